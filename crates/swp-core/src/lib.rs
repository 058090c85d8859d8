//! Sliding-window data link protocol with piggybacked acknowledgments,
//! negative acknowledgments and per-frame retransmission timers.

pub mod engine;
pub mod error;
pub mod runtime;
pub mod seq;
pub mod timer;

#[cfg(test)]
mod testing;

pub use engine::{Engine, EngineStats, ReceiverWindow, SenderWindow};
pub use error::{ConfigError, EngineError, Result};
pub use runtime::{Connection, EventSender, TokioTimers};
pub use seq::{MAX_WINDOW, SeqSpace, between};
pub use timer::{TimerFacility, TimerKind, Timers};

pub use swp_abstract::{Event, Frame, FrameKind, LayerContext, Packet, ProtocolConfig, Seq};
