//! Discrete-event simulator for the sliding-window engine: two stations, a
//! lossy link with checksummed frames, and TOML-driven test scenarios.

pub mod scenario_runner;
pub mod simulator;
pub mod timers;
pub mod trace;
pub mod wire;

pub use simulator::{Fault, FaultAction, FrameCounts, Simulator};
pub use timers::{TimerOp, VirtualTimers};
pub use trace::{LinkEventSummary, SimulationReport, StationReport};
