pub mod config;
pub mod interface;
pub mod packet;
pub mod scenario;

pub use interface::{Event, LayerContext};
pub use packet::{Frame, FrameKind, Packet, Seq};

pub use config::{LinkConfig, ProtocolConfig};
pub use scenario::{
    LinkConfigOverride, NodeId, ProtocolConfigOverride, TestAction, TestAssertion, TestScenario,
};
