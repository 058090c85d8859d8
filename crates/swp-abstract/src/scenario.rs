use crate::config::{LinkConfig, ProtocolConfig};
use crate::packet::{FrameKind, Seq};
use serde::{Deserialize, Serialize};

/// One of the two stations at the ends of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeId {
    A,
    B,
}

impl NodeId {
    pub fn peer(&self) -> Self {
        match self {
            NodeId::A => NodeId::B,
            NodeId::B => NodeId::A,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub protocol: ProtocolConfigOverride,
    #[serde(default)]
    pub link: LinkConfigOverride,
    pub actions: Vec<TestAction>,
    #[serde(default)]
    pub assertions: Vec<TestAssertion>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProtocolConfigOverride {
    pub max_seq: Option<Seq>,
    pub frame_timeout_ms: Option<u64>,
    pub ack_timeout_ms: Option<u64>,
}

impl ProtocolConfigOverride {
    pub fn apply_to(&self, config: &mut ProtocolConfig) {
        if let Some(v) = self.max_seq {
            config.max_seq = v;
        }
        if let Some(v) = self.frame_timeout_ms {
            config.frame_timeout_ms = v;
        }
        if let Some(v) = self.ack_timeout_ms {
            config.ack_timeout_ms = v;
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LinkConfigOverride {
    pub loss_rate: Option<f64>,
    pub corrupt_rate: Option<f64>,
    pub min_latency: Option<u64>,
    pub max_latency: Option<u64>,
    pub seed: Option<u64>,
}

impl LinkConfigOverride {
    pub fn apply_to(&self, config: &mut LinkConfig) {
        if let Some(v) = self.loss_rate {
            config.loss_rate = v;
        }
        if let Some(v) = self.corrupt_rate {
            config.corrupt_rate = v;
        }
        if let Some(v) = self.min_latency {
            config.min_latency = v;
        }
        if let Some(v) = self.max_latency {
            config.max_latency = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestAction {
    /// The network layer of `node` submits `data` at `time`.
    Submit { time: u64, node: NodeId, data: String },
    /// Drop the next frame `from` sends that matches `kind` (and `seq`, for DATA).
    DropNext {
        from: NodeId,
        kind: FrameKind,
        seq: Option<Seq>,
    },
    /// Corrupt the next matching frame so the peer sees a checksum error.
    CorruptNext {
        from: NodeId,
        kind: FrameKind,
        seq: Option<Seq>,
    },
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestAssertion {
    /// `node` delivered exactly these payloads, in this order.
    Delivered { node: NodeId, data: Vec<String> },
    /// Number of frames of `kind` transmitted by `from` is within range.
    FrameCount {
        from: NodeId,
        kind: FrameKind,
        min: u32,
        max: Option<u32>,
    },
    /// Simulation goes quiet within this many virtual milliseconds.
    MaxDuration { ms: u64 },
}
