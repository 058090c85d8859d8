use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::packet::Seq;

/// Protocol parameters shared by both peers.
///
/// The ack timeout must be shorter than the frame timeout, otherwise a lone
/// frame is retransmitted before its acknowledgment can leave the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Largest sequence number; the sequence space is `0..=max_seq`.
    pub max_seq: Seq,
    /// Retransmission delay for an unacknowledged DATA frame.
    pub frame_timeout_ms: u64,
    /// How long a pending acknowledgment waits for a piggyback ride.
    pub ack_timeout_ms: u64,
}

impl ProtocolConfig {
    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_seq: 7,
            frame_timeout_ms: 200,
            ack_timeout_ms: 50,
        }
    }
}

/// Behaviour of the simulated link between the two peers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub loss_rate: f64,
    pub corrupt_rate: f64,
    pub min_latency: u64,
    pub max_latency: u64,
    pub seed: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            corrupt_rate: 0.0,
            min_latency: 10,
            max_latency: 30,
            seed: 0,
        }
    }
}
