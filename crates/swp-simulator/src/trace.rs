use serde::Serialize;
use std::collections::BTreeMap;
use swp_abstract::{LinkConfig, NodeId, ProtocolConfig};
use swp_core::EngineStats;

use crate::simulator::FrameCounts;

/// A compact textual summary of one link-layer event.
#[derive(Debug, Clone, Serialize)]
pub struct LinkEventSummary {
    pub time: u64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationReport {
    /// Payloads handed to this station's network layer, in delivery order.
    pub delivered: Vec<String>,
    pub frames_sent: FrameCounts,
    pub stats: EngineStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub protocol: ProtocolConfig,
    pub link: LinkConfig,
    pub duration_ms: u64,
    pub stations: BTreeMap<NodeId, StationReport>,
    pub link_events: Vec<LinkEventSummary>,
}
