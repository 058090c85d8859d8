use crate::packet::{Frame, Packet, Seq};

/// Everything that can wake the protocol engine up.
///
/// Producers are the link layer (arrivals and checksum failures), the network
/// layer (send readiness) and the engine's own timers. The engine consumes them
/// one at a time, in the order they were posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The network layer has credit and a payload waiting.
    NetworkLayerReady,
    /// An intact frame came off the link.
    FrameArrival(Frame),
    /// A frame came off the link but failed its integrity check.
    ChecksumError,
    /// The retransmission timer of the given frame expired.
    Timeout(Seq),
    /// The acknowledgment-delay timer expired.
    AckTimeout,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::NetworkLayerReady => "network_layer_ready",
            Event::FrameArrival(_) => "frame_arrival",
            Event::ChecksumError => "cksum_err",
            Event::Timeout(_) => "timeout",
            Event::AckTimeout => "ack_timeout",
        }
    }
}

/// Capabilities the surrounding system provides to the protocol engine.
/// The engine calls these while it handles an event; none of them may block.
pub trait LayerContext {
    /// Hand a fully formed frame to the unreliable link.
    fn transmit(&mut self, frame: Frame);

    /// Allow the network layer to submit `n` more payloads.
    fn grant_credit(&mut self, n: usize);

    /// Take the next outbound payload. Called once per `NetworkLayerReady`.
    fn pull_payload(&mut self) -> Option<Packet>;

    /// Hand an in-order payload up to the network layer.
    fn deliver(&mut self, packet: Packet);
}
