use swp_abstract::Seq;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_seq must be at least 1, got {0}")]
    MaxSeqTooSmall(Seq),
    #[error("sequence space of {0} numbers cannot be split into two equal windows")]
    OddSequenceSpace(u64),
    #[error("window of {window} slots exceeds the limit of {limit}")]
    WindowTooLarge { window: u64, limit: usize },
    #[error("{0} timeout must be non-zero")]
    ZeroTimeout(&'static str),
    #[error("ack timeout ({ack_ms} ms) must be shorter than frame timeout ({frame_ms} ms)")]
    AckTimeoutNotShorter { ack_ms: u64, frame_ms: u64 },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid protocol configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("event source closed")]
    EventSourceClosed,
}

pub type Result<T> = std::result::Result<T, EngineError>;
