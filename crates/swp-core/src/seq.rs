//! Modular sequence-number arithmetic.

use swp_abstract::Seq;

use crate::error::ConfigError;

/// Returns true if, walking forward circularly from `a`, `b` is reached
/// strictly before `c`. In other words `b` lies in the half-open window
/// `[a, c)` of a circular sequence space.
pub fn between(a: Seq, b: Seq, c: Seq) -> bool {
    (a <= b && b < c) || (c < a && a <= b) || (b < c && c < a)
}

/// Largest window an engine will allocate buffers and timers for.
pub const MAX_WINDOW: usize = 1 << 16;

/// Sequence space `0..=max_seq` and the window size derived from it.
///
/// The window is half the space. Anything larger lets an old and a new frame
/// with the same sequence number be in flight at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqSpace {
    max_seq: Seq,
}

impl SeqSpace {
    pub fn new(max_seq: Seq) -> Result<Self, ConfigError> {
        if max_seq < 1 {
            return Err(ConfigError::MaxSeqTooSmall(max_seq));
        }
        let size = u64::from(max_seq) + 1;
        if size % 2 != 0 {
            return Err(ConfigError::OddSequenceSpace(size));
        }
        if size / 2 > MAX_WINDOW as u64 {
            return Err(ConfigError::WindowTooLarge {
                window: size / 2,
                limit: MAX_WINDOW,
            });
        }
        Ok(Self { max_seq })
    }

    pub fn max_seq(&self) -> Seq {
        self.max_seq
    }

    /// Number of distinct sequence numbers, `MAX_SEQ + 1`.
    pub fn modulus(&self) -> u64 {
        u64::from(self.max_seq) + 1
    }

    pub fn window_size(&self) -> usize {
        (self.modulus() / 2) as usize
    }

    pub fn next(&self, seq: Seq) -> Seq {
        ((u64::from(seq) + 1) % self.modulus()) as Seq
    }

    /// The number before `seq`; `prev(0)` is `MAX_SEQ`.
    pub fn prev(&self, seq: Seq) -> Seq {
        ((u64::from(seq) + u64::from(self.max_seq)) % self.modulus()) as Seq
    }

    pub fn add(&self, seq: Seq, n: u64) -> Seq {
        ((u64::from(seq) + n % self.modulus()) % self.modulus()) as Seq
    }

    /// Forward distance from `from` to `to`, i.e. `(to - from) mod (MAX_SEQ + 1)`.
    pub fn distance(&self, from: Seq, to: Seq) -> u64 {
        let m = self.modulus();
        (u64::from(to) % m + m - u64::from(from) % m) % m
    }

    /// Buffer slot for `seq`. Sequence numbers `window_size` apart share a
    /// slot; the windows guarantee that at most one of them is live.
    pub fn slot(&self, seq: Seq) -> usize {
        (u64::from(seq) % self.window_size() as u64) as usize
    }
}

impl Default for SeqSpace {
    fn default() -> Self {
        Self { max_seq: 7 }
    }
}
