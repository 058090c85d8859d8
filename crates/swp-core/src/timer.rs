//! Retransmission and acknowledgment-delay timers.
//!
//! Timers never touch protocol state. When one expires, the facility posts the
//! matching [`Event`] back into the engine's event stream, so every state
//! change still happens on the thread that drains events.

use std::time::Duration;

use swp_abstract::{Event, Seq};

use crate::seq::SeqSpace;

/// What an expiring timer reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Retransmission timer of the DATA frame with this sequence number.
    Frame(Seq),
    /// The shared acknowledgment-delay timer.
    Ack,
}

impl From<TimerKind> for Event {
    fn from(kind: TimerKind) -> Self {
        match kind {
            TimerKind::Frame(seq) => Event::Timeout(seq),
            TimerKind::Ack => Event::AckTimeout,
        }
    }
}

/// One-shot delayed callbacks.
///
/// `schedule` arranges for `kind` to be posted as an event once `delay` has
/// elapsed. `cancel` must be a no-op for a handle whose timer already fired.
pub trait TimerFacility {
    type Handle;

    fn schedule(&mut self, delay: Duration, kind: TimerKind) -> Self::Handle;

    fn cancel(&mut self, handle: Self::Handle);
}

/// Per-slot retransmission timers plus the single ack-delay timer.
pub struct Timers<F: TimerFacility> {
    facility: F,
    space: SeqSpace,
    frame_timeout: Duration,
    ack_timeout: Duration,
    // indexed by `space.slot(seq)`
    frame: Vec<Option<F::Handle>>,
    ack: Option<F::Handle>,
}

impl<F: TimerFacility> Timers<F> {
    pub fn new(space: SeqSpace, frame_timeout: Duration, ack_timeout: Duration, facility: F) -> Self {
        Self {
            facility,
            space,
            frame_timeout,
            ack_timeout,
            frame: (0..space.window_size()).map(|_| None).collect(),
            ack: None,
        }
    }

    /// Arm the retransmission timer for `seq`, replacing whatever ran in its slot.
    pub fn start_timer(&mut self, seq: Seq) {
        self.stop_timer(seq);
        let handle = self.facility.schedule(self.frame_timeout, TimerKind::Frame(seq));
        self.frame[self.space.slot(seq)] = Some(handle);
    }

    pub fn stop_timer(&mut self, seq: Seq) {
        if let Some(handle) = self.frame[self.space.slot(seq)].take() {
            self.facility.cancel(handle);
        }
    }

    pub fn start_ack_timer(&mut self) {
        self.stop_ack_timer();
        self.ack = Some(self.facility.schedule(self.ack_timeout, TimerKind::Ack));
    }

    pub fn stop_ack_timer(&mut self) {
        if let Some(handle) = self.ack.take() {
            self.facility.cancel(handle);
        }
    }

    /// Whether the slot of `seq` holds a timer that has not been stopped.
    ///
    /// A timer that has expired counts until its timeout is handled: the
    /// engine then re-arms it when it resends, or stops it on acknowledgment.
    /// It does not mean the timer is still pending.
    pub fn is_armed(&self, seq: Seq) -> bool {
        self.frame[self.space.slot(seq)].is_some()
    }

    pub fn ack_armed(&self) -> bool {
        self.ack.is_some()
    }

    /// Frame slots holding a timer that has not been stopped, see [`Self::is_armed`].
    pub fn armed_frame_timers(&self) -> usize {
        self.frame.iter().filter(|h| h.is_some()).count()
    }

    pub fn facility(&self) -> &F {
        &self.facility
    }

    pub fn facility_mut(&mut self) -> &mut F {
        &mut self.facility
    }
}
