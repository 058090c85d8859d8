//! Hand-driven collaborators for unit tests.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use swp_abstract::{Frame, LayerContext, Packet};

use crate::timer::{TimerFacility, TimerKind};

/// Timer facility on a clock that only moves when told to.
#[derive(Default)]
pub(crate) struct ManualTimers {
    now: Duration,
    next_id: u64,
    live: BTreeMap<u64, (Duration, TimerKind)>,
}

impl ManualTimers {
    /// Move the clock forward and return the timers that expired, earliest first.
    pub(crate) fn advance(&mut self, by: Duration) -> Vec<TimerKind> {
        self.now += by;
        let mut due: Vec<(Duration, u64, TimerKind)> = self
            .live
            .iter()
            .filter(|(_, (deadline, _))| *deadline <= self.now)
            .map(|(id, (deadline, kind))| (*deadline, *id, *kind))
            .collect();
        due.sort_by_key(|(deadline, id, _)| (*deadline, *id));
        for (_, id, _) in &due {
            self.live.remove(id);
        }
        due.into_iter().map(|(_, _, kind)| kind).collect()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn is_live(&self, kind: TimerKind) -> bool {
        self.live.values().any(|(_, k)| *k == kind)
    }
}

impl TimerFacility for ManualTimers {
    type Handle = u64;

    fn schedule(&mut self, delay: Duration, kind: TimerKind) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id, (self.now + delay, kind));
        id
    }

    fn cancel(&mut self, handle: u64) {
        self.live.remove(&handle);
    }
}

/// Layer context that records everything the engine does.
#[derive(Default)]
pub(crate) struct RecordingContext {
    pub(crate) sent: Vec<Frame>,
    pub(crate) credit: usize,
    pub(crate) outbox: VecDeque<Packet>,
    pub(crate) delivered: Vec<Packet>,
}

impl RecordingContext {
    pub(crate) fn take_sent(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.sent)
    }

    pub(crate) fn delivered_strings(&self) -> Vec<String> {
        self.delivered
            .iter()
            .map(|p| String::from_utf8_lossy(p.as_bytes()).into_owned())
            .collect()
    }
}

impl LayerContext for RecordingContext {
    fn transmit(&mut self, frame: Frame) {
        self.sent.push(frame);
    }

    fn grant_credit(&mut self, n: usize) {
        self.credit += n;
    }

    fn pull_payload(&mut self) -> Option<Packet> {
        self.outbox.pop_front()
    }

    fn deliver(&mut self, packet: Packet) {
        self.delivered.push(packet);
    }
}
