use std::time::Duration;

use swp_core::{TimerFacility, TimerKind};

/// A timer request recorded while the engine handled an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOp {
    Arm {
        id: u64,
        delay: Duration,
        kind: TimerKind,
    },
    Cancel(u64),
}

/// Timer facility for virtual time.
///
/// Nothing is scheduled here; arm and cancel requests are queued in call order
/// and the simulator turns them into queue entries after the handler returns.
#[derive(Debug, Default)]
pub struct VirtualTimers {
    next_id: u64,
    ops: Vec<TimerOp>,
}

impl VirtualTimers {
    pub fn drain(&mut self) -> Vec<TimerOp> {
        std::mem::take(&mut self.ops)
    }
}

impl TimerFacility for VirtualTimers {
    type Handle = u64;

    fn schedule(&mut self, delay: Duration, kind: TimerKind) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.ops.push(TimerOp::Arm { id, delay, kind });
        id
    }

    fn cancel(&mut self, handle: u64) {
        self.ops.push(TimerOp::Cancel(handle));
    }
}
