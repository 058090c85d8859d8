use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashSet, VecDeque};

use anyhow::{Result, ensure};
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use swp_abstract::{
    Event, Frame, FrameKind, LayerContext, LinkConfig, NodeId, Packet, ProtocolConfig, Seq,
};
use swp_core::{Engine, TimerKind};
use tracing::{debug, info, warn};

use crate::timers::{TimerOp, VirtualTimers};
use crate::trace::{LinkEventSummary, SimulationReport, StationReport};
use crate::wire::{self, WireError};

#[derive(Debug)]
pub enum EventType {
    Submit { node: NodeId, data: Packet },
    NetworkLayerReady { node: NodeId },
    FrameArrival { to: NodeId, bytes: Bytes },
    TimerExpiry { node: NodeId, id: u64, kind: TimerKind },
}

#[derive(Debug)]
struct QueuedEvent {
    time: u64,
    event_type: EventType,
    id: u64, // tie-breaker, keeps same-time events in insertion order
}

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.id == other.id
    }
}

impl Eq for QueuedEvent {}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed so the BinaryHeap pops the earliest event first
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultAction {
    Drop,
    Corrupt,
}

/// One-shot fault applied to the first matching frame a station transmits.
///
/// `seq` matches the sequence number of a DATA frame and the `ack` field of an
/// ACK or NAK. `None` matches any frame of `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    pub from: NodeId,
    pub kind: FrameKind,
    pub seq: Option<Seq>,
    pub action: FaultAction,
}

impl Fault {
    fn matches(&self, from: NodeId, frame: &Frame) -> bool {
        let number = if frame.is_data() { frame.seq } else { frame.ack };
        self.from == from && self.kind == frame.kind && self.seq.is_none_or(|s| s == number)
    }
}

/// Frames put on the link by one station, by kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameCounts {
    pub data: u32,
    pub ack: u32,
    pub nak: u32,
}

impl FrameCounts {
    pub fn get(&self, kind: FrameKind) -> u32 {
        match kind {
            FrameKind::Data => self.data,
            FrameKind::Ack => self.ack,
            FrameKind::Nak => self.nak,
        }
    }

    fn record(&mut self, kind: FrameKind) {
        match kind {
            FrameKind::Data => self.data += 1,
            FrameKind::Ack => self.ack += 1,
            FrameKind::Nak => self.nak += 1,
        }
    }
}

/// Actions buffered while an engine handles one event.
#[derive(Default)]
struct ActionBuffer {
    outgoing: Vec<Frame>,
    credit: usize,
    delivered: Vec<Packet>,
}

/// Context handed to the engine: records its requests, serves payloads from
/// the station's queue.
struct ScopedContext<'a> {
    buffer: &'a mut ActionBuffer,
    outbox: &'a mut VecDeque<Packet>,
}

impl LayerContext for ScopedContext<'_> {
    fn transmit(&mut self, frame: Frame) {
        self.buffer.outgoing.push(frame);
    }

    fn grant_credit(&mut self, n: usize) {
        self.buffer.credit += n;
    }

    fn pull_payload(&mut self) -> Option<Packet> {
        self.outbox.pop_front()
    }

    fn deliver(&mut self, packet: Packet) {
        self.buffer.delivered.push(packet);
    }
}

/// One end of the link together with its network layer.
struct Station {
    engine: Engine<VirtualTimers>,
    outbox: VecDeque<Packet>,
    // credit granted by the engine and not yet spent on a ready event
    credit: usize,
    // ready events queued but not yet handled
    announced: usize,
    delivered: Vec<Packet>,
    frames_sent: FrameCounts,
    // arrival time of the last frame this station put on the link
    last_arrival: u64,
}

impl Station {
    fn new(protocol: &ProtocolConfig) -> Result<Self> {
        Ok(Self {
            engine: Engine::new(protocol, VirtualTimers::default())?,
            outbox: VecDeque::new(),
            credit: 0,
            announced: 0,
            delivered: Vec::new(),
            frames_sent: FrameCounts::default(),
            last_arrival: 0,
        })
    }
}

fn slot(node: NodeId) -> usize {
    match node {
        NodeId::A => 0,
        NodeId::B => 1,
    }
}

/// Discrete-event simulation of two engines joined by an unreliable link.
pub struct Simulator {
    time: u64,
    event_queue: BinaryHeap<QueuedEvent>,
    event_id_counter: u64,
    started: bool,

    protocol: ProtocolConfig,
    link: LinkConfig,
    rng: StdRng,

    stations: [Station; 2],
    live_timers: HashSet<(NodeId, u64)>,
    faults: Vec<Fault>,

    /// Timeline of link events (sends, drops, corruptions, deliveries).
    pub link_events: Vec<LinkEventSummary>,
}

impl Simulator {
    pub fn new(protocol: ProtocolConfig, link: LinkConfig) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&link.loss_rate),
            "loss rate {} is not a probability",
            link.loss_rate
        );
        ensure!(
            (0.0..=1.0).contains(&link.corrupt_rate),
            "corrupt rate {} is not a probability",
            link.corrupt_rate
        );
        ensure!(
            link.min_latency <= link.max_latency,
            "min latency {} exceeds max latency {}",
            link.min_latency,
            link.max_latency
        );

        let stations = [Station::new(&protocol)?, Station::new(&protocol)?];
        Ok(Self {
            time: 0,
            event_queue: BinaryHeap::new(),
            event_id_counter: 0,
            started: false,
            rng: StdRng::seed_from_u64(link.seed),
            protocol,
            link,
            stations,
            live_timers: HashSet::new(),
            faults: Vec::new(),
            link_events: Vec::new(),
        })
    }

    pub fn protocol_config(&self) -> &ProtocolConfig {
        &self.protocol
    }

    pub fn link_config(&self) -> &LinkConfig {
        &self.link
    }

    pub fn add_fault(&mut self, fault: Fault) {
        self.faults.push(fault);
    }

    pub fn schedule_submit(&mut self, time: u64, node: NodeId, data: impl Into<Packet>) {
        self.push_event(
            time,
            EventType::Submit {
                node,
                data: data.into(),
            },
        );
    }

    pub fn engine(&self, node: NodeId) -> &Engine<VirtualTimers> {
        &self.stations[slot(node)].engine
    }

    pub fn delivered(&self, node: NodeId) -> &[Packet] {
        &self.stations[slot(node)].delivered
    }

    pub fn frames_sent(&self, node: NodeId) -> FrameCounts {
        self.stations[slot(node)].frames_sent
    }

    /// Payloads submitted at `node` that its engine has not taken yet.
    pub fn queued(&self, node: NodeId) -> usize {
        self.stations[slot(node)].outbox.len()
    }

    pub fn peek_next_event_time(&self) -> Option<u64> {
        self.event_queue.peek().map(|e| e.time)
    }

    pub fn current_time(&self) -> u64 {
        self.time
    }

    pub fn remaining_events(&self) -> usize {
        self.event_queue.len()
    }

    fn push_event(&mut self, time: u64, event_type: EventType) {
        self.event_queue.push(QueuedEvent {
            time,
            event_type,
            id: self.event_id_counter,
        });
        self.event_id_counter += 1;
    }

    fn note(&mut self, description: String) {
        debug!(time = self.time, "{description}");
        self.link_events.push(LinkEventSummary {
            time: self.time,
            description,
        });
    }

    /// Start both engines. Called implicitly by [`Self::step`].
    pub fn init(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        for node in [NodeId::A, NodeId::B] {
            let mut buffer = ActionBuffer::default();
            {
                let station = &mut self.stations[slot(node)];
                let mut ctx = ScopedContext {
                    buffer: &mut buffer,
                    outbox: &mut station.outbox,
                };
                station.engine.start(&mut ctx);
            }
            self.process_actions(node, buffer);
        }
    }

    /// Process the next event. Returns false once the queue is empty.
    pub fn step(&mut self) -> bool {
        self.init();

        let Some(event) = self.event_queue.pop() else {
            return false;
        };

        self.time = event.time;
        debug!("processing event at {}: {:?}", self.time, event.event_type);

        match event.event_type {
            EventType::Submit { node, data } => {
                self.stations[slot(node)].outbox.push_back(data);
                self.announce(node);
            }
            EventType::NetworkLayerReady { node } => {
                self.stations[slot(node)].announced -= 1;
                self.dispatch(node, Event::NetworkLayerReady);
            }
            EventType::FrameArrival { to, bytes } => match wire::decode(&bytes) {
                Ok(frame) => self.dispatch(to, Event::FrameArrival(frame)),
                Err(WireError::ChecksumMismatch { .. }) => {
                    self.note(format!("[{to:?}] CHECKSUM ERROR"));
                    self.dispatch(to, Event::ChecksumError);
                }
                Err(err) => {
                    warn!(node = ?to, %err, "dropping undecodable frame");
                    self.note(format!("[{to:?}] DROP (undecodable: {err})"));
                }
            },
            EventType::TimerExpiry { node, id, kind } => {
                if self.live_timers.remove(&(node, id)) {
                    self.dispatch(node, kind.into());
                } else {
                    debug!("skipping cancelled timer {id} of {node:?}");
                }
            }
        }
        true
    }

    /// Run until the link goes quiet.
    ///
    /// Does not return if the configuration keeps frames retransmitting
    /// forever (a loss rate of 1.0, say); use [`Self::run_until`] then.
    pub fn run_until_complete(&mut self) {
        while self.step() {}
    }

    /// Process every event due at or before `deadline_ms`. Returns true if
    /// the queue drained before the deadline.
    pub fn run_until(&mut self, deadline_ms: u64) -> bool {
        self.init();
        while self
            .peek_next_event_time()
            .is_some_and(|time| time <= deadline_ms)
        {
            self.step();
        }
        self.event_queue.is_empty()
    }

    /// Produce a serializable snapshot of the current simulation state.
    pub fn export_report(&self) -> SimulationReport {
        let stations = [NodeId::A, NodeId::B]
            .into_iter()
            .map(|node| {
                let station = &self.stations[slot(node)];
                let report = StationReport {
                    delivered: station
                        .delivered
                        .iter()
                        .map(|p| String::from_utf8_lossy(p.as_bytes()).into_owned())
                        .collect(),
                    frames_sent: station.frames_sent,
                    stats: *station.engine.stats(),
                };
                (node, report)
            })
            .collect::<BTreeMap<_, _>>();

        SimulationReport {
            protocol: self.protocol.clone(),
            link: self.link.clone(),
            duration_ms: self.time,
            stations,
            link_events: self.link_events.clone(),
        }
    }

    fn dispatch(&mut self, node: NodeId, event: Event) {
        let mut buffer = ActionBuffer::default();
        {
            let station = &mut self.stations[slot(node)];
            let mut ctx = ScopedContext {
                buffer: &mut buffer,
                outbox: &mut station.outbox,
            };
            station.engine.handle(event, &mut ctx);
        }
        self.process_actions(node, buffer);
    }

    // Post one ready event per unit of credit while unannounced payloads wait.
    fn announce(&mut self, node: NodeId) {
        let mut ready = 0;
        {
            let station = &mut self.stations[slot(node)];
            while station.credit > 0 && station.outbox.len() > station.announced {
                station.credit -= 1;
                station.announced += 1;
                ready += 1;
            }
        }
        for _ in 0..ready {
            self.push_event(self.time, EventType::NetworkLayerReady { node });
        }
    }

    fn process_actions(&mut self, node: NodeId, buffer: ActionBuffer) {
        let ops = self.stations[slot(node)]
            .engine
            .timer_facility_mut()
            .drain();
        for op in ops {
            match op {
                TimerOp::Arm { id, delay, kind } => {
                    self.live_timers.insert((node, id));
                    let due = self.time + delay.as_millis() as u64;
                    self.push_event(due, EventType::TimerExpiry { node, id, kind });
                }
                TimerOp::Cancel(id) => {
                    self.live_timers.remove(&(node, id));
                }
            }
        }

        for packet in buffer.delivered {
            info!(?node, bytes = packet.len(), "delivered to network layer");
            self.note(format!(
                "[{node:?}] DELIVERED {} bytes to network layer",
                packet.len()
            ));
            self.stations[slot(node)].delivered.push(packet);
        }

        for frame in buffer.outgoing {
            self.stations[slot(node)].frames_sent.record(frame.kind);
            self.transmit(node, frame);
        }

        self.stations[slot(node)].credit += buffer.credit;
        self.announce(node);
    }

    fn transmit(&mut self, from: NodeId, frame: Frame) {
        let to = from.peer();
        let mut corrupt = false;

        if let Some(pos) = self.faults.iter().position(|f| f.matches(from, &frame)) {
            let fault = self.faults.remove(pos);
            match fault.action {
                FaultAction::Drop => {
                    self.note(format!("[{from:?}->{to:?}] DROP (deterministic) {frame}"));
                    return;
                }
                FaultAction::Corrupt => corrupt = true,
            }
        }

        if !corrupt && self.rng.random::<f64>() < self.link.loss_rate {
            self.note(format!("[{from:?}->{to:?}] DROP (random loss) {frame}"));
            return;
        }

        let mut bytes = wire::encode(&frame).to_vec();
        if corrupt || self.rng.random::<f64>() < self.link.corrupt_rate {
            let index = self.rng.random_range(0..bytes.len());
            let bit = self.rng.random_range(0..8u32);
            bytes[index] ^= 1 << bit;
            self.note(format!(
                "[{from:?}->{to:?}] CORRUPT byte {index} of {frame}"
            ));
        }

        let latency = self
            .rng
            .random_range(self.link.min_latency..=self.link.max_latency);
        // the link is FIFO per direction
        let station = &mut self.stations[slot(from)];
        let arrival = (self.time + latency).max(station.last_arrival);
        station.last_arrival = arrival;

        self.note(format!(
            "[{from:?}->{to:?}] SEND {frame} (arrives at {arrival}ms)"
        ));
        self.push_event(
            arrival,
            EventType::FrameArrival {
                to,
                bytes: Bytes::from(bytes),
            },
        );
    }
}
