//! Drives an [`Engine`] from a tokio channel.
//!
//! Every producer (link, network layer, timers) posts into one unbounded
//! channel; [`Connection::run`] drains it one event at a time. Timer tasks only
//! post events, so the engine state has a single writer and needs no locks.

use std::time::Duration;

use swp_abstract::{Event, LayerContext, ProtocolConfig};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::{Engine, EngineStats};
use crate::error::{EngineError, Result};
use crate::timer::{TimerFacility, TimerKind};

pub type EventSender = mpsc::UnboundedSender<Event>;

/// Timer facility backed by one tokio task per armed timer.
///
/// Holds only a weak sender so that armed timers do not keep the event
/// source open on their own.
pub struct TokioTimers {
    events: mpsc::WeakUnboundedSender<Event>,
}

impl TimerFacility for TokioTimers {
    type Handle = AbortHandle;

    fn schedule(&mut self, delay: Duration, kind: TimerKind) -> AbortHandle {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(events) = events.upgrade() {
                let _ = events.send(kind.into());
            }
        })
        .abort_handle()
    }

    fn cancel(&mut self, handle: AbortHandle) {
        // a timer that already posted its event is unaffected
        handle.abort();
    }
}

/// One station: engine, event source and the layers around it.
pub struct Connection<C: LayerContext> {
    engine: Engine<TokioTimers>,
    events: mpsc::UnboundedReceiver<Event>,
    ctx: C,
    shutdown: CancellationToken,
}

impl<C: LayerContext> Connection<C> {
    /// Build a connection and the sender collaborators use to post events.
    pub fn new(
        config: &ProtocolConfig,
        ctx: C,
        shutdown: CancellationToken,
    ) -> Result<(Self, EventSender)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Engine::new(
            config,
            TokioTimers {
                events: tx.downgrade(),
            },
        )?;
        Ok((
            Self {
                engine,
                events: rx,
                ctx,
                shutdown,
            },
            tx,
        ))
    }

    pub fn engine(&self) -> &Engine<TokioTimers> {
        &self.engine
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    /// Run the event loop until `shutdown` is cancelled.
    ///
    /// Must be called inside a tokio runtime. Returns the layer context and
    /// the final counters, or [`EngineError::EventSourceClosed`] if every
    /// event sender was dropped first.
    pub async fn run(mut self) -> Result<(C, EngineStats)> {
        info!(
            window = self.engine.space().window_size(),
            "connection starting"
        );
        self.engine.start(&mut self.ctx);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    debug!("shutdown requested");
                    break;
                }
                event = self.events.recv() => match event {
                    Some(event) => self.engine.handle(event, &mut self.ctx),
                    None => return Err(EngineError::EventSourceClosed),
                },
            }
        }

        let stats = *self.engine.stats();
        info!(?stats, "connection stopped");
        Ok((self.ctx, stats))
    }
}
