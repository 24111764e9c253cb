//! [`NavigationLoop`] – the fixed-rate control loop.
//!
//! Every period the loop runs exactly one [`WaypointSequencer::tick`]:
//!
//! 1. **Check** – stop if the shared shutdown flag is set.
//! 2. **Tick** – the sequencer looks up the goal in the robot frame, asks the
//!    controller for a command and dispatches it.
//! 3. **Report** – state changes go out on [`Topic::Status`]; the first of a
//!    run of skipped ticks and every dispatch failure go out on
//!    [`Topic::Alerts`].
//!
//! Ticks never overlap: the interval uses [`MissedTickBehavior::Skip`], so a
//! slow tick drops the missed periods instead of bursting to catch up.
//!
//! Cancellation sends a final stop command before returning, so the base
//! is not left holding the last motion command.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};
use waynav_control::{TickOutcome, WaypointSequencer};
use waynav_hal::CommandSink;
use waynav_middleware::{EventBus, Topic};
use waynav_perception::LocalFrame;
use waynav_types::{ControlCommand, Event, EventPayload, NavError, SequencerState};

const SOURCE: &str = "waynav-runtime::nav_loop";

/// Default control rate (Hz).
pub const DEFAULT_CONTROL_RATE_HZ: f64 = 20.0;

/// Why [`NavigationLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Every waypoint was reached.
    Completed,
    /// The shutdown flag was raised first.
    Cancelled,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopReport {
    pub exit: LoopExit,
    pub ticks: u64,
    pub skipped_ticks: u64,
    pub dispatch_failures: u64,
    pub final_state: SequencerState,
}

/// Owns a sequencer, its localisation source and its command sink, and
/// ticks them at a fixed rate.
pub struct NavigationLoop {
    sequencer: WaypointSequencer,
    frame: Box<dyn LocalFrame + Send>,
    sink: Box<dyn CommandSink>,
    bus: Option<EventBus>,
    period: Duration,
    shutdown: Arc<AtomicBool>,
}

impl NavigationLoop {
    /// # Errors
    ///
    /// [`NavError::Config`] if `control_rate_hz` is not a positive finite
    /// number.
    pub fn new(
        sequencer: WaypointSequencer,
        frame: Box<dyn LocalFrame + Send>,
        sink: Box<dyn CommandSink>,
        control_rate_hz: f64,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self, NavError> {
        if !control_rate_hz.is_finite() || control_rate_hz <= 0.0 {
            return Err(NavError::Config(format!(
                "control_rate_hz must be positive, got {control_rate_hz}"
            )));
        }
        Ok(Self {
            sequencer,
            frame,
            sink,
            bus: None,
            period: Duration::from_secs_f64(1.0 / control_rate_hz),
            shutdown,
        })
    }

    /// Publish status changes and faults on `bus`.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn sequencer(&self) -> &WaypointSequencer {
        &self.sequencer
    }

    /// Tick until the mission completes or shutdown is requested.
    #[instrument(skip(self), fields(waypoints = self.sequencer.waypoints().len(), sink = self.sink.id()))]
    pub async fn run(mut self) -> LoopReport {
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut ticks = 0u64;
        let mut skipped_ticks = 0u64;
        let mut dispatch_failures = 0u64;
        let mut skipping = false;

        info!(period_ms = self.period.as_millis() as u64, "navigation loop started");
        let exit = loop {
            ticker.tick().await;
            if self.shutdown.load(Ordering::SeqCst) {
                break LoopExit::Cancelled;
            }

            let before = self.sequencer.state();
            let outcome = self.sequencer.tick(self.frame.as_ref(), self.sink.as_mut());
            ticks += 1;

            if self.sequencer.state() != before {
                self.publish(Topic::Status, EventPayload::Status(self.sequencer.status()));
            }

            match outcome {
                TickOutcome::Skipped(err) => {
                    skipped_ticks += 1;
                    if !skipping {
                        self.fault("localization", &err);
                    }
                    skipping = true;
                    continue;
                }
                TickOutcome::DispatchFailed(err) => {
                    dispatch_failures += 1;
                    let sink = self.sink.id().to_string();
                    self.fault(&sink, &err);
                }
                _ => {}
            }
            skipping = false;

            if self.sequencer.is_complete() {
                break LoopExit::Completed;
            }
        };

        if exit == LoopExit::Cancelled {
            warn!(state = ?self.sequencer.state(), "navigation cancelled; stopping base");
            if let Err(e) = self.sink.send(ControlCommand::stop()) {
                warn!(error = %e, "failed to send final stop");
            }
        }

        let report = LoopReport {
            exit,
            ticks,
            skipped_ticks,
            dispatch_failures,
            final_state: self.sequencer.state(),
        };
        info!(?report, "navigation loop finished");
        report
    }

    fn fault(&self, component: &str, err: &NavError) {
        self.publish(
            Topic::Alerts,
            EventPayload::Fault {
                component: component.to_string(),
                message: err.to_string(),
            },
        );
    }

    fn publish(&self, topic: Topic, payload: EventPayload) {
        if let Some(bus) = &self.bus
            && let Err(e) = bus.publish_to(topic, Event::new(SOURCE, payload))
        {
            debug!(?topic, error = %e, "event not delivered");
        }
    }
}
