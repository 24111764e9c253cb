//! Simulated drive base running as its own task.
//!
//! [`SimDriveTask`] listens on [`Topic::Commands`], integrates the held
//! command at a fixed rate with [`SimDriveBase`], and publishes the
//! resulting pose both to the [`PosePublisher`] snapshot (for localisation)
//! and to [`Topic::Pose`] (for anyone observing).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};
use waynav_hal::{CommandSink, SimDriveBase};
use waynav_middleware::{EventBus, Topic, TopicReceiver};
use waynav_perception::PosePublisher;
use waynav_types::{Event, EventPayload, NavError, RobotPose};

const SOURCE: &str = "waynav-runtime::sim_drive";

/// A [`SimDriveBase`] wired to the event bus.
pub struct SimDriveTask {
    base: SimDriveBase,
    commands: TopicReceiver,
    publisher: PosePublisher,
    bus: EventBus,
    period: Duration,
}

impl SimDriveTask {
    /// Subscribe to commands now, so nothing sent after this call is missed,
    /// and publish `start` as the first pose.
    ///
    /// # Errors
    ///
    /// [`NavError::Config`] if `rate_hz` is not a positive finite number.
    pub fn new(
        bus: EventBus,
        publisher: PosePublisher,
        start: RobotPose,
        rate_hz: f64,
    ) -> Result<Self, NavError> {
        if !rate_hz.is_finite() || rate_hz <= 0.0 {
            return Err(NavError::Config(format!("sim_rate_hz must be positive, got {rate_hz}")));
        }
        let commands = bus.subscribe_to(Topic::Commands);
        publisher.publish(start);
        Ok(Self {
            base: SimDriveBase::at(start),
            commands,
            publisher,
            bus,
            period: Duration::from_secs_f64(1.0 / rate_hz),
        })
    }

    /// Run until `shutdown` is set or the bus closes.  Returns the final pose.
    pub async fn run(mut self, shutdown: Arc<AtomicBool>) -> RobotPose {
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let dt = self.period.as_secs_f64();
        info!(rate_hz = 1.0 / dt, "sim drive base running");

        while !shutdown.load(Ordering::SeqCst) {
            tokio::select! {
                event = self.commands.next_event() => match event {
                    Some(Event { payload: EventPayload::Command(cmd), .. }) => {
                        // Infallible for the simulator.
                        let _ = self.base.send(cmd);
                    }
                    Some(_) => {}
                    None => break,
                },
                _ = ticker.tick() => {
                    let pose = self.base.step(dt);
                    self.publisher.publish(pose);
                    // Nobody watching the pose topic is fine.
                    let _ = self
                        .bus
                        .publish_to(Topic::Pose, Event::new(SOURCE, EventPayload::Pose(pose)));
                }
            }
        }

        let pose = self.base.pose();
        debug!(x = pose.x, y = pose.y, theta = pose.theta, commands = self.base.received(), "sim drive base stopped");
        pose
    }

    /// Spawn [`run`][Self::run] on the current tokio runtime.
    pub fn spawn(self, shutdown: Arc<AtomicBool>) -> JoinHandle<RobotPose> {
        tokio::spawn(self.run(shutdown))
    }
}
