//! Typed, topic-based publish/subscribe event bus.
//!
//! Uses [`tokio::sync::broadcast`] channels so every subscriber receives
//! every message and a slow subscriber only ever hurts itself (it lags and
//! loses the oldest events).
//!
//! # Topics
//!
//! | Topic | Traffic |
//! |---|---|
//! | [`Topic::Pose`] | Robot poses from the drive base or localisation |
//! | [`Topic::Commands`] | One velocity command per control tick |
//! | [`Topic::Status`] | Sequencer state changes |
//! | [`Topic::Alerts`] | Faults: dispatch failures, lost localisation |

use tokio::sync::broadcast;
use tracing::warn;
use waynav_types::{Event, NavError};

/// Buffered events per topic before slow subscribers start lagging.
const DEFAULT_CAPACITY: usize = 256;

/// Routing lanes on the [`EventBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Pose,
    Commands,
    Status,
    Alerts,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Pose, Topic::Commands, Topic::Status, Topic::Alerts];
}

/// Shared event bus.  Clones are cheap and share the same channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    pose: broadcast::Sender<Event>,
    commands: broadcast::Sender<Event>,
    status: broadcast::Sender<Event>,
    alerts: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a bus whose topic channels each buffer `capacity` events.
    ///
    /// `capacity` must be non-zero.
    pub fn new(capacity: usize) -> Self {
        let (pose, _) = broadcast::channel(capacity);
        let (commands, _) = broadcast::channel(capacity);
        let (status, _) = broadcast::channel(capacity);
        let (alerts, _) = broadcast::channel(capacity);
        Self {
            pose,
            commands,
            status,
            alerts,
        }
    }

    /// Publish `event` on `topic`.
    ///
    /// Returns the number of subscribers handed the event.
    ///
    /// # Errors
    ///
    /// [`NavError::Channel`] when nobody is subscribed to `topic`.
    pub fn publish_to(&self, topic: Topic, event: Event) -> Result<usize, NavError> {
        self.sender(topic)
            .send(event)
            .map_err(|_| NavError::Channel(format!("no subscribers for topic {topic:?}")))
    }

    /// Subscribe to a single topic.  Only events published after this call
    /// are delivered.
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.sender(topic).subscribe(),
        }
    }

    /// Current number of subscribers on `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.sender(topic).receiver_count()
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Pose => &self.pose,
            Topic::Commands => &self.commands,
            Topic::Status => &self.status,
            Topic::Alerts => &self.alerts,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// An async receiver bound to one [`Topic`].
#[derive(Debug)]
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event, surfacing lag to the caller.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Wait for the next event, stepping over lag.
    ///
    /// Returns `None` once every publisher is gone.
    pub async fn next_event(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(topic = ?self.topic, lagged_by = n, "subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// `true` when no event is waiting to be received.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use waynav_types::{ControlCommand, EventPayload, RobotPose};

    fn command_event() -> Event {
        Event::new("test", EventPayload::Command(ControlCommand::new(0.5, 0.0)))
    }

    #[test]
    fn publish_without_subscribers_is_a_channel_error() {
        let bus = EventBus::default();
        for topic in Topic::ALL {
            assert!(matches!(
                bus.publish_to(topic, command_event()),
                Err(NavError::Channel(_))
            ));
        }
    }

    #[tokio::test]
    async fn every_subscriber_receives_the_event() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut first = bus.subscribe_to(Topic::Commands);
        let mut second = bus.subscribe_to(Topic::Commands);

        let event = command_event();
        assert_eq!(bus.publish_to(Topic::Commands, event.clone())?, 2);

        assert_eq!(first.recv().await?.id, event.id);
        assert_eq!(second.recv().await?.id, event.id);
        Ok(())
    }

    #[tokio::test]
    async fn topics_are_isolated() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut alerts = bus.subscribe_to(Topic::Alerts);
        let _pose = bus.subscribe_to(Topic::Pose);

        bus.publish_to(
            Topic::Pose,
            Event::new("sim", EventPayload::Pose(RobotPose::default())),
        )?;

        let result = tokio::time::timeout(Duration::from_millis(50), alerts.recv()).await;
        assert!(result.is_err(), "alerts subscriber must not see a pose");
        assert_eq!(alerts.topic(), Topic::Alerts);
        Ok(())
    }

    #[tokio::test]
    async fn slow_subscriber_lags_then_catches_up() {
        let bus = EventBus::new(16);
        let mut slow = bus.subscribe_to(Topic::Pose);
        for _ in 0..100 {
            let _ = bus.publish_to(
                Topic::Pose,
                Event::new("flood", EventPayload::Pose(RobotPose::default())),
            );
        }

        assert!(matches!(
            slow.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        // Buffered events are still readable after the lag report.
        assert!(slow.next_event().await.is_some());
    }

    #[tokio::test]
    async fn next_event_ends_when_bus_is_dropped() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe_to(Topic::Status);
        drop(bus);
        assert!(rx.next_event().await.is_none());
    }

    #[test]
    fn subscriber_count_tracks_receivers() {
        let bus = EventBus::default();
        let rx = bus.subscribe_to(Topic::Status);
        assert_eq!(bus.subscriber_count(Topic::Status), 1);
        drop(rx);
        assert_eq!(bus.subscriber_count(Topic::Status), 0);
    }
}
