//! [`CommandSink`] that publishes each command on [`Topic::Commands`].

use tracing::trace;
use waynav_hal::CommandSink;
use waynav_middleware::{EventBus, Topic};
use waynav_types::{ControlCommand, Event, EventPayload, NavError};

/// Publishes commands to whoever drives the base (a simulator task, a
/// hardware bridge) through the event bus.
#[derive(Debug, Clone)]
pub struct BusCommandSink {
    bus: EventBus,
    source: String,
}

impl BusCommandSink {
    pub fn new(bus: EventBus) -> Self {
        Self::with_source(bus, "waynav-runtime::cmd_vel")
    }

    /// Sink stamping events with a custom `source`.
    pub fn with_source(bus: EventBus, source: impl Into<String>) -> Self {
        Self {
            bus,
            source: source.into(),
        }
    }
}

impl CommandSink for BusCommandSink {
    fn id(&self) -> &str {
        "cmd_vel"
    }

    fn send(&mut self, command: ControlCommand) -> Result<(), NavError> {
        let event = Event::new(self.source.clone(), EventPayload::Command(command));
        let delivered = self
            .bus
            .publish_to(Topic::Commands, event)
            .map_err(|e| NavError::Dispatch {
                sink: self.id().to_string(),
                details: e.to_string(),
            })?;
        trace!(delivered, angular = command.angular, linear = command.linear, "command published");
        Ok(())
    }
}
