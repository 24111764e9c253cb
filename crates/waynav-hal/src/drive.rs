//! Generic `CommandSink` trait for anything that consumes velocity commands:
//! a motor driver, a middleware publisher, or a simulator.
//!
//! The navigation loop only ever talks to this trait, so the actuation path
//! can be swapped without touching planning or control logic.

use waynav_types::{ControlCommand, NavError};

/// A consumer of per-tick [`ControlCommand`]s.
///
/// Dispatch is fire-and-forget: `send` returns once the command has been
/// handed off, with no acknowledgement from the actuators.
pub trait CommandSink: Send {
    /// Stable identifier for this sink, e.g. `"cmd_vel"` or `"sim_base"`.
    fn id(&self) -> &str;

    /// Hand `command` to the actuation path.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::Dispatch`] if the command could not be handed off.
    fn send(&mut self, command: ControlCommand) -> Result<(), NavError>;
}

impl<S: CommandSink + ?Sized> CommandSink for Box<S> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn send(&mut self, command: ControlCommand) -> Result<(), NavError> {
        (**self).send(command)
    }
}
