//! In-process stand-ins for real actuation, for CI and headless runs.
//!
//! - [`RecordingSink`] remembers every command it receives.
//! - [`SimDriveBase`] holds the latest command and integrates unicycle
//!   kinematics so the rest of the stack can close the loop without a robot.
//!
//! # Example
//!
//! ```rust
//! use waynav_hal::{CommandSink, SimDriveBase};
//! use waynav_types::ControlCommand;
//!
//! let mut base = SimDriveBase::new();
//! base.send(ControlCommand::new(0.0, 1.0)).unwrap();
//! base.step(0.5);
//! assert!((base.pose().x - 0.5).abs() < 1e-9);
//! ```

use tracing::trace;
use waynav_types::{ControlCommand, NavError, RobotPose, normalize_angle};

use crate::drive::CommandSink;

// ────────────────────────────────────────────────────────────────────────────
// Recording sink
// ────────────────────────────────────────────────────────────────────────────

/// A sink that records every command it is sent.  Always succeeds.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    commands: Vec<ControlCommand>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command received, oldest first.
    pub fn commands(&self) -> &[ControlCommand] {
        &self.commands
    }

    pub fn last(&self) -> Option<ControlCommand> {
        self.commands.last().copied()
    }
}

impl CommandSink for RecordingSink {
    fn id(&self) -> &str {
        "recording"
    }

    fn send(&mut self, command: ControlCommand) -> Result<(), NavError> {
        self.commands.push(command);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated differential-drive base
// ────────────────────────────────────────────────────────────────────────────

/// Kinematic differential-drive base.
///
/// The most recent command is held until replaced; [`step`][Self::step]
/// advances the pose by `dt` seconds under that command.
#[derive(Debug, Clone)]
pub struct SimDriveBase {
    pose: RobotPose,
    command: ControlCommand,
    received: usize,
}

impl Default for SimDriveBase {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriveBase {
    /// A base at the world origin facing +X.
    pub fn new() -> Self {
        Self::at(RobotPose::default())
    }

    /// A base starting at `pose`.
    pub fn at(pose: RobotPose) -> Self {
        Self {
            pose,
            command: ControlCommand::stop(),
            received: 0,
        }
    }

    pub fn pose(&self) -> RobotPose {
        self.pose
    }

    /// The command currently being executed.
    pub fn command(&self) -> ControlCommand {
        self.command
    }

    /// Number of commands received so far.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Integrate the held command over `dt` seconds.  Non-positive `dt` is a
    /// no-op.
    pub fn step(&mut self, dt: f64) -> RobotPose {
        if dt <= 0.0 {
            return self.pose;
        }
        let ControlCommand { angular, linear } = self.command;
        // Midpoint heading keeps arcs accurate at coarse step sizes.
        let heading = self.pose.theta + angular * dt * 0.5;
        self.pose.x += linear * heading.cos() * dt;
        self.pose.y += linear * heading.sin() * dt;
        self.pose.theta = normalize_angle(self.pose.theta + angular * dt);
        trace!(x = self.pose.x, y = self.pose.y, theta = self.pose.theta, "sim step");
        self.pose
    }
}

impl CommandSink for SimDriveBase {
    fn id(&self) -> &str {
        "sim_base"
    }

    fn send(&mut self, command: ControlCommand) -> Result<(), NavError> {
        self.command = command;
        self.received += 1;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
