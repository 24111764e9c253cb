//! Rotate-then-drive motion controller.
//!
//! Given the current goal already expressed in the robot frame (x forward,
//! y left) the controller picks one of three phases:
//!
//! | Phase | Condition | Command |
//! |---|---|---|
//! | [`MotionPhase::RotateToBearing`] | \|bearing\| > deadband | ±`angular_speed`, no translation |
//! | [`MotionPhase::Arrived`] | aligned and distance < threshold | stop, goal reached |
//! | [`MotionPhase::DriveToGoal`] | aligned, still far | `linear_speed` straight ahead |
//!
//! The arrival check only runs once the robot is aligned, so "reached" can
//! never be reported while facing away from the goal.  The controller keeps
//! no state between calls.
//!
//! # Example
//!
//! ```rust
//! use waynav_control::motion::{MotionController, MotionPhase};
//! use waynav_types::Waypoint;
//!
//! let controller = MotionController::default();
//!
//! let decision = controller.compute_command(Waypoint::new(0.0, 10.0));
//! assert_eq!(decision.phase, MotionPhase::RotateToBearing);
//! assert!(decision.command.angular > 0.0);
//! ```

use waynav_types::{ControlCommand, NavError, Waypoint};

/// Bearing band (degrees) inside which the robot counts as facing the goal.
pub const DEFAULT_BEARING_DEADBAND_DEG: f64 = 5.0;
/// Distance below which an aligned goal counts as reached.
pub const DEFAULT_ARRIVAL_THRESHOLD: f64 = 0.5;
/// Magnitude of the in-place rotation command (rad/s).
pub const DEFAULT_ANGULAR_SPEED: f64 = 0.5;
/// Forward speed while driving toward an aligned goal.
pub const DEFAULT_LINEAR_SPEED: f64 = 0.5;

/// Constants of the control law.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    pub bearing_deadband_deg: f64,
    pub arrival_threshold: f64,
    pub angular_speed: f64,
    pub linear_speed: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            bearing_deadband_deg: DEFAULT_BEARING_DEADBAND_DEG,
            arrival_threshold: DEFAULT_ARRIVAL_THRESHOLD,
            angular_speed: DEFAULT_ANGULAR_SPEED,
            linear_speed: DEFAULT_LINEAR_SPEED,
        }
    }
}

impl ControllerConfig {
    /// Check every constant is finite and in range.
    ///
    /// # Errors
    ///
    /// [`NavError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), NavError> {
        let positive = [
            ("arrival_threshold", self.arrival_threshold),
            ("angular_speed", self.angular_speed),
            ("linear_speed", self.linear_speed),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(NavError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        let deadband = self.bearing_deadband_deg;
        if !deadband.is_finite() || !(0.0..180.0).contains(&deadband) {
            return Err(NavError::Config(format!(
                "bearing_deadband_deg must be in [0, 180), got {deadband}"
            )));
        }
        Ok(())
    }
}

/// Which branch of the control law produced a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPhase {
    RotateToBearing,
    DriveToGoal,
    Arrived,
}

/// Output of one [`MotionController::compute_command`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionDecision {
    pub command: ControlCommand,
    pub phase: MotionPhase,
    /// `true` only in [`MotionPhase::Arrived`].
    pub reached: bool,
    /// Bearing to the goal in degrees, positive to the left.
    pub bearing_deg: f64,
    /// Straight-line distance to the goal.
    pub distance: f64,
}

/// Stateless proportional (bang-bang) controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionController {
    config: ControllerConfig,
}

impl MotionController {
    pub fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Compute this tick's command for a goal in the robot frame.
    pub fn compute_command(&self, local_goal: Waypoint) -> MotionDecision {
        let bearing_deg = local_goal.y.atan2(local_goal.x).to_degrees();
        let distance = local_goal.norm();

        let (phase, command) = if bearing_deg.abs() > self.config.bearing_deadband_deg {
            let angular = self.config.angular_speed.copysign(bearing_deg);
            (MotionPhase::RotateToBearing, ControlCommand::new(angular, 0.0))
        } else if distance < self.config.arrival_threshold {
            (MotionPhase::Arrived, ControlCommand::stop())
        } else {
            (
                MotionPhase::DriveToGoal,
                ControlCommand::new(0.0, self.config.linear_speed),
            )
        };

        MotionDecision {
            command,
            phase,
            reached: phase == MotionPhase::Arrived,
            bearing_deg,
            distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> MotionController {
        MotionController::default()
    }

    /// A goal at `distance` along a ray `bearing_deg` off the robot's nose.
    fn goal_at(bearing_deg: f64, distance: f64) -> Waypoint {
        let rad = bearing_deg.to_radians();
        Waypoint::new(distance * rad.cos(), distance * rad.sin())
    }

    #[test]
    fn at_goal_reports_reached_with_zero_command() {
        let d = controller().compute_command(Waypoint::new(0.0, 0.0));
        assert!(d.reached);
        assert_eq!(d.phase, MotionPhase::Arrived);
        assert_eq!(d.command, ControlCommand::stop());
    }

    #[test]
    fn far_ahead_drives_straight() {
        let d = controller().compute_command(Waypoint::new(10.0, 0.0));
        assert!(!d.reached);
        assert_eq!(d.phase, MotionPhase::DriveToGoal);
        assert!(d.command.linear > 0.0);
        assert_eq!(d.command.angular, 0.0);
    }

    #[test]
    fn far_left_rotates_counter_clockwise_in_place() {
        let d = controller().compute_command(Waypoint::new(0.0, 10.0));
        assert!(!d.reached);
        assert_eq!(d.phase, MotionPhase::RotateToBearing);
        assert!(d.command.angular > 0.0);
        assert_eq!(d.command.linear, 0.0);
        assert!((d.bearing_deg - 90.0).abs() < 1e-9);
    }

    #[test]
    fn far_right_rotates_clockwise() {
        let d = controller().compute_command(Waypoint::new(0.0, -10.0));
        assert!(d.command.angular < 0.0);
        assert_eq!(d.command.linear, 0.0);
    }

    #[test]
    fn close_but_misaligned_is_not_reached() {
        // Inside the arrival radius yet 90° off: rotate first.
        let d = controller().compute_command(Waypoint::new(0.0, 0.2));
        assert!(!d.reached);
        assert_eq!(d.phase, MotionPhase::RotateToBearing);

        // Directly behind, very close.
        let d = controller().compute_command(Waypoint::new(-0.1, 0.0));
        assert!(!d.reached);
        assert_eq!(d.phase, MotionPhase::RotateToBearing);
    }

    #[test]
    fn deadband_boundary() {
        let c = controller();
        // Just inside the band drives, just outside rotates.
        assert_eq!(c.compute_command(goal_at(4.99, 10.0)).phase, MotionPhase::DriveToGoal);
        assert_eq!(c.compute_command(goal_at(-4.99, 10.0)).phase, MotionPhase::DriveToGoal);
        assert_eq!(c.compute_command(goal_at(5.01, 10.0)).phase, MotionPhase::RotateToBearing);
        assert_eq!(c.compute_command(goal_at(-5.01, 10.0)).phase, MotionPhase::RotateToBearing);
    }

    #[test]
    fn arrival_threshold_is_strict() {
        let c = controller();
        assert!(c.compute_command(Waypoint::new(0.49, 0.0)).reached);
        assert!(!c.compute_command(Waypoint::new(0.5, 0.0)).reached);
        assert_eq!(
            c.compute_command(Waypoint::new(0.5, 0.0)).phase,
            MotionPhase::DriveToGoal
        );
    }

    #[test]
    fn custom_constants_are_used() {
        let c = MotionController::new(ControllerConfig {
            bearing_deadband_deg: 30.0,
            arrival_threshold: 2.0,
            angular_speed: 1.2,
            linear_speed: 0.8,
        });
        assert_eq!(c.compute_command(goal_at(20.0, 5.0)).command.linear, 0.8);
        assert_eq!(c.compute_command(goal_at(45.0, 5.0)).command.angular, 1.2);
        assert!(c.compute_command(goal_at(10.0, 1.5)).reached);
    }

    #[test]
    fn controller_is_stateless() {
        let c = controller();
        let first = c.compute_command(Waypoint::new(3.0, 1.0));
        for _ in 0..10 {
            c.compute_command(Waypoint::new(-5.0, 2.0));
        }
        assert_eq!(c.compute_command(Waypoint::new(3.0, 1.0)), first);
    }

    #[test]
    fn validate_rejects_bad_constants() {
        assert!(ControllerConfig::default().validate().is_ok());

        let mut cfg = ControllerConfig::default();
        cfg.arrival_threshold = 0.0;
        assert!(matches!(cfg.validate(), Err(NavError::Config(m)) if m.contains("arrival_threshold")));

        let mut cfg = ControllerConfig::default();
        cfg.linear_speed = f64::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = ControllerConfig::default();
        cfg.bearing_deadband_deg = 180.0;
        assert!(cfg.validate().is_err());
    }
}
