//! `waynav-types` – shared vocabulary for the WayNav workspace.
//!
//! Every crate speaks in terms of these plain value types: world-frame
//! [`Waypoint`]s, the localisation [`RobotPose`], the per-tick
//! [`ControlCommand`], the bus [`Event`] envelope, and the single global
//! [`NavError`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identity of a node in a navigation graph.
pub type NodeId = i64;

/// A plain 2-D position with no identity.
///
/// Used both for world-frame targets and, after transformation, for the same
/// target expressed in the robot's local frame (x forward, y left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
}

impl Waypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean norm of the point taken as a vector from the origin.
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Straight-line distance to `other`.
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Wrap an angle into `(-π, π]`.
pub fn normalize_angle(theta: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    let wrapped = theta.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}

/// Robot pose in the world frame, as reported by localisation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RobotPose {
    pub x: f64,
    pub y: f64,
    /// Heading, counter-clockwise from world +X (radians).
    pub theta: f64,
}

impl RobotPose {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }

    pub fn position(self) -> Waypoint {
        Waypoint::new(self.x, self.y)
    }
}

/// Differential-drive velocity command dispatched once per control tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlCommand {
    /// Angular velocity (rad/s), positive turns left.
    pub angular: f64,
    /// Linear velocity along the robot's forward axis.
    pub linear: f64,
}

impl ControlCommand {
    pub fn new(angular: f64, linear: f64) -> Self {
        Self { angular, linear }
    }

    pub fn stop() -> Self {
        Self::default()
    }

    pub fn is_stop(&self) -> bool {
        self.angular == 0.0 && self.linear == 0.0
    }
}

/// Lifecycle of a waypoint-following mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencerState {
    /// Plan loaded, no tick has run yet.
    Idle,
    /// Steering toward the waypoint at this index.
    Navigating(usize),
    /// Every waypoint has been reached. Terminal.
    Completed,
}

/// Mission progress snapshot published on every sequencer state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationStatus {
    pub state: SequencerState,
    /// The waypoint currently being pursued, if any.
    pub waypoint: Option<Waypoint>,
}

/// Unified event wrapper for the navigation event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g. `"waynav-runtime::nav_loop"`
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Stamp a payload with a fresh id and the current time.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data routed over the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    Pose(RobotPose),
    Command(ControlCommand),
    Status(NavigationStatus),
    Fault { component: String, message: String },
}

/// Global error type for planning, sensing, dispatch, and configuration.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NavError {
    #[error("Unknown node id {0}")]
    UnknownNode(NodeId),

    #[error("No path from node {start} to node {goal}")]
    NoPath { start: NodeId, goal: NodeId },

    #[error("Invalid cost {cost} for edge {from} -> {to}")]
    InvalidEdgeCost { from: NodeId, to: NodeId, cost: f64 },

    #[error("Waypoint plan is empty")]
    EmptyPlan,

    #[error("Transform unavailable: {0}")]
    Transform(String),

    #[error("Command dispatch failed on {sink}: {details}")]
    Dispatch { sink: String, details: String },

    #[error("Waypoint file error: {0}")]
    WaypointFile(String),

    #[error("Graph file error: {0}")]
    GraphFile(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event bus error: {0}")]
    Channel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waypoint_distance_is_euclidean() {
        let a = Waypoint::new(0.0, 0.0);
        let b = Waypoint::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-12);
        assert!((b.norm() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_angle_wraps_into_half_open_range() {
        use std::f64::consts::{FRAC_PI_2, PI, TAU};
        assert!((normalize_angle(3.0 * PI - 0.1) - (PI - 0.1)).abs() < 1e-9);
        assert!((normalize_angle(-FRAC_PI_2) + FRAC_PI_2).abs() < 1e-9);
        assert!((normalize_angle(TAU + 0.25) - 0.25).abs() < 1e-9);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-9);
    }

    #[test]
    fn stop_command_is_zero() {
        let cmd = ControlCommand::stop();
        assert!(cmd.is_stop());
        assert!(!ControlCommand::new(0.5, 0.0).is_stop());
    }

    #[test]
    fn command_event_roundtrip() {
        let event = Event::new(
            "waynav-runtime::nav_loop",
            EventPayload::Command(ControlCommand::new(-0.5, 0.0)),
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event.id, back.id);
        match back.payload {
            EventPayload::Command(cmd) => {
                assert!((cmd.angular - (-0.5)).abs() < f64::EPSILON);
                assert_eq!(cmd.linear, 0.0);
            }
            _ => panic!("unexpected variant"),
        }
    }

    #[test]
    fn status_event_roundtrip() {
        let status = NavigationStatus {
            state: SequencerState::Navigating(2),
            waypoint: Some(Waypoint::new(1.0, -1.0)),
        };
        let json = serde_json::to_string(&EventPayload::Status(status.clone())).unwrap();
        let back: EventPayload = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, EventPayload::Status(s) if s == status));
    }

    #[test]
    fn nav_error_display() {
        let err = NavError::NoPath { start: 0, goal: 2 };
        assert!(err.to_string().contains("No path"));

        let err2 = NavError::Dispatch {
            sink: "cmd_vel".to_string(),
            details: "closed".to_string(),
        };
        assert!(err2.to_string().contains("cmd_vel"));
    }
}
