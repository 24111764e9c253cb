//! The transform contract used by the control loop.
//!
//! [`LocalFrame`] is all the navigation core knows about localisation: the
//! robot's current world pose, and a way to express a world-frame point in
//! the robot frame (x forward, y left).  Any failure is a
//! [`NavError::Transform`], which the control loop treats as "skip this
//! tick".
//!
//! [`TfLocalizer`] implements the contract with a static
//! [`TfEngine`] (`world` → `odom`) and the live `odom` → `base_link` pose read
//! from a [`PoseReader`].

use std::time::Duration;

use tracing::trace;
use waynav_types::{NavError, RobotPose, Waypoint};

use crate::pose::PoseReader;
use crate::transform::{TfEngine, Transform2D};

/// Fixed world frame goals are expressed in.
pub const WORLD_FRAME: &str = "world";
/// Odometry frame the live pose is reported in.
pub const ODOM_FRAME: &str = "odom";

/// Source of the robot's pose and world → robot-frame conversion.
pub trait LocalFrame {
    /// Current robot pose in the world frame.
    fn current_pose(&self) -> Result<RobotPose, NavError>;

    /// Express a world-frame point in the robot's local frame.
    fn to_local_frame(&self, world: Waypoint) -> Result<Waypoint, NavError> {
        let pose = self.current_pose()?;
        Ok(Transform2D::from(pose).inverse().apply(world))
    }
}

/// A fixed pose is its own (never failing) localisation source.
impl LocalFrame for RobotPose {
    fn current_pose(&self) -> Result<RobotPose, NavError> {
        Ok(*self)
    }
}

/// [`LocalFrame`] backed by a pose snapshot channel and a static frame tree.
#[derive(Debug, Clone)]
pub struct TfLocalizer {
    reader: PoseReader,
    frames: TfEngine,
    max_pose_age: Option<Duration>,
}

impl TfLocalizer {
    /// Localizer with `odom` coinciding with `world`.
    pub fn new(reader: PoseReader) -> Self {
        let mut frames = TfEngine::new();
        frames.set_transform(WORLD_FRAME, ODOM_FRAME, Transform2D::identity());
        Self::with_frames(reader, frames)
    }

    /// Localizer using a caller-supplied frame tree, which must connect
    /// [`WORLD_FRAME`] and [`ODOM_FRAME`].
    pub fn with_frames(reader: PoseReader, frames: TfEngine) -> Self {
        Self {
            reader,
            frames,
            max_pose_age: None,
        }
    }

    /// Reject poses older than `max_age`.
    pub fn with_max_pose_age(mut self, max_age: Duration) -> Self {
        self.max_pose_age = Some(max_age);
        self
    }
}

impl LocalFrame for TfLocalizer {
    fn current_pose(&self) -> Result<RobotPose, NavError> {
        let sample = self
            .reader
            .latest()
            .ok_or_else(|| NavError::Transform("no pose received yet".to_string()))?;

        if let Some(max_age) = self.max_pose_age {
            let age = sample.age();
            if age > max_age {
                return Err(NavError::Transform(format!(
                    "pose is stale ({} ms old, limit {} ms)",
                    age.as_millis(),
                    max_age.as_millis()
                )));
            }
        }

        let world_to_odom = self.frames.lookup(WORLD_FRAME, ODOM_FRAME).ok_or_else(|| {
            NavError::Transform(format!("no transform from {WORLD_FRAME} to {ODOM_FRAME}"))
        })?;
        let pose: RobotPose = world_to_odom.compose(Transform2D::from(sample.pose)).into();
        trace!(x = pose.x, y = pose.y, theta = pose.theta, "robot pose");
        Ok(pose)
    }
}
