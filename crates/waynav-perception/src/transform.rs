//! Planar Transform Frame (TF) Engine.
//!
//! Maintains a graph of named reference frames and the 2-D rigid-body
//! transforms (translation + heading) that relate them.  Given any two frame
//! names the engine composes a chain of transforms via BFS, walking edges in
//! either direction (a reverse hop uses the inverse transform).
//!
//! # Example
//!
//! ```rust
//! use waynav_perception::transform::{TfEngine, Transform2D};
//!
//! let mut tf = TfEngine::new();
//!
//! // odom is 1 m forward of world origin, same orientation.
//! tf.set_transform("world", "odom", Transform2D::new(1.0, 0.0, 0.0));
//! // base_link is 0.5 m forward of odom.
//! tf.set_transform("odom", "base_link", Transform2D::new(0.5, 0.0, 0.0));
//!
//! let t = tf.lookup("world", "base_link").unwrap();
//! assert!((t.x - 1.5).abs() < 1e-9);
//!
//! // Reverse lookups use the inverse.
//! let back = tf.lookup("base_link", "world").unwrap();
//! assert!((back.x + 1.5).abs() < 1e-9);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};

use waynav_types::{RobotPose, Waypoint, normalize_angle};

// ────────────────────────────────────────────────────────────────────────────
// Transform2D
// ────────────────────────────────────────────────────────────────────────────

/// A planar rigid-body transform: rotation by `theta` followed by translation.
///
/// Represents the pose of frame B relative to frame A: to convert a point
/// expressed in frame B into frame A, rotate it by `theta` then add
/// `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl Transform2D {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// The identity transform (no translation, no rotation).
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Map a point from the child frame into the parent frame.
    pub fn apply(self, p: Waypoint) -> Waypoint {
        let (sin, cos) = self.theta.sin_cos();
        Waypoint::new(
            cos * p.x - sin * p.y + self.x,
            sin * p.x + cos * p.y + self.y,
        )
    }

    /// The transform mapping parent-frame points back into the child frame.
    pub fn inverse(self) -> Self {
        let (sin, cos) = self.theta.sin_cos();
        Self::new(
            -(cos * self.x + sin * self.y),
            sin * self.x - cos * self.y,
            -self.theta,
        )
    }

    /// Compose two transforms: `self` applied first, then `other`.
    ///
    /// If `self` = T_A_B and `other` = T_B_C, the result is T_A_C.
    pub fn compose(self, other: Self) -> Self {
        let origin = self.apply(Waypoint::new(other.x, other.y));
        Self::new(origin.x, origin.y, self.theta + other.theta)
    }
}

impl From<RobotPose> for Transform2D {
    fn from(pose: RobotPose) -> Self {
        Self::new(pose.x, pose.y, pose.theta)
    }
}

impl From<Transform2D> for RobotPose {
    fn from(t: Transform2D) -> Self {
        RobotPose::new(t.x, t.y, t.theta)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TfEngine
// ────────────────────────────────────────────────────────────────────────────

/// A graph of named reference frames and the [`Transform2D`]s relating them.
///
/// Frames are identified by arbitrary string names (e.g. `"world"`,
/// `"odom"`, `"base_link"`).  Each edge is stored once, parent → child, and
/// [`TfEngine::lookup`] may traverse it either way.
#[derive(Debug, Default, Clone)]
pub struct TfEngine {
    /// `edges[parent][child] = Transform2D`
    edges: HashMap<String, HashMap<String, Transform2D>>,
}

impl TfEngine {
    /// Create an empty TF engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or update the pose of `child_frame` within `parent_frame`.
    pub fn set_transform(&mut self, parent_frame: &str, child_frame: &str, transform: Transform2D) {
        self.edges
            .entry(parent_frame.to_string())
            .or_default()
            .insert(child_frame.to_string(), transform);
    }

    /// Whether `frame` appears on either end of any registered edge.
    pub fn has_frame(&self, frame: &str) -> bool {
        self.edges.contains_key(frame) || self.edges.values().any(|c| c.contains_key(frame))
    }

    /// Compute the pose of `target_frame` expressed in `source_frame`, i.e.
    /// the transform that maps `target_frame` points into `source_frame`.
    ///
    /// Returns `None` if the two frames are not connected.
    pub fn lookup(&self, source_frame: &str, target_frame: &str) -> Option<Transform2D> {
        if source_frame == target_frame {
            return Some(Transform2D::identity());
        }

        let mut queue: VecDeque<(&str, Transform2D)> = VecDeque::new();
        let mut visited: HashSet<&str> = HashSet::new();
        queue.push_back((source_frame, Transform2D::identity()));
        visited.insert(source_frame);

        while let Some((current, accumulated)) = queue.pop_front() {
            for (next, hop) in self.hops(current) {
                if !visited.insert(next) {
                    continue;
                }
                let composed = accumulated.compose(hop);
                if next == target_frame {
                    return Some(composed);
                }
                queue.push_back((next, composed));
            }
        }

        None
    }

    /// Every frame adjacent to `frame`, with the transform for that hop.
    fn hops<'a>(&'a self, frame: &'a str) -> impl Iterator<Item = (&'a str, Transform2D)> + 'a {
        let forward = self
            .edges
            .get(frame)
            .into_iter()
            .flat_map(|children| children.iter().map(|(c, t)| (c.as_str(), *t)));
        let backward = self.edges.iter().filter_map(move |(parent, children)| {
            children.get(frame).map(|t| (parent.as_str(), t.inverse()))
        });
        forward.chain(backward)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
