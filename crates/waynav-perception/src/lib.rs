//! `waynav-perception` – where the robot is, and where things are relative
//! to it.
//!
//! # Modules
//!
//! - [`transform`] – [`TfEngine`][transform::TfEngine]: graph of named 2-D
//!   reference frames and the rigid transforms ([`Transform2D`]) that relate
//!   them.
//! - [`pose`] – [`pose_channel`][pose::pose_channel]: latest-value pose
//!   snapshot shared between the localisation writer and the control loop.
//! - [`localizer`] – [`LocalFrame`][localizer::LocalFrame]: the contract the
//!   control loop uses to express world-frame goals in the robot frame, and
//!   [`TfLocalizer`][localizer::TfLocalizer], its implementation on top of the
//!   two modules above.

pub mod localizer;
pub mod pose;
pub mod transform;

pub use localizer::{LocalFrame, TfLocalizer};
pub use pose::{PosePublisher, PoseReader, PoseSample, pose_channel};
pub use transform::{TfEngine, Transform2D};
