//! `waynav-control` – turning a list of waypoints into velocity commands.
//!
//! # Modules
//!
//! - [`motion`] – [`MotionController`][motion::MotionController]: a
//!   stateless rotate-then-drive law mapping a robot-frame goal to one
//!   [`ControlCommand`][waynav_types::ControlCommand] per tick.
//! - [`sequencer`] – [`WaypointSequencer`][sequencer::WaypointSequencer]:
//!   the `Idle → Navigating(i) → Completed` state machine that drives the
//!   controller through an ordered plan.
//! - [`plan`] – [`load_plan`][plan::load_plan]: reads a waypoint list from a
//!   text file.

pub mod motion;
pub mod plan;
pub mod sequencer;

pub use motion::{ControllerConfig, MotionController, MotionDecision, MotionPhase};
pub use plan::{WaypointPlan, load_plan, parse_plan};
pub use sequencer::{TickOutcome, WaypointSequencer};
