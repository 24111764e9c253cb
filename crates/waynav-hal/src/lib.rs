//! `waynav-hal` – the actuation boundary.
//!
//! # Modules
//!
//! - [`drive`] – [`CommandSink`][drive::CommandSink]: the fire-and-forget
//!   contract every velocity-command consumer implements.
//! - [`sim`] – [`SimDriveBase`][sim::SimDriveBase], a kinematic
//!   differential-drive simulator, and [`RecordingSink`][sim::RecordingSink],
//!   a sink that only remembers what it was sent.

pub mod drive;
pub mod sim;

pub use drive::CommandSink;
pub use sim::{RecordingSink, SimDriveBase};
