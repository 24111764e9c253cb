//! `waynav-runtime` – running a navigation mission.
//!
//! # Modules
//!
//! - [`nav_loop`] – [`NavigationLoop`][nav_loop::NavigationLoop]: ticks a
//!   [`WaypointSequencer`][waynav_control::WaypointSequencer] at a fixed rate
//!   on the tokio runtime until the mission completes or a shutdown flag is
//!   raised, reporting state changes and faults on the event bus.
//! - [`mission`] – [`MissionSource`][mission::MissionSource] and
//!   [`run_simulated`][mission::run_simulated]: turn a goal, a plan file or
//!   a graph route into waypoints, and wire the full stack around them.
//! - [`bus_sink`] – [`BusCommandSink`][bus_sink::BusCommandSink]: a
//!   [`CommandSink`][waynav_hal::CommandSink] that publishes on
//!   [`Topic::Commands`][waynav_middleware::Topic::Commands].
//! - [`sim_drive`] – [`SimDriveTask`][sim_drive::SimDriveTask]: a simulated
//!   drive base that consumes bus commands and publishes poses.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console
//!   logging plus optional OTLP span export (`OTEL_EXPORTER_OTLP_ENDPOINT`).

pub mod bus_sink;
pub mod mission;
pub mod nav_loop;
pub mod sim_drive;
pub mod telemetry;

pub use bus_sink::BusCommandSink;
pub use mission::{MissionSource, RuntimeSettings, resolve_waypoints, run_simulated};
pub use nav_loop::{LoopExit, LoopReport, NavigationLoop};
pub use sim_drive::SimDriveTask;
pub use telemetry::{TracerProviderGuard, init_tracing};
