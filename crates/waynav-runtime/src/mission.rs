//! Mission assembly: where the waypoints come from and how the pieces are
//! wired together for a run.
//!
//! A [`MissionSource`] resolves to a waypoint list (a single goal, a plan
//! file, or an A* route across a graph file).  [`run_simulated`] then builds
//! the whole stack around that list:
//!
//! ```text
//!  NavigationLoop ──cmd──▶ BusCommandSink ──Topic::Commands──▶ SimDriveTask
//!        ▲                                                          │
//!        └──── TfLocalizer ◀──── PoseReader ◀──── PosePublisher ◀───┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{info, warn};
use waynav_control::{ControllerConfig, MotionController, WaypointSequencer, load_plan};
use waynav_middleware::EventBus;
use waynav_perception::localizer::{ODOM_FRAME, WORLD_FRAME};
use waynav_perception::{TfEngine, TfLocalizer, Transform2D, pose_channel};
use waynav_planner::load_graph;
use waynav_types::{NavError, NodeId, RobotPose, Waypoint};

use crate::bus_sink::BusCommandSink;
use crate::nav_loop::{DEFAULT_CONTROL_RATE_HZ, LoopReport, NavigationLoop};
use crate::sim_drive::SimDriveTask;

/// Default simulator integration rate (Hz).
pub const DEFAULT_SIM_RATE_HZ: f64 = 50.0;

/// Where a mission's waypoints come from.
#[derive(Debug, Clone, PartialEq)]
pub enum MissionSource {
    /// Drive to one world-frame point.
    Goal(Waypoint),
    /// Follow the `x y` pairs in a plan file.
    WaypointFile(PathBuf),
    /// Follow the shortest route between two nodes of a graph file.
    Graph {
        path: PathBuf,
        start: NodeId,
        goal: NodeId,
    },
}

/// Resolve `source` to the ordered waypoints to visit.
///
/// # Errors
///
/// File errors from the loaders, [`NavError::EmptyPlan`] for a plan file
/// without waypoints, and planner errors ([`NavError::UnknownNode`],
/// [`NavError::NoPath`]) for graph missions.
pub fn resolve_waypoints(source: &MissionSource) -> Result<Vec<Waypoint>, NavError> {
    match source {
        MissionSource::Goal(goal) => Ok(vec![*goal]),
        MissionSource::WaypointFile(path) => {
            let plan = load_plan(path)?;
            if plan.skipped > 0 {
                warn!(skipped = plan.skipped, "some plan lines were ignored");
            }
            if plan.waypoints.is_empty() {
                return Err(NavError::EmptyPlan);
            }
            Ok(plan.waypoints)
        }
        MissionSource::Graph { path, start, goal } => {
            let mut loaded = load_graph(path)?;
            if loaded.skipped > 0 {
                warn!(skipped = loaded.skipped, "some graph lines were ignored");
            }
            let route = loaded.graph.get_path(*start, *goal)?;
            info!(
                start,
                goal,
                nodes = route.len(),
                cost = route.cost,
                expanded = route.nodes_expanded,
                "route planned"
            );
            Ok(route.waypoints)
        }
    }
}

/// Knobs for a simulated run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeSettings {
    pub controller: ControllerConfig,
    pub control_rate_hz: f64,
    pub sim_rate_hz: f64,
    /// Poses older than this are treated as missing.  `None` disables the
    /// check.
    pub max_pose_age: Option<Duration>,
    /// Static `world` → `odom` offset.
    pub odom_offset: Transform2D,
    /// Simulated base start pose, in the `odom` frame.
    pub start_pose: RobotPose,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            controller: ControllerConfig::default(),
            control_rate_hz: DEFAULT_CONTROL_RATE_HZ,
            sim_rate_hz: DEFAULT_SIM_RATE_HZ,
            max_pose_age: Some(Duration::from_millis(500)),
            odom_offset: Transform2D::identity(),
            start_pose: RobotPose::default(),
        }
    }
}

/// Drive a simulated base through `waypoints`.
///
/// Returns when the mission completes or `shutdown` is raised.  The
/// simulator task is stopped before returning either way.
///
/// # Errors
///
/// [`NavError::Config`] for invalid settings and [`NavError::EmptyPlan`] for
/// an empty waypoint list.  Nothing that happens during the run is an error;
/// see the returned [`LoopReport`].
pub async fn run_simulated(
    waypoints: Vec<Waypoint>,
    settings: RuntimeSettings,
    shutdown: Arc<AtomicBool>,
) -> Result<LoopReport, NavError> {
    settings.controller.validate()?;
    let sequencer = WaypointSequencer::new(waypoints, MotionController::new(settings.controller))?;

    let bus = EventBus::default();
    let (publisher, reader) = pose_channel();

    let mut frames = TfEngine::new();
    frames.set_transform(WORLD_FRAME, ODOM_FRAME, settings.odom_offset);
    let mut localizer = TfLocalizer::with_frames(reader, frames);
    if let Some(max_age) = settings.max_pose_age {
        localizer = localizer.with_max_pose_age(max_age);
    }

    let sim_stop = Arc::new(AtomicBool::new(false));
    let sim = SimDriveTask::new(bus.clone(), publisher, settings.start_pose, settings.sim_rate_hz)?
        .spawn(sim_stop.clone());

    let nav = NavigationLoop::new(
        sequencer,
        Box::new(localizer),
        Box::new(BusCommandSink::new(bus.clone())),
        settings.control_rate_hz,
        shutdown,
    )?
    .with_bus(bus);

    let report = nav.run().await;

    sim_stop.store(true, Ordering::SeqCst);
    match sim.await {
        Ok(pose) => info!(x = pose.x, y = pose.y, theta = pose.theta, "final base pose"),
        Err(e) => warn!(error = %e, "sim drive task ended abnormally"),
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav_loop::LoopExit;
    use std::io::Write;
    use tokio::time;
    use waynav_types::SequencerState;

    /// Fast settings so simulated missions finish in well under a second.
    fn quick_settings() -> RuntimeSettings {
        RuntimeSettings {
            controller: ControllerConfig {
                angular_speed: 4.0,
                linear_speed: 2.0,
                ..ControllerConfig::default()
            },
            control_rate_hz: 200.0,
            sim_rate_hz: 200.0,
            max_pose_age: None,
            ..RuntimeSettings::default()
        }
    }

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn single_goal_is_a_one_waypoint_mission() {
        let wps = resolve_waypoints(&MissionSource::Goal(Waypoint::new(3.0, -1.0))).unwrap();
        assert_eq!(wps, vec![Waypoint::new(3.0, -1.0)]);
    }

    #[test]
    fn plan_file_mission() {
        let file = write_temp("0 0\n1 0\n");
        let wps = resolve_waypoints(&MissionSource::WaypointFile(file.path().to_path_buf())).unwrap();
        assert_eq!(wps.len(), 2);
    }

    #[test]
    fn plan_file_without_waypoints_is_empty_plan() {
        let file = write_temp("# nothing here\n");
        let err = resolve_waypoints(&MissionSource::WaypointFile(file.path().to_path_buf()))
            .unwrap_err();
        assert_eq!(err, NavError::EmptyPlan);
    }

    #[test]
    fn graph_mission_follows_shortest_route() {
        let file = write_temp(
            "node 0 0 0\nnode 1 1 0\nnode 2 1 1\nnode 3 5 5\n\
             edge 0 1\nedge 1 2\nedge 0 3\nedge 3 2\n",
        );
        let source = MissionSource::Graph {
            path: file.path().to_path_buf(),
            start: 0,
            goal: 2,
        };
        let wps = resolve_waypoints(&source).unwrap();
        assert_eq!(
            wps,
            vec![Waypoint::new(0.0, 0.0), Waypoint::new(1.0, 0.0), Waypoint::new(1.0, 1.0)]
        );
    }

    #[test]
    fn graph_mission_reports_unreachable_goal() {
        let file = write_temp("node 0 0 0\nnode 1 1 0\nnode 2 9 9\nedge 0 1\n");
        let source = MissionSource::Graph {
            path: file.path().to_path_buf(),
            start: 0,
            goal: 2,
        };
        assert_eq!(
            resolve_waypoints(&source).unwrap_err(),
            NavError::NoPath { start: 0, goal: 2 }
        );
    }

    #[tokio::test]
    async fn simulated_mission_visits_all_waypoints() {
        let waypoints = vec![Waypoint::new(1.0, 0.0), Waypoint::new(1.0, 1.0), Waypoint::new(0.0, 1.0)];
        let run = run_simulated(waypoints, quick_settings(), Arc::new(AtomicBool::new(false)));
        let report = time::timeout(Duration::from_secs(10), run).await.unwrap().unwrap();

        assert_eq!(report.exit, LoopExit::Completed);
        assert_eq!(report.final_state, SequencerState::Completed);
        assert_eq!(report.dispatch_failures, 0);
    }

    #[tokio::test]
    async fn odom_offset_shifts_the_start() {
        // The base starts at odom (0, 0), which is world (2, 0): already on the goal.
        let settings = RuntimeSettings {
            odom_offset: Transform2D::new(2.0, 0.0, 0.0),
            ..quick_settings()
        };
        let run = run_simulated(vec![Waypoint::new(2.0, 0.0)], settings, Arc::new(AtomicBool::new(false)));
        let report = time::timeout(Duration::from_secs(5), run).await.unwrap().unwrap();
        assert_eq!(report.exit, LoopExit::Completed);
        assert_eq!(report.ticks, 1);
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected_before_running() {
        let mut settings = quick_settings();
        settings.controller.linear_speed = -1.0;
        let err = run_simulated(vec![Waypoint::new(1.0, 0.0)], settings, Arc::new(AtomicBool::new(false)))
            .await
            .unwrap_err();
        assert!(matches!(err, NavError::Config(_)));
    }

    #[tokio::test]
    async fn raised_shutdown_cancels_immediately() {
        let shutdown = Arc::new(AtomicBool::new(true));
        let report = run_simulated(vec![Waypoint::new(50.0, 0.0)], quick_settings(), shutdown)
            .await
            .unwrap();
        assert_eq!(report.exit, LoopExit::Cancelled);
        assert_eq!(report.ticks, 0);
    }
}
