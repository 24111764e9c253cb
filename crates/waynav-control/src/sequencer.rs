//! Waypoint sequencer – the mission state machine.
//!
//! ```text
//!   Idle ──first tick──▶ Navigating(0) ──reached──▶ Navigating(1) ─ … ─▶ Completed
//! ```
//!
//! Each call to [`WaypointSequencer::tick`] does at most one unit of work:
//! look up the current waypoint in the robot frame, ask the
//! [`MotionController`] for a command, hand it to the [`CommandSink`], and
//! advance when the controller reports the waypoint reached.
//!
//! A failed transform lookup skips the tick without dispatching anything; a
//! failed dispatch is logged and reported but never stops the mission.  Once
//! `Completed`, further ticks do nothing.

use tracing::{debug, info, warn};
use waynav_hal::CommandSink;
use waynav_perception::LocalFrame;
use waynav_types::{NavError, NavigationStatus, SequencerState, Waypoint};

use crate::motion::{MotionController, MotionDecision};

/// Result of a single [`WaypointSequencer::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Steering toward the current waypoint; the command was dispatched.
    Commanded(MotionDecision),
    /// Waypoint `reached` was reached and the next one is now current.
    Advanced { reached: usize },
    /// The last waypoint was reached on this tick.
    Completed,
    /// The mission was already complete; nothing was done.
    Finished,
    /// No robot-frame goal was available; nothing was dispatched.
    Skipped(NavError),
    /// The command could not be dispatched.  Any waypoint transition still
    /// took effect; see [`WaypointSequencer::state`].
    DispatchFailed(NavError),
}

/// Drives a [`MotionController`] through an ordered list of waypoints.
#[derive(Debug, Clone)]
pub struct WaypointSequencer {
    waypoints: Vec<Waypoint>,
    controller: MotionController,
    state: SequencerState,
}

impl WaypointSequencer {
    /// # Errors
    ///
    /// [`NavError::EmptyPlan`] when `waypoints` is empty.
    pub fn new(waypoints: Vec<Waypoint>, controller: MotionController) -> Result<Self, NavError> {
        if waypoints.is_empty() {
            return Err(NavError::EmptyPlan);
        }
        info!(waypoints = waypoints.len(), "waypoint sequencer ready");
        Ok(Self {
            waypoints,
            controller,
            state: SequencerState::Idle,
        })
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn controller(&self) -> &MotionController {
        &self.controller
    }

    /// The waypoint being pursued (the first one while still `Idle`).
    pub fn current_waypoint(&self) -> Option<Waypoint> {
        match self.state {
            SequencerState::Idle => self.waypoints.first().copied(),
            SequencerState::Navigating(i) => self.waypoints.get(i).copied(),
            SequencerState::Completed => None,
        }
    }

    /// Waypoints not yet reached, including the current one.
    pub fn remaining(&self) -> usize {
        match self.state {
            SequencerState::Idle => self.waypoints.len(),
            SequencerState::Navigating(i) => self.waypoints.len() - i,
            SequencerState::Completed => 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == SequencerState::Completed
    }

    pub fn status(&self) -> NavigationStatus {
        NavigationStatus {
            state: self.state,
            waypoint: self.current_waypoint(),
        }
    }

    /// Run one control step.
    pub fn tick(&mut self, frame: &dyn LocalFrame, sink: &mut dyn CommandSink) -> TickOutcome {
        let index = match self.state {
            SequencerState::Completed => return TickOutcome::Finished,
            SequencerState::Idle => {
                self.state = SequencerState::Navigating(0);
                info!(x = self.waypoints[0].x, y = self.waypoints[0].y, "navigating to waypoint 0");
                0
            }
            SequencerState::Navigating(i) => i,
        };
        let target = self.waypoints[index];

        let local_goal = match frame.to_local_frame(target) {
            Ok(goal) if goal.x.is_finite() && goal.y.is_finite() => goal,
            Ok(goal) => {
                let err = NavError::Transform(format!(
                    "non-finite local goal ({}, {})",
                    goal.x, goal.y
                ));
                warn!(waypoint = index, error = %err, "skipping tick");
                return TickOutcome::Skipped(err);
            }
            Err(err) => {
                warn!(waypoint = index, error = %err, "skipping tick");
                return TickOutcome::Skipped(err);
            }
        };

        let decision = self.controller.compute_command(local_goal);
        debug!(
            waypoint = index,
            phase = ?decision.phase,
            bearing_deg = decision.bearing_deg,
            distance = decision.distance,
            angular = decision.command.angular,
            linear = decision.command.linear,
            "control tick"
        );
        let dispatch = sink.send(decision.command);

        let outcome = if decision.reached {
            self.advance(index)
        } else {
            TickOutcome::Commanded(decision)
        };

        match dispatch {
            Ok(()) => outcome,
            Err(err) => {
                warn!(sink = sink.id(), error = %err, "command dispatch failed");
                TickOutcome::DispatchFailed(err)
            }
        }
    }

    fn advance(&mut self, reached: usize) -> TickOutcome {
        let next = reached + 1;
        if next >= self.waypoints.len() {
            self.state = SequencerState::Completed;
            info!(waypoints = self.waypoints.len(), "mission completed");
            TickOutcome::Completed
        } else {
            self.state = SequencerState::Navigating(next);
            let wp = self.waypoints[next];
            info!(reached, next, x = wp.x, y = wp.y, "waypoint reached");
            TickOutcome::Advanced { reached }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waynav_hal::RecordingSink;
    use waynav_types::{ControlCommand, RobotPose};

    /// Frame that never has a pose.
    struct Lost;

    impl LocalFrame for Lost {
        fn current_pose(&self) -> Result<RobotPose, NavError> {
            Err(NavError::Transform("no pose".to_string()))
        }
    }

    struct Refusing;

    impl CommandSink for Refusing {
        fn id(&self) -> &str {
            "refusing"
        }

        fn send(&mut self, _command: ControlCommand) -> Result<(), NavError> {
            Err(NavError::Dispatch {
                sink: "refusing".to_string(),
                details: "offline".to_string(),
            })
        }
    }

    fn three_point_plan() -> WaypointSequencer {
        WaypointSequencer::new(
            vec![
                Waypoint::new(1.0, 0.0),
                Waypoint::new(1.0, 1.0),
                Waypoint::new(0.0, 1.0),
            ],
            MotionController::default(),
        )
        .unwrap()
    }

    fn at(wp: Waypoint) -> RobotPose {
        RobotPose::new(wp.x, wp.y, 0.0)
    }

    #[test]
    fn empty_plan_is_rejected() {
        let err = WaypointSequencer::new(vec![], MotionController::default()).unwrap_err();
        assert_eq!(err, NavError::EmptyPlan);
    }

    #[test]
    fn starts_idle_with_first_waypoint_current() {
        let seq = three_point_plan();
        assert_eq!(seq.state(), SequencerState::Idle);
        assert_eq!(seq.current_waypoint(), Some(Waypoint::new(1.0, 0.0)));
        assert_eq!(seq.remaining(), 3);
    }

    #[test]
    fn first_tick_starts_navigating() {
        let mut seq = three_point_plan();
        let mut sink = RecordingSink::new();
        let outcome = seq.tick(&RobotPose::default(), &mut sink);

        // (1, 0) is straight ahead and 1 m away.
        assert!(matches!(outcome, TickOutcome::Commanded(d) if d.command.linear > 0.0));
        assert_eq!(seq.state(), SequencerState::Navigating(0));
        assert_eq!(sink.commands().len(), 1);
    }

    #[test]
    fn visits_every_waypoint_in_order_then_completes() {
        let mut seq = three_point_plan();
        let mut sink = RecordingSink::new();
        let plan = seq.waypoints().to_vec();
        assert_eq!(seq.state(), SequencerState::Idle);

        // One metre short of waypoint 0, already facing it.
        let outcome = seq.tick(&RobotPose::default(), &mut sink);
        assert!(matches!(outcome, TickOutcome::Commanded(d) if !d.reached));
        assert_eq!(seq.state(), SequencerState::Navigating(0));
        assert_eq!(seq.remaining(), 3);

        assert_eq!(seq.tick(&at(plan[0]), &mut sink), TickOutcome::Advanced { reached: 0 });
        assert_eq!(seq.state(), SequencerState::Navigating(1));
        assert_eq!(seq.remaining(), 2);

        assert_eq!(seq.tick(&at(plan[1]), &mut sink), TickOutcome::Advanced { reached: 1 });
        assert_eq!(seq.state(), SequencerState::Navigating(2));

        assert_eq!(seq.tick(&at(plan[2]), &mut sink), TickOutcome::Completed);
        assert_eq!(seq.state(), SequencerState::Completed);
        assert!(seq.is_complete());
        assert_eq!(seq.current_waypoint(), None);
        assert_eq!(seq.remaining(), 0);

        // One drive command, then a stop for every reaching tick.
        assert_eq!(sink.commands().len(), 4);
        assert!(!sink.commands()[0].is_stop());
        assert!(sink.commands()[1..].iter().all(ControlCommand::is_stop));
    }

    #[test]
    fn one_reached_event_advances_one_index() {
        let mut seq = three_point_plan();
        let mut sink = RecordingSink::new();

        // Sitting on waypoint 0 forever only advances past it once; the next
        // tick steers toward waypoint 1 instead of skipping it.
        seq.tick(&at(Waypoint::new(1.0, 0.0)), &mut sink);
        let outcome = seq.tick(&at(Waypoint::new(1.0, 0.0)), &mut sink);
        assert!(matches!(outcome, TickOutcome::Commanded(_)));
        assert_eq!(seq.state(), SequencerState::Navigating(1));
    }

    #[test]
    fn no_commands_after_completion() {
        let mut seq =
            WaypointSequencer::new(vec![Waypoint::new(0.0, 0.0)], MotionController::default())
                .unwrap();
        let mut sink = RecordingSink::new();

        assert_eq!(seq.tick(&RobotPose::default(), &mut sink), TickOutcome::Completed);
        for _ in 0..5 {
            assert_eq!(seq.tick(&RobotPose::default(), &mut sink), TickOutcome::Finished);
        }
        assert_eq!(sink.commands().len(), 1);
    }

    #[test]
    fn missing_transform_skips_without_dispatch() {
        let mut seq = three_point_plan();
        let mut sink = RecordingSink::new();

        let outcome = seq.tick(&Lost, &mut sink);
        assert!(matches!(outcome, TickOutcome::Skipped(NavError::Transform(_))));
        assert!(sink.commands().is_empty());
        assert_eq!(seq.state(), SequencerState::Navigating(0));

        // Recovers on the next tick once a pose is available.
        let outcome = seq.tick(&RobotPose::default(), &mut sink);
        assert!(matches!(outcome, TickOutcome::Commanded(_)));
    }

    #[test]
    fn non_finite_pose_is_skipped() {
        let mut seq = three_point_plan();
        let mut sink = RecordingSink::new();
        let outcome = seq.tick(&RobotPose::new(f64::NAN, 0.0, 0.0), &mut sink);
        assert!(matches!(outcome, TickOutcome::Skipped(_)));
        assert!(sink.commands().is_empty());
    }

    #[test]
    fn dispatch_failure_is_reported_not_fatal() {
        let mut seq = three_point_plan();
        let outcome = seq.tick(&RobotPose::default(), &mut Refusing);
        assert!(matches!(outcome, TickOutcome::DispatchFailed(NavError::Dispatch { .. })));
        assert_eq!(seq.state(), SequencerState::Navigating(0));

        // Arrival still advances the mission.
        seq.tick(&at(Waypoint::new(1.0, 0.0)), &mut Refusing);
        assert_eq!(seq.state(), SequencerState::Navigating(1));
    }

    #[test]
    fn status_reflects_current_waypoint() {
        let mut seq = three_point_plan();
        let mut sink = RecordingSink::new();
        seq.tick(&at(Waypoint::new(1.0, 0.0)), &mut sink);
        let status = seq.status();
        assert_eq!(status.state, SequencerState::Navigating(1));
        assert_eq!(status.waypoint, Some(Waypoint::new(1.0, 1.0)));
    }
}
