//! Latest-pose snapshot shared between localisation and the control loop.
//!
//! Built on [`tokio::sync::watch`]: the publisher overwrites a single slot
//! and never waits for readers, and readers copy the whole [`PoseSample`]
//! out under the channel's lock, so a tick can never observe a half-written
//! pose.
//!
//! # Example
//!
//! ```rust
//! use waynav_perception::pose::pose_channel;
//! use waynav_types::RobotPose;
//!
//! let (publisher, reader) = pose_channel();
//! assert!(reader.latest().is_none());
//!
//! publisher.publish(RobotPose::new(1.0, 2.0, 0.0));
//! assert_eq!(reader.latest().unwrap().pose.x, 1.0);
//! ```

use std::time::{Duration, Instant};

use tokio::sync::watch;
use waynav_types::RobotPose;

/// A pose together with the instant it was published.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    pub pose: RobotPose,
    pub stamp: Instant,
}

impl PoseSample {
    pub fn age(&self) -> Duration {
        self.stamp.elapsed()
    }
}

/// Create a connected publisher/reader pair with no pose yet.
pub fn pose_channel() -> (PosePublisher, PoseReader) {
    let (tx, rx) = watch::channel(None);
    (PosePublisher { tx }, PoseReader { rx })
}

/// Write side, held by the localisation source.
#[derive(Debug)]
pub struct PosePublisher {
    tx: watch::Sender<Option<PoseSample>>,
}

impl PosePublisher {
    /// Replace the current snapshot.  Succeeds even with no readers.
    pub fn publish(&self, pose: RobotPose) {
        self.publish_sample(PoseSample {
            pose,
            stamp: Instant::now(),
        });
    }

    /// Replace the current snapshot with an explicitly stamped sample.
    pub fn publish_sample(&self, sample: PoseSample) {
        self.tx.send_replace(Some(sample));
    }

    /// Open another reader on this channel.
    pub fn reader(&self) -> PoseReader {
        PoseReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side.  Cheap to clone; every clone sees the same latest value.
#[derive(Debug, Clone)]
pub struct PoseReader {
    rx: watch::Receiver<Option<PoseSample>>,
}

impl PoseReader {
    /// Copy of the most recent sample, or `None` before the first publish.
    pub fn latest(&self) -> Option<PoseSample> {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_sees_latest_value_only() {
        let (publisher, reader) = pose_channel();
        publisher.publish(RobotPose::new(1.0, 0.0, 0.0));
        publisher.publish(RobotPose::new(2.0, 0.0, 0.0));
        assert_eq!(reader.latest().unwrap().pose, RobotPose::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn extra_readers_share_the_slot() {
        let (publisher, first) = pose_channel();
        let second = publisher.reader();
        let third = first.clone();
        publisher.publish(RobotPose::new(0.0, 3.0, 1.0));
        for reader in [first, second, third] {
            assert_eq!(reader.latest().unwrap().pose.y, 3.0);
        }
    }

    #[test]
    fn publish_without_readers_does_not_fail() {
        let (publisher, reader) = pose_channel();
        drop(reader);
        publisher.publish(RobotPose::default());
        assert!(publisher.reader().latest().is_some());
    }

    #[test]
    fn sample_age_grows() {
        let (publisher, reader) = pose_channel();
        let stamp = Instant::now() - Duration::from_millis(200);
        publisher.publish_sample(PoseSample {
            pose: RobotPose::default(),
            stamp,
        });
        assert!(reader.latest().unwrap().age() >= Duration::from_millis(200));
    }

    #[test]
    fn concurrent_writer_never_tears_pose() {
        // Writer always publishes x == y == theta; a torn read would break it.
        let (publisher, reader) = pose_channel();
        let writer = std::thread::spawn(move || {
            for i in 0..5_000 {
                let v = i as f64;
                publisher.publish(RobotPose::new(v, v, v));
            }
        });
        for _ in 0..5_000 {
            if let Some(sample) = reader.latest() {
                let p = sample.pose;
                assert_eq!(p.x, p.y);
                assert_eq!(p.y, p.theta);
            }
        }
        writer.join().unwrap();
    }
}
