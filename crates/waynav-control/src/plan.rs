//! Waypoint file loader.
//!
//! A plan file is a list of world-frame `x y` pairs, normally one per line:
//!
//! ```text
//! # square, 2 m sides
//! 2.0 0.0
//! 2.0 2.0
//! 0.0 2.0
//! 0.0 0.0
//! ```
//!
//! Numbers are consumed as a stream of consecutive pairs.  Text after `#` is
//! ignored.  A token that is not a finite number drops the rest of its line
//! (and any half-read pair) and is counted in [`WaypointPlan::skipped`]; a
//! trailing unpaired number is ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info, warn};
use waynav_types::{NavError, Waypoint};

/// Waypoints read from a plan file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaypointPlan {
    pub waypoints: Vec<Waypoint>,
    /// Lines abandoned because of an unparsable token.
    pub skipped: usize,
}

/// Read a plan from `path`.
///
/// # Errors
///
/// [`NavError::WaypointFile`] if the file cannot be opened or read.
pub fn load_plan(path: impl AsRef<Path>) -> Result<WaypointPlan, NavError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| NavError::WaypointFile(format!("{}: {e}", path.display())))?;
    let plan = parse_plan(BufReader::new(file))?;
    info!(
        path = %path.display(),
        waypoints = plan.waypoints.len(),
        skipped = plan.skipped,
        "waypoint plan loaded"
    );
    Ok(plan)
}

/// Parse a plan from any buffered reader.
pub fn parse_plan<R: BufRead>(reader: R) -> Result<WaypointPlan, NavError> {
    let mut plan = WaypointPlan::default();
    let mut pending: Option<f64> = None;

    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| NavError::WaypointFile(e.to_string()))?;
        let content = line.split('#').next().unwrap_or_default();

        for token in content.split_whitespace() {
            match token.parse::<f64>() {
                Ok(value) if value.is_finite() => match pending.take() {
                    Some(x) => plan.waypoints.push(Waypoint::new(x, value)),
                    None => pending = Some(value),
                },
                _ => {
                    warn!(line = number + 1, token, "skipping malformed waypoint line");
                    plan.skipped += 1;
                    pending = None;
                    break;
                }
            }
        }
    }

    if let Some(x) = pending {
        debug!(x, "ignoring trailing unpaired value");
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn parse(text: &str) -> WaypointPlan {
        parse_plan(Cursor::new(text)).unwrap()
    }

    #[test]
    fn one_pair_per_line() {
        let plan = parse("0 0\n1.5 -2\n3e0 4\n");
        assert_eq!(
            plan.waypoints,
            vec![
                Waypoint::new(0.0, 0.0),
                Waypoint::new(1.5, -2.0),
                Waypoint::new(3.0, 4.0)
            ]
        );
        assert_eq!(plan.skipped, 0);
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let plan = parse("# header\n\n  1 2   # first\n\t3 4\n");
        assert_eq!(plan.waypoints.len(), 2);
        assert_eq!(plan.skipped, 0);
    }

    #[test]
    fn malformed_line_is_counted_and_dropped() {
        let plan = parse("1 2\n3 oops\n5 6\nnan 1\n");
        assert_eq!(plan.waypoints, vec![Waypoint::new(1.0, 2.0), Waypoint::new(5.0, 6.0)]);
        assert_eq!(plan.skipped, 2);
    }

    #[test]
    fn trailing_unpaired_value_is_ignored() {
        let plan = parse("1 2\n3\n");
        assert_eq!(plan.waypoints, vec![Waypoint::new(1.0, 2.0)]);
        assert_eq!(plan.skipped, 0);
    }

    #[test]
    fn empty_input_gives_empty_plan() {
        assert!(parse("").waypoints.is_empty());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0 0\n2 0\n2 2").unwrap();
        let plan = load_plan(file.path()).unwrap();
        assert_eq!(plan.waypoints.len(), 3);
        assert_eq!(plan.waypoints[2], Waypoint::new(2.0, 2.0));
    }

    #[test]
    fn missing_file_is_a_waypoint_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_plan(dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, NavError::WaypointFile(_)));
    }
}
