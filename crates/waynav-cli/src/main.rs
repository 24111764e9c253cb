//! `waynav` – drive a simulated robot through a set of waypoints.
//!
//! ```text
//! waynav <x> <y>                          drive to a single goal
//! waynav <waypoint-file>                  follow the x y pairs in a file
//! waynav --graph <graph-file> <start> <goal>
//!                                         plan with A*, then follow the route
//! waynav --init-config                    write ~/.waynav/config.toml
//! ```
//!
//! Anything else prints this usage and exits successfully.  Ctrl-C stops the
//! mission and sends a final stop command to the base.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use tracing::warn;

use waynav_runtime::{LoopExit, LoopReport, MissionSource, resolve_waypoints, run_simulated};
use waynav_types::{NodeId, Waypoint};

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Run(MissionSource),
    InitConfig,
    Usage,
}

fn parse_args(args: &[String]) -> Command {
    match args {
        [flag] if flag == "--init-config" => Command::InitConfig,
        [flag, ..] if flag == "-h" || flag == "--help" => Command::Usage,
        [flag, path, start, goal] if flag == "--graph" => {
            match (start.parse::<NodeId>(), goal.parse::<NodeId>()) {
                (Ok(start), Ok(goal)) => Command::Run(MissionSource::Graph {
                    path: PathBuf::from(path),
                    start,
                    goal,
                }),
                _ => Command::Usage,
            }
        }
        [x, y] => match (x.parse::<f64>(), y.parse::<f64>()) {
            (Ok(x), Ok(y)) if x.is_finite() && y.is_finite() => {
                Command::Run(MissionSource::Goal(Waypoint::new(x, y)))
            }
            _ => Command::Usage,
        },
        [path] if !path.starts_with('-') => {
            Command::Run(MissionSource::WaypointFile(PathBuf::from(path)))
        }
        _ => Command::Usage,
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let source = match parse_args(&args) {
        Command::Usage => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Command::InitConfig => return init_config(),
        Command::Run(source) => source,
    };

    let _tracing = waynav_runtime::init_tracing("waynav");

    // ── Shutdown flag ─────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the robot …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the mission can only end by completing");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    // ── Mission ───────────────────────────────────────────────────────────
    let waypoints = match resolve_waypoints(&source) {
        Ok(waypoints) => waypoints,
        Err(e) => {
            println!("{}: {}", "Cannot build mission".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };
    print_plan(&waypoints);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            println!("{}: {}", "Failed to start tokio runtime".red(), e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_simulated(waypoints, cfg.runtime_settings(), shutdown)) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}: {}", "Navigation failed to start".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_config() -> ExitCode {
    let path = config::config_path();
    if path.exists() {
        println!("  Config already exists at {}", path.display().to_string().bold());
        return ExitCode::SUCCESS;
    }
    match config::save(&config::Config::default()) {
        Ok(()) => {
            println!(
                "  {} Default config written to {}",
                "✓".green().bold(),
                path.display().to_string().bold()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}: {}", "Error saving config".red(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_usage() {
    println!("{} {}", "waynav".bold(), format!("v{}", env!("CARGO_PKG_VERSION")).dimmed());
    println!();
    println!("Usage:");
    println!("  waynav <x> <y>");
    println!("  waynav <waypoint-file>");
    println!("  waynav --graph <graph-file> <start-id> <goal-id>");
    println!("  waynav --init-config");
}

fn print_plan(waypoints: &[Waypoint]) {
    println!("  {} waypoint(s):", waypoints.len().to_string().bold());
    for (i, wp) in waypoints.iter().enumerate() {
        println!("    {i:>3}  ({:.2}, {:.2})", wp.x, wp.y);
    }
}

fn print_report(report: &LoopReport) {
    match report.exit {
        LoopExit::Completed => println!(
            "  {} All waypoints reached in {} ticks.",
            "✓".green().bold(),
            report.ticks
        ),
        LoopExit::Cancelled => println!(
            "  {} Mission cancelled in state {:?}.",
            "✗".yellow().bold(),
            report.final_state
        ),
    }
    if report.skipped_ticks > 0 || report.dispatch_failures > 0 {
        println!(
            "    {} skipped tick(s), {} dispatch failure(s)",
            report.skipped_ticks.to_string().dimmed(),
            report.dispatch_failures.to_string().dimmed()
        );
    }
}
