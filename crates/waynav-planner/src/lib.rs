//! `waynav-planner` – offline route planning over a waypoint graph.
//!
//! # Modules
//!
//! - [`astar`] – [`AStar`][astar::AStar]: an arena-backed node/edge graph
//!   with an optimal, deterministic A* search using the straight-line
//!   Euclidean heuristic.
//! - [`loader`] – [`load_graph`][loader::load_graph]: builds an
//!   [`AStar`][astar::AStar] graph from a line-based text file.

pub mod astar;
pub mod loader;

pub use astar::{AStar, PlannedPath};
pub use loader::{GraphLoad, load_graph, parse_graph};
