//! A* shortest-path search over a positioned node/edge graph.
//!
//! Nodes live in an arena (`Vec<Node>`) and are located through an
//! id → slot map.  Edges are keyed by neighbour **id**, and the search's
//! predecessor links are arena slots, so the graph can be cleared and rebuilt
//! between missions without anything pointing at freed memory.
//!
//! The heuristic is the straight-line Euclidean distance to the goal.  Edge
//! costs are never allowed to fall below the straight-line distance between
//! their endpoints, which keeps the heuristic admissible *and* consistent and
//! therefore every returned path optimal.
//!
//! # Determinism
//!
//! When two open nodes share the lowest f-score the one with the **lowest
//! node id** is expanded first, and outgoing edges are relaxed in ascending
//! neighbour-id order.  The same graph always yields the same path, whatever
//! order it was built in.
//!
//! # Example
//!
//! ```rust
//! use waynav_planner::AStar;
//!
//! let mut graph = AStar::new();
//! graph.add_node(0, 0.0, 0.0);
//! graph.add_node(1, 3.0, 4.0);
//! graph.add_edge(0, 1).unwrap();
//!
//! let path = graph.get_path(0, 1).unwrap();
//! assert_eq!(path.nodes, vec![0, 1]);
//! assert!((path.cost - 5.0).abs() < 1e-9);
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use tracing::{debug, trace};
use waynav_types::{NavError, NodeId, Waypoint};

// ────────────────────────────────────────────────────────────────────────────
// Graph storage
// ────────────────────────────────────────────────────────────────────────────

/// How an edge's traversal cost is obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
enum EdgeCost {
    /// Straight-line distance between the endpoints' *current* positions.
    Euclidean,
    /// Explicit cost supplied by the caller (validated on insertion).
    Fixed(f64),
}

/// Per-search scratch data.  Reset at the start of every [`AStar::get_path`].
#[derive(Debug, Clone, Copy)]
struct SearchState {
    g_score: f64,
    f_score: f64,
    /// Arena slot of the predecessor on the best known path.
    came_from: Option<usize>,
    closed: bool,
}

impl SearchState {
    fn unvisited() -> Self {
        Self {
            g_score: f64::INFINITY,
            f_score: f64::INFINITY,
            came_from: None,
            closed: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    id: NodeId,
    position: Waypoint,
    /// Outgoing edges, ordered by neighbour id for reproducible relaxation.
    neighbors: BTreeMap<NodeId, EdgeCost>,
    search: SearchState,
}

/// Open-set entry.  Ordered so that [`BinaryHeap`] pops the lowest f-score
/// first and, among equal f-scores, the lowest node id.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f_score: f64,
    id: NodeId,
    slot: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed on both keys: BinaryHeap is a max-heap.
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Result type
// ────────────────────────────────────────────────────────────────────────────

/// A successful [`AStar::get_path`] result.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPath {
    /// World-frame coordinates from start to goal, both inclusive.
    pub waypoints: Vec<Waypoint>,
    /// Node ids along the path, parallel to `waypoints`.
    pub nodes: Vec<NodeId>,
    /// Sum of traversed edge costs.
    pub cost: f64,
    /// Number of nodes closed during the search.
    pub nodes_expanded: usize,
}

impl PlannedPath {
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// AStar
// ────────────────────────────────────────────────────────────────────────────

/// Navigation graph plus A* search engine.
#[derive(Debug, Default, Clone)]
pub struct AStar {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
}

impl AStar {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register node `id` at `(x, y)`, or move it there if it already exists.
    ///
    /// Edges touching an existing node are kept.  Euclidean edges pick up the
    /// new position automatically since their cost is evaluated at search
    /// time.  Explicit-cost arcs into or out of a moved node are raised to
    /// the new straight-line distance when they would fall below it.
    pub fn add_node(&mut self, id: NodeId, x: f64, y: f64) {
        let position = Waypoint::new(x, y);
        match self.index.get(&id) {
            Some(&slot) => {
                self.nodes[slot].position = position;
                self.clamp_fixed_arcs(slot);
            }
            None => {
                self.index.insert(id, self.nodes.len());
                self.nodes.push(Node {
                    id,
                    position,
                    neighbors: BTreeMap::new(),
                    search: SearchState::unvisited(),
                });
            }
        }
    }

    /// Connect `id0` and `id1` in both directions with Euclidean cost.
    ///
    /// # Errors
    ///
    /// [`NavError::UnknownNode`] if either id is unregistered; the graph is
    /// left unchanged.
    pub fn add_edge(&mut self, id0: NodeId, id1: NodeId) -> Result<(), NavError> {
        let a = self.slot(id0)?;
        let b = self.slot(id1)?;
        self.nodes[a].neighbors.insert(id1, EdgeCost::Euclidean);
        self.nodes[b].neighbors.insert(id0, EdgeCost::Euclidean);
        Ok(())
    }

    /// Add a one-way arc `from -> to` with an explicit cost.
    ///
    /// # Errors
    ///
    /// - [`NavError::UnknownNode`] if either id is unregistered.
    /// - [`NavError::InvalidEdgeCost`] if `cost` is not finite or is below
    ///   the straight-line distance between the endpoints.
    pub fn add_directed_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        cost: f64,
    ) -> Result<(), NavError> {
        let a = self.slot(from)?;
        let b = self.slot(to)?;
        let straight = self.nodes[a].position.distance(self.nodes[b].position);
        // Small slack so a caller passing the exact distance is not rejected
        // by rounding.
        if !cost.is_finite() || cost < straight - 1e-9 {
            return Err(NavError::InvalidEdgeCost { from, to, cost });
        }
        self.nodes[a].neighbors.insert(to, EdgeCost::Fixed(cost));
        Ok(())
    }

    /// Discard every node and edge.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// World position of node `id`, if registered.
    pub fn position(&self, id: NodeId) -> Option<Waypoint> {
        self.index.get(&id).map(|&slot| self.nodes[slot].position)
    }

    /// Compute the minimum-cost path from `start` to `goal`.
    ///
    /// # Errors
    ///
    /// - [`NavError::UnknownNode`] if `start` (checked first) or `goal` is
    ///   not registered.
    /// - [`NavError::NoPath`] if `goal` is unreachable from `start`.
    pub fn get_path(&mut self, start: NodeId, goal: NodeId) -> Result<PlannedPath, NavError> {
        let start_slot = self.slot(start)?;
        let goal_slot = self.slot(goal)?;
        trace!(start, goal, nodes = self.nodes.len(), "astar search");

        for node in &mut self.nodes {
            node.search = SearchState::unvisited();
        }

        let h_start = self.heuristic(start_slot, goal_slot);
        self.nodes[start_slot].search.g_score = 0.0;
        self.nodes[start_slot].search.f_score = h_start;

        let mut open = BinaryHeap::new();
        open.push(OpenEntry {
            f_score: h_start,
            id: start,
            slot: start_slot,
        });
        let mut nodes_expanded = 0;

        while let Some(OpenEntry { f_score, slot, .. }) = open.pop() {
            let state = self.nodes[slot].search;
            // Lazy deletion: skip entries superseded by a cheaper push.
            if state.closed || f_score > state.f_score {
                continue;
            }

            if slot == goal_slot {
                let path = self.reconstruct(goal_slot, nodes_expanded);
                debug!(
                    start,
                    goal,
                    cost = path.cost,
                    hops = path.len(),
                    nodes_expanded,
                    "astar path found"
                );
                return Ok(path);
            }

            self.nodes[slot].search.closed = true;
            nodes_expanded += 1;

            let edges: Vec<(usize, f64)> = self.nodes[slot]
                .neighbors
                .iter()
                .filter_map(|(id, cost)| {
                    let next = *self.index.get(id)?;
                    Some((next, self.edge_cost(slot, next, *cost)))
                })
                .collect();

            for (next, cost) in edges {
                if self.nodes[next].search.closed {
                    continue;
                }
                let tentative = state.g_score + cost;
                if tentative < self.nodes[next].search.g_score {
                    let f = tentative + self.heuristic(next, goal_slot);
                    let search = &mut self.nodes[next].search;
                    search.came_from = Some(slot);
                    search.g_score = tentative;
                    search.f_score = f;
                    open.push(OpenEntry {
                        f_score: f,
                        id: self.nodes[next].id,
                        slot: next,
                    });
                }
            }
        }

        debug!(start, goal, nodes_expanded, "astar found no path");
        Err(NavError::NoPath { start, goal })
    }

    // ── internal helpers ────────────────────────────────────────────────────

    /// Keep every `Fixed` arc touching `slot` at or above its endpoints'
    /// straight-line distance.
    fn clamp_fixed_arcs(&mut self, slot: usize) {
        let id = self.nodes[slot].id;
        let position = self.nodes[slot].position;
        let positions: HashMap<NodeId, Waypoint> =
            self.nodes.iter().map(|n| (n.id, n.position)).collect();

        for (from_slot, node) in self.nodes.iter_mut().enumerate() {
            for (&to, cost) in node.neighbors.iter_mut() {
                let EdgeCost::Fixed(c) = *cost else { continue };
                let straight = if from_slot == slot {
                    match positions.get(&to) {
                        Some(&p) => position.distance(p),
                        None => continue,
                    }
                } else if to == id {
                    node.position.distance(position)
                } else {
                    continue;
                };
                if c < straight {
                    debug!(from = node.id, to, cost = c, straight, "raising arc cost after node move");
                    *cost = EdgeCost::Fixed(straight);
                }
            }
        }
    }

    fn slot(&self, id: NodeId) -> Result<usize, NavError> {
        self.index.get(&id).copied().ok_or(NavError::UnknownNode(id))
    }

    fn heuristic(&self, from: usize, to: usize) -> f64 {
        self.nodes[from].position.distance(self.nodes[to].position)
    }

    fn edge_cost(&self, from: usize, to: usize, cost: EdgeCost) -> f64 {
        match cost {
            EdgeCost::Euclidean => self.heuristic(from, to),
            EdgeCost::Fixed(c) => c,
        }
    }

    fn reconstruct(&self, goal_slot: usize, nodes_expanded: usize) -> PlannedPath {
        let mut slots = vec![goal_slot];
        let mut current = goal_slot;
        while let Some(prev) = self.nodes[current].search.came_from {
            slots.push(prev);
            current = prev;
        }
        slots.reverse();

        PlannedPath {
            waypoints: slots.iter().map(|&s| self.nodes[s].position).collect(),
            nodes: slots.iter().map(|&s| self.nodes[s].id).collect(),
            cost: self.nodes[goal_slot].search.g_score,
            nodes_expanded,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
