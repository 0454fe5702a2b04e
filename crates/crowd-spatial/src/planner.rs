//! Best-first / A* search over a pluggable planning domain.
//!
//! The search is generic over an abstract state space: the domain supplies
//! transitions with costs, an admissible heuristic, and the goal test.
//! Long-term and mid-term planning instantiate it with [`GridDomain`];
//! tests use tiny hand-built domains.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::HashMap;
use std::hash::Hash;

use crowd_core::CellIndex;

use crate::grid::NavGrid;

// ── PlanningDomain ────────────────────────────────────────────────────────────

/// An abstract state space for best-first search.
pub trait PlanningDomain {
    type State: Copy + Eq + Hash;

    /// Push every `(successor, transition_cost)` of `state` into `out`.
    fn successors(&self, state: Self::State, out: &mut Vec<(Self::State, f32)>);

    /// Admissible estimate of the remaining cost from `state` to `goal`.
    /// Return 0 to degrade A* into uniform-cost search.
    fn heuristic(&self, state: Self::State, goal: Self::State) -> f32;

    /// Goal test; defaults to state equality.
    fn is_goal(&self, state: Self::State, goal: Self::State) -> bool {
        state == goal
    }
}

// ── Frontier ordering ─────────────────────────────────────────────────────────

/// Min-heap entry: ordered by `f`-value ascending, with `g` descending as a
/// tie-break (prefer deeper nodes, the classic A* tie-break).
struct Open<S> {
    f: f32,
    g: f32,
    state: S,
}

impl<S> PartialEq for Open<S> {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.g == other.g
    }
}
impl<S> Eq for Open<S> {}

impl<S> Ord for Open<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for BinaryHeap's max-heap semantics.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| self.g.total_cmp(&other.g))
    }
}
impl<S> PartialOrd for Open<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ── BestFirstSearchPlanner ────────────────────────────────────────────────────

/// Generic A* with a bounded expansion budget.
pub struct BestFirstSearchPlanner {
    /// Hard cap on node expansions; exceeding it is a planning failure.
    pub max_expansions: usize,
}

impl Default for BestFirstSearchPlanner {
    fn default() -> Self {
        Self { max_expansions: 100_000 }
    }
}

impl BestFirstSearchPlanner {
    pub fn new(max_expansions: usize) -> Self {
        Self { max_expansions }
    }

    /// Search from `start` to `goal`, returning the full state path
    /// (start and goal inclusive), or `None` when the space is exhausted
    /// or the expansion budget runs out.
    pub fn plan<D: PlanningDomain>(
        &self,
        domain: &D,
        start: D::State,
        goal: D::State,
    ) -> Option<Vec<D::State>> {
        if domain.is_goal(start, goal) {
            return Some(vec![start]);
        }

        let mut open = BinaryHeap::new();
        let mut best_g: HashMap<D::State, f32> = HashMap::new();
        let mut came_from: HashMap<D::State, D::State> = HashMap::new();
        let mut successors = Vec::with_capacity(8);

        best_g.insert(start, 0.0);
        open.push(Open { f: domain.heuristic(start, goal), g: 0.0, state: start });

        let mut expansions = 0usize;
        while let Some(Open { g, state, .. }) = open.pop() {
            // Stale heap entry: a better g was found after this was pushed.
            if best_g.get(&state).is_some_and(|&bg| g > bg) {
                continue;
            }
            if domain.is_goal(state, goal) {
                return Some(reconstruct(&came_from, start, state));
            }
            expansions += 1;
            if expansions > self.max_expansions {
                return None;
            }

            successors.clear();
            domain.successors(state, &mut successors);
            for &(next, cost) in &successors {
                let next_g = g + cost;
                if best_g.get(&next).is_none_or(|&bg| next_g < bg) {
                    best_g.insert(next, next_g);
                    came_from.insert(next, state);
                    open.push(Open {
                        f: next_g + domain.heuristic(next, goal),
                        g: next_g,
                        state: next,
                    });
                }
            }
        }
        None
    }
}

fn reconstruct<S: Copy + Eq + Hash>(
    came_from: &HashMap<S, S>,
    start: S,
    end: S,
) -> Vec<S> {
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

// ── GridDomain ────────────────────────────────────────────────────────────────

/// The navigation grid as a planning domain (8-connected, unit/√2 costs).
pub struct GridDomain<'a> {
    pub grid: &'a NavGrid,
}

impl PlanningDomain for GridDomain<'_> {
    type State = CellIndex;

    fn successors(&self, state: CellIndex, out: &mut Vec<(CellIndex, f32)>) {
        self.grid.successors(state, out);
    }

    fn heuristic(&self, state: CellIndex, goal: CellIndex) -> f32 {
        self.grid.heuristic(state, goal)
    }
}
