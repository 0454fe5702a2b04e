//! `crowd-spatial` — the spatial index of the `rust_crowd` framework.
//!
//! Two structures cover the two populations of the world:
//!
//! - a **balanced agent k-d tree**, rebuilt from scratch every simulation
//!   tick ([`kdtree`]);
//! - an **obstacle BSP** over directed polygon edges, built once at
//!   simulation preprocess ([`bsp`], segments in [`obstacle`]).
//!
//! On top of those sit a navigation grid for coarse path planning
//! ([`grid`]), a generic best-first planner ([`planner`]), and the
//! [`SpatialIndex`] facade that the engine owns and agents query through.
//!
//! # Query semantics
//!
//! All queries are **total**: they return empty results or no-hit instead of
//! failing.  The agent tree is only invalid during the engine's rebuild
//! window inside a tick; every agent-visible call happens outside it.
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | Rayon-scored BSP splitter selection at preprocess time.   |

pub mod bsp;
pub mod grid;
pub mod index;
pub mod kdtree;
pub mod neighbors;
pub mod obstacle;
pub mod planner;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use bsp::ObstacleBsp;
pub use grid::NavGrid;
pub use index::{Hit, HitKind, SpatialIndex};
pub use kdtree::{AgentEntry, AgentKdTree, MAX_LEAF_SIZE};
pub use neighbors::NeighborList;
pub use obstacle::{ObstacleSegment, SegmentArena};
pub use planner::{BestFirstSearchPlanner, GridDomain, PlanningDomain};
