//! Transition graph interface and per-edge statistics
//!
//! The transition graph is the discrete structure guiding the planner: its
//! nodes ("states") are sets of configurations, its edges are allowed mode
//! transitions carrying a constraint projection, a steering policy and a
//! path constraint. The planner consumes the graph through the
//! [`TransitionGraph`] trait; [`mode_graph::ModeGraph`] is the closure-built
//! implementation used by the demos and tests.

pub mod constraints;
pub mod mode_graph;
pub mod statistics;

pub use constraints::{CoordinateLock, Unconstrained};
pub use mode_graph::{ModeEdge, ModeGraph};
pub use statistics::{EdgeStatisticsTable, FailureReason, SuccessStatistics};

use crate::common::{Configuration, ConstraintOperator, PlanningResult};
use crate::path::Path;

/// Identifier of a transition-graph state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub usize);

/// Stable identifier of a transition-graph edge, also the key of the
/// per-edge statistics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

/// Interface of the discrete graph guiding the planner.
pub trait TransitionGraph {
    /// All states known to the graph's node selector.
    fn states(&self) -> Vec<StateId>;

    /// Every state containing `q`. A configuration may belong to several
    /// states; belonging to none is an error.
    fn classify(&self, q: &Configuration) -> PlanningResult<Vec<StateId>>;

    /// Pick an outgoing edge of `from`, or `None` if the state has no
    /// outgoing edge.
    fn choose_edge(&self, from: StateId) -> Option<EdgeId>;

    /// Every edge leading from one of the `from` states to one of the `to`
    /// states, in deterministic insertion order.
    fn edges_between(&self, from: &[StateId], to: &[StateId]) -> Vec<EdgeId>;

    /// Human-readable edge name, used for statistics bins and logs.
    fn edge_name(&self, edge: EdgeId) -> String;

    /// Project `target` onto the edge's constraint manifold anchored at
    /// `reference`. `None` on projection failure.
    fn apply_constraint(
        &self,
        edge: EdgeId,
        reference: &Configuration,
        target: &Configuration,
    ) -> Option<Configuration>;

    /// Build a path along the edge with its steering method. `None` if no
    /// path can be built.
    fn build_path(&self, edge: EdgeId, from: &Configuration, to: &Configuration) -> Option<Path>;

    /// Fresh constraint operator describing the manifold a path through this
    /// edge must stay on.
    fn path_constraint(&self, edge: EdgeId) -> Box<dyn ConstraintOperator>;
}
