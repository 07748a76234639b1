//! Connected components of the roadmap
//!
//! Components are mutual-reachability classes of the directed roadmap.
//! Each component keeps the transitive sets of components it can reach and
//! be reached from, so that adding an edge can merge every component lying
//! on a newly closed directed cycle without any graph search.

use std::collections::BTreeSet;

use super::{ComponentId, NodeId};

/// Maximal set of mutually reachable roadmap nodes.
#[derive(Debug, Clone, Default)]
pub struct ConnectedComponent {
    pub(super) nodes: Vec<NodeId>,
    pub(super) reachable_to: BTreeSet<ComponentId>,
    pub(super) reachable_from: BTreeSet<ComponentId>,
}

impl ConnectedComponent {
    /// Member nodes, in insertion order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Whether some node of this component has a directed path into `other`.
    pub fn can_reach(&self, other: ComponentId) -> bool {
        self.reachable_to.contains(&other)
    }
}
