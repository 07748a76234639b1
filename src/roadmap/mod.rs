//! Roadmap of validated motions
//!
//! Nodes carry sampled configurations together with their cached
//! transition-graph classification; edges are directed, each holding the
//! validated path that realizes it. Connected components follow
//! mutual reachability: two nodes share a component exactly when each can
//! reach the other through validated edges.

pub mod component;
pub mod metric;

pub use component::ConnectedComponent;
pub use metric::{EuclideanDistance, WeightedDistance};

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use ordered_float::OrderedFloat;
use tracing::debug;

use crate::common::{Configuration, DistanceMetric};
use crate::graph::{StateId, TransitionGraph};
use crate::path::Path;

/// Identifier of a roadmap node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Identifier of a connected component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub usize);

/// A sampled configuration stitched into the roadmap.
#[derive(Debug)]
pub struct RoadmapNode {
    config: Configuration,
    states: Vec<StateId>,
    component: ComponentId,
    out_neighbors: Vec<NodeId>,
    in_neighbors: Vec<NodeId>,
}

impl RoadmapNode {
    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Cached transition-graph classification, computed at insertion.
    /// Empty when the configuration classified into no state.
    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    pub fn component(&self) -> ComponentId {
        self.component
    }

    pub fn out_neighbors(&self) -> &[NodeId] {
        &self.out_neighbors
    }

    pub fn in_neighbors(&self) -> &[NodeId] {
        &self.in_neighbors
    }
}

/// A directed validated motion between two nodes.
#[derive(Debug)]
pub struct RoadmapEdge {
    from: NodeId,
    to: NodeId,
    path: Path,
}

impl RoadmapEdge {
    pub fn from(&self) -> NodeId {
        self.from
    }

    pub fn to(&self) -> NodeId {
        self.to
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Directed roadmap with mutual-reachability connected components.
pub struct Roadmap {
    graph: Arc<dyn TransitionGraph>,
    metric: Box<dyn DistanceMetric>,
    nodes: Vec<RoadmapNode>,
    edges: Vec<RoadmapEdge>,
    components: BTreeMap<ComponentId, ConnectedComponent>,
    next_component: usize,
}

impl Roadmap {
    /// Roadmap over `graph` with the euclidean metric.
    pub fn new(graph: Arc<dyn TransitionGraph>) -> Self {
        Self::with_metric(graph, Box::new(EuclideanDistance))
    }

    pub fn with_metric(graph: Arc<dyn TransitionGraph>, metric: Box<dyn DistanceMetric>) -> Self {
        Roadmap {
            graph,
            metric,
            nodes: Vec::new(),
            edges: Vec::new(),
            components: BTreeMap::new(),
            next_component: 0,
        }
    }

    pub(crate) fn graph(&self) -> &Arc<dyn TransitionGraph> {
        &self.graph
    }

    /// Insert a node for `config`, reusing the existing node if one already
    /// carries exactly this configuration. A fresh node starts as its own
    /// singleton component; a configuration that classifies into no state is
    /// kept with an empty state set.
    pub fn add_node(&mut self, config: Configuration) -> NodeId {
        if let Some(existing) = self.nodes.iter().position(|n| n.config == config) {
            return NodeId(existing);
        }
        let states = match self.graph.classify(&config) {
            Ok(states) => states,
            Err(_) => {
                debug!("inserting a configuration that belongs to no transition state");
                Vec::new()
            }
        };
        let id = NodeId(self.nodes.len());
        let component = self.fresh_component(id);
        self.nodes.push(RoadmapNode {
            config,
            states,
            component,
            out_neighbors: Vec::new(),
            in_neighbors: Vec::new(),
        });
        id
    }

    /// Insert a directed validated edge and maintain components.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, path: Path) {
        if !self.nodes[from.0].out_neighbors.contains(&to) {
            self.nodes[from.0].out_neighbors.push(to);
        }
        if !self.nodes[to.0].in_neighbors.contains(&from) {
            self.nodes[to.0].in_neighbors.push(from);
        }
        self.edges.push(RoadmapEdge { from, to, path });
        let from_cc = self.nodes[from.0].component;
        let to_cc = self.nodes[to.0].component;
        self.link_components(from_cc, to_cc);
    }

    /// Insert a node for `config` together with both directed edges to and
    /// from `near`; the reverse edge carries the time-reversed path. The new
    /// node joins `near`'s component, which keeps its id.
    pub fn add_node_and_edges(&mut self, near: NodeId, config: Configuration, path: Path) -> NodeId {
        let node = self.add_node(config);
        let reversed = path.reversed();
        self.add_edge(near, node, path);
        self.add_edge(node, near, reversed);
        node
    }

    /// Nearest node of `component` classified in `state`.
    pub fn nearest_node(
        &self,
        q: &Configuration,
        component: ComponentId,
        state: StateId,
    ) -> Option<NodeId> {
        let cc = self.components.get(&component)?;
        cc.nodes
            .iter()
            .copied()
            .filter(|n| self.nodes[n.0].states.contains(&state))
            .min_by_key(|n| OrderedFloat(self.metric.distance(q, &self.nodes[n.0].config)))
    }

    /// The `k` nearest nodes of `component`, ascending distance.
    pub fn k_nearest(&self, q: &Configuration, component: ComponentId, k: usize) -> Vec<NodeId> {
        let cc = match self.components.get(&component) {
            Some(cc) => cc,
            None => return Vec::new(),
        };
        let mut by_distance: Vec<(OrderedFloat<f64>, NodeId)> = cc
            .nodes
            .iter()
            .copied()
            .map(|n| {
                (
                    OrderedFloat(self.metric.distance(q, &self.nodes[n.0].config)),
                    n,
                )
            })
            .collect();
        by_distance.sort_by_key(|(d, _)| *d);
        by_distance.truncate(k);
        by_distance.into_iter().map(|(_, n)| n).collect()
    }

    /// Nearest node of the whole roadmap, with its distance.
    pub fn nearest(&self, q: &Configuration) -> Option<(NodeId, f64)> {
        (0..self.nodes.len())
            .map(|i| (NodeId(i), self.metric.distance(q, &self.nodes[i].config)))
            .min_by_key(|(_, d)| OrderedFloat(*d))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &RoadmapNode {
        &self.nodes[id.0]
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn configuration(&self, id: NodeId) -> &Configuration {
        &self.nodes[id.0].config
    }

    pub fn states_of(&self, id: NodeId) -> &[StateId] {
        &self.nodes[id.0].states
    }

    pub fn component_of(&self, id: NodeId) -> ComponentId {
        self.nodes[id.0].component
    }

    /// Live component ids, ascending.
    pub fn connected_components(&self) -> Vec<ComponentId> {
        self.components.keys().copied().collect()
    }

    pub fn component(&self, id: ComponentId) -> Option<&ConnectedComponent> {
        self.components.get(&id)
    }

    /// Whether the directed edge `from -> to` exists.
    pub fn is_out_neighbor(&self, from: NodeId, to: NodeId) -> bool {
        self.nodes[from.0].out_neighbors.contains(&to)
    }

    /// Whether the directed edge `to -> from` exists.
    pub fn is_in_neighbor(&self, from: NodeId, to: NodeId) -> bool {
        self.nodes[from.0].in_neighbors.contains(&to)
    }

    /// Whether a directed chain of edges leads from `from` to `to`.
    pub fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return true;
        }
        let mut visited = vec![false; self.nodes.len()];
        visited[from.0] = true;
        let mut queue = VecDeque::from([from]);
        while let Some(n) = queue.pop_front() {
            for &next in &self.nodes[n.0].out_neighbors {
                if next == to {
                    return true;
                }
                if !visited[next.0] {
                    visited[next.0] = true;
                    queue.push_back(next);
                }
            }
        }
        false
    }

    pub fn edges(&self) -> impl Iterator<Item = &RoadmapEdge> {
        self.edges.iter()
    }

    /// Path stored on the directed edge `from -> to`, if present.
    pub fn edge_path(&self, from: NodeId, to: NodeId) -> Option<&Path> {
        self.edges
            .iter()
            .find(|e| e.from == from && e.to == to)
            .map(|e| &e.path)
    }

    fn fresh_component(&mut self, node: NodeId) -> ComponentId {
        let id = ComponentId(self.next_component);
        self.next_component += 1;
        let mut cc = ConnectedComponent::default();
        cc.nodes.push(node);
        self.components.insert(id, cc);
        id
    }

    /// Account for a new directed edge between two components. The transitive
    /// reachability sets are extended first; if the edge closed a directed
    /// cycle at component level, every component on the cycle then merges.
    fn link_components(&mut self, from_cc: ComponentId, to_cc: ComponentId) {
        if from_cc == to_cc {
            return;
        }
        let closes_cycle = self.components[&to_cc].reachable_to.contains(&from_cc);
        // Everything reaching `from_cc` now reaches everything reached from
        // `to_cc`, including components off the cycle, so the extension runs
        // before any merge.
        let mut upstream = self.components[&from_cc].reachable_from.clone();
        upstream.insert(from_cc);
        let mut downstream = self.components[&to_cc].reachable_to.clone();
        downstream.insert(to_cc);
        for (id, cc) in self.components.iter_mut() {
            if upstream.contains(id) {
                cc.reachable_to.extend(downstream.iter().copied());
                cc.reachable_to.remove(id);
            }
            if downstream.contains(id) {
                cc.reachable_from.extend(upstream.iter().copied());
                cc.reachable_from.remove(id);
            }
        }
        if closes_cycle {
            // Merge ({to} + reachable from to) intersected with
            // ({from} + reaching from): exactly the components sitting on a
            // directed path from `to_cc` back to `from_cc`.
            let mut members = BTreeSet::from([from_cc, to_cc]);
            let cycle_candidates: Vec<ComponentId> =
                self.components[&to_cc].reachable_to.iter().copied().collect();
            for c in cycle_candidates {
                if c == from_cc || self.components[&from_cc].reachable_from.contains(&c) {
                    members.insert(c);
                }
            }
            // The oldest member absorbs the rest, so a pre-existing
            // component keeps its id when freshly created nodes join it.
            let survivor = members.first().copied().unwrap_or(from_cc);
            self.merge_components(survivor, &members);
        }
    }

    fn merge_components(&mut self, into: ComponentId, members: &BTreeSet<ComponentId>) {
        let mut merged_nodes: Vec<NodeId> = Vec::new();
        let mut merged_to: BTreeSet<ComponentId> = BTreeSet::new();
        let mut merged_from: BTreeSet<ComponentId> = BTreeSet::new();
        for &cc in members {
            if cc == into {
                continue;
            }
            if let Some(removed) = self.components.remove(&cc) {
                merged_nodes.extend_from_slice(&removed.nodes);
                merged_to.extend(removed.reachable_to);
                merged_from.extend(removed.reachable_from);
            }
        }
        for &node in &merged_nodes {
            self.nodes[node.0].component = into;
        }
        if let Some(target) = self.components.get_mut(&into) {
            target.nodes.extend(merged_nodes);
            target.reachable_to.extend(merged_to);
            target.reachable_from.extend(merged_from);
            for m in members {
                target.reachable_to.remove(m);
                target.reachable_from.remove(m);
            }
            target.reachable_to.remove(&into);
            target.reachable_from.remove(&into);
        }
        // Every other component now reaches `into` wherever it reached a
        // merged member.
        for (id, cc) in self.components.iter_mut() {
            if *id == into {
                continue;
            }
            rewire(&mut cc.reachable_to, members, into);
            rewire(&mut cc.reachable_from, members, into);
        }
    }
}

fn rewire(set: &mut BTreeSet<ComponentId>, members: &BTreeSet<ComponentId>, into: ComponentId) {
    let mut hit = false;
    for m in members {
        hit |= set.remove(m);
    }
    if hit {
        set.insert(into);
    }
}
