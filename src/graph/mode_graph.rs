//! Closure-built transition graph
//!
//! `ModeGraph` is the reference [`TransitionGraph`] implementation: states
//! are membership predicates, edges carry closures for constraint
//! projection, steering and path constraints, with sensible defaults so a
//! small graph takes a handful of lines to set up.

use rand::Rng;

use super::{EdgeId, StateId, TransitionGraph};
use crate::common::{Configuration, ConstraintOperator, PlanningError, PlanningResult};
use crate::graph::constraints::Unconstrained;
use crate::path::Path;

type MembershipFn = Box<dyn Fn(&Configuration) -> bool>;
type ProjectFn = Box<dyn Fn(&Configuration, &Configuration) -> Option<Configuration>>;
type SteerFn = Box<dyn Fn(&Configuration, &Configuration) -> Option<Path>>;
type ConstraintFactory = Box<dyn Fn() -> Box<dyn ConstraintOperator>>;

struct ModeState {
    name: String,
    member: MembershipFn,
}

/// One transition with its behavior closures.
///
/// Defaults: weight 1, projection passes the target through unchanged,
/// steering builds a straight segment, the path constraint accepts
/// everything. Override what the mode semantics need:
///
/// ```
/// use manipulation_planning::{Configuration, ModeEdge, ModeGraph};
///
/// let mut graph = ModeGraph::new();
/// let free = graph.add_state("free", |_q| true);
/// let edge = graph.add_edge(
///     ModeEdge::new("transit", free, free)
///         .with_weight(2.0)
///         .with_project(|_reference, target: &Configuration| Some(target.clone())),
/// );
/// # let _ = edge;
/// ```
pub struct ModeEdge {
    name: String,
    from: StateId,
    to: StateId,
    weight: f64,
    project: ProjectFn,
    steer: SteerFn,
    constraint: ConstraintFactory,
}

impl ModeEdge {
    pub fn new(name: &str, from: StateId, to: StateId) -> Self {
        ModeEdge {
            name: name.to_string(),
            from,
            to,
            weight: 1.0,
            project: Box::new(|_reference, target| Some(target.clone())),
            steer: Box::new(|from, to| Some(Path::straight(from.clone(), to.clone()))),
            constraint: Box::new(|| Box::new(Unconstrained)),
        }
    }

    /// Edge-selection weight; edges with zero weight are never chosen.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_project(
        mut self,
        f: impl Fn(&Configuration, &Configuration) -> Option<Configuration> + 'static,
    ) -> Self {
        self.project = Box::new(f);
        self
    }

    pub fn with_steer(
        mut self,
        f: impl Fn(&Configuration, &Configuration) -> Option<Path> + 'static,
    ) -> Self {
        self.steer = Box::new(f);
        self
    }

    pub fn with_constraint(
        mut self,
        f: impl Fn() -> Box<dyn ConstraintOperator> + 'static,
    ) -> Self {
        self.constraint = Box::new(f);
        self
    }
}

/// Transition graph assembled from states and [`ModeEdge`]s.
#[derive(Default)]
pub struct ModeGraph {
    states: Vec<ModeState>,
    edges: Vec<ModeEdge>,
    outgoing: Vec<Vec<EdgeId>>,
}

impl ModeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state(
        &mut self,
        name: &str,
        member: impl Fn(&Configuration) -> bool + 'static,
    ) -> StateId {
        self.states.push(ModeState {
            name: name.to_string(),
            member: Box::new(member),
        });
        self.outgoing.push(Vec::new());
        StateId(self.states.len() - 1)
    }

    pub fn add_edge(&mut self, edge: ModeEdge) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.outgoing[edge.from.0].push(id);
        self.edges.push(edge);
        id
    }

    pub fn state_name(&self, state: StateId) -> &str {
        &self.states[state.0].name
    }
}

impl TransitionGraph for ModeGraph {
    fn states(&self) -> Vec<StateId> {
        (0..self.states.len()).map(StateId).collect()
    }

    fn classify(&self, q: &Configuration) -> PlanningResult<Vec<StateId>> {
        let states: Vec<StateId> = self
            .states
            .iter()
            .enumerate()
            .filter(|(_, s)| (s.member)(q))
            .map(|(i, _)| StateId(i))
            .collect();
        if states.is_empty() {
            Err(PlanningError::UnclassifiedConfiguration)
        } else {
            Ok(states)
        }
    }

    fn choose_edge(&self, from: StateId) -> Option<EdgeId> {
        let outgoing = self.outgoing.get(from.0)?;
        let total: f64 = outgoing.iter().map(|e| self.edges[e.0].weight).sum();
        if outgoing.is_empty() || total <= 0.0 {
            return None;
        }
        let mut pick = rand::thread_rng().gen_range(0.0..total);
        for &edge in outgoing {
            let weight = self.edges[edge.0].weight;
            if pick < weight {
                return Some(edge);
            }
            pick -= weight;
        }
        outgoing.iter().rev().find(|e| self.edges[e.0].weight > 0.0).copied()
    }

    fn edges_between(&self, from: &[StateId], to: &[StateId]) -> Vec<EdgeId> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| from.contains(&e.from) && to.contains(&e.to))
            .map(|(i, _)| EdgeId(i))
            .collect()
    }

    fn edge_name(&self, edge: EdgeId) -> String {
        self.edges[edge.0].name.clone()
    }

    fn apply_constraint(
        &self,
        edge: EdgeId,
        reference: &Configuration,
        target: &Configuration,
    ) -> Option<Configuration> {
        (self.edges[edge.0].project)(reference, target)
    }

    fn build_path(&self, edge: EdgeId, from: &Configuration, to: &Configuration) -> Option<Path> {
        (self.edges[edge.0].steer)(from, to)
    }

    fn path_constraint(&self, edge: EdgeId) -> Box<dyn ConstraintOperator> {
        (self.edges[edge.0].constraint)()
    }
}
