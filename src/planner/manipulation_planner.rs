//! Incremental roadmap construction guided by a transition graph.
//!
//! Each planning step samples one random configuration and tries to grow
//! every connected component toward it, once per transition state. New
//! nodes are then connected across components, first among themselves and,
//! failing that, to the nearest nodes of the other components. Per-edge
//! statistics record how each extension attempt ended.

use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, trace};

use crate::common::{Configuration, PathValidator, PlanningError, PlanningResult};
use crate::graph::{EdgeId, EdgeStatisticsTable, FailureReason};
use crate::path::{Path, TIME_EPS};
use crate::planner::Problem;
use crate::roadmap::{NodeId, Roadmap};

/// Planner tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct PlannerConfig {
    /// Fraction of a partially valid extension that is kept, in (0, 1].
    /// Fully valid extensions are always kept whole.
    pub extend_step: f64,
    /// Neighbors tried per component when connecting a new node to the
    /// rest of the roadmap.
    pub k_nearest: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            extend_step: 1.0,
            k_nearest: 7,
        }
    }
}

/// RRT-style planner over a transition graph.
///
/// Owns the [`Problem`] and the [`Roadmap`] it grows. Both must have been
/// built over the same transition graph instance; construction fails with
/// [`PlanningError::GraphMismatch`] otherwise.
pub struct ManipulationPlanner {
    problem: Problem,
    roadmap: Roadmap,
    stats: EdgeStatisticsTable,
    config: PlannerConfig,
}

impl ManipulationPlanner {
    pub fn new(problem: Problem, roadmap: Roadmap) -> PlanningResult<Self> {
        Self::with_config(problem, roadmap, PlannerConfig::default())
    }

    pub fn with_config(
        problem: Problem,
        roadmap: Roadmap,
        config: PlannerConfig,
    ) -> PlanningResult<Self> {
        if !(config.extend_step > 0.0 && config.extend_step <= 1.0) {
            return Err(PlanningError::InvalidParameter(format!(
                "extend step must lie in (0, 1], got {}",
                config.extend_step
            )));
        }
        if config.k_nearest == 0 {
            return Err(PlanningError::InvalidParameter(
                "k nearest must be at least 1".to_string(),
            ));
        }
        if !Arc::ptr_eq(problem.graph(), roadmap.graph()) {
            return Err(PlanningError::GraphMismatch);
        }
        Ok(ManipulationPlanner {
            problem,
            roadmap,
            stats: EdgeStatisticsTable::new(),
            config,
        })
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn roadmap(&self) -> &Roadmap {
        &self.roadmap
    }

    /// Mutable roadmap access, used to seed start and goal configurations.
    pub fn roadmap_mut(&mut self) -> &mut Roadmap {
        &mut self.roadmap
    }

    /// One planning iteration: sample once, extend every component in
    /// every state toward the sample, then try to connect the new nodes
    /// across components.
    ///
    /// Extensions that reach a configuration already created during this
    /// step only contribute their edges, so a step never inserts two
    /// nodes with equal configurations.
    pub fn one_step(&mut self) {
        let q_rand = self.problem.sampler_mut().sample();
        let states = self.problem.graph().states();
        let components = self.roadmap.connected_components();

        let mut new_nodes: Vec<NodeId> = Vec::new();
        let mut delayed: Vec<(NodeId, Configuration, Path)> = Vec::new();
        for &component in &components {
            for &state in &states {
                let near = match self.roadmap.nearest_node(&q_rand, component, state) {
                    Some(n) => n,
                    None => continue,
                };
                let path = match self.extend(near, &q_rand) {
                    Some(p) => p,
                    None => continue,
                };
                let q_new = path.end().clone();
                if new_nodes
                    .iter()
                    .any(|&n| self.roadmap.configuration(n) == &q_new)
                {
                    delayed.push((near, q_new, path));
                } else {
                    new_nodes.push(self.roadmap.add_node_and_edges(near, q_new, path));
                }
            }
        }
        for (near, q_new, path) in delayed {
            let node = self.roadmap.add_node(q_new);
            let reversed = path.reversed();
            self.roadmap.add_edge(near, node, path);
            self.roadmap.add_edge(node, near, reversed);
        }
        trace!(
            "one step grew {} node(s), roadmap has {} node(s) in {} component(s)",
            new_nodes.len(),
            self.roadmap.node_count(),
            self.roadmap.connected_components().len()
        );

        let connections = self.try_connect_new_nodes(&new_nodes);
        if connections == 0 {
            self.try_connect_to_roadmap(&new_nodes);
        }
    }

    /// One extension attempt from `near` toward `q_rand` through a
    /// transition edge chosen at random among the edges leaving the near
    /// node's primary state.
    ///
    /// Structural dead ends (unclassified node, no outgoing edge) fail
    /// silently; past edge selection exactly one statistics record is
    /// made, whatever the outcome.
    fn extend(&mut self, near: NodeId, q_rand: &Configuration) -> Option<Path> {
        let state = self.roadmap.states_of(near).first().copied()?;
        let graph = Arc::clone(self.problem.graph());
        let edge = graph.choose_edge(state)?;
        let q_near = self.roadmap.configuration(near).clone();

        let q_proj = match graph.apply_constraint(edge, &q_near, q_rand) {
            Some(q) => q,
            None => {
                self.record_failure(edge, FailureReason::Projection);
                return None;
            }
        };
        let path = match graph.build_path(edge, &q_near, &q_proj) {
            Some(p) => p,
            None => {
                self.record_failure(edge, FailureReason::SteeringMethod);
                return None;
            }
        };

        let projected = self.problem.projector().map(|p| p.apply(&path));
        let (path, proj_shortened) = match projected {
            None => (path, false),
            Some(Some(projected)) if !projected.is_zero_length() => {
                let shortened = projected.length() < path.length() - TIME_EPS;
                (projected, shortened)
            }
            Some(_) => {
                self.record_failure(edge, FailureReason::PathProjectionZero);
                return None;
            }
        };

        let (fully_valid, valid_part) = self.problem.validator().validate(&path, false);
        if valid_part.is_zero_length() {
            self.record_failure(edge, FailureReason::PathValidationZero);
            return None;
        }
        let kept = if fully_valid || self.config.extend_step >= 1.0 {
            valid_part
        } else {
            let (t0, _) = valid_part.time_range();
            let cut = t0 + self.config.extend_step * valid_part.length();
            match valid_part.extract(t0, cut) {
                Ok(p) => p,
                Err(_) => {
                    self.record_failure(edge, FailureReason::PathProjectionShorter);
                    return None;
                }
            }
        };
        if kept.is_zero_length() {
            // The step cut of a barely valid part can collapse to zero.
            self.record_failure(edge, FailureReason::PathValidationZero);
            return None;
        }

        if proj_shortened {
            self.record_failure(edge, FailureReason::PartlyExtended);
        } else if !fully_valid {
            self.record_failure(edge, FailureReason::PathValidationShorter);
        } else {
            self.record_success(edge);
        }
        Some(kept)
    }

    /// Tries to connect this step's new nodes pairwise across components.
    /// Returns the number of pairs connected.
    fn try_connect_new_nodes(&mut self, nodes: &[NodeId]) -> usize {
        let mut connections = 0;
        for (a, b) in nodes.iter().copied().tuple_combinations::<(_, _)>() {
            if self.roadmap.component_of(a) == self.roadmap.component_of(b) {
                continue;
            }
            if self.try_connect_pair(a, b) {
                connections += 1;
            }
        }
        connections
    }

    /// Tries to connect each new node to the `k_nearest` nodes of every
    /// other component, stopping at the first success per node. Returns
    /// the number of connections made.
    fn try_connect_to_roadmap(&mut self, nodes: &[NodeId]) -> usize {
        let components = self.roadmap.connected_components();
        let mut connections = 0;
        for &node in nodes {
            let q = self.roadmap.configuration(node).clone();
            let mut connected = false;
            for &component in &components {
                if component == self.roadmap.component_of(node) {
                    continue;
                }
                for neighbor in self.roadmap.k_nearest(&q, component, self.config.k_nearest) {
                    if self.try_connect_pair(node, neighbor) {
                        connections += 1;
                        connected = true;
                        break;
                    }
                }
                if connected {
                    break;
                }
            }
        }
        connections
    }

    /// Shortcut connection between two existing nodes with the base
    /// steering method, bypassing graph-edge selection. Adds whichever
    /// directed edges are missing; the reverse edge carries the
    /// time-reversed path.
    fn try_connect_pair(&mut self, from: NodeId, to: NodeId) -> bool {
        let forward = self.roadmap.is_out_neighbor(from, to);
        let backward = self.roadmap.is_in_neighbor(from, to);
        if forward && backward {
            debug!("{:?} and {:?} are already connected", from, to);
            return false;
        }
        let q1 = self.roadmap.configuration(from).clone();
        let q2 = self.roadmap.configuration(to).clone();
        let path = match self.problem.steering().steer(&q1, &q2) {
            Some(p) => p,
            None => return false,
        };
        let projected = self.problem.projector().map(|p| p.apply(&path));
        let path = match projected {
            None => path,
            // a connection must reach its target, partial projections
            // are useless here
            Some(Some(projected)) if projected.length() >= path.length() - TIME_EPS => projected,
            Some(_) => return false,
        };
        let (valid, _) = self.problem.validator().validate(&path, false);
        if !valid {
            return false;
        }
        if !forward {
            self.roadmap.add_edge(from, to, path.clone());
        }
        if !backward {
            self.roadmap.add_edge(to, from, path.reversed());
        }
        true
    }

    fn record_failure(&mut self, edge: EdgeId, reason: FailureReason) {
        let graph = Arc::clone(self.problem.graph());
        self.stats
            .entry(edge, || graph.edge_name(edge))
            .add_failure(reason);
    }

    fn record_success(&mut self, edge: EdgeId) {
        let graph = Arc::clone(self.problem.graph());
        self.stats
            .entry(edge, || graph.edge_name(edge))
            .add_success();
    }

    /// Full per-edge statistics, including reasons the fixed-order
    /// report leaves out.
    pub fn statistics(&self) -> &EdgeStatisticsTable {
        &self.stats
    }

    /// Success count followed by the fixed-order failure counts for one
    /// edge. Edges never touched report all zeros.
    pub fn edge_stat(&self, edge: EdgeId) -> Vec<usize> {
        let mut counts = vec![0; FailureReason::REPORTED + 1];
        if let Some(stats) = self.stats.get(edge) {
            counts[0] = stats.nb_success();
            for (i, reason) in FailureReason::ALL[..FailureReason::REPORTED]
                .iter()
                .enumerate()
            {
                counts[i + 1] = stats.nb_failure(*reason);
            }
        }
        counts
    }

    /// Labels matching the layout of [`edge_stat`](Self::edge_stat).
    pub fn error_list() -> Vec<&'static str> {
        let mut labels = vec!["Success"];
        labels.extend(
            FailureReason::ALL[..FailureReason::REPORTED]
                .iter()
                .map(|r| r.label()),
        );
        labels
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::common::{ConfigurationSampler, PathProjector};
    use crate::graph::{CoordinateLock, ModeEdge, ModeGraph, TransitionGraph};
    use crate::steering::StraightLineSteering;
    use approx::assert_relative_eq;

    fn q(values: &[f64]) -> Configuration {
        Configuration::new(values.to_vec())
    }

    struct CyclingSampler {
        configs: Vec<Configuration>,
        next: usize,
    }

    impl CyclingSampler {
        fn new(configs: Vec<Configuration>) -> Self {
            CyclingSampler { configs, next: 0 }
        }
    }

    impl ConfigurationSampler for CyclingSampler {
        fn sample(&mut self) -> Configuration {
            let config = self.configs[self.next % self.configs.len()].clone();
            self.next += 1;
            config
        }
    }

    struct AlwaysValid;

    impl PathValidator for AlwaysValid {
        fn validate(&self, path: &Path, _reverse: bool) -> (bool, Path) {
            (true, path.clone())
        }
    }

    struct FnValidator<F>(F);

    impl<F> PathValidator for FnValidator<F>
    where
        F: Fn(&Path, bool) -> (bool, Path),
    {
        fn validate(&self, path: &Path, reverse: bool) -> (bool, Path) {
            (self.0)(path, reverse)
        }
    }

    struct FnProjector<F>(F);

    impl<F> PathProjector for FnProjector<F>
    where
        F: Fn(&Path) -> Option<Path>,
    {
        fn apply(&self, path: &Path) -> Option<Path> {
            (self.0)(path)
        }
    }

    fn free_graph() -> (Arc<dyn TransitionGraph>, EdgeId) {
        let mut graph = ModeGraph::new();
        let free = graph.add_state("free", |_| true);
        let edge = graph.add_edge(ModeEdge::new("loop", free, free));
        (Arc::new(graph), edge)
    }

    fn planner_with(
        graph: &Arc<dyn TransitionGraph>,
        sampler: CyclingSampler,
        base: Box<dyn PathValidator>,
        seeds: &[Configuration],
    ) -> ManipulationPlanner {
        let problem = Problem::new(
            Arc::clone(graph),
            Box::new(sampler),
            Box::new(StraightLineSteering),
            base,
        );
        let mut roadmap = Roadmap::new(Arc::clone(graph));
        for seed in seeds {
            roadmap.add_node(seed.clone());
        }
        ManipulationPlanner::new(problem, roadmap).unwrap()
    }

    #[test]
    fn test_one_step_merges_seed_components() {
        let (graph, edge) = free_graph();
        let sampler = CyclingSampler::new(vec![q(&[1.0])]);
        let mut planner = planner_with(
            &graph,
            sampler,
            Box::new(AlwaysValid),
            &[q(&[0.0]), q(&[2.0])],
        );
        let (a, b) = (NodeId(0), NodeId(1));
        assert_eq!(planner.roadmap().connected_components().len(), 2);

        planner.one_step();

        let roadmap = planner.roadmap();
        assert_eq!(roadmap.connected_components().len(), 1);
        assert!(roadmap.can_reach(a, b));
        assert!(roadmap.can_reach(b, a));
        // both components extended toward the same sample; the second
        // extension reused the first one's node through a delayed edge
        assert_eq!(roadmap.node_count(), 3);
        let middle = NodeId(2);
        assert_eq!(roadmap.configuration(middle), &q(&[1.0]));
        assert!(roadmap.is_out_neighbor(a, middle) && roadmap.is_out_neighbor(middle, a));
        assert!(roadmap.is_out_neighbor(b, middle) && roadmap.is_out_neighbor(middle, b));
        assert_eq!(planner.edge_stat(edge)[0], 2);
    }

    #[test]
    fn test_one_step_extends_every_state_of_a_component() {
        let mut graph = ModeGraph::new();
        let low = graph.add_state("low", |q: &Configuration| q.0[0] <= 2.0);
        let high = graph.add_state("high", |q: &Configuration| q.0[0] >= 2.0);
        let stay_low = graph.add_edge(
            ModeEdge::new("stay_low", low, low)
                .with_project(|_, target| Some(q(&[target.0[0].min(2.0)]))),
        );
        let stay_high = graph.add_edge(
            ModeEdge::new("stay_high", high, high)
                .with_project(|_, target| Some(q(&[target.0[0].max(2.0)]))),
        );
        let graph: Arc<dyn TransitionGraph> = Arc::new(graph);
        let problem = Problem::new(
            Arc::clone(&graph),
            Box::new(CyclingSampler::new(vec![q(&[1.0])])),
            Box::new(StraightLineSteering),
            Box::new(AlwaysValid),
        );
        let mut roadmap = Roadmap::new(Arc::clone(&graph));
        let a = roadmap.add_node(q(&[0.0]));
        roadmap.add_node_and_edges(a, q(&[4.0]), Path::straight(q(&[0.0]), q(&[4.0])));
        assert_eq!(roadmap.connected_components().len(), 1);
        let mut planner = ManipulationPlanner::new(problem, roadmap).unwrap();

        planner.one_step();

        // one component spanning two states: one extension attempt per state,
        // even though the first extension grows the component mid-step
        let attempts =
            |e: EdgeId| planner.statistics().get(e).map_or(0, |s| s.attempts());
        assert_eq!((attempts(stay_low), attempts(stay_high)), (1, 1));
        assert_eq!(planner.roadmap().node_count(), 4);
        assert_eq!(planner.roadmap().connected_components().len(), 1);
    }

    #[test]
    fn test_always_valid_never_records_validation_reasons() {
        let (graph, edge) = free_graph();
        let sampler =
            CyclingSampler::new(vec![q(&[1.0]), q(&[3.0]), q(&[5.0]), q(&[7.0])]);
        let mut planner = planner_with(
            &graph,
            sampler,
            Box::new(AlwaysValid),
            &[q(&[0.0]), q(&[2.0])],
        );
        for _ in 0..4 {
            planner.one_step();
        }
        let stats = planner.statistics().get(edge).unwrap();
        assert!(stats.nb_success() > 0);
        assert_eq!(stats.nb_failure(FailureReason::PathValidationZero), 0);
        assert_eq!(stats.nb_failure(FailureReason::PathValidationShorter), 0);
    }

    #[test]
    fn test_statistics_conservation_over_flaky_extensions() {
        let mut graph = ModeGraph::new();
        let free = graph.add_state("free", |_| true);
        let proj_calls = Arc::new(AtomicUsize::new(0));
        let pc = Arc::clone(&proj_calls);
        let sc = Arc::new(AtomicUsize::new(0));
        let steer_counter = Arc::clone(&sc);
        let edge = graph.add_edge(
            ModeEdge::new("flaky", free, free)
                .with_project(move |_, target| {
                    if pc.fetch_add(1, Ordering::SeqCst) % 3 == 2 {
                        None
                    } else {
                        Some(target.clone())
                    }
                })
                .with_steer(move |from, to| {
                    if steer_counter.fetch_add(1, Ordering::SeqCst) % 4 == 3 {
                        None
                    } else {
                        Some(Path::straight(from.clone(), to.clone()))
                    }
                }),
        );
        let graph: Arc<dyn TransitionGraph> = Arc::new(graph);
        // truncate anything longer than 1.5
        let base = FnValidator(|p: &Path, _| {
            let (t0, t1) = p.time_range();
            if t1 - t0 <= 1.5 {
                (true, p.clone())
            } else {
                (false, p.extract(t0, t0 + 1.5).unwrap())
            }
        });
        let sampler =
            CyclingSampler::new(vec![q(&[1.0]), q(&[4.0]), q(&[-2.0]), q(&[0.5])]);
        let mut planner =
            planner_with(&graph, sampler, Box::new(base), &[q(&[0.0])]);
        for _ in 0..40 {
            planner.one_step();
        }

        let stats = planner.statistics().get(edge).unwrap();
        // every attempt past edge selection calls the edge projection
        // exactly once, so the records must count the calls exactly
        assert_eq!(stats.attempts(), proj_calls.load(Ordering::SeqCst));
        let expected_projection_failures = (0..proj_calls.load(Ordering::SeqCst))
            .filter(|i| i % 3 == 2)
            .count();
        assert_eq!(
            stats.nb_failure(FailureReason::Projection),
            expected_projection_failures
        );
        assert!(stats.nb_failure(FailureReason::SteeringMethod) > 0);
        assert!(stats.nb_failure(FailureReason::PathValidationShorter) > 0);
        // no projector configured, so the report covers every attempt
        let report = planner.edge_stat(edge);
        assert_eq!(report.len(), FailureReason::REPORTED + 1);
        assert_eq!(report.iter().sum::<usize>(), stats.attempts());
    }

    #[test]
    fn test_extend_records_each_failure_reason() {
        // projection failure
        let mut graph = ModeGraph::new();
        let free = graph.add_state("free", |_| true);
        let edge = graph.add_edge(
            ModeEdge::new("blocked", free, free).with_project(|_, _| None),
        );
        let graph: Arc<dyn TransitionGraph> = Arc::new(graph);
        let sampler = CyclingSampler::new(vec![q(&[1.0])]);
        let mut planner =
            planner_with(&graph, sampler, Box::new(AlwaysValid), &[q(&[0.0])]);
        assert!(planner.extend(NodeId(0), &q(&[1.0])).is_none());
        let stats = planner.statistics().get(edge).unwrap();
        assert_eq!(stats.nb_failure(FailureReason::Projection), 1);
        assert_eq!(stats.attempts(), 1);

        // steering failure
        let mut graph = ModeGraph::new();
        let free = graph.add_state("free", |_| true);
        let edge = graph.add_edge(ModeEdge::new("stuck", free, free).with_steer(|_, _| None));
        let graph: Arc<dyn TransitionGraph> = Arc::new(graph);
        let sampler = CyclingSampler::new(vec![q(&[1.0])]);
        let mut planner =
            planner_with(&graph, sampler, Box::new(AlwaysValid), &[q(&[0.0])]);
        assert!(planner.extend(NodeId(0), &q(&[1.0])).is_none());
        let stats = planner.statistics().get(edge).unwrap();
        assert_eq!(stats.nb_failure(FailureReason::SteeringMethod), 1);
        assert_eq!(stats.attempts(), 1);
    }

    #[test]
    fn test_projector_zero_fails_and_shorter_partly_extends() {
        let (graph, edge) = free_graph();
        let sampler = CyclingSampler::new(vec![q(&[2.0])]);
        let problem = Problem::new(
            Arc::clone(&graph),
            Box::new(sampler),
            Box::new(StraightLineSteering),
            Box::new(AlwaysValid),
        )
        .with_projector(Box::new(FnProjector(|_: &Path| None)));
        let mut roadmap = Roadmap::new(Arc::clone(&graph));
        roadmap.add_node(q(&[0.0]));
        let mut planner = ManipulationPlanner::new(problem, roadmap).unwrap();
        assert!(planner.extend(NodeId(0), &q(&[2.0])).is_none());
        let stats = planner.statistics().get(edge).unwrap();
        assert_eq!(stats.nb_failure(FailureReason::PathProjectionZero), 1);

        // a projector that keeps the first half partly extends
        let (graph, edge) = free_graph();
        let sampler = CyclingSampler::new(vec![q(&[2.0])]);
        let problem = Problem::new(
            Arc::clone(&graph),
            Box::new(sampler),
            Box::new(StraightLineSteering),
            Box::new(AlwaysValid),
        )
        .with_projector(Box::new(FnProjector(|p: &Path| {
            let (t0, t1) = p.time_range();
            p.extract(t0, t0 + (t1 - t0) / 2.0).ok()
        })));
        let mut roadmap = Roadmap::new(Arc::clone(&graph));
        roadmap.add_node(q(&[0.0]));
        let mut planner = ManipulationPlanner::new(problem, roadmap).unwrap();
        let path = planner.extend(NodeId(0), &q(&[2.0])).unwrap();
        assert_relative_eq!(path.length(), 1.0, epsilon = 1e-9);
        assert_eq!(path.end(), &q(&[1.0]));
        let stats = planner.statistics().get(edge).unwrap();
        assert_eq!(stats.nb_failure(FailureReason::PartlyExtended), 1);
        assert_eq!(stats.nb_success(), 0);
        // partial extensions are invisible in the fixed-order report
        assert_eq!(planner.edge_stat(edge), vec![0; 7]);
        assert_eq!(stats.attempts(), 1);
        let labels = ManipulationPlanner::error_list();
        assert_eq!(labels.len(), planner.edge_stat(edge).len());
        assert_eq!(labels[0], "Success");
    }

    #[test]
    fn test_dead_end_state_is_silent() {
        let mut graph = ModeGraph::new();
        graph.add_state("stranded", |_| true);
        let graph: Arc<dyn TransitionGraph> = Arc::new(graph);
        let sampler = CyclingSampler::new(vec![q(&[1.0])]);
        let mut planner =
            planner_with(&graph, sampler, Box::new(AlwaysValid), &[q(&[0.0])]);
        planner.one_step();
        assert!(planner.extend(NodeId(0), &q(&[1.0])).is_none());
        assert_eq!(planner.statistics().iter().count(), 0);
    }

    #[test]
    fn test_partially_valid_extension_keeps_extend_step_fraction() {
        let (graph, edge) = free_graph();
        // valid up to x = 2, so the 0 -> 4 extension truncates there
        let base = FnValidator(|p: &Path, _| {
            let (t0, t1) = p.time_range();
            if p.eval(t1).0[0] <= 2.0 {
                (true, p.clone())
            } else {
                let cut = t0 + (2.0 - p.eval(t0).0[0]);
                (false, p.extract(t0, cut).unwrap())
            }
        });
        let sampler = CyclingSampler::new(vec![q(&[4.0])]);
        let problem = Problem::new(
            Arc::clone(&graph),
            Box::new(sampler),
            Box::new(StraightLineSteering),
            Box::new(base),
        );
        let mut roadmap = Roadmap::new(Arc::clone(&graph));
        roadmap.add_node(q(&[0.0]));
        let config = PlannerConfig {
            extend_step: 0.5,
            k_nearest: 7,
        };
        let mut planner = ManipulationPlanner::with_config(problem, roadmap, config).unwrap();
        let path = planner.extend(NodeId(0), &q(&[4.0])).unwrap();
        // half of the two units that validated
        assert_relative_eq!(path.length(), 1.0, epsilon = 1e-9);
        assert_eq!(path.end(), &q(&[1.0]));
        let stats = planner.statistics().get(edge).unwrap();
        assert_eq!(stats.nb_failure(FailureReason::PathValidationShorter), 1);
    }

    #[test]
    fn test_extend_step_cut_collapsing_to_zero_is_recorded() {
        let (graph, edge) = free_graph();
        // the valid prefix barely clears the zero-length threshold, so
        // half of it does not
        let base = FnValidator(|p: &Path, _| {
            let (t0, _) = p.time_range();
            (false, p.extract(t0, t0 + 1.8e-9).unwrap())
        });
        let problem = Problem::new(
            Arc::clone(&graph),
            Box::new(CyclingSampler::new(vec![q(&[1.0])])),
            Box::new(StraightLineSteering),
            Box::new(base),
        );
        let mut roadmap = Roadmap::new(Arc::clone(&graph));
        roadmap.add_node(q(&[0.0]));
        let config = PlannerConfig {
            extend_step: 0.5,
            k_nearest: 7,
        };
        let mut planner = ManipulationPlanner::with_config(problem, roadmap, config).unwrap();

        planner.one_step();

        // the vanishing cut counts as a zero-length validation and stores
        // neither node nor edge
        let stats = planner.statistics().get(edge).unwrap();
        assert_eq!(stats.nb_failure(FailureReason::PathValidationZero), 1);
        assert_eq!(stats.attempts(), 1);
        assert_eq!(planner.roadmap().node_count(), 1);
    }

    #[test]
    fn test_fully_valid_extension_ignores_extend_step() {
        let (graph, edge) = free_graph();
        let sampler = CyclingSampler::new(vec![q(&[1.0])]);
        let problem = Problem::new(
            Arc::clone(&graph),
            Box::new(sampler),
            Box::new(StraightLineSteering),
            Box::new(AlwaysValid),
        );
        let mut roadmap = Roadmap::new(Arc::clone(&graph));
        roadmap.add_node(q(&[0.0]));
        let config = PlannerConfig {
            extend_step: 0.5,
            k_nearest: 7,
        };
        let mut planner = ManipulationPlanner::with_config(problem, roadmap, config).unwrap();
        let path = planner.extend(NodeId(0), &q(&[1.0])).unwrap();
        assert_relative_eq!(path.length(), 1.0, epsilon = 1e-9);
        assert_eq!(path.end(), &q(&[1.0]));
        assert_eq!(planner.statistics().get(edge).unwrap().nb_success(), 1);
    }

    #[test]
    fn test_connect_pair_adds_both_directions() {
        let (graph, _) = free_graph();
        let sampler = CyclingSampler::new(vec![q(&[0.5])]);
        let mut planner = planner_with(
            &graph,
            sampler,
            Box::new(AlwaysValid),
            &[q(&[0.0]), q(&[1.0])],
        );
        let (a, b) = (NodeId(0), NodeId(1));
        assert_eq!(planner.try_connect_new_nodes(&[a, b]), 1);
        let roadmap = planner.roadmap();
        assert!(roadmap.is_out_neighbor(a, b) && roadmap.is_out_neighbor(b, a));
        let forward = roadmap.edge_path(a, b).unwrap();
        let backward = roadmap.edge_path(b, a).unwrap();
        assert_eq!(forward.initial(), &q(&[0.0]));
        assert_eq!(forward.end(), &q(&[1.0]));
        assert_eq!(backward.initial(), &q(&[1.0]));
        assert_eq!(backward.end(), &q(&[0.0]));
        assert_eq!(roadmap.connected_components().len(), 1);
        // same component now, the pair is skipped
        assert_eq!(planner.try_connect_new_nodes(&[a, b]), 0);
    }

    #[test]
    fn test_connect_to_roadmap_stops_at_first_success() {
        let (graph, _) = free_graph();
        let sampler = CyclingSampler::new(vec![q(&[0.0])]);
        let problem = Problem::new(
            Arc::clone(&graph),
            Box::new(sampler),
            Box::new(StraightLineSteering),
            Box::new(AlwaysValid),
        );
        let mut roadmap = Roadmap::new(Arc::clone(&graph));
        let a = roadmap.add_node(q(&[0.0]));
        let b1 = roadmap.add_node(q(&[10.0]));
        let b2 = roadmap.add_node(q(&[11.0]));
        let b3 = roadmap.add_node(q(&[12.0]));
        for (x, y) in [(b1, b2), (b2, b3)] {
            let path = Path::straight(
                roadmap.configuration(x).clone(),
                roadmap.configuration(y).clone(),
            );
            let reversed = path.reversed();
            roadmap.add_edge(x, y, path);
            roadmap.add_edge(y, x, reversed);
        }
        assert_eq!(roadmap.connected_components().len(), 2);
        let mut planner = ManipulationPlanner::new(problem, roadmap).unwrap();
        assert_eq!(planner.try_connect_to_roadmap(&[a]), 1);
        let roadmap = planner.roadmap();
        assert!(roadmap.is_out_neighbor(a, b1));
        assert!(!roadmap.is_out_neighbor(a, b2));
        assert_eq!(roadmap.connected_components().len(), 1);
    }

    #[test]
    fn test_connect_to_roadmap_respects_k_limit() {
        let (graph, _) = free_graph();
        let sampler = CyclingSampler::new(vec![q(&[0.0])]);
        // refuse any connection ending at x = 10 or x = 11
        let base = FnValidator(|p: &Path, _| {
            let end = p.end().0[0];
            if (end - 10.0).abs() < 1e-9 || (end - 11.0).abs() < 1e-9 {
                let (t0, _) = p.time_range();
                (false, Path::point(p.initial().clone(), t0))
            } else {
                (true, p.clone())
            }
        });
        let problem = Problem::new(
            Arc::clone(&graph),
            Box::new(sampler),
            Box::new(StraightLineSteering),
            Box::new(base),
        );
        let mut roadmap = Roadmap::new(Arc::clone(&graph));
        let a = roadmap.add_node(q(&[0.0]));
        let b1 = roadmap.add_node(q(&[10.0]));
        let b2 = roadmap.add_node(q(&[11.0]));
        let b3 = roadmap.add_node(q(&[12.0]));
        for (x, y) in [(b1, b2), (b2, b3)] {
            let path = Path::straight(
                roadmap.configuration(x).clone(),
                roadmap.configuration(y).clone(),
            );
            let reversed = path.reversed();
            roadmap.add_edge(x, y, path);
            roadmap.add_edge(y, x, reversed);
        }
        let config = PlannerConfig {
            extend_step: 1.0,
            k_nearest: 2,
        };
        let mut planner = ManipulationPlanner::with_config(problem, roadmap, config).unwrap();
        // b1 and b2 are the two nearest and both refused; b3 is beyond k
        assert_eq!(planner.try_connect_to_roadmap(&[a]), 0);
        assert_eq!(planner.roadmap().connected_components().len(), 2);
    }

    #[test]
    fn test_projected_extension_lands_in_edge_destination() {
        let mut graph = ModeGraph::new();
        let home = graph.add_state("object_home", |c| (c.0[1] - 7.0).abs() < 1e-9);
        graph.add_edge(
            ModeEdge::new("transit", home, home)
                .with_project(|reference, target| {
                    Some(q(&[target.0[0], reference.0[1]]))
                })
                .with_constraint(|| Box::new(CoordinateLock::new(vec![1], 1e-9))),
        );
        let graph: Arc<dyn TransitionGraph> = Arc::new(graph);
        let sampler = CyclingSampler::new(vec![q(&[5.0, 3.0])]);
        let mut planner =
            planner_with(&graph, sampler, Box::new(AlwaysValid), &[q(&[0.0, 7.0])]);
        planner.one_step();

        let roadmap = planner.roadmap();
        assert_eq!(roadmap.node_count(), 2);
        let new = NodeId(1);
        // the projection held the object coordinate, so the new node is
        // still classified in the edge's destination state
        assert_eq!(roadmap.configuration(new), &q(&[5.0, 7.0]));
        assert_eq!(roadmap.states_of(new), &[home]);
        let mut op = graph.path_constraint(EdgeId(0));
        op.offset_from_config(roadmap.configuration(NodeId(0)));
        assert!(op.is_satisfied(roadmap.configuration(new)));
    }

    #[test]
    fn test_construction_parameter_checks() {
        let (graph, _) = free_graph();
        let build = |extend_step: f64, k_nearest: usize| {
            let problem = Problem::new(
                Arc::clone(&graph),
                Box::new(CyclingSampler::new(vec![q(&[0.0])])),
                Box::new(StraightLineSteering),
                Box::new(AlwaysValid),
            );
            let roadmap = Roadmap::new(Arc::clone(&graph));
            ManipulationPlanner::with_config(
                problem,
                roadmap,
                PlannerConfig {
                    extend_step,
                    k_nearest,
                },
            )
        };
        assert!(matches!(
            build(0.0, 7),
            Err(PlanningError::InvalidParameter(_))
        ));
        assert!(matches!(
            build(1.5, 7),
            Err(PlanningError::InvalidParameter(_))
        ));
        assert!(matches!(
            build(1.0, 0),
            Err(PlanningError::InvalidParameter(_))
        ));
        assert!(build(1.0, 7).is_ok());
        let defaults = PlannerConfig::default();
        assert_relative_eq!(defaults.extend_step, 1.0);
        assert_eq!(defaults.k_nearest, 7);
    }

    #[test]
    fn test_mismatched_graphs_are_rejected() {
        let (graph_a, _) = free_graph();
        let (graph_b, _) = free_graph();
        let problem = Problem::new(
            graph_a,
            Box::new(CyclingSampler::new(vec![q(&[0.0])])),
            Box::new(StraightLineSteering),
            Box::new(AlwaysValid),
        );
        let roadmap = Roadmap::new(graph_b);
        assert!(matches!(
            ManipulationPlanner::new(problem, roadmap),
            Err(PlanningError::GraphMismatch)
        ));
    }
}
