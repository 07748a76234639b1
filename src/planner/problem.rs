//! Planning problem definition.

use std::sync::Arc;

use crate::common::{ConfigurationSampler, PathProjector, PathValidator, SteeringMethod};
use crate::graph::TransitionGraph;
use crate::validation::GraphPathValidator;

/// Everything the planner needs besides the roadmap: the transition
/// graph, a sampler, a steering method for shortcut connections, an
/// optional path projector and the validator.
///
/// The base validator passed to [`Problem::new`] is wrapped in a
/// [`GraphPathValidator`] over the same graph, so every path the
/// planner keeps is both collision-free and graph-consistent.
pub struct Problem {
    graph: Arc<dyn TransitionGraph>,
    sampler: Box<dyn ConfigurationSampler>,
    steering: Box<dyn SteeringMethod>,
    projector: Option<Box<dyn PathProjector>>,
    validator: GraphPathValidator,
}

impl Problem {
    pub fn new(
        graph: Arc<dyn TransitionGraph>,
        sampler: Box<dyn ConfigurationSampler>,
        steering: Box<dyn SteeringMethod>,
        base_validator: Box<dyn PathValidator>,
    ) -> Self {
        let validator = GraphPathValidator::new(base_validator, Arc::clone(&graph));
        Problem {
            graph,
            sampler,
            steering,
            projector: None,
            validator,
        }
    }

    pub fn with_projector(mut self, projector: Box<dyn PathProjector>) -> Self {
        self.projector = Some(projector);
        self
    }

    pub fn graph(&self) -> &Arc<dyn TransitionGraph> {
        &self.graph
    }

    pub fn validator(&self) -> &GraphPathValidator {
        &self.validator
    }

    pub(crate) fn sampler_mut(&mut self) -> &mut dyn ConfigurationSampler {
        &mut *self.sampler
    }

    pub(crate) fn steering(&self) -> &dyn SteeringMethod {
        &*self.steering
    }

    pub(crate) fn projector(&self) -> Option<&dyn PathProjector> {
        self.projector.as_deref()
    }
}
