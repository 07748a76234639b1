//! Collaborator interfaces consumed by the planner
//!
//! The planner core is written against these traits; concrete
//! implementations live in `sampling`, `steering`, `validation`,
//! `roadmap::metric` and `graph::constraints`.

use crate::common::types::Configuration;
use crate::path::Path;

/// Trait for random configuration sources.
pub trait ConfigurationSampler {
    /// Draw one configuration from the sampler's internal random state.
    fn sample(&mut self) -> Configuration;
}

/// Trait for direct steering between two configurations.
pub trait SteeringMethod {
    /// Build a path from `from` to `to`, or `None` if no path can be built.
    fn steer(&self, from: &Configuration, to: &Configuration) -> Option<Path>;
}

/// Trait for path validation (collision checking and the like).
pub trait PathValidator {
    /// Validate `path`. Returns whether the whole path is valid together
    /// with the longest valid part: a prefix starting at the path's start
    /// time in forward mode, a suffix ending at the path's end time in
    /// reverse mode. The returned part is never longer than the input.
    fn validate(&self, path: &Path, reverse: bool) -> (bool, Path);
}

/// Trait for continuous path projection onto a constraint manifold.
pub trait PathProjector {
    /// Project `path`. `None` on failure, otherwise a path that follows the
    /// input from its start and may be shorter than it.
    fn apply(&self, path: &Path) -> Option<Path>;
}

/// Trait for configuration-level constraints attached to paths.
///
/// An operator is re-anchored with [`offset_from_config`] so that the given
/// reference configuration satisfies it, then queried with [`is_satisfied`].
///
/// [`offset_from_config`]: ConstraintOperator::offset_from_config
/// [`is_satisfied`]: ConstraintOperator::is_satisfied
pub trait ConstraintOperator {
    /// Re-anchor the operator's right-hand side at `reference`.
    fn offset_from_config(&mut self, reference: &Configuration);

    /// Whether `q` satisfies the operator.
    fn is_satisfied(&self, q: &Configuration) -> bool;
}

/// Trait for configuration-space distance metrics.
pub trait DistanceMetric {
    fn distance(&self, a: &Configuration, b: &Configuration) -> f64;
}
