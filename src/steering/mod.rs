//! Steering methods.

use crate::common::{Configuration, SteeringMethod};
use crate::path::Path;

/// Connects two configurations with a straight segment.
pub struct StraightLineSteering;

impl SteeringMethod for StraightLineSteering {
    fn steer(&self, from: &Configuration, to: &Configuration) -> Option<Path> {
        Some(Path::straight(from.clone(), to.clone()))
    }
}
