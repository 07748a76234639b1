//! Reference constraint operators

use crate::common::{Configuration, ConstraintOperator};

/// Operator satisfied by every configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconstrained;

impl ConstraintOperator for Unconstrained {
    fn offset_from_config(&mut self, _reference: &Configuration) {}

    fn is_satisfied(&self, _q: &Configuration) -> bool {
        true
    }
}

/// Holds a subset of coordinates fixed at an anchor value.
///
/// This is the manipulation archetype: while the robot moves freely, the
/// coordinates of whatever it is not holding must stay put. The anchor is
/// captured from the reference configuration on `offset_from_config`; an
/// operator that was never anchored constrains nothing.
#[derive(Debug, Clone)]
pub struct CoordinateLock {
    dims: Vec<usize>,
    tolerance: f64,
    anchor: Option<Vec<f64>>,
}

impl CoordinateLock {
    pub fn new(dims: Vec<usize>, tolerance: f64) -> Self {
        CoordinateLock {
            dims,
            tolerance,
            anchor: None,
        }
    }
}

impl ConstraintOperator for CoordinateLock {
    fn offset_from_config(&mut self, reference: &Configuration) {
        self.anchor = Some(self.dims.iter().map(|&d| reference.0[d]).collect());
    }

    fn is_satisfied(&self, q: &Configuration) -> bool {
        match &self.anchor {
            None => true,
            Some(anchor) => self
                .dims
                .iter()
                .zip(anchor.iter())
                .all(|(&d, &value)| (q.0[d] - value).abs() <= self.tolerance),
        }
    }
}
