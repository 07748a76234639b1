//! Configuration samplers.

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::common::{Configuration, ConfigurationSampler, PlanningError, PlanningResult};

/// Samples configurations uniformly inside an axis-aligned box.
pub struct UniformSampler {
    lower: DVector<f64>,
    upper: DVector<f64>,
    rng: StdRng,
}

impl UniformSampler {
    pub fn new(lower: Configuration, upper: Configuration) -> PlanningResult<Self> {
        Self::build(lower, upper, StdRng::from_entropy())
    }

    /// Same bounds, reproducible stream.
    pub fn seeded(lower: Configuration, upper: Configuration, seed: u64) -> PlanningResult<Self> {
        Self::build(lower, upper, StdRng::seed_from_u64(seed))
    }

    fn build(lower: Configuration, upper: Configuration, rng: StdRng) -> PlanningResult<Self> {
        if lower.dim() != upper.dim() {
            return Err(PlanningError::InvalidParameter(
                "sampling bounds must have the same dimension".to_string(),
            ));
        }
        if lower.0.iter().zip(upper.0.iter()).any(|(l, u)| l > u) {
            return Err(PlanningError::InvalidParameter(
                "lower sampling bound exceeds upper bound".to_string(),
            ));
        }
        Ok(UniformSampler {
            lower: lower.0,
            upper: upper.0,
            rng,
        })
    }
}

impl ConfigurationSampler for UniformSampler {
    fn sample(&mut self) -> Configuration {
        let values = DVector::from_iterator(
            self.lower.len(),
            self.lower
                .iter()
                .zip(self.upper.iter())
                .map(|(&l, &u)| self.rng.gen_range(l..=u)),
        );
        Configuration(values)
    }
}

/// Samples configurations from an axis-aligned normal distribution
/// around a center configuration.
pub struct GaussianSampler {
    center: DVector<f64>,
    normals: Vec<Normal<f64>>,
    rng: StdRng,
}

impl GaussianSampler {
    pub fn new(center: Configuration, stddev: &[f64]) -> PlanningResult<Self> {
        Self::build(center, stddev, StdRng::from_entropy())
    }

    pub fn seeded(center: Configuration, stddev: &[f64], seed: u64) -> PlanningResult<Self> {
        Self::build(center, stddev, StdRng::seed_from_u64(seed))
    }

    fn build(center: Configuration, stddev: &[f64], rng: StdRng) -> PlanningResult<Self> {
        if center.dim() != stddev.len() {
            return Err(PlanningError::InvalidParameter(
                "standard deviation dimension does not match the center".to_string(),
            ));
        }
        let normals = stddev
            .iter()
            .map(|&s| {
                Normal::new(0.0, s).map_err(|_| {
                    PlanningError::InvalidParameter(format!(
                        "invalid standard deviation {s}"
                    ))
                })
            })
            .collect::<PlanningResult<Vec<_>>>()?;
        Ok(GaussianSampler {
            center: center.0,
            normals,
            rng,
        })
    }
}

impl ConfigurationSampler for GaussianSampler {
    fn sample(&mut self) -> Configuration {
        let values = DVector::from_iterator(
            self.center.len(),
            self.center
                .iter()
                .zip(self.normals.iter())
                .map(|(&c, normal)| c + normal.sample(&mut self.rng)),
        );
        Configuration(values)
    }
}
