//! Distance metrics for nearest-neighbor queries

use crate::common::{Configuration, DistanceMetric};

/// Plain euclidean distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanDistance;

impl DistanceMetric for EuclideanDistance {
    fn distance(&self, a: &Configuration, b: &Configuration) -> f64 {
        a.distance(b)
    }
}

/// Euclidean distance with per-coordinate weights.
#[derive(Debug, Clone)]
pub struct WeightedDistance {
    weights: Vec<f64>,
}

impl WeightedDistance {
    pub fn new(weights: Vec<f64>) -> Self {
        WeightedDistance { weights }
    }
}

impl DistanceMetric for WeightedDistance {
    fn distance(&self, a: &Configuration, b: &Configuration) -> f64 {
        a.0.iter()
            .zip(b.0.iter())
            .zip(self.weights.iter())
            .map(|((x, y), w)| w * (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    }
}
