//! Core types for manipulation planning

use nalgebra::DVector;

/// A point in configuration space.
///
/// Immutable once built; compared by exact componentwise value equality,
/// which is what the roadmap uses to de-duplicate nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration(pub DVector<f64>);

impl Configuration {
    /// Create a configuration from a plain vector of coordinates.
    pub fn new(coords: Vec<f64>) -> Self {
        Configuration(DVector::from_vec(coords))
    }

    /// Number of degrees of freedom.
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// Euclidean distance to another configuration.
    pub fn distance(&self, other: &Configuration) -> f64 {
        (&other.0 - &self.0).norm()
    }

    /// Linear interpolation, `s` in [0, 1].
    pub fn interpolate(&self, other: &Configuration, s: f64) -> Configuration {
        Configuration(&self.0 + (&other.0 - &self.0) * s)
    }

    /// Coordinate slice access.
    pub fn as_slice(&self) -> &[f64] {
        self.0.as_slice()
    }
}

impl From<DVector<f64>> for Configuration {
    fn from(v: DVector<f64>) -> Self {
        Configuration(v)
    }
}

impl From<Vec<f64>> for Configuration {
    fn from(v: Vec<f64>) -> Self {
        Configuration::new(v)
    }
}
