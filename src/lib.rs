//! ManipulationPlanning - transition-graph-guided motion planning
//!
//! This crate provides an incremental roadmap planner for robot
//! manipulation. A discrete transition graph describes the manipulation
//! modes (states) and the allowed transitions between them; the planner
//! grows a roadmap of validated paths whose connected components track
//! mutual reachability.

// Core modules
pub mod common;
pub mod path;

// Planning modules
pub mod graph;
pub mod planner;
pub mod roadmap;
pub mod sampling;
pub mod steering;
pub mod validation;

// Re-export common types for convenience
pub use common::{Configuration, ConfigurationSampler, ConstraintOperator, DistanceMetric};
pub use common::{PathProjector, PathValidator, SteeringMethod};
pub use common::{PlanningError, PlanningResult};
pub use graph::{EdgeId, FailureReason, ModeEdge, ModeGraph, StateId, TransitionGraph};
pub use path::Path;
pub use planner::{ManipulationPlanner, PlannerConfig, Problem};
pub use roadmap::{ComponentId, NodeId, Roadmap};
