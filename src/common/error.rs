//! Error types for manipulation_planning

use thiserror::Error;

/// Main error type for the planning crate.
#[derive(Error, Debug)]
pub enum PlanningError {
    /// A configuration matched no transition-graph state.
    #[error("configuration belongs to no transition state")]
    UnclassifiedConfiguration,
    /// A path sub-range was requested outside the path's time range.
    #[error("interval [{from:.4}, {to:.4}] lies outside the path range [{start:.4}, {end:.4}]")]
    IntervalOutOfRange {
        from: f64,
        to: f64,
        start: f64,
        end: f64,
    },
    /// Planner, problem and roadmap must share one transition graph.
    #[error("planner and roadmap are built over different transition graphs")]
    GraphMismatch,
    /// Invalid construction parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for planning operations.
pub type PlanningResult<T> = Result<T, PlanningError>;
