//! Path validation
//!
//! [`DiscretizedPathValidator`] is the base collision validator;
//! [`GraphPathValidator`] wraps a base validator and repairs
//! transition-graph inconsistencies introduced by truncation.

pub mod discretized;
pub mod graph_validator;

pub use discretized::DiscretizedPathValidator;
pub use graph_validator::GraphPathValidator;
