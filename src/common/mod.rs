//! Common types, traits, and error definitions for manipulation_planning
//!
//! This module provides the foundational building blocks used across
//! the planner, the roadmap and the validation components.

pub mod error;
pub mod traits;
pub mod types;

pub use error::*;
pub use traits::*;
pub use types::*;
