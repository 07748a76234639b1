//! The manipulation planner and its problem definition.

pub mod manipulation_planner;
pub mod problem;

pub use manipulation_planner::{ManipulationPlanner, PlannerConfig};
pub use problem::Problem;
