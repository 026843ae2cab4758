//! Metrics
//!
//! Evaluation of a fitted tree over labeled instances.
pub mod evaluation;

pub use evaluation::{evaluate_node, pessimistic_error, TestResults};
