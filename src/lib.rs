mod constants;
mod impurity;
mod node;

// Modules
pub mod config;
pub mod data;
pub mod errors;
pub mod metrics;
pub mod prune;
pub mod reader;
pub mod serialize;
pub mod splitter;
pub mod tree;
pub mod utils;

// Individual classes, and functions
pub use config::{JsonIO, TreeConfig};
pub use data::{Attribute, AttributeKind, Instance, Schema, Value};
pub use errors::DecisionTreeError;
pub use metrics::evaluation::TestResults;
pub use node::{Condition, Node};
pub use tree::{Tree, TreeBuilder};
