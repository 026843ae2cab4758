pub mod builder;
pub mod predict;
pub mod tree;

pub use builder::TreeBuilder;
pub use tree::Tree;
