//! Errors
//!
//! Custom error types used throughout the `dectree` crate.
use thiserror::Error;

/// Errors that can occur while building, pruning, using or persisting a tree.
#[derive(Debug, Error)]
pub enum DecisionTreeError {
    /// The class attribute is not usable, e.g. it is continuous or has no values.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// Build was called without a single instance carrying a class value.
    #[error("No valid instances, every instance has a missing class value.")]
    NoValidInstances,
    /// An internal invariant failed while searching for a split.
    #[error("Split computation failed for attribute {0}: {1}")]
    SplitComputationFailure(String, String),
    /// An internal node had no child able to receive an instance.
    #[error("Unable to route instance at node {0}: {1}")]
    PredictionRoutingFailure(usize, String),
    /// A persisted tree could not be turned back into a tree.
    #[error("Unable to deserialize tree: {0}")]
    DeserializationFailure(String),
    /// A raw value could not be parsed for the given attribute.
    #[error("Invalid value '{0}' for attribute {1}: {2}")]
    ParseValue(String, String, String),
    /// Unable to write model or configuration.
    #[error("Unable to write to file: {0}")]
    UnableToWrite(String),
    /// Unable to read model, configuration or data.
    #[error("Unable to read from file {0}")]
    UnableToRead(String),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
}
