//! Error types for drone records.

/// Indicates that a drone could not be created because its name is blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("drone name must not be empty")]
pub struct EmptyDroneName;
