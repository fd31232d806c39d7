/// Errors that reject an import document as a whole.
///
/// Individual malformed drones or waypoints never produce one of these; they are dropped and the
/// rest of the batch is kept.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The file was not declared as JSON.
    #[error("only JSON files are supported (got {content_type})")]
    NotJson { content_type: String },

    /// The file content is not valid JSON.
    #[error("invalid JSON format")]
    Syntax(#[from] serde_json::Error),

    /// The top-level value is neither an array of drones nor an object keyed by drone id.
    #[error("expected an array or an object of drones, found {found}")]
    UnsupportedShape { found: &'static str },

    /// An array document contained something other than an object.
    #[error("array element {index} is {found}, expected a drone object")]
    MalformedElement { index: usize, found: &'static str },
}
