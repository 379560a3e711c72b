/// Errors that prevent a validation run from starting.
///
/// Problems with the document itself are never reported here; they are
/// collected into a [`ValidationResult`](crate::ValidationResult).
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The version is well formed but has no registered contract.
    #[error("unknown protocol version: {0}")]
    UnknownVersion(String),

    /// A field constraint could not be compiled.
    #[error("failed to compile constraint for {field}: {message}")]
    CompileFailed { field: String, message: String },

    /// The version string itself is malformed.
    #[error(transparent)]
    Core(#[from] nalt_core::CoreError),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
