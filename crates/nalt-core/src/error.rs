/// Errors raised before a document reaches the validator or migrator.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The input is not UTF-8 JSON.
    #[error("document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A version string does not have the `[nalt-protocol/]MAJOR.MINOR.PATCH` shape.
    #[error("malformed spec version: {0:?}")]
    InvalidVersion(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
