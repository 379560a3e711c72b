use nalt_core::SpecVersion;
use nalt_schema::{Finding, SchemaError};

/// Errors that abort a migration. No partial document is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Source or target version is missing, malformed or unregistered.
    #[error("unknown protocol version: {0}")]
    UnknownVersion(String),

    /// Only forward migration is implemented.
    #[error("downgrade from {from} to {to} is not supported")]
    Downgrade { from: SpecVersion, to: SpecVersion },

    /// Two adjacent registered versions have no step between them.
    #[error("no migration step registered from {from} to {to}")]
    MissingStep { from: SpecVersion, to: SpecVersion },

    /// A single step could not produce a well-formed document.
    #[error("migration step {from} -> {to} failed: {reason}")]
    Step {
        from: SpecVersion,
        to: SpecVersion,
        reason: String,
    },

    /// The migrated document failed confirmation against the target contract.
    #[error("migrated document is not valid {version} ({} errors)", .errors.len())]
    TargetInvalid {
        version: SpecVersion,
        errors: Vec<Finding>,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

pub type Result<T> = std::result::Result<T, MigrateError>;
