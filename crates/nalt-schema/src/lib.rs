//! Version registry and multi-version validator for NALT Protocol documents.
//!
//! The [`VersionRegistry`] maps every published protocol version to its
//! [`Contract`]: required fields, closed vocabularies, ranges and formats for
//! documents, meta, entries and their nested objects. Field constraints are
//! JSON Schema fragments compiled once when the registry is built.
//!
//! The [`Validator`] walks a generic JSON tree against one contract and
//! collects every violation, in document order, instead of stopping at the
//! first one:
//!
//! ```no_run
//! use std::sync::Arc;
//! use nalt_schema::{Validator, VersionRegistry};
//!
//! let registry = Arc::new(VersionRegistry::builtin()?);
//! let validator = Validator::new(registry);
//! let doc = nalt_core::parse_document(br#"{"spec_version":"nalt-protocol/1.2.0"}"#)?;
//! let result = validator.validate(&doc, "1.2.0")?;
//! for error in &result.errors {
//!     eprintln!("{}: {}", error.path, error.message);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod contract;
pub mod error;
pub mod format;
pub mod registry;
pub mod validator;
pub mod versions;

pub use config::ValidatorConfig;
pub use contract::{Contract, FieldRule, Format, Nested, ObjectContract, ObjectKind, Presence};
pub use error::{Result, SchemaError};
pub use registry::VersionRegistry;
pub use validator::{Finding, ValidationResult, Validator};
