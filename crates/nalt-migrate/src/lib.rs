//! Forward migration of NALT Protocol documents.
//!
//! A [`Migrator`] walks the registry's version order from a document's
//! declared `spec_version` to a target version, applying one [`Step`] per
//! adjacent pair. Steps work on a private copy, so a failure anywhere in the
//! chain leaves no partially migrated output.
//!
//! ```no_run
//! use std::sync::Arc;
//! use nalt_migrate::Migrator;
//! use nalt_schema::VersionRegistry;
//!
//! let registry = Arc::new(VersionRegistry::builtin()?);
//! let migrator = Migrator::new(registry);
//! let doc = nalt_core::parse_document(&std::fs::read("diary.json")?)?;
//! let result = migrator.migrate(&doc, "1.2.0")?;
//! println!("{} field relocations", result.relocations());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod change;
pub mod config;
pub mod env;
pub mod error;
pub mod migrator;
pub mod relocate;
pub mod step;

pub use change::FieldChange;
pub use config::{MigratorConfig, ProvenanceMode};
pub use env::{FixedEnv, MigrationEnv, SystemEnv};
pub use error::{MigrateError, Result};
pub use migrator::{AppliedStep, MigrationResult, Migrator};
pub use relocate::{Relocation, Scope};
pub use step::{builtin_steps, Stamp, Step, StepContext, StepOutcome};
