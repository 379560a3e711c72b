//! Validation and forward migration for NALT Protocol diary documents.
//!
//! # Crate Structure
//!
//! - [`model`]: shared data model, version tags and vocabularies
//! - [`schema`]: version registry and multi-version validator
//! - [`migrate`]: forward migration chain between adjacent versions
//! - [`batch`]: bounded worker pool for processing many documents

/// Re-export data model types.
pub mod model {
    pub use nalt_core::*;
}

/// Re-export registry and validator types.
pub mod schema {
    pub use nalt_schema::*;
}

/// Re-export migrator types.
pub mod migrate {
    pub use nalt_migrate::*;
}

pub mod batch;
