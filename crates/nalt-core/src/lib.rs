//! Shared data model for NALT Protocol diary documents.
//!
//! Documents are handled as generic JSON trees ([`serde_json::Value`]) by the
//! validator and migrator. This crate provides the pieces both sides agree on:
//!
//! - [`SpecVersion`]: the `nalt-protocol/<semver>` tag and its total order
//! - [`Pointer`]: JSON-pointer locators used in findings and change reports
//! - [`vocab`]: the closed vocabularies (entry type, mode, content format, ...)
//! - [`model`]: a typed view of latest-version documents with extension bags

pub mod error;
pub mod extension;
pub mod model;
pub mod pointer;
pub mod version;
pub mod vocab;

pub use error::{CoreError, Result};
pub use extension::{is_extension, Extensions, EXTENSION_PREFIX};
pub use model::{Document, Entry, Meta, Mood, Relation, Signature};
pub use pointer::{Pointer, Segment};
pub use version::{SpecVersion, PROTOCOL_PREFIX};

/// Decode raw document bytes as UTF-8 JSON.
///
/// This is the caller-level parse step; failures here never reach the
/// validator.
pub fn parse_document(bytes: &[u8]) -> Result<serde_json::Value> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_document_accepts_utf8_json() {
        let value = parse_document("{\"content\":\"日記\"}".as_bytes()).unwrap();
        assert_eq!(value["content"], "日記");
    }

    #[test]
    fn parse_document_rejects_malformed_input() {
        assert!(matches!(
            parse_document(b"{\"entries\": ["),
            Err(CoreError::Parse(_))
        ));
        assert!(matches!(
            parse_document(&[0x7b, 0xff, 0x7d]),
            Err(CoreError::Parse(_))
        ));
    }
}
