//! Typed view of a latest-version (slim-core) document.
//!
//! Every struct keeps unrecognized fields in a flattened [`Extensions`] bag,
//! so converting a document to the typed view and back is lossless.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::extension::Extensions;
use crate::vocab::{EntryMode, EntryType, RelationType, SignatureAlg};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub spec_version: String,
    pub document_id: String,
    pub date: NaiveDate,
    pub meta: Meta,
    pub entries: Vec<Entry>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub language: String,
    pub timezone: String,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub entry_id: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub mode: EntryMode,
    pub content_format: String,
    pub content: String,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mood {
    #[serde(rename = "type")]
    pub kind: String,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(rename = "type")]
    pub kind: RelationType,
    pub target_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub alg: SignatureAlg,
    pub sig: String,
    pub public_key: String,
}

impl Document {
    /// Deserialize the typed view from a generic tree.
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn entry(&self, entry_id: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.entry_id == entry_id)
    }

    /// The `x_signature` extension, if present and well formed.
    pub fn signature(&self) -> Option<Signature> {
        extension_as(&self.extensions, "x_signature")
    }
}

impl Entry {
    pub fn relations(&self) -> Vec<Relation> {
        extension_as(&self.extensions, "x_relations").unwrap_or_default()
    }

    pub fn moods(&self) -> Vec<Mood> {
        extension_as(&self.extensions, "x_moods").unwrap_or_default()
    }

    pub fn tags(&self) -> Vec<String> {
        extension_as(&self.extensions, "x_tags").unwrap_or_default()
    }
}

fn extension_as<T: for<'de> Deserialize<'de>>(extensions: &Extensions, name: &str) -> Option<T> {
    extensions
        .get(name)
        .and_then(|value| T::deserialize(value).ok())
}
