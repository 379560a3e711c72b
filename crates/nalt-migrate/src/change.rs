use serde::Serialize;

/// One field-level edit made by a migration step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldChange {
    /// The value now lives under a new key; nothing was copied.
    Moved { from: String, to: String },
    Added { path: String },
    Removed { path: String },
    /// Same key, normalized value.
    Rewritten {
        path: String,
        before: String,
        after: String,
    },
}

impl FieldChange {
    pub fn is_relocation(&self) -> bool {
        matches!(self, FieldChange::Moved { .. })
    }
}
