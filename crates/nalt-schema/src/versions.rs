//! Built-in contracts for every published protocol version.
//!
//! Adding a version means appending one constructor here and registering it
//! in [`builtin_contracts`].

use nalt_core::vocab::{
    ContentFormat, EntryMode, EntryType, MoodKind, RelationType, SignatureAlg,
};
use nalt_core::SpecVersion;
use serde_json::{json, Value};

use crate::contract::{Contract, FieldRule, Format, ObjectKind};
use crate::error::Result;

/// Largest summary length, in characters.
pub const SUMMARY_MAX_CHARS: u64 = 140;
pub const TAGS_MIN: u64 = 1;
pub const TAGS_MAX: u64 = 6;
pub const TAG_PATTERN: &str = "^[a-z0-9_]+$";
pub const LANGUAGE_PATTERN: &str = "^[a-z]{2}$";
/// Bounds of `meta.x_utc_offset_minutes` (UTC-12:00 to UTC+14:00).
pub const UTC_OFFSET_MIN: i64 = -720;
pub const UTC_OFFSET_MAX: i64 = 840;

pub fn builtin_contracts() -> Result<Vec<Contract>> {
    Ok(vec![v1_0_0()?, v1_1_0()?, v1_1_1()?, v1_2_0()?])
}

fn string() -> Value {
    json!({"type": "string"})
}

fn non_empty_string() -> Value {
    json!({"type": "string", "minLength": 1})
}

fn object() -> Value {
    json!({"type": "object"})
}

fn array() -> Value {
    json!({"type": "array"})
}

fn one_of(names: Vec<&'static str>) -> Value {
    json!({"type": "string", "enum": names})
}

fn spec_version(version: SpecVersion) -> FieldRule {
    FieldRule::required("spec_version", json!({"type": "string", "const": version.tag()}))
}

fn entries() -> FieldRule {
    FieldRule::required("entries", json!({"type": "array", "minItems": 1})).each(ObjectKind::Entry)
}

fn meta_rules(with_offset: bool) -> Vec<FieldRule> {
    let mut rules = vec![
        FieldRule::required(
            "language",
            json!({"type": "string", "pattern": LANGUAGE_PATTERN}),
        ),
        FieldRule::required("timezone", string()).format(Format::Timezone),
    ];
    if with_offset {
        rules.push(FieldRule::optional(
            "x_utc_offset_minutes",
            json!({"type": "integer", "minimum": UTC_OFFSET_MIN, "maximum": UTC_OFFSET_MAX}),
        ));
    }
    rules
}

fn core_entry_rules(content_format: Value) -> Vec<FieldRule> {
    vec![
        FieldRule::required("entry_id", non_empty_string()),
        FieldRule::required("type", one_of(EntryType::names())),
        FieldRule::required("mode", one_of(EntryMode::names())),
        FieldRule::required("content_format", content_format),
        FieldRule::required("content", string()),
    ]
}

/// Entry fields that were core before the slim-core release.
fn rich_entry_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::optional(
            "summary",
            json!({"type": "string", "maxLength": SUMMARY_MAX_CHARS}),
        ),
        FieldRule::optional("moods", array()).each(ObjectKind::Mood),
        FieldRule::optional(
            "tags",
            json!({
                "type": "array",
                "minItems": TAGS_MIN,
                "maxItems": TAGS_MAX,
                "items": {"type": "string", "pattern": TAG_PATTERN}
            }),
        ),
        FieldRule::optional(
            "entities",
            json!({
                "type": "object",
                "additionalProperties": {"type": "array", "items": {"type": "string"}}
            }),
        ),
        FieldRule::optional("end_date", string()).format(Format::Date),
    ]
}

/// Extension fields every version names explicitly.
fn named_extension_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::optional("x_relations", array()).each(ObjectKind::Relation),
        FieldRule::optional("x_due_date", string()).format(Format::Date),
    ]
}

fn mood_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::required("type", one_of(MoodKind::names())),
        FieldRule::required(
            "intensity",
            json!({"type": "number", "minimum": 0, "maximum": 1}),
        ),
    ]
}

fn relation_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::required("type", one_of(RelationType::names())),
        FieldRule::required("target_id", non_empty_string()),
    ]
}

fn signature_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::required("alg", one_of(SignatureAlg::names())),
        FieldRule::required("sig", non_empty_string()),
        FieldRule::required("public_key", non_empty_string()),
    ]
}

fn merge(groups: Vec<Vec<FieldRule>>) -> Vec<FieldRule> {
    groups.into_iter().flatten().collect()
}

fn content_formats() -> Value {
    one_of(ContentFormat::names())
}

/// 1.0.0: free-text content formats, strict entry and meta objects.
fn v1_0_0() -> Result<Contract> {
    let version = SpecVersion::V1_0_0;
    let entry = merge(vec![
        core_entry_rules(string()),
        rich_entry_rules(),
        named_extension_rules(),
    ]);

    Contract::builder(version)
        .object(
            ObjectKind::Document,
            false,
            vec![
                spec_version(version),
                FieldRule::recommended("document_id", string()).format(Format::UuidV4),
                FieldRule::required("date", string()).format(Format::Date),
                FieldRule::required("meta", object()).object(ObjectKind::Meta),
                entries(),
            ],
        )
        .object(ObjectKind::Meta, true, meta_rules(false))
        .object(ObjectKind::Entry, true, entry)
        .object(ObjectKind::Mood, false, mood_rules())
        .object(ObjectKind::Relation, false, relation_rules())
        .build()
}

/// 1.1.0: MIME content formats, required UUID, document timestamp and signature.
fn v1_1_0() -> Result<Contract> {
    let version = SpecVersion::V1_1_0;
    let entry = merge(vec![
        core_entry_rules(content_formats()),
        rich_entry_rules(),
        named_extension_rules(),
    ]);

    Contract::builder(version)
        .object(
            ObjectKind::Document,
            false,
            vec![
                spec_version(version),
                FieldRule::required("document_id", string()).format(Format::UuidV4),
                FieldRule::required("date", string()).format(Format::Date),
                FieldRule::recommended("timestamp", string()).format(Format::DateTime),
                FieldRule::required("meta", object()).object(ObjectKind::Meta),
                entries(),
                FieldRule::optional("signature", object()).object(ObjectKind::Signature),
            ],
        )
        .object(ObjectKind::Meta, false, meta_rules(true))
        .object(ObjectKind::Entry, false, entry)
        .object(ObjectKind::Mood, false, mood_rules())
        .object(ObjectKind::Relation, false, relation_rules())
        .object(ObjectKind::Signature, false, signature_rules())
        .intensity_decimals(2)
        .build()
}

/// 1.1.1: document timestamp replaced by per-entry `created_at`.
fn v1_1_1() -> Result<Contract> {
    let version = SpecVersion::V1_1_1;
    let entry = merge(vec![
        core_entry_rules(content_formats()),
        rich_entry_rules(),
        vec![FieldRule::recommended("created_at", string()).format(Format::DateTime)],
        named_extension_rules(),
    ]);

    Contract::builder(version)
        .object(
            ObjectKind::Document,
            false,
            vec![
                spec_version(version),
                FieldRule::required("document_id", string()).format(Format::UuidV4),
                FieldRule::required("date", string()).format(Format::Date),
                FieldRule::required("meta", object()).object(ObjectKind::Meta),
                entries(),
                FieldRule::optional("signature", object()).object(ObjectKind::Signature),
            ],
        )
        .object(ObjectKind::Meta, false, meta_rules(true))
        .object(ObjectKind::Entry, false, entry)
        .object(ObjectKind::Mood, false, mood_rules())
        .object(ObjectKind::Relation, false, relation_rules())
        .object(ObjectKind::Signature, false, signature_rules())
        .intensity_decimals(2)
        .build()
}

/// 1.2.0: slim core. Five entry fields; everything else is an extension.
fn v1_2_0() -> Result<Contract> {
    let version = SpecVersion::V1_2_0;
    let entry = merge(vec![core_entry_rules(content_formats()), named_extension_rules()]);

    Contract::builder(version)
        .object(
            ObjectKind::Document,
            false,
            vec![
                spec_version(version),
                FieldRule::required("document_id", string()).format(Format::UuidV4),
                FieldRule::required("date", string()).format(Format::Date),
                FieldRule::required("meta", object()).object(ObjectKind::Meta),
                entries(),
            ],
        )
        .object(ObjectKind::Meta, false, meta_rules(false))
        .object(ObjectKind::Entry, false, entry)
        .object(ObjectKind::Relation, false, relation_rules())
        .end_date_field("x_end_date")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_contracts_compile_in_order() {
        let contracts = builtin_contracts().unwrap();
        let versions: Vec<SpecVersion> = contracts.iter().map(Contract::version).collect();
        assert_eq!(
            versions,
            vec![
                SpecVersion::V1_0_0,
                SpecVersion::V1_1_0,
                SpecVersion::V1_1_1,
                SpecVersion::V1_2_0
            ]
        );
    }

    #[test]
    fn slim_core_entry_has_five_core_fields() {
        let contract = v1_2_0().unwrap();
        let entry = contract.object(ObjectKind::Entry).unwrap();
        let names: Vec<&str> = entry.fields().iter().map(FieldRule::name).collect();
        assert_eq!(
            names,
            vec![
                "entry_id",
                "type",
                "mode",
                "content_format",
                "content",
                "x_relations",
                "x_due_date"
            ]
        );
        assert!(contract.object(ObjectKind::Mood).is_none());
        assert_eq!(contract.end_date_field(), "x_end_date");
    }

    #[test]
    fn only_first_version_is_strict() {
        for contract in builtin_contracts().unwrap() {
            let strict = contract.version() == SpecVersion::V1_0_0;
            assert_eq!(contract.object(ObjectKind::Entry).unwrap().is_strict(), strict);
            assert_eq!(contract.object(ObjectKind::Meta).unwrap().is_strict(), strict);
            assert!(!contract.object(ObjectKind::Document).unwrap().is_strict());
        }
    }
}
