use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use nalt_core::vocab::{
    ContentFormat, EntryMode, EntryType, MoodKind, RelationType, SignatureAlg,
};
use nalt_migrate::{FixedEnv, MigrationResult, Migrator, MigratorConfig, ProvenanceMode};
use nalt_schema::{Validator, VersionRegistry};
use proptest::prelude::*;
use proptest::sample::select;
use proptest::test_runner::TestCaseError;
use serde_json::{json, Map, Value};
use uuid::Uuid;

const GENERATED_ID: &str = "0b7f7f7e-4a7d-4c1b-9d55-6b1f0f3c2a11";
const DOCUMENT_ID: &str = "6f1c1c4e-8c9a-4f4e-bb7a-1f2d3c4b5a69";

const CORE_ENTRY_FIELDS: [&str; 5] = ["entry_id", "type", "mode", "content_format", "content"];
const RELOCATED_ENTRY_FIELDS: [&str; 6] =
    ["summary", "moods", "tags", "entities", "end_date", "created_at"];

const LANGUAGES: [&str; 4] = ["en", "ja", "de", "fr"];
const TIMEZONES: [&str; 5] = [
    "UTC",
    "Asia/Tokyo",
    "America/New_York",
    "Europe/Berlin",
    "Asia/Kolkata",
];
const LEGACY_FORMATS: [&str; 8] = [
    "plain_text",
    "markdown",
    "md",
    "Markdown",
    "html",
    "json",
    "org",
    "text/plain",
];

fn registry() -> Arc<VersionRegistry> {
    Arc::new(VersionRegistry::builtin().expect("builtin registry"))
}

fn validator() -> Validator {
    Validator::new(registry())
}

fn migrator() -> Migrator {
    let config = MigratorConfig {
        provenance: ProvenanceMode::Accumulate,
        confirm: true,
    };
    let env = FixedEnv {
        now: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        document_id: Uuid::parse_str(GENERATED_ID).unwrap(),
    };
    Migrator::with_config(registry(), config).with_env(env)
}

fn migrate(migrator: &Migrator, doc: &Value, target: &str) -> Result<MigrationResult, TestCaseError> {
    migrator
        .migrate(doc, target)
        .map_err(|err| TestCaseError::fail(format!("migration to {target} failed: {err}")))
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// 1.0.0: legacy content formats, raw intensities, no `created_at`.
    Legacy,
    /// 1.1.1: MIME content formats, two-decimal intensities.
    Rich,
}

/// Random choice of which optional entry fields are present.
#[derive(Debug, Clone)]
struct EntrySeed {
    kind: &'static str,
    mode: &'static str,
    format: &'static str,
    content: String,
    summary: Option<String>,
    moods: Option<Vec<(&'static str, u32)>>,
    tags: Option<Vec<String>>,
    people: Option<Vec<String>>,
    end_after_days: Option<i64>,
    relation: Option<&'static str>,
    note: Option<String>,
    created: bool,
}

impl EntrySeed {
    fn to_value(&self, index: usize, date: NaiveDate, shape: Shape) -> Value {
        let mut entry = Map::new();
        entry.insert("entry_id".into(), json!(format!("e{index}")));
        entry.insert("type".into(), json!(self.kind));
        entry.insert("mode".into(), json!(self.mode));
        entry.insert("content_format".into(), json!(self.format));
        entry.insert("content".into(), json!(self.content));

        if let Some(summary) = &self.summary {
            entry.insert("summary".into(), json!(summary));
        }
        if let Some(moods) = &self.moods {
            let moods: Vec<Value> = moods
                .iter()
                .map(|(kind, permille)| {
                    let intensity = match shape {
                        Shape::Legacy => f64::from(*permille) / 1000.0,
                        Shape::Rich => f64::from(*permille / 10) / 100.0,
                    };
                    json!({"type": kind, "intensity": intensity})
                })
                .collect();
            entry.insert("moods".into(), Value::Array(moods));
        }
        if let Some(tags) = &self.tags {
            entry.insert("tags".into(), json!(tags));
        }
        if let Some(people) = &self.people {
            entry.insert("entities".into(), json!({"people": people}));
        }
        if let Some(days) = self.end_after_days {
            let end = date + Duration::days(days);
            entry.insert("end_date".into(), json!(end.to_string()));
        }
        if shape == Shape::Rich && self.created {
            entry.insert("created_at".into(), json!(format!("{date}T12:00:00Z")));
        }
        if let Some(relation) = self.relation {
            entry.insert(
                "x_relations".into(),
                json!([{"type": relation, "target_id": "e0"}]),
            );
        }
        if let Some(note) = &self.note {
            entry.insert("x_note".into(), json!(note));
        }
        Value::Object(entry)
    }
}

fn entry_seed(formats: Vec<&'static str>) -> impl Strategy<Value = EntrySeed> {
    (
        (
            select(EntryType::names()),
            select(EntryMode::names()),
            select(formats),
            "[a-zA-Z0-9 .,!]{0,40}",
        ),
        (
            proptest::option::of("[a-zA-Z ]{0,40}"),
            proptest::option::of(prop::collection::vec(
                (select(MoodKind::names()), 0u32..=1000),
                1..4,
            )),
            proptest::option::of(prop::collection::vec("[a-z0-9_]{1,8}", 1..=6)),
            proptest::option::of(prop::collection::vec("[A-Z][a-z]{1,8}", 0..3)),
        ),
        (
            proptest::option::of(0i64..30),
            proptest::option::of(select(RelationType::names())),
            proptest::option::of("[a-z ]{0,20}"),
            any::<bool>(),
        ),
    )
        .prop_map(
            |(
                (kind, mode, format, content),
                (summary, moods, tags, people),
                (end_after_days, relation, note, created),
            )| EntrySeed {
                kind,
                mode,
                format,
                content,
                summary,
                moods,
                tags,
                people,
                end_after_days,
                relation,
                note,
                created,
            },
        )
}

fn entries(seeds: &[EntrySeed], date: NaiveDate, shape: Shape) -> Value {
    Value::Array(
        seeds
            .iter()
            .enumerate()
            .map(|(i, seed)| seed.to_value(i, date, shape))
            .collect(),
    )
}

/// 1.0.0 document; the id is absent, a UUIDv4 or a free-form legacy id.
fn legacy_document() -> impl Strategy<Value = Value> {
    let id = prop_oneof![
        Just(None),
        Just(Some(DOCUMENT_ID.to_string())),
        "[a-z]{3,8}-[0-9]{2}".prop_map(Some),
    ];
    (
        0i64..300,
        select(LANGUAGES.to_vec()),
        select(TIMEZONES.to_vec()),
        id,
        prop::collection::vec(entry_seed(LEGACY_FORMATS.to_vec()), 1..5),
        proptest::option::of("[a-z]{1,10}"),
    )
        .prop_map(|(day, language, timezone, id, seeds, source)| {
            let date = base_date() + Duration::days(day);
            let mut doc = Map::new();
            doc.insert("spec_version".into(), json!("nalt-protocol/1.0.0"));
            if let Some(id) = id {
                doc.insert("document_id".into(), json!(id));
            }
            doc.insert("date".into(), json!(date.to_string()));
            doc.insert(
                "meta".into(),
                json!({"language": language, "timezone": timezone}),
            );
            doc.insert("entries".into(), entries(&seeds, date, Shape::Legacy));
            if let Some(source) = source {
                doc.insert("x_source".into(), json!(source));
            }
            Value::Object(doc)
        })
}

/// 1.1.1 document carrying a random subset of the fields 1.2.0 relocates.
fn rich_document() -> impl Strategy<Value = Value> {
    (
        0i64..300,
        select(LANGUAGES.to_vec()),
        select(TIMEZONES.to_vec()),
        prop::collection::vec(entry_seed(ContentFormat::names()), 1..5),
        proptest::option::of(select(SignatureAlg::names())),
        proptest::option::of(-720i64..=840),
        proptest::option::of("[a-z]{1,10}"),
    )
        .prop_map(|(day, language, timezone, seeds, alg, offset, source)| {
            let date = base_date() + Duration::days(day);
            let mut meta = Map::new();
            meta.insert("language".into(), json!(language));
            meta.insert("timezone".into(), json!(timezone));
            if let Some(offset) = offset {
                meta.insert("x_utc_offset_minutes".into(), json!(offset));
            }

            let mut doc = Map::new();
            doc.insert("spec_version".into(), json!("nalt-protocol/1.1.1"));
            doc.insert("document_id".into(), json!(DOCUMENT_ID));
            doc.insert("date".into(), json!(date.to_string()));
            doc.insert("meta".into(), Value::Object(meta));
            doc.insert("entries".into(), entries(&seeds, date, Shape::Rich));
            if let Some(alg) = alg {
                doc.insert(
                    "signature".into(),
                    json!({"alg": alg, "sig": "c2lnbmF0dXJl", "public_key": "cHVibGljLWtleQ=="}),
                );
            }
            if let Some(source) = source {
                doc.insert("x_source".into(), json!(source));
            }
            Value::Object(doc)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_sources_are_valid(legacy in legacy_document(), rich in rich_document()) {
        let validator = validator();
        let result = validator.validate(&legacy, "1.0.0").unwrap();
        prop_assert!(result.valid, "{:?}", result.errors);
        let result = validator.validate(&rich, "1.1.1").unwrap();
        prop_assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn chain_equals_composed_single_steps(doc in legacy_document()) {
        let migrator = migrator();
        let direct = migrate(&migrator, &doc, "1.2.0")?;

        let mut stepwise = doc.clone();
        for target in ["1.1.0", "1.1.1", "1.2.0"] {
            stepwise = migrate(&migrator, &stepwise, target)?.document;
        }
        prop_assert_eq!(direct.document, stepwise);
    }

    #[test]
    fn migrating_twice_is_a_no_op(doc in legacy_document()) {
        let migrator = migrator();
        for target in ["1.1.0", "1.1.1", "1.2.0"] {
            let once = migrate(&migrator, &doc, target)?;
            prop_assert!(once.migrated);
            let twice = migrate(&migrator, &once.document, target)?;
            prop_assert!(!twice.migrated);
            prop_assert!(twice.changes.is_empty());
            prop_assert_eq!(twice.document, once.document);
        }
    }

    #[test]
    fn slim_core_upgrade_is_lossless(doc in rich_document()) {
        let result = migrate(&migrator(), &doc, "1.2.0")?;
        let out = &result.document;
        let source_entries = doc["entries"].as_array().unwrap();
        prop_assert_eq!(out["entries"].as_array().unwrap().len(), source_entries.len());

        let mut expected_moves = 0;
        for (i, entry) in source_entries.iter().enumerate() {
            let migrated = &out["entries"][i];
            for field in CORE_ENTRY_FIELDS {
                prop_assert_eq!(&migrated[field], &entry[field], "/entries/{}/{}", i, field);
            }
            for field in RELOCATED_ENTRY_FIELDS {
                if let Some(value) = entry.get(field) {
                    expected_moves += 1;
                    prop_assert!(migrated.get(field).is_none());
                    prop_assert_eq!(migrated.get(format!("x_{field}").as_str()), Some(value));
                }
            }
            for (key, value) in entry.as_object().unwrap() {
                if key.starts_with("x_") {
                    prop_assert_eq!(migrated.get(key.as_str()), Some(value));
                }
            }
        }

        if let Some(signature) = doc.get("signature") {
            expected_moves += 1;
            prop_assert!(out.get("signature").is_none());
            prop_assert_eq!(out.get("x_signature"), Some(signature));
        }
        if let Some(offset) = doc["meta"].get("x_utc_offset_minutes") {
            expected_moves += 1;
            prop_assert!(out["meta"].get("x_utc_offset_minutes").is_none());
            prop_assert_eq!(out.get("x_utc_offset_minutes"), Some(offset));
        }
        prop_assert_eq!(&out["x_source"], &doc["x_source"]);
        prop_assert_eq!(result.relocations(), expected_moves);
    }
}
