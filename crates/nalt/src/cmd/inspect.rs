use std::collections::BTreeMap;

use nalt_core::vocab::{EntryMode, EntryType, MoodKind, Polarity};
use nalt_core::{Document, SpecVersion};
use nalt_migrate::Migrator;
use serde::Serialize;

use crate::cmd::{load_document, load_registry, InspectArgs};
use crate::exit::{core_error, migrate_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

#[derive(Serialize, Debug, PartialEq)]
struct Summary {
    document_id: String,
    date: String,
    source_version: SpecVersion,
    entries: usize,
    by_type: BTreeMap<&'static str, usize>,
    by_mode: BTreeMap<&'static str, usize>,
    moods: BTreeMap<&'static str, usize>,
    relations: usize,
    tags: Vec<String>,
    signed: bool,
}

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let file = args.file.display().to_string();
    let registry = load_registry()?;
    let latest = registry
        .latest()
        .ok_or_else(|| CliError::new(INTERNAL, "no protocol versions registered"))?;
    let raw = load_document(&args.file)?;

    let migrated = Migrator::new(registry)
        .migrate(&raw, &latest.to_string())
        .map_err(|err| migrate_error(&file, err))?;
    let document = Document::from_value(&migrated.document).map_err(|err| core_error(&file, err))?;
    let summary = summarize(&document, migrated.from);

    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Table => {
            let mut table = table(vec!["FIELD", "VALUE"]);
            for (field, value) in rows(&summary) {
                table.add_row(vec![field.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (field, value) in rows(&summary) {
                println!("{field:<14} {value}");
            }
        }
    }
    Ok(SUCCESS)
}

fn summarize(document: &Document, source_version: SpecVersion) -> Summary {
    let mut by_type = BTreeMap::new();
    let mut by_mode = BTreeMap::new();
    let mut moods = BTreeMap::new();
    let mut relations = 0;
    let mut tags = Vec::new();

    for entry in &document.entries {
        *by_type.entry(entry.kind.as_str()).or_insert(0) += 1;
        *by_mode.entry(entry.mode.as_str()).or_insert(0) += 1;
        relations += entry.relations().len();
        for mood in entry.moods() {
            *moods.entry(polarity_name(&mood.kind)).or_insert(0) += 1;
        }
        for tag in entry.tags() {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags.sort();

    Summary {
        document_id: document.document_id.clone(),
        date: document.date.to_string(),
        source_version,
        entries: document.entries.len(),
        by_type,
        by_mode,
        moods,
        relations,
        tags,
        signed: document.signature().is_some(),
    }
}

fn polarity_name(kind: &str) -> &'static str {
    match kind.parse::<MoodKind>().map(|mood| mood.polarity()) {
        Ok(Polarity::Positive) => "positive",
        Ok(Polarity::Negative) => "negative",
        Ok(Polarity::Neutral) => "neutral",
        Err(_) => "other",
    }
}

fn rows(summary: &Summary) -> Vec<(&'static str, String)> {
    vec![
        ("document_id", summary.document_id.clone()),
        ("date", summary.date.clone()),
        ("source", summary.source_version.tag()),
        ("entries", summary.entries.to_string()),
        ("types", counts(&summary.by_type, EntryType::names())),
        ("modes", counts(&summary.by_mode, EntryMode::names())),
        ("moods", counts(&summary.moods, vec!["positive", "negative", "neutral", "other"])),
        ("relations", summary.relations.to_string()),
        ("tags", summary.tags.join(", ")),
        ("signed", summary.signed.to_string()),
    ]
}

/// `name=count` pairs in vocabulary order, skipping zeros.
fn counts(map: &BTreeMap<&'static str, usize>, order: Vec<&'static str>) -> String {
    order
        .into_iter()
        .filter_map(|name| map.get(name).map(|count| format!("{name}={count}")))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn summarizes_latest_document() {
        let value = json!({
            "spec_version": "nalt-protocol/1.2.0",
            "document_id": "0b7f7f7e-4a7d-4c1b-9d55-6b1f0f3c2a11",
            "date": "2025-01-15",
            "meta": {"language": "en", "timezone": "UTC"},
            "entries": [
                {
                    "entry_id": "e1", "type": "event", "mode": "morning",
                    "content_format": "text/plain", "content": "run",
                    "x_moods": [{"type": "happy", "intensity": 0.8}, {"type": "tired", "intensity": 0.3}],
                    "x_tags": ["run", "health"],
                    "x_relations": [{"type": "led_to", "target_id": "e2"}]
                },
                {
                    "entry_id": "e2", "type": "reflection", "mode": "night",
                    "content_format": "text/markdown", "content": "slept well",
                    "x_tags": ["health"]
                }
            ]
        });
        let document = Document::from_value(&value).unwrap();
        let summary = summarize(&document, SpecVersion::V1_1_1);

        assert_eq!(summary.entries, 2);
        assert_eq!(summary.by_type.get("event"), Some(&1));
        assert_eq!(summary.by_mode.get("night"), Some(&1));
        assert_eq!(summary.moods.get("positive"), Some(&1));
        assert_eq!(summary.moods.get("negative"), Some(&1));
        assert_eq!(summary.relations, 1);
        assert_eq!(summary.tags, vec!["health", "run"]);
        assert!(!summary.signed);

        let rendered = rows(&summary);
        assert_eq!(rendered[4], ("types", "event=1 reflection=1".to_string()));
    }
}
