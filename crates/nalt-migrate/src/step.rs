//! Single-version migration steps and the built-in upgrade chain.

use chrono::{NaiveDate, Offset, TimeZone};
use chrono_tz::Tz;
use nalt_core::vocab::ContentFormat;
use nalt_core::{Pointer, SpecVersion};
use nalt_schema::format::{is_uuid_v4, parse_date, parse_timezone};
use serde_json::{json, Map, Value};

use crate::change::FieldChange;
use crate::config::ProvenanceMode;
use crate::env::MigrationEnv;
use crate::relocate::{Relocation, Scope};

/// Provenance object written by the first upgrade.
pub const MIGRATION_STAMP: &str = "x_migration";
/// Provenance timestamp written by later upgrades.
pub const MIGRATED_AT_STAMP: &str = "x_migrated_at";
/// One `{from, to, migrated_at}` record per applied step.
pub const MIGRATION_HISTORY: &str = "x_migration_history";

pub const UTC_OFFSET_FIELD: &str = "x_utc_offset_minutes";
/// Where a pre-1.1.0 `document_id` that is not a UUIDv4 is kept.
pub const LEGACY_DOCUMENT_ID: &str = "x_legacy_document_id";
/// Decimal places `moods[].intensity` is rounded to.
pub const INTENSITY_DECIMALS: u32 = 2;

/// Fields that leave the core in 1.2.0, as extension renames.
pub const SLIM_CORE_RELOCATIONS: &[Relocation] = &[
    Relocation::within(Scope::Document, "signature", "x_signature"),
    Relocation::across(Scope::Meta, UTC_OFFSET_FIELD, Scope::Document, UTC_OFFSET_FIELD),
    Relocation::within(Scope::Entries, "summary", "x_summary"),
    Relocation::within(Scope::Entries, "moods", "x_moods"),
    Relocation::within(Scope::Entries, "tags", "x_tags"),
    Relocation::within(Scope::Entries, "entities", "x_entities"),
    Relocation::within(Scope::Entries, "end_date", "x_end_date"),
    Relocation::within(Scope::Entries, "created_at", "x_created_at"),
];

/// Shape of the provenance a step leaves on its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    /// `x_migration: {from, to, migrated_at}`.
    Migration,
    /// `x_migrated_at: "<timestamp>"`.
    MigratedAt,
}

/// Mutable state handed to a step's transform.
pub struct StepContext<'a> {
    pub env: &'a dyn MigrationEnv,
    /// Generation time shared by every value this step writes.
    pub timestamp: String,
    pub changes: Vec<FieldChange>,
    pub warnings: Vec<String>,
}

impl<'a> StepContext<'a> {
    fn new(env: &'a dyn MigrationEnv) -> Self {
        Self {
            env,
            timestamp: env.timestamp(),
            changes: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn added(&mut self, path: Pointer) {
        self.changes.push(FieldChange::Added {
            path: path.to_string(),
        });
    }

    pub fn warn(&mut self, message: String) {
        tracing::warn!(%message, "lossy migration");
        self.warnings.push(message);
    }
}

/// Field edits performed before the step's relocations run.
pub type Transform = fn(&mut Map<String, Value>, &mut StepContext<'_>) -> Result<(), String>;

/// What one step did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    pub changes: Vec<FieldChange>,
    pub warnings: Vec<String>,
}

/// Transformation between two adjacent versions.
#[derive(Debug, Clone)]
pub struct Step {
    from: SpecVersion,
    to: SpecVersion,
    transform: Transform,
    relocations: Vec<Relocation>,
    stamp: Stamp,
}

impl Step {
    pub fn new(from: SpecVersion, to: SpecVersion, transform: Transform) -> Self {
        Self {
            from,
            to,
            transform,
            relocations: Vec::new(),
            stamp: Stamp::MigratedAt,
        }
    }

    pub fn relocate(mut self, relocations: &[Relocation]) -> Self {
        self.relocations.extend_from_slice(relocations);
        self
    }

    pub fn stamp(mut self, stamp: Stamp) -> Self {
        self.stamp = stamp;
        self
    }

    pub fn from(&self) -> SpecVersion {
        self.from
    }

    pub fn to(&self) -> SpecVersion {
        self.to
    }

    pub fn relocations(&self) -> &[Relocation] {
        &self.relocations
    }

    /// Run transform, relocations, version bump and provenance, in that order.
    pub fn apply(
        &self,
        document: &mut Map<String, Value>,
        env: &dyn MigrationEnv,
        provenance: ProvenanceMode,
    ) -> Result<StepOutcome, String> {
        let mut ctx = StepContext::new(env);
        (self.transform)(document, &mut ctx)?;
        for relocation in &self.relocations {
            relocation.apply(document, &mut ctx.changes)?;
        }
        document.insert("spec_version".to_string(), json!(self.to.tag()));
        self.write_provenance(document, &ctx.timestamp, provenance)?;

        Ok(StepOutcome {
            changes: ctx.changes,
            warnings: ctx.warnings,
        })
    }

    fn write_provenance(
        &self,
        document: &mut Map<String, Value>,
        timestamp: &str,
        provenance: ProvenanceMode,
    ) -> Result<(), String> {
        let record = json!({
            "from": self.from.tag(),
            "to": self.to.tag(),
            "migrated_at": timestamp,
        });

        document.shift_remove(MIGRATION_STAMP);
        document.shift_remove(MIGRATED_AT_STAMP);
        match self.stamp {
            Stamp::Migration => document.insert(MIGRATION_STAMP.to_string(), record.clone()),
            Stamp::MigratedAt => document.insert(MIGRATED_AT_STAMP.to_string(), json!(timestamp)),
        };

        if provenance == ProvenanceMode::Accumulate {
            let history = document
                .entry(MIGRATION_HISTORY)
                .or_insert_with(|| Value::Array(Vec::new()));
            match history.as_array_mut() {
                Some(records) => records.push(record),
                None => return Err(format!("/{MIGRATION_HISTORY} is not an array")),
            }
        }
        Ok(())
    }
}

/// The upgrade chain between every published version.
pub fn builtin_steps() -> Vec<Step> {
    vec![
        Step::new(SpecVersion::V1_0_0, SpecVersion::V1_1_0, upgrade_to_1_1_0)
            .stamp(Stamp::Migration),
        Step::new(SpecVersion::V1_1_0, SpecVersion::V1_1_1, upgrade_to_1_1_1),
        Step::new(SpecVersion::V1_1_1, SpecVersion::V1_2_0, relocate_only)
            .relocate(SLIM_CORE_RELOCATIONS),
    ]
}

/// Map a 1.0.0 content format to its MIME type.
///
/// Existing MIME values pass through. Returns `None` for anything the
/// legacy table does not know.
pub fn legacy_content_format(raw: &str) -> Option<ContentFormat> {
    if let Ok(format) = raw.parse::<ContentFormat>() {
        return Some(format);
    }
    match raw.trim().to_ascii_lowercase().as_str() {
        "plain_text" => Some(ContentFormat::Plain),
        "markdown" | "md" => Some(ContentFormat::Markdown),
        "html" => Some(ContentFormat::Html),
        "json" => Some(ContentFormat::Json),
        "org" => Some(ContentFormat::Org),
        _ => None,
    }
}

/// Offset of `tz` from UTC at noon UTC on `date`, in minutes.
pub fn utc_offset_minutes(date: NaiveDate, tz: Tz) -> Option<i64> {
    let noon = date.and_hms_opt(12, 0, 0)?;
    let local = tz.from_utc_datetime(&noon);
    Some(i64::from(local.offset().fix().local_minus_utc()) / 60)
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn entries_mut<'d>(
    document: &'d mut Map<String, Value>,
) -> Result<Vec<(Pointer, &'d mut Map<String, Value>)>, String> {
    let base = Pointer::root().key("entries");
    let entries = document
        .get_mut("entries")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| format!("{base} is not an array"))?;

    entries
        .iter_mut()
        .enumerate()
        .map(|(i, entry)| {
            let path = base.index(i);
            match entry.as_object_mut() {
                Some(object) => Ok((path, object)),
                None => Err(format!("{path} is not an object")),
            }
        })
        .collect()
}

fn upgrade_to_1_1_0(
    document: &mut Map<String, Value>,
    ctx: &mut StepContext<'_>,
) -> Result<(), String> {
    ensure_document_id(document, ctx)?;
    if !document.contains_key("timestamp") {
        document.insert("timestamp".to_string(), json!(ctx.timestamp));
        ctx.added(Pointer::root().key("timestamp"));
    }

    for (base, entry) in entries_mut(document)? {
        normalize_content_format(entry, &base, ctx)?;
        round_intensities(entry, &base, ctx);
    }
    attach_utc_offset(document, ctx);
    Ok(())
}

/// Generate a UUIDv4 `document_id`, keeping a non-conforming legacy id
/// under [`LEGACY_DOCUMENT_ID`].
fn ensure_document_id(
    document: &mut Map<String, Value>,
    ctx: &mut StepContext<'_>,
) -> Result<(), String> {
    let path = Pointer::root().key("document_id");
    let legacy = match document.get("document_id") {
        Some(Value::String(id)) if is_uuid_v4(id) => return Ok(()),
        Some(_) => true,
        None => false,
    };
    if legacy && document.contains_key(LEGACY_DOCUMENT_ID) {
        return Err(format!(
            "{} already exists",
            Pointer::root().key(LEGACY_DOCUMENT_ID)
        ));
    }

    let id = json!(ctx.env.new_document_id().to_string());
    match document.get_mut("document_id") {
        Some(slot) => {
            let old = std::mem::replace(slot, id);
            document.insert(LEGACY_DOCUMENT_ID.to_string(), old);
            ctx.changes.push(FieldChange::Moved {
                from: path.to_string(),
                to: Pointer::root().key(LEGACY_DOCUMENT_ID).to_string(),
            });
            ctx.added(path);
        }
        None => {
            document.insert("document_id".to_string(), id);
            ctx.added(path);
        }
    }
    Ok(())
}

fn normalize_content_format(
    entry: &mut Map<String, Value>,
    base: &Pointer,
    ctx: &mut StepContext<'_>,
) -> Result<(), String> {
    let path = base.key("content_format");
    let raw = match entry.get("content_format") {
        Some(Value::String(raw)) => raw.clone(),
        Some(_) => return Err(format!("{path} is not a string")),
        None => return Err(format!("{path} is missing")),
    };

    let format = match legacy_content_format(&raw) {
        Some(format) => format,
        None => {
            ctx.warn(format!("{path}: unknown content format {raw:?}, using text/plain"));
            ContentFormat::Plain
        }
    };
    if format.as_str() != raw {
        entry.insert("content_format".to_string(), json!(format.as_str()));
        ctx.changes.push(FieldChange::Rewritten {
            path: path.to_string(),
            before: raw,
            after: format.as_str().to_string(),
        });
    }
    Ok(())
}

fn round_intensities(entry: &mut Map<String, Value>, base: &Pointer, ctx: &mut StepContext<'_>) {
    let Some(moods) = entry.get_mut("moods").and_then(Value::as_array_mut) else {
        return;
    };
    for (i, mood) in moods.iter_mut().enumerate() {
        let Some(slot) = mood.get_mut("intensity") else {
            continue;
        };
        let Some(value) = slot.as_f64() else {
            continue;
        };
        let rounded = round_to(value, INTENSITY_DECIMALS);
        if rounded != value {
            *slot = json!(rounded);
            ctx.changes.push(FieldChange::Rewritten {
                path: base.key("moods").index(i).key("intensity").to_string(),
                before: value.to_string(),
                after: rounded.to_string(),
            });
        }
    }
}

fn attach_utc_offset(document: &mut Map<String, Value>, ctx: &mut StepContext<'_>) {
    let path = Pointer::root().key("meta").key(UTC_OFFSET_FIELD);
    let date = document
        .get("date")
        .and_then(Value::as_str)
        .and_then(parse_date);
    let Some(meta) = document.get_mut("meta").and_then(Value::as_object_mut) else {
        ctx.warn(format!("{path} not computed: meta is not an object"));
        return;
    };
    if meta.contains_key(UTC_OFFSET_FIELD) {
        return;
    }

    let tz = meta
        .get("timezone")
        .and_then(Value::as_str)
        .and_then(parse_timezone);
    match date.zip(tz).and_then(|(date, tz)| utc_offset_minutes(date, tz)) {
        Some(minutes) => {
            meta.insert(UTC_OFFSET_FIELD.to_string(), json!(minutes));
            ctx.added(path);
        }
        None => ctx.warn(format!(
            "{path} not computed: date or timezone is not usable"
        )),
    }
}

fn upgrade_to_1_1_1(
    document: &mut Map<String, Value>,
    ctx: &mut StepContext<'_>,
) -> Result<(), String> {
    let Some(timestamp) = document.shift_remove("timestamp") else {
        return Ok(());
    };
    ctx.changes.push(FieldChange::Removed {
        path: Pointer::root().key("timestamp").to_string(),
    });

    let mut added = Vec::new();
    for (base, entry) in entries_mut(document)? {
        if !entry.contains_key("created_at") {
            entry.insert("created_at".to_string(), timestamp.clone());
            added.push(base.key("created_at"));
        }
    }
    for path in added {
        ctx.added(path);
    }
    Ok(())
}

fn relocate_only(_: &mut Map<String, Value>, _: &mut StepContext<'_>) -> Result<(), String> {
    Ok(())
}
