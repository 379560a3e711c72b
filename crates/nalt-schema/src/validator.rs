use std::collections::HashSet;
use std::sync::Arc;

use nalt_core::{Pointer, SpecVersion};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ValidatorConfig;
use crate::contract::{Contract, Format, Nested, ObjectContract, ObjectKind, Presence};
use crate::error::{Result, SchemaError};
use crate::format;
use crate::registry::VersionRegistry;

/// One located problem in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// JSON-pointer locator, e.g. `/entries/2/moods/0/intensity`.
    pub path: String,
    pub message: String,
}

/// Outcome of validating a document against one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub version: SpecVersion,
    pub valid: bool,
    /// Every violation, in document order.
    pub errors: Vec<Finding>,
    /// Advisory findings. They never affect `valid`.
    pub warnings: Vec<Finding>,
}

/// Checks documents against the contracts of a [`VersionRegistry`].
pub struct Validator {
    registry: Arc<VersionRegistry>,
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(registry: Arc<VersionRegistry>) -> Self {
        Self::with_config(registry, ValidatorConfig::default())
    }

    pub fn with_config(registry: Arc<VersionRegistry>, config: ValidatorConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<VersionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate `document` against the contract of `version`.
    ///
    /// Only an unknown `version` is an `Err`; every problem with the
    /// document itself is collected into the result.
    pub fn validate(&self, document: &Value, version: &str) -> Result<ValidationResult> {
        let contract = self.registry.contract_for(version)?;
        let mut pass = Pass::new(contract, self.config);
        pass.run(document);
        let result = pass.finish(document);

        tracing::debug!(
            version = %result.version,
            valid = result.valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "validation finished"
        );
        Ok(result)
    }

    /// Validate against the version the document declares in `spec_version`.
    pub fn validate_declared(&self, document: &Value) -> Result<ValidationResult> {
        match document.get("spec_version").and_then(Value::as_str) {
            Some(version) => self.validate(document, version),
            None => Err(SchemaError::UnknownVersion(
                "document has no spec_version".to_string(),
            )),
        }
    }
}

struct Pass<'a> {
    contract: &'a Contract,
    config: ValidatorConfig,
    errors: Vec<(Pointer, String)>,
    warnings: Vec<(Pointer, String)>,
}

impl<'a> Pass<'a> {
    fn new(contract: &'a Contract, config: ValidatorConfig) -> Self {
        Self {
            contract,
            config,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn error(&mut self, path: Pointer, message: impl Into<String>) {
        self.errors.push((path, message.into()));
    }

    fn warn(&mut self, path: Pointer, message: impl Into<String>) {
        self.warnings.push((path, message.into()));
    }

    fn run(&mut self, document: &Value) {
        let root = Pointer::root();
        let Some(map) = document.as_object() else {
            self.error(root, "document must be a JSON object");
            return;
        };
        self.check_object(ObjectKind::Document, map, &root);
        self.check_cross_fields(map);
    }

    /// Structural, enum and format pass over one object and its children.
    fn check_object(&mut self, kind: ObjectKind, map: &Map<String, Value>, path: &Pointer) {
        let contract = self.contract;
        let Some(object) = contract.object(kind) else {
            return;
        };

        for rule in object.fields() {
            let field_path = path.key(rule.name());
            let Some(value) = map.get(rule.name()) else {
                match rule.presence() {
                    Presence::Required => {
                        self.error(field_path, format!("missing required field '{}'", rule.name()))
                    }
                    Presence::Recommended if self.config.advisories => self.warn(
                        field_path,
                        format!("recommended field '{}' is missing", rule.name()),
                    ),
                    _ => {}
                }
                continue;
            };

            for message in rule.violations(value) {
                self.error(field_path.clone(), message);
            }

            if let (Some(format), Some(text)) = (rule.format_kind(), value.as_str()) {
                if let Some(message) = format::check(format, text) {
                    // Identifier shape is only enforced where the identifier is required.
                    if format == Format::UuidV4 && rule.presence() != Presence::Required {
                        if self.config.advisories {
                            self.warn(field_path.clone(), message);
                        }
                    } else {
                        self.error(field_path.clone(), message);
                    }
                }
            }

            match (rule.nested(), value) {
                (Some(Nested::Object(child)), Value::Object(child_map)) => {
                    self.check_object(child, child_map, &field_path);
                }
                (Some(Nested::Each(child)), Value::Array(items)) => {
                    for (index, item) in items.iter().enumerate() {
                        let item_path = field_path.index(index);
                        match item.as_object() {
                            Some(item_map) => self.check_object(child, item_map, &item_path),
                            None => self.error(
                                item_path,
                                format!("{} must be a JSON object", child.as_str()),
                            ),
                        }
                    }
                }
                _ => {}
            }
        }

        self.check_unknown_fields(object, map, path);
    }

    fn check_unknown_fields(
        &mut self,
        object: &ObjectContract,
        map: &Map<String, Value>,
        path: &Pointer,
    ) {
        for name in map.keys() {
            if object.recognizes(name) {
                continue;
            }
            let message = format!(
                "unknown {} field '{name}' (extension fields must start with 'x_')",
                object.kind().as_str()
            );
            if object.is_strict() {
                self.error(path.key(name), message);
            } else if self.config.lint_unknown_fields {
                self.warn(path.key(name), message);
            }
        }
    }

    /// Semantic rules spanning more than one field.
    fn check_cross_fields(&mut self, document: &Map<String, Value>) {
        let Some(entries) = document.get("entries").and_then(Value::as_array) else {
            return;
        };
        let entries_path = Pointer::root().key("entries");
        let date = document
            .get("date")
            .and_then(Value::as_str)
            .and_then(format::parse_date);

        let mut ids = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            let Some(id) = entry.get("entry_id").and_then(Value::as_str) else {
                continue;
            };
            if !ids.insert(id) {
                self.error(
                    entries_path.index(index).key("entry_id"),
                    format!("duplicate entry_id {id:?}"),
                );
            }
        }

        let end_date_field = self.contract.end_date_field();
        for (index, entry) in entries.iter().enumerate() {
            let Some(entry) = entry.as_object() else {
                continue;
            };
            let entry_path = entries_path.index(index);

            if let (Some(date), Some(end)) = (
                date,
                entry
                    .get(end_date_field)
                    .and_then(Value::as_str)
                    .and_then(format::parse_date),
            ) {
                if end < date {
                    self.error(
                        entry_path.key(end_date_field),
                        format!("{end_date_field} {end} is before document date {date}"),
                    );
                }
            }

            if let Some(relations) = entry.get("x_relations").and_then(Value::as_array) {
                for (position, relation) in relations.iter().enumerate() {
                    let Some(target) = relation.get("target_id").and_then(Value::as_str) else {
                        continue;
                    };
                    if !target.is_empty() && !ids.contains(target) {
                        self.error(
                            entry_path
                                .key("x_relations")
                                .index(position)
                                .key("target_id"),
                            format!("relation target {target:?} does not match any entry_id"),
                        );
                    }
                }
            }

            if let Some(decimals) = self.contract.intensity_decimals() {
                self.check_intensity_precision(entry, &entry_path, decimals);
            }
        }
    }

    fn check_intensity_precision(
        &mut self,
        entry: &Map<String, Value>,
        entry_path: &Pointer,
        decimals: u32,
    ) {
        let Some(moods) = entry.get("moods").and_then(Value::as_array) else {
            return;
        };
        for (position, mood) in moods.iter().enumerate() {
            let Some(intensity) = mood.get("intensity").and_then(Value::as_f64) else {
                continue;
            };
            if !has_precision(intensity, decimals) {
                let step = 10f64.powi(-(decimals as i32));
                self.error(
                    entry_path.key("moods").index(position).key("intensity"),
                    format!("{intensity} is not a multiple of {step}"),
                );
            }
        }
    }

    fn finish(self, document: &Value) -> ValidationResult {
        let errors = into_document_order(self.errors, document);
        let warnings = into_document_order(self.warnings, document);
        ValidationResult {
            version: self.contract.version(),
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// ULPs of slack allowed when scaling a value by a power of ten.
const PRECISION_ULPS: f64 = 4.0;

/// Whether `value` has at most `decimals` decimal places, within float error.
///
/// The slack is a few ULPs of the scaled value, so `0.1 + 0.2` passes at two
/// places but `0.850000000001` does not.
pub fn has_precision(value: f64, decimals: u32) -> bool {
    if !value.is_finite() {
        return false;
    }
    let scaled = value * 10f64.powi(decimals as i32);
    let tolerance = scaled.abs().max(1.0) * f64::EPSILON * PRECISION_ULPS;
    (scaled - scaled.round()).abs() <= tolerance
}

fn into_document_order(findings: Vec<(Pointer, String)>, document: &Value) -> Vec<Finding> {
    let mut keyed: Vec<(Vec<usize>, Pointer, String)> = findings
        .into_iter()
        .map(|(path, message)| (path.order_key(document), path, message))
        .collect();
    // Stable: findings on the same path keep the order they were raised in.
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed
        .into_iter()
        .map(|(_, path, message)| Finding {
            path: path.to_string(),
            message,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const DOC_ID: &str = "0b7f7f7e-4a7d-4c1b-9d55-6b1f0f3c2a11";

    fn validator() -> Validator {
        Validator::new(Arc::new(VersionRegistry::builtin().unwrap()))
    }

    fn minimal_v120() -> Value {
        json!({
            "spec_version": "nalt-protocol/1.2.0",
            "document_id": DOC_ID,
            "date": "2025-01-15",
            "meta": {"language": "en", "timezone": "UTC"},
            "entries": [{
                "entry_id": "e1",
                "type": "event",
                "mode": "morning",
                "content_format": "text/plain",
                "content": "hi"
            }]
        })
    }

    fn v110() -> Value {
        json!({
            "spec_version": "nalt-protocol/1.1.0",
            "document_id": DOC_ID,
            "date": "2025-01-15",
            "timestamp": "2025-01-15T21:00:00Z",
            "meta": {"language": "en", "timezone": "Europe/Berlin", "x_utc_offset_minutes": 60},
            "entries": [
                {
                    "entry_id": "e1",
                    "type": "reflection",
                    "mode": "evening",
                    "content_format": "text/plain",
                    "content": "long day",
                    "moods": [{"type": "tired", "intensity": 0.7}],
                    "tags": ["work"]
                },
                {
                    "entry_id": "e2",
                    "type": "task",
                    "mode": "night",
                    "content_format": "text/markdown",
                    "content": "- [ ] sleep",
                    "x_relations": [{"type": "caused_by", "target_id": "e1"}]
                }
            ]
        })
    }

    fn v100() -> Value {
        json!({
            "spec_version": "nalt-protocol/1.0.0",
            "date": "2025-01-15",
            "meta": {"language": "en", "timezone": "UTC"},
            "entries": [{
                "entry_id": "e1",
                "type": "idea",
                "mode": "none",
                "content_format": "plain_text",
                "content": "try rust"
            }]
        })
    }

    fn paths(result: &ValidationResult) -> Vec<&str> {
        result.errors.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn minimal_slim_core_document_is_valid() {
        let result = validator().validate(&minimal_v120(), "1.2.0").unwrap();
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn unknown_version_is_a_hard_error() {
        let err = validator().validate(&minimal_v120(), "9.9.9").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownVersion(_)));
    }

    #[test]
    fn spec_version_must_match_requested_contract() {
        let result = validator().validate(&minimal_v120(), "1.1.1").unwrap();
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "/spec_version");
    }

    #[test]
    fn validate_declared_reads_spec_version() {
        let validator = validator();
        assert!(validator.validate_declared(&v110()).unwrap().valid);
        assert!(matches!(
            validator.validate_declared(&json!({"entries": []})),
            Err(SchemaError::UnknownVersion(_))
        ));
    }

    #[test]
    fn content_format_enum_is_version_gated() {
        let validator = validator();
        let mut doc = v110();
        doc["entries"][0]["content_format"] = json!("plain_text");
        let result = validator.validate(&doc, "1.1.0").unwrap();
        assert!(!result.valid);
        assert_eq!(paths(&result), vec!["/entries/0/content_format"]);

        doc["entries"][0]["content_format"] = json!("text/plain");
        assert!(validator.validate(&doc, "1.1.0").unwrap().valid);

        assert!(validator.validate(&v100(), "1.0.0").unwrap().valid);
    }

    #[test]
    fn intensity_precision_from_1_1_0() {
        let validator = validator();
        let mut doc = v110();
        doc["entries"][0]["moods"] = json!([{"type": "happy", "intensity": 0.855}]);
        let result = validator.validate(&doc, "1.1.0").unwrap();
        assert_eq!(paths(&result), vec!["/entries/0/moods/0/intensity"]);

        doc["entries"][0]["moods"] = json!([{"type": "happy", "intensity": 0.850000000001}]);
        let result = validator.validate(&doc, "1.1.0").unwrap();
        assert_eq!(paths(&result), vec!["/entries/0/moods/0/intensity"]);

        doc["entries"][0]["moods"] = json!([{"type": "happy", "intensity": 0.85}]);
        assert!(validator.validate(&doc, "1.1.0").unwrap().valid);

        let mut legacy = v100();
        legacy["entries"][0]["moods"] = json!([{"type": "happy", "intensity": 0.855}]);
        assert!(validator.validate(&legacy, "1.0.0").unwrap().valid);
    }

    #[test]
    fn dangling_relation_points_at_relation() {
        let mut doc = minimal_v120();
        doc["entries"][0]["x_relations"] = json!([{"type": "led_to", "target_id": "ghost"}]);
        let result = validator().validate(&doc, "1.2.0").unwrap();
        assert!(!result.valid);
        assert_eq!(paths(&result), vec!["/entries/0/x_relations/0/target_id"]);
        assert!(result.errors[0].message.contains("ghost"));
    }

    #[test]
    fn reports_every_independent_defect_in_document_order() {
        let mut doc = v110();
        doc["entries"][0]["type"] = json!("dream");
        doc["entries"][1]["mode"] = json!("noon");
        doc["entries"][1]["x_relations"] = json!([{"type": "explains", "target_id": "e9"}]);
        doc["entries"][0]["moods"] = json!([{"type": "calm", "intensity": 1.5}]);

        let result = validator().validate(&doc, "1.1.0").unwrap();
        assert_eq!(
            paths(&result),
            vec![
                "/entries/0/type",
                "/entries/0/moods/0/intensity",
                "/entries/1/mode",
                "/entries/1/x_relations/0/target_id",
            ]
        );
    }

    #[test]
    fn end_date_before_date_is_rejected() {
        let mut doc = v110();
        doc["entries"][0]["end_date"] = json!("2025-01-14");
        let result = validator().validate(&doc, "1.1.0").unwrap();
        assert_eq!(paths(&result), vec!["/entries/0/end_date"]);

        doc["entries"][0]["end_date"] = json!("2025-01-15");
        assert!(validator().validate(&doc, "1.1.0").unwrap().valid);
    }

    #[test]
    fn slim_core_checks_extension_end_date() {
        let mut doc = minimal_v120();
        doc["entries"][0]["x_end_date"] = json!("2024-12-31");
        let result = validator().validate(&doc, "1.2.0").unwrap();
        assert_eq!(paths(&result), vec!["/entries/0/x_end_date"]);

        doc["entries"][0]["x_end_date"] = json!("whenever");
        assert!(validator().validate(&doc, "1.2.0").unwrap().valid);
    }

    #[test]
    fn duplicate_entry_ids_are_rejected() {
        let mut doc = v110();
        doc["entries"][1]["entry_id"] = json!("e1");
        doc["entries"][1]["x_relations"] = json!([]);
        let result = validator().validate(&doc, "1.1.0").unwrap();
        assert_eq!(paths(&result), vec!["/entries/1/entry_id"]);
    }

    #[test]
    fn strict_contract_rejects_unprefixed_unknown_fields() {
        let validator = validator();
        let mut doc = v100();
        doc["entries"][0]["mood_score"] = json!(3);
        doc["entries"][0]["x_mood_score"] = json!(3);
        doc["meta"]["device"] = json!("phone");
        let result = validator.validate(&doc, "1.0.0").unwrap();
        assert_eq!(paths(&result), vec!["/meta/device", "/entries/0/mood_score"]);

        let mut later = minimal_v120();
        later["entries"][0]["mood_score"] = json!(3);
        let result = validator.validate(&later, "1.2.0").unwrap();
        assert!(result.valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn lint_mode_warns_about_unprefixed_fields() {
        let validator = Validator::with_config(
            Arc::new(VersionRegistry::builtin().unwrap()),
            ValidatorConfig {
                lint_unknown_fields: true,
                ..ValidatorConfig::default()
            },
        );
        let mut doc = minimal_v120();
        doc["entries"][0]["summary"] = json!("moved to x_summary in 1.2.0");
        let result = validator.validate(&doc, "1.2.0").unwrap();
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].path, "/entries/0/summary");
    }

    #[test]
    fn advisories_flag_missing_recommended_fields() {
        let validator = validator();
        let mut doc = v110();
        doc.as_object_mut().unwrap().shift_remove("timestamp");
        let result = validator.validate(&doc, "1.1.0").unwrap();
        assert!(result.valid);
        assert_eq!(result.warnings[0].path, "/timestamp");

        let quiet = Validator::with_config(
            validator.registry().clone(),
            ValidatorConfig {
                advisories: false,
                ..ValidatorConfig::default()
            },
        );
        assert!(quiet.validate(&doc, "1.1.0").unwrap().warnings.is_empty());
    }

    #[test]
    fn document_id_is_required_from_1_1_0() {
        let validator = validator();
        let mut doc = v110();
        doc["document_id"] = json!("not-a-uuid");
        let result = validator.validate(&doc, "1.1.0").unwrap();
        assert_eq!(paths(&result), vec!["/document_id"]);

        doc.as_object_mut().unwrap().shift_remove("document_id");
        let result = validator.validate(&doc, "1.1.0").unwrap();
        assert_eq!(result.errors[0].message, "missing required field 'document_id'");

        let result = validator.validate(&v100(), "1.0.0").unwrap();
        assert!(result.valid);
        assert_eq!(result.warnings[0].path, "/document_id");
    }

    #[test]
    fn legacy_document_id_shape_is_advisory() {
        let validator = validator();
        let mut doc = v100();
        doc["document_id"] = json!("diary-2025-01-15");
        let result = validator.validate(&doc, "1.0.0").unwrap();
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].path, "/document_id");
        assert!(result.warnings[0].message.contains("version 4 UUID"));

        doc["document_id"] = json!(DOC_ID);
        assert!(validator.validate(&doc, "1.0.0").unwrap().warnings.is_empty());
    }

    #[test]
    fn mood_vocabulary_enforced_while_moods_are_core() {
        let mut doc = v110();
        doc["entries"][0]["moods"] = json!([{"type": "hangry", "intensity": 0.5}]);
        let result = validator().validate(&doc, "1.1.0").unwrap();
        assert_eq!(paths(&result), vec!["/entries/0/moods/0/type"]);

        let mut slim = minimal_v120();
        slim["entries"][0]["x_moods"] = json!([{"type": "hangry", "intensity": 0.555}]);
        assert!(validator().validate(&slim, "1.2.0").unwrap().valid);
    }

    #[test]
    fn tags_and_language_patterns() {
        let mut doc = v110();
        doc["entries"][0]["tags"] = json!(["Work", "ok"]);
        doc["meta"]["language"] = json!("eng");
        let result = validator().validate(&doc, "1.1.0").unwrap();
        assert_eq!(paths(&result), vec!["/meta/language", "/entries/0/tags"]);

        doc["meta"]["language"] = json!("en");
        doc["entries"][0]["tags"] = json!(["a", "b", "c", "d", "e", "f", "g"]);
        let result = validator().validate(&doc, "1.1.0").unwrap();
        assert_eq!(paths(&result), vec!["/entries/0/tags"]);
    }

    #[test]
    fn signature_checked_where_legal() {
        let mut doc = v110();
        doc["signature"] = json!({"alg": "HS256", "sig": "abc", "public_key": "did:key:z"});
        let result = validator().validate(&doc, "1.1.0").unwrap();
        assert_eq!(paths(&result), vec!["/signature/alg"]);

        let mut slim = minimal_v120();
        slim["x_signature"] = json!({"alg": "HS256"});
        assert!(validator().validate(&slim, "1.2.0").unwrap().valid);
    }

    #[test]
    fn structural_problems_do_not_stop_the_scan() {
        let doc = json!({
            "spec_version": "nalt-protocol/1.2.0",
            "date": "2025-02-30",
            "meta": "en",
            "entries": []
        });
        let result = validator().validate(&doc, "1.2.0").unwrap();
        assert_eq!(
            paths(&result),
            vec!["/date", "/meta", "/entries", "/document_id"]
        );
    }

    #[test]
    fn non_object_root_is_a_single_error() {
        let result = validator().validate(&json!([1, 2]), "1.2.0").unwrap();
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "");
    }

    #[test]
    fn precision_helper() {
        assert!(has_precision(0.85, 2));
        assert!(has_precision(0.1 + 0.2, 2));
        assert!(has_precision(1.0, 2));
        assert!(!has_precision(0.855, 2));
        assert!(!has_precision(0.850000000001, 2));
        assert!(!has_precision(0.85 + 1e-12, 2));
        assert!(has_precision(0.07, 2));
        assert!(has_precision(0.29, 2));
        assert!(!has_precision(f64::NAN, 2));
    }
}
