use jsonschema::Validator as Constraint;
use nalt_core::{is_extension, SpecVersion};
use serde_json::Value;

use crate::error::{Result, SchemaError};

/// The object shapes a contract describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Document,
    Meta,
    Entry,
    Mood,
    Relation,
    Signature,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Document => "document",
            ObjectKind::Meta => "meta",
            ObjectKind::Entry => "entry",
            ObjectKind::Mood => "mood",
            ObjectKind::Relation => "relation",
            ObjectKind::Signature => "signature",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    /// Optional, but its absence is reported as a warning.
    Recommended,
    Optional,
}

/// String formats checked outside of JSON Schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// RFC 3339 timestamp.
    DateTime,
    /// Hyphenated UUID, version 4.
    UuidV4,
    /// IANA time zone name.
    Timezone,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Date => "date",
            Format::DateTime => "date-time",
            Format::UuidV4 => "uuid",
            Format::Timezone => "timezone",
        }
    }
}

/// How a field's value is descended into once its own constraint is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nested {
    /// The value is a single object of this kind.
    Object(ObjectKind),
    /// The value is an array whose items are objects of this kind.
    Each(ObjectKind),
}

/// One named field of an object contract.
#[derive(Debug)]
pub struct FieldRule {
    name: &'static str,
    presence: Presence,
    schema: Value,
    format: Option<Format>,
    nested: Option<Nested>,
    constraint: Option<Constraint>,
}

impl FieldRule {
    fn new(name: &'static str, presence: Presence, schema: Value) -> Self {
        Self {
            name,
            presence,
            schema,
            format: None,
            nested: None,
            constraint: None,
        }
    }

    pub fn required(name: &'static str, schema: Value) -> Self {
        Self::new(name, Presence::Required, schema)
    }

    pub fn recommended(name: &'static str, schema: Value) -> Self {
        Self::new(name, Presence::Recommended, schema)
    }

    pub fn optional(name: &'static str, schema: Value) -> Self {
        Self::new(name, Presence::Optional, schema)
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn object(mut self, kind: ObjectKind) -> Self {
        self.nested = Some(Nested::Object(kind));
        self
    }

    pub fn each(mut self, kind: ObjectKind) -> Self {
        self.nested = Some(Nested::Each(kind));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    /// The JSON Schema fragment constraining the field value.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn format_kind(&self) -> Option<Format> {
        self.format
    }

    pub fn nested(&self) -> Option<Nested> {
        self.nested
    }

    /// Messages for every constraint the value violates, in schema order.
    pub fn violations(&self, value: &Value) -> Vec<String> {
        match &self.constraint {
            Some(constraint) => constraint
                .iter_errors(value)
                .map(|err| err.to_string())
                .collect(),
            None => Vec::new(),
        }
    }

    fn compile(&mut self, owner: ObjectKind) -> Result<()> {
        let constraint =
            jsonschema::validator_for(&self.schema).map_err(|err| SchemaError::CompileFailed {
                field: format!("{}.{}", owner.as_str(), self.name),
                message: err.to_string(),
            })?;
        self.constraint = Some(constraint);
        Ok(())
    }
}

/// Field rules for one object kind under one version.
#[derive(Debug)]
pub struct ObjectContract {
    kind: ObjectKind,
    strict: bool,
    fields: Vec<FieldRule>,
}

impl ObjectContract {
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Strict objects reject fields that are neither named nor `x_`-prefixed.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.name == name)
    }

    /// Whether `name` is either a named field or an extension.
    pub fn recognizes(&self, name: &str) -> bool {
        is_extension(name) || self.field(name).is_some()
    }
}

/// The complete structural contract of one protocol version.
#[derive(Debug)]
pub struct Contract {
    version: SpecVersion,
    objects: Vec<ObjectContract>,
    intensity_decimals: Option<u32>,
    end_date_field: &'static str,
}

impl Contract {
    pub fn builder(version: SpecVersion) -> ContractBuilder {
        ContractBuilder {
            version,
            objects: Vec::new(),
            intensity_decimals: None,
            end_date_field: "end_date",
        }
    }

    pub fn version(&self) -> SpecVersion {
        self.version
    }

    pub fn object(&self, kind: ObjectKind) -> Option<&ObjectContract> {
        self.objects.iter().find(|object| object.kind == kind)
    }

    pub fn objects(&self) -> &[ObjectContract] {
        &self.objects
    }

    /// Required decimal precision of `moods[].intensity`, if the version mandates one.
    pub fn intensity_decimals(&self) -> Option<u32> {
        self.intensity_decimals
    }

    /// Entry field that carries the end date under this version.
    pub fn end_date_field(&self) -> &'static str {
        self.end_date_field
    }
}

pub struct ContractBuilder {
    version: SpecVersion,
    objects: Vec<ObjectContract>,
    intensity_decimals: Option<u32>,
    end_date_field: &'static str,
}

impl ContractBuilder {
    pub fn object(mut self, kind: ObjectKind, strict: bool, fields: Vec<FieldRule>) -> Self {
        self.objects.retain(|object| object.kind != kind);
        self.objects.push(ObjectContract {
            kind,
            strict,
            fields,
        });
        self
    }

    pub fn intensity_decimals(mut self, decimals: u32) -> Self {
        self.intensity_decimals = Some(decimals);
        self
    }

    pub fn end_date_field(mut self, field: &'static str) -> Self {
        self.end_date_field = field;
        self
    }

    /// Compile every field constraint.
    ///
    /// Fails if a constraint is not valid JSON Schema or a nested rule refers
    /// to an object kind the contract does not define.
    pub fn build(mut self) -> Result<Contract> {
        let defined: Vec<ObjectKind> = self.objects.iter().map(|object| object.kind).collect();
        for object in &mut self.objects {
            let owner = object.kind;
            for rule in &mut object.fields {
                if let Some(Nested::Object(kind) | Nested::Each(kind)) = rule.nested {
                    if !defined.contains(&kind) {
                        return Err(SchemaError::CompileFailed {
                            field: format!("{}.{}", owner.as_str(), rule.name),
                            message: format!("no {} contract defined", kind.as_str()),
                        });
                    }
                }
                rule.compile(owner)?;
            }
        }

        Ok(Contract {
            version: self.version,
            objects: self.objects,
            intensity_decimals: self.intensity_decimals,
            end_date_field: self.end_date_field,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn minimal(fields: Vec<FieldRule>) -> Result<Contract> {
        Contract::builder(SpecVersion::V1_0_0)
            .object(ObjectKind::Document, false, fields)
            .build()
    }

    #[test]
    fn compiled_rule_reports_violations() {
        let contract = minimal(vec![FieldRule::required(
            "mode",
            json!({"type": "string", "enum": ["morning", "night"]}),
        )])
        .unwrap();
        let rule = contract
            .object(ObjectKind::Document)
            .unwrap()
            .field("mode")
            .unwrap();

        assert!(rule.violations(&json!("night")).is_empty());
        assert_eq!(rule.violations(&json!("noon")).len(), 1);
        assert_eq!(rule.presence(), Presence::Required);
    }

    #[test]
    fn invalid_fragment_fails_compile() {
        let result = minimal(vec![FieldRule::optional(
            "broken",
            json!({"type": "definitely-not-a-type"}),
        )]);
        assert!(matches!(result, Err(SchemaError::CompileFailed { .. })));
    }

    #[test]
    fn nested_rule_requires_defined_kind() {
        let result = minimal(vec![FieldRule::required("meta", json!({"type": "object"}))
            .object(ObjectKind::Meta)]);
        match result {
            Err(SchemaError::CompileFailed { field, message }) => {
                assert_eq!(field, "document.meta");
                assert!(message.contains("meta"));
            }
            _ => panic!("expected compile failure"),
        }
    }

    #[test]
    fn recognizes_named_and_extension_fields() {
        let contract =
            minimal(vec![FieldRule::required("date", json!({"type": "string"}))]).unwrap();
        let document = contract.object(ObjectKind::Document).unwrap();
        assert!(document.recognizes("date"));
        assert!(document.recognizes("x_anything"));
        assert!(!document.recognizes("timestamp"));
    }
}
