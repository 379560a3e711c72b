use std::collections::BTreeMap;

use nalt_core::SpecVersion;
use serde_json::{json, Map, Value};

use crate::contract::{Contract, Nested, ObjectContract, ObjectKind, Presence};
use crate::error::{Result, SchemaError};
use crate::versions::builtin_contracts;

/// Ordered table of protocol versions and their contracts.
///
/// Built once at startup and shared read-only (typically behind an `Arc`)
/// by every validator and migrator.
pub struct VersionRegistry {
    contracts: BTreeMap<SpecVersion, Contract>,
}

impl VersionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            contracts: BTreeMap::new(),
        }
    }

    /// Registry holding every published protocol version.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        for contract in builtin_contracts()? {
            registry.register(contract);
        }
        Ok(registry)
    }

    /// Add a contract, replacing any existing contract for the same version.
    pub fn register(&mut self, contract: Contract) {
        tracing::debug!(version = %contract.version(), "registering contract");
        self.contracts.insert(contract.version(), contract);
    }

    /// Parse a bare or tagged version and confirm it is registered.
    ///
    /// A malformed string is a [`SchemaError::Core`]; a well-formed but
    /// unregistered one is [`SchemaError::UnknownVersion`].
    pub fn resolve(&self, version: &str) -> Result<SpecVersion> {
        let parsed = SpecVersion::parse(version)?;
        if self.contracts.contains_key(&parsed) {
            Ok(parsed)
        } else {
            Err(SchemaError::UnknownVersion(version.to_string()))
        }
    }

    pub fn contract_for(&self, version: &str) -> Result<&Contract> {
        let parsed = self.resolve(version)?;
        self.contract(parsed)
            .ok_or_else(|| SchemaError::UnknownVersion(version.to_string()))
    }

    pub fn contract(&self, version: SpecVersion) -> Option<&Contract> {
        self.contracts.get(&version)
    }

    pub fn is_known(&self, version: &str) -> bool {
        self.resolve(version).is_ok()
    }

    /// Registered versions, oldest first.
    pub fn order(&self) -> Vec<SpecVersion> {
        self.contracts.keys().copied().collect()
    }

    pub fn latest(&self) -> Option<SpecVersion> {
        self.contracts.keys().next_back().copied()
    }

    /// Versions strictly after `from` up to and including `to`.
    pub fn path(&self, from: SpecVersion, to: SpecVersion) -> Vec<SpecVersion> {
        self.contracts
            .keys()
            .copied()
            .filter(|version| *version > from && *version <= to)
            .collect()
    }

    /// Render a version contract as a JSON Schema 2020-12 document.
    ///
    /// Covers structure, enums, ranges and patterns. Format checks and
    /// cross-field rules (`end_date >= date`, relation targets, intensity
    /// precision) are only enforced by [`Validator`](crate::Validator).
    pub fn export_schema(&self, version: &str) -> Result<Value> {
        let contract = self.contract_for(version)?;
        let mut defs = Map::new();
        for object in contract.objects() {
            if object.kind() != ObjectKind::Document {
                defs.insert(object.kind().as_str().to_string(), object_schema(object));
            }
        }

        let mut schema = match contract.object(ObjectKind::Document) {
            Some(document) => object_schema(document),
            None => json!({"type": "object"}),
        };
        if let Value::Object(map) = &mut schema {
            map.insert(
                "$schema".to_string(),
                json!("https://json-schema.org/draft/2020-12/schema"),
            );
            map.insert(
                "title".to_string(),
                json!(format!("NALT Protocol {}", contract.version())),
            );
            map.insert("$defs".to_string(), Value::Object(defs));
        }
        Ok(schema)
    }
}

impl Default for VersionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn object_schema(object: &ObjectContract) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for rule in object.fields() {
        let mut property = rule.schema().clone();
        if let (Some(format), Value::Object(map)) = (rule.format_kind(), &mut property) {
            map.insert("format".to_string(), json!(format.as_str()));
        }
        match rule.nested() {
            Some(Nested::Object(kind)) => {
                property = json!({"$ref": format!("#/$defs/{}", kind.as_str())});
            }
            Some(Nested::Each(kind)) => {
                if let Value::Object(map) = &mut property {
                    map.insert(
                        "items".to_string(),
                        json!({"$ref": format!("#/$defs/{}", kind.as_str())}),
                    );
                }
            }
            None => {}
        }
        if rule.presence() == Presence::Required {
            required.push(json!(rule.name()));
        }
        properties.insert(rule.name().to_string(), property);
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    schema.insert("required".to_string(), Value::Array(required));
    if object.is_strict() {
        schema.insert("patternProperties".to_string(), json!({"^x_": {}}));
        schema.insert("additionalProperties".to_string(), Value::Bool(false));
    }
    Value::Object(schema)
}
