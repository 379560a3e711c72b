use serde_json::{Map, Value};

/// Prefix that marks an application-defined extension field.
pub const EXTENSION_PREFIX: &str = "x_";

/// Opaque bag of extension fields attached to a structured entity.
pub type Extensions = Map<String, Value>;

/// Whether a field name is an `x_`-prefixed extension.
pub fn is_extension(name: &str) -> bool {
    name.starts_with(EXTENSION_PREFIX)
}
