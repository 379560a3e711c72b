use nalt_core::Pointer;
use serde_json::{Map, Value};

use crate::change::FieldChange;

/// Where a relocated field lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Document,
    Meta,
    /// Every object in the `entries` array.
    Entries,
}

impl Scope {
    fn is_single(self) -> bool {
        !matches!(self, Scope::Entries)
    }

    fn as_str(self) -> &'static str {
        match self {
            Scope::Document => "document",
            Scope::Meta => "meta",
            Scope::Entries => "entry",
        }
    }
}

/// Move one field to a new key, possibly in another scope.
///
/// A relocation never copies: after it runs the source key is gone and the
/// value is reachable only at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    pub from_scope: Scope,
    pub from: &'static str,
    pub to_scope: Scope,
    pub to: &'static str,
}

impl Relocation {
    /// Rename within one scope, keeping the field's position.
    pub const fn within(scope: Scope, from: &'static str, to: &'static str) -> Self {
        Self {
            from_scope: scope,
            from,
            to_scope: scope,
            to,
        }
    }

    /// Move between two single-object scopes. The field is appended at the
    /// destination.
    pub const fn across(
        from_scope: Scope,
        from: &'static str,
        to_scope: Scope,
        to: &'static str,
    ) -> Self {
        Self {
            from_scope,
            from,
            to_scope,
            to,
        }
    }

    /// Apply to `document`, recording every move.
    ///
    /// Fails when the destination key already exists or the relocation
    /// crosses into or out of the per-entry scope. A failed relocation may
    /// leave `document` partially edited; callers work on a copy.
    pub fn apply(
        &self,
        document: &mut Map<String, Value>,
        changes: &mut Vec<FieldChange>,
    ) -> Result<(), String> {
        if self.from_scope == self.to_scope {
            for (base, object) in scoped_objects(document, self.from_scope) {
                rename_in_place(object, self.from, self.to, &base, changes)?;
            }
            return Ok(());
        }

        if !self.from_scope.is_single() || !self.to_scope.is_single() {
            return Err(format!(
                "cannot move {} between {} and {} scope",
                self.from,
                self.from_scope.as_str(),
                self.to_scope.as_str()
            ));
        }

        let Some((from_base, source)) = scoped_objects(document, self.from_scope).pop() else {
            return Ok(());
        };
        let Some(value) = source.shift_remove(self.from) else {
            return Ok(());
        };

        let Some((to_base, target)) = scoped_objects(document, self.to_scope).pop() else {
            return Err(format!(
                "no {} object to receive {}",
                self.to_scope.as_str(),
                self.from
            ));
        };
        if target.contains_key(self.to) {
            return Err(collision(&to_base, self.to));
        }
        target.insert(self.to.to_string(), value);
        changes.push(FieldChange::Moved {
            from: from_base.key(self.from).to_string(),
            to: to_base.key(self.to).to_string(),
        });
        Ok(())
    }
}

/// The objects a scope addresses, with their locations.
///
/// Missing or non-object containers yield nothing; shape problems are left
/// to validation.
fn scoped_objects(
    document: &mut Map<String, Value>,
    scope: Scope,
) -> Vec<(Pointer, &mut Map<String, Value>)> {
    match scope {
        Scope::Document => vec![(Pointer::root(), document)],
        Scope::Meta => document
            .get_mut("meta")
            .and_then(Value::as_object_mut)
            .map(|meta| vec![(Pointer::root().key("meta"), meta)])
            .unwrap_or_default(),
        Scope::Entries => {
            let base = Pointer::root().key("entries");
            match document.get_mut("entries").and_then(Value::as_array_mut) {
                Some(entries) => entries
                    .iter_mut()
                    .enumerate()
                    .filter_map(|(i, entry)| entry.as_object_mut().map(|e| (base.index(i), e)))
                    .collect(),
                None => Vec::new(),
            }
        }
    }
}

fn rename_in_place(
    object: &mut Map<String, Value>,
    from: &str,
    to: &str,
    base: &Pointer,
    changes: &mut Vec<FieldChange>,
) -> Result<(), String> {
    if !object.contains_key(from) {
        return Ok(());
    }
    if object.contains_key(to) {
        return Err(collision(base, to));
    }

    let fields = std::mem::take(object);
    for (key, value) in fields {
        if key == from {
            object.insert(to.to_string(), value);
        } else {
            object.insert(key, value);
        }
    }
    changes.push(FieldChange::Moved {
        from: base.key(from).to_string(),
        to: base.key(to).to_string(),
    });
    Ok(())
}

fn collision(base: &Pointer, key: &str) -> String {
    format!("{} already exists", base.key(key))
}
