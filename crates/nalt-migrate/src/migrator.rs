use std::sync::Arc;

use nalt_core::SpecVersion;
use nalt_schema::{Validator, VersionRegistry};
use serde::Serialize;
use serde_json::Value;

use crate::change::FieldChange;
use crate::config::MigratorConfig;
use crate::env::{MigrationEnv, SystemEnv};
use crate::error::{MigrateError, Result};
use crate::step::{builtin_steps, Step};

/// A step that ran as part of a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppliedStep {
    pub from: SpecVersion,
    pub to: SpecVersion,
}

/// Outcome of [`Migrator::migrate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationResult {
    /// The migrated document. Equal to the input when `migrated` is false.
    pub document: Value,
    pub migrated: bool,
    pub from: SpecVersion,
    pub to: SpecVersion,
    pub steps: Vec<AppliedStep>,
    /// Field edits in the order they were made.
    pub changes: Vec<FieldChange>,
    /// Lossy fallbacks and skipped computations.
    pub warnings: Vec<String>,
}

impl MigrationResult {
    /// Number of fields moved to a new key.
    pub fn relocations(&self) -> usize {
        self.changes.iter().filter(|change| change.is_relocation()).count()
    }
}

/// Upgrades documents along the registry's version order.
pub struct Migrator {
    registry: Arc<VersionRegistry>,
    steps: Vec<Step>,
    env: Arc<dyn MigrationEnv>,
    config: MigratorConfig,
}

impl Migrator {
    pub fn new(registry: Arc<VersionRegistry>) -> Self {
        Self::with_config(registry, MigratorConfig::default())
    }

    pub fn with_config(registry: Arc<VersionRegistry>, config: MigratorConfig) -> Self {
        Self {
            registry,
            steps: builtin_steps(),
            env: Arc::new(SystemEnv),
            config,
        }
    }

    /// Replace the clock and id source.
    pub fn with_env(mut self, env: impl MigrationEnv + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Add a step, replacing any existing step between the same versions.
    pub fn register_step(&mut self, step: Step) {
        self.steps
            .retain(|existing| !(existing.from() == step.from() && existing.to() == step.to()));
        self.steps.push(step);
    }

    pub fn registry(&self) -> &Arc<VersionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    /// The adjacent steps leading from `from` to `to`, in order.
    pub fn plan(&self, from: SpecVersion, to: SpecVersion) -> Result<Vec<&Step>> {
        if to < from {
            return Err(MigrateError::Downgrade { from, to });
        }

        let mut previous = from;
        let mut plan = Vec::new();
        for version in self.registry.path(from, to) {
            let step = self
                .steps
                .iter()
                .find(|step| step.from() == previous && step.to() == version)
                .ok_or(MigrateError::MissingStep {
                    from: previous,
                    to: version,
                })?;
            plan.push(step);
            previous = version;
        }
        Ok(plan)
    }

    /// Migrate `document` from its declared version to `target`.
    ///
    /// The input is never modified. Any step failure aborts the whole chain.
    pub fn migrate(&self, document: &Value, target: &str) -> Result<MigrationResult> {
        let source = document
            .as_object()
            .ok_or_else(|| MigrateError::UnknownVersion("document is not a JSON object".into()))?;
        let declared = source
            .get("spec_version")
            .and_then(Value::as_str)
            .ok_or_else(|| MigrateError::UnknownVersion("document has no spec_version".into()))?;
        let from = self.resolve(declared)?;
        let to = self.resolve(target)?;

        if from == to {
            tracing::debug!(version = %from, "document already at target version");
            return Ok(MigrationResult {
                document: document.clone(),
                migrated: false,
                from,
                to,
                steps: Vec::new(),
                changes: Vec::new(),
                warnings: Vec::new(),
            });
        }

        let plan = self.plan(from, to)?;
        let mut working = source.clone();
        let mut steps = Vec::with_capacity(plan.len());
        let mut changes = Vec::new();
        let mut warnings = Vec::new();

        for step in plan {
            let outcome = step
                .apply(&mut working, self.env.as_ref(), self.config.provenance)
                .map_err(|reason| MigrateError::Step {
                    from: step.from(),
                    to: step.to(),
                    reason,
                })?;
            tracing::debug!(
                from = %step.from(),
                to = %step.to(),
                changes = outcome.changes.len(),
                warnings = outcome.warnings.len(),
                "applied migration step"
            );
            steps.push(AppliedStep {
                from: step.from(),
                to: step.to(),
            });
            changes.extend(outcome.changes);
            warnings.extend(outcome.warnings);
        }

        let document = Value::Object(working);
        if self.config.confirm {
            self.confirm(&document, to)?;
        }

        Ok(MigrationResult {
            document,
            migrated: true,
            from,
            to,
            steps,
            changes,
            warnings,
        })
    }

    fn confirm(&self, document: &Value, version: SpecVersion) -> Result<()> {
        let validator = Validator::new(Arc::clone(&self.registry));
        let result = validator.validate(document, &version.to_string())?;
        if result.valid {
            Ok(())
        } else {
            Err(MigrateError::TargetInvalid {
                version,
                errors: result.errors,
            })
        }
    }

    fn resolve(&self, version: &str) -> Result<SpecVersion> {
        self.registry
            .resolve(version)
            .map_err(|_| MigrateError::UnknownVersion(version.to_string()))
    }
}
