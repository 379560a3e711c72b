/// How migration provenance is recorded on the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProvenanceMode {
    /// Only the last step's stamp (`x_migration` or `x_migrated_at`) survives.
    LastStep,
    /// Last step's stamp plus one `x_migration_history` record per step.
    #[default]
    Accumulate,
}

/// Controls [`Migrator`](crate::Migrator) behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MigratorConfig {
    pub provenance: ProvenanceMode,
    /// When true, the output is validated against the target version and
    /// the migration fails if it is invalid.
    pub confirm: bool,
}
