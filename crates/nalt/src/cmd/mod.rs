use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Subcommand, ValueEnum};
use nalt_migrate::ProvenanceMode;
use nalt_schema::VersionRegistry;
use serde_json::Value;

use crate::exit::{core_error, io_error, schema_error, CliResult};
use crate::output::OutputFormat;

pub mod inspect;
pub mod migrate;
pub mod schema;
pub mod validate;
pub mod version;
pub mod versions;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate documents against their declared or a given version.
    Validate(ValidateArgs),
    /// Migrate a document forward to a target version.
    Migrate(MigrateArgs),
    /// List the protocol versions this build knows.
    Versions(VersionsArgs),
    /// Print the JSON Schema of a protocol version.
    Schema(SchemaArgs),
    /// Summarize a document's entries at the latest version.
    Inspect(InspectArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Validate(args) => validate::run(args, format),
        Command::Migrate(args) => migrate::run(args, format),
        Command::Versions(args) => versions::run(args, format),
        Command::Schema(args) => schema::run(args, format),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Documents to validate.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
    /// Validate against this version instead of each document's spec_version.
    #[arg(long = "version", value_name = "VERSION")]
    pub target: Option<String>,
    /// Warn about unknown fields that lack the x_ prefix.
    #[arg(long, env = "NALT_LINT")]
    pub lint: bool,
    /// Skip the advisory pass.
    #[arg(long)]
    pub no_advisories: bool,
    /// Worker threads. Default: available parallelism.
    #[arg(long, short = 'j', env = "NALT_JOBS")]
    pub jobs: Option<usize>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ProvenanceArg {
    /// Keep a per-step x_migration_history next to the last stamp.
    Accumulate,
    /// Keep only the last step's stamp.
    LastStep,
}

impl From<ProvenanceArg> for ProvenanceMode {
    fn from(arg: ProvenanceArg) -> Self {
        match arg {
            ProvenanceArg::Accumulate => ProvenanceMode::Accumulate,
            ProvenanceArg::LastStep => ProvenanceMode::LastStep,
        }
    }
}

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Document to migrate.
    pub file: PathBuf,
    /// Target version, bare (1.2.0) or tagged (nalt-protocol/1.2.0).
    #[arg(long, value_name = "VERSION")]
    pub to: String,
    /// Write the migrated document here instead of stdout.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub out: Option<PathBuf>,
    /// Validate the result at the target version and fail if it is invalid.
    #[arg(long)]
    pub confirm: bool,
    /// How migration provenance is recorded.
    #[arg(long, value_name = "MODE", default_value = "accumulate")]
    pub provenance: ProvenanceArg,
}

#[derive(Args, Debug, Default)]
pub struct VersionsArgs {}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Protocol version to export.
    pub version: String,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Document to summarize.
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build information.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn load_registry() -> CliResult<Arc<VersionRegistry>> {
    VersionRegistry::builtin()
        .map(Arc::new)
        .map_err(|err| schema_error("registry build failed", err))
}

pub(crate) fn load_document(path: &Path) -> CliResult<Value> {
    let bytes = std::fs::read(path).map_err(|err| io_error(path, err))?;
    nalt_core::parse_document(&bytes).map_err(|err| core_error(&path.display().to_string(), err))
}
