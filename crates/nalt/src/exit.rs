use std::fmt;
use std::io;
use std::path::Path;

use nalt_core::CoreError;
use nalt_migrate::MigrateError;
use nalt_schema::SchemaError;

pub const SUCCESS: i32 = 0;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;
pub const INTERRUPTED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Clone)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(path: &Path, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => USAGE,
        io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{}: {err}", path.display()))
}

pub fn core_error(context: &str, err: CoreError) -> CliError {
    match err {
        CoreError::Parse(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        CoreError::InvalidVersion(_) => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    match err {
        SchemaError::UnknownVersion(_) => CliError::new(USAGE, format!("{context}: {err}")),
        SchemaError::Core(err) => core_error(context, err),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn migrate_error(context: &str, err: MigrateError) -> CliError {
    match err {
        MigrateError::UnknownVersion(_) | MigrateError::Downgrade { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        MigrateError::Step { .. } | MigrateError::TargetInvalid { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        MigrateError::Schema(err) => schema_error(context, err),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}
