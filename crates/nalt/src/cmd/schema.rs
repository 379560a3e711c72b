use crate::cmd::{load_registry, SchemaArgs};
use crate::exit::{schema_error, CliResult, SUCCESS};
use crate::output::{print_json, print_json_pretty, OutputFormat};

pub fn run(args: SchemaArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry()?;
    let schema = registry
        .export_schema(&args.version)
        .map_err(|err| schema_error("schema export failed", err))?;

    match format {
        OutputFormat::Json => print_json(&schema),
        OutputFormat::Table | OutputFormat::Pretty => print_json_pretty(&schema),
    }
    Ok(SUCCESS)
}
