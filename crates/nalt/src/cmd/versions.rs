use nalt_core::SpecVersion;
use nalt_schema::{Contract, ObjectKind, Presence};
use serde::Serialize;

use crate::cmd::{load_registry, VersionsArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

#[derive(Serialize)]
struct VersionRow {
    version: SpecVersion,
    tag: String,
    latest: bool,
    strict: bool,
    required_entry_fields: Vec<&'static str>,
}

pub fn run(_args: VersionsArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry()?;
    let latest = registry.latest();
    let rows: Vec<VersionRow> = registry
        .order()
        .into_iter()
        .filter_map(|version| registry.contract(version))
        .map(|contract| row(contract, latest))
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = table(vec!["VERSION", "TAG", "LATEST", "STRICT", "REQUIRED ENTRY FIELDS"]);
            for row in &rows {
                table.add_row(vec![
                    row.version.to_string(),
                    row.tag.clone(),
                    yes_no(row.latest).to_string(),
                    yes_no(row.strict).to_string(),
                    row.required_entry_fields.join(", "),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in &rows {
                let marker = if row.latest { " (latest)" } else { "" };
                println!("{}{marker}", row.tag);
            }
        }
    }
    Ok(SUCCESS)
}

fn row(contract: &Contract, latest: Option<SpecVersion>) -> VersionRow {
    let entry = contract.object(ObjectKind::Entry);
    VersionRow {
        version: contract.version(),
        tag: contract.version().tag(),
        latest: latest == Some(contract.version()),
        strict: entry.is_some_and(|entry| entry.is_strict()),
        required_entry_fields: entry
            .map(|entry| {
                entry
                    .fields()
                    .iter()
                    .filter(|rule| rule.presence() == Presence::Required)
                    .map(|rule| rule.name())
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
