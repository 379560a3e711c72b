use nalt_core::SpecVersion;
use nalt_migrate::{
    AppliedStep, FieldChange, MigrateError, MigrationResult, Migrator, MigratorConfig,
};
use serde::Serialize;

use crate::cmd::{load_document, load_registry, MigrateArgs};
use crate::exit::{io_error, migrate_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

#[derive(Serialize)]
struct MigrateReport<'a> {
    file: String,
    from: SpecVersion,
    to: SpecVersion,
    migrated: bool,
    relocations: usize,
    steps: &'a [AppliedStep],
    changes: &'a [FieldChange],
    warnings: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

pub fn run(args: MigrateArgs, format: OutputFormat) -> CliResult<i32> {
    let file = args.file.display().to_string();
    let document = load_document(&args.file)?;
    let config = MigratorConfig {
        provenance: args.provenance.into(),
        confirm: args.confirm,
    };
    let migrator = Migrator::with_config(load_registry()?, config);

    let result = match migrator.migrate(&document, &args.to) {
        Ok(result) => result,
        Err(MigrateError::TargetInvalid { version, errors }) => {
            for finding in &errors {
                eprintln!("  {}: {}", finding.path, finding.message);
            }
            return Err(migrate_error(
                &file,
                MigrateError::TargetInvalid { version, errors },
            ));
        }
        Err(err) => return Err(migrate_error(&file, err)),
    };

    let rendered = serde_json::to_string_pretty(&result.document)
        .map_err(|err| CliError::new(INTERNAL, format!("{file}: {err}")))?;

    match &args.out {
        Some(out) => {
            std::fs::write(out, format!("{rendered}\n")).map_err(|err| io_error(out, err))?;
            let report = report(file, &result, Some(out.display().to_string()));
            print_report(&report, format);
        }
        None => {
            println!("{rendered}");
            for line in summary_lines(&result) {
                eprintln!("{line}");
            }
        }
    }
    Ok(SUCCESS)
}

fn report(file: String, result: &MigrationResult, output: Option<String>) -> MigrateReport<'_> {
    MigrateReport {
        file,
        from: result.from,
        to: result.to,
        migrated: result.migrated,
        relocations: result.relocations(),
        steps: &result.steps,
        changes: &result.changes,
        warnings: &result.warnings,
        output,
    }
}

fn print_report(report: &MigrateReport<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            println!("{}", headline(report.migrated, report.from, report.to, report.relocations));
            if report.changes.is_empty() && report.warnings.is_empty() {
                return;
            }
            let mut table = table(vec!["CHANGE", "PATH", "DETAIL"]);
            for change in report.changes {
                let (kind, path, detail) = describe(change);
                table.add_row(vec![kind, path, detail]);
            }
            for warning in report.warnings {
                table.add_row(vec!["warning".to_string(), String::new(), warning.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{}", headline(report.migrated, report.from, report.to, report.relocations));
            for change in report.changes {
                println!("  {}", change_line(change));
            }
            for warning in report.warnings {
                println!("  warning: {warning}");
            }
        }
    }
}

fn summary_lines(result: &MigrationResult) -> Vec<String> {
    let mut lines = vec![headline(
        result.migrated,
        result.from,
        result.to,
        result.relocations(),
    )];
    lines.extend(result.changes.iter().map(|change| format!("  {}", change_line(change))));
    lines.extend(result.warnings.iter().map(|warning| format!("  warning: {warning}")));
    lines
}

fn headline(migrated: bool, from: SpecVersion, to: SpecVersion, relocations: usize) -> String {
    if migrated {
        format!("migrated {from} -> {to} with {relocations} field relocations")
    } else {
        format!("no changes needed: document is already {to}")
    }
}

fn describe(change: &FieldChange) -> (String, String, String) {
    match change {
        FieldChange::Moved { from, to } => ("moved".into(), from.clone(), format!("-> {to}")),
        FieldChange::Added { path } => ("added".into(), path.clone(), String::new()),
        FieldChange::Removed { path } => ("removed".into(), path.clone(), String::new()),
        FieldChange::Rewritten {
            path,
            before,
            after,
        } => ("rewritten".into(), path.clone(), format!("{before} -> {after}")),
    }
}

fn change_line(change: &FieldChange) -> String {
    let (kind, path, detail) = describe(change);
    if detail.is_empty() {
        format!("{kind} {path}")
    } else {
        format!("{kind} {path} {detail}")
    }
}
