use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use comfy_table::Cell;
use nalt::batch::run_bounded;
use nalt_schema::{Finding, ValidationResult, Validator, ValidatorConfig};
use serde::Serialize;

use crate::cmd::{load_document, load_registry, ValidateArgs};
use crate::exit::{schema_error, CliError, CliResult, DATA_INVALID, INTERNAL, INTERRUPTED, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

#[derive(Serialize)]
struct FileReport {
    file: String,
    #[serde(flatten)]
    result: ValidationResult,
}

pub fn run(args: ValidateArgs, format: OutputFormat) -> CliResult<i32> {
    let config = ValidatorConfig {
        lint_unknown_fields: args.lint,
        advisories: !args.no_advisories,
    };
    let validator = Validator::with_config(load_registry()?, config);
    let jobs = args.jobs.unwrap_or_else(default_jobs);

    let cancel = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(cancel.clone())?;

    let outcomes = run_bounded(&args.files, jobs, &cancel, |path| {
        check_file(&validator, path, args.target.as_deref())
    });

    let mut code = SUCCESS;
    let mut reports = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Some(Ok(report)) => {
                if !report.result.valid && code == SUCCESS {
                    code = DATA_INVALID;
                }
                reports.push(report);
            }
            Some(Err(err)) => {
                eprintln!("error: {err}");
                if code == SUCCESS || code == DATA_INVALID {
                    code = err.code;
                }
            }
            None => code = INTERRUPTED,
        }
    }

    print_reports(&reports, format);
    if code == INTERRUPTED {
        tracing::warn!(
            checked = reports.len(),
            total = args.files.len(),
            "validation interrupted"
        );
    }
    Ok(code)
}

fn check_file(
    validator: &Validator,
    path: &Path,
    target: Option<&str>,
) -> CliResult<FileReport> {
    let file = path.display().to_string();
    let document = load_document(path)?;
    let result = match target {
        Some(version) => validator.validate(&document, version),
        None => validator.validate_declared(&document),
    }
    .map_err(|err| schema_error(&file, err))?;

    tracing::info!(
        file = %file,
        version = %result.version,
        valid = result.valid,
        errors = result.errors.len(),
        "validated"
    );
    Ok(FileReport { file, result })
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(usize::from)
        .unwrap_or(1)
}

fn install_ctrlc_handler(cancel: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        cancel.store(true, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

fn print_reports(reports: &[FileReport], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for report in reports {
                print_json(report);
            }
        }
        OutputFormat::Table => {
            let mut table = table(vec!["FILE", "VERSION", "LEVEL", "PATH", "MESSAGE"]);
            for report in reports {
                let version = report.result.version.to_string();
                if report.result.errors.is_empty() && report.result.warnings.is_empty() {
                    table.add_row(vec![
                        Cell::new(&report.file),
                        Cell::new(&version),
                        Cell::new("ok"),
                        Cell::new(""),
                        Cell::new("valid"),
                    ]);
                }
                let findings = labelled(&report.result.errors, "error")
                    .chain(labelled(&report.result.warnings, "warning"));
                for (level, finding) in findings {
                    table.add_row(vec![
                        Cell::new(&report.file),
                        Cell::new(&version),
                        Cell::new(level),
                        Cell::new(display_path(&finding.path)),
                        Cell::new(&finding.message),
                    ]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for report in reports {
                let status = if report.result.valid { "valid" } else { "INVALID" };
                println!("{}: {status} ({})", report.file, report.result.version.tag());
                let findings = labelled(&report.result.errors, "error")
                    .chain(labelled(&report.result.warnings, "warning"));
                for (level, finding) in findings {
                    println!(
                        "  {level:<7} {}: {}",
                        display_path(&finding.path),
                        finding.message
                    );
                }
            }
        }
    }
}

fn labelled<'a>(
    findings: &'a [Finding],
    level: &'static str,
) -> impl Iterator<Item = (&'static str, &'a Finding)> + 'a {
    findings.iter().map(move |finding| (level, finding))
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}
