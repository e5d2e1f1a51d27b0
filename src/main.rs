use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};

use censo_validator::config::{Config, OutputFormat};
use censo_validator::profile::{ProfileManager, RulesProfile};
use censo_validator::validation::{validate_bytes, ValidationReport};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let config = Config::from_args_and_env()?;
    init_logging(&config.log_level);

    if config.files.is_empty() {
        bail!("No census file given; run with --help for usage");
    }

    let mut profiles = ProfileManager::new(&config);
    profiles.load().await?;
    let profile = profiles.get_effective_profile().await;
    log::debug!("Using rules profile '{}'", profile.name);

    let mut all_valid = true;
    let mut reports = Vec::new();
    for path in &config.files {
        let report = check_file(path, &config, &profile)?;
        all_valid &= report.is_valid();
        reports.push((path.as_path(), report));
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match config.format {
        OutputFormat::Text => {
            for (path, report) in &reports {
                write_text_report(&mut out, path, report)?;
            }
        }
        OutputFormat::Json => {
            let json: Vec<_> = reports
                .iter()
                .map(|(path, report)| {
                    serde_json::json!({
                        "file": path.display().to_string(),
                        "report": report,
                    })
                })
                .collect();
            serde_json::to_writer_pretty(&mut out, &json)?;
            writeln!(out)?;
        }
    }

    Ok(if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn check_file(path: &Path, config: &Config, profile: &RulesProfile) -> Result<ValidationReport> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read census file: {}", path.display()))?;
    log::info!("Validating {} ({} bytes)", path.display(), bytes.len());
    Ok(validate_bytes(&bytes, config.get_effective_phase(), profile))
}

fn write_text_report(out: &mut impl Write, path: &Path, report: &ValidationReport) -> Result<()> {
    for error in &report.errors {
        writeln!(out, "{}:{}", path.display(), error)?;
    }
    writeln!(
        out,
        "{}: {} phase, {} records, {} schools, {} errors, {} warnings{}",
        path.display(),
        report.phase,
        report.lines_processed,
        report.entities_found,
        report.error_count(),
        report.warning_count(),
        if report.short_circuited {
            " (structure checks skipped after file-level errors)"
        } else {
            ""
        }
    )?;
    Ok(())
}
