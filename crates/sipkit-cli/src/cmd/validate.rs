use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::info;
use walkdir::WalkDir;

use sipkit_core::adaptor::SourceAdaptor;
use sipkit_core::toolkit::archive::build_exclusions;
use sipkit_core::toolkit::{BuiltinScraper, FileScraper};

/// Scrape every non-excluded file under `path` and stream one record per
/// file into the valid or invalid output. A file that cannot be scraped gets
/// an invalid record; it never aborts the scan.
pub fn run(
    path: &Path,
    valid_output: &Path,
    invalid_output: &Path,
    summary: bool,
    config_path: Option<&Path>,
    echo_stdout: bool,
) -> Result<()> {
    let excludes = match super::load_config_optional(config_path)? {
        Some(config) => {
            let registry = sipkit_adaptors::builtin_registry()?;
            let adaptor = registry.get(&config.script.adaptor)?;
            Some(build_exclusions(&adaptor.exclude_patterns(&config))?)
        }
        None => None,
    };

    let scraper = BuiltinScraper::default();
    let mut valid = BufWriter::new(
        File::create(valid_output)
            .with_context(|| format!("cannot create {}", valid_output.display()))?,
    );
    let mut invalid = BufWriter::new(
        File::create(invalid_output)
            .with_context(|| format!("cannot create {}", invalid_output.display()))?,
    );

    let mut valid_count = 0usize;
    let mut invalid_count = 0usize;
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(excludes) = &excludes {
            let relative = entry
                .path()
                .strip_prefix(path)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            if excludes.is_match(&relative) {
                continue;
            }
        }

        let report = scraper.scrape(entry.path(), true);
        let record = json!({
            "path": entry.path().to_string_lossy(),
            "filename": entry.file_name().to_string_lossy(),
            "timestamp": timestamp()?,
            "MIME type": report.mimetype,
            "version": report.version,
            "metadata": report.streams,
            "grade": report.grade,
            "well-formed": report.well_formed.unwrap_or(false),
            "tool_info": report.tool,
        });
        let line = serde_json::to_string(&record)?;
        if report.well_formed == Some(true) {
            writeln!(valid, "{line}")?;
            valid_count += 1;
        } else {
            writeln!(invalid, "{line}")?;
            invalid_count += 1;
        }
        if echo_stdout {
            println!("{line}");
        }
    }
    valid.flush()?;
    invalid.flush()?;

    if summary {
        write_summary(valid_output, true, valid_count)?;
        write_summary(invalid_output, false, invalid_count)?;
    }

    info!(valid = valid_count, invalid = invalid_count, "validation finished");
    Ok(())
}

/// Write a one-record count summary next to an output file.
fn write_summary(output: &Path, well_formed: bool, count: usize) -> Result<()> {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let summary_path: PathBuf = output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{stem}_summary.jsonl"));

    let record = json!({
        "timestamp": timestamp()?,
        "well-formed": well_formed,
        "file_count": count,
    });
    let mut file = File::create(&summary_path)
        .with_context(|| format!("cannot create {}", summary_path.display()))?;
    writeln!(file, "{}", serde_json::to_string(&record)?)?;
    Ok(())
}

fn timestamp() -> Result<String> {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    OffsetDateTime::now_utc()
        .format(&format)
        .context("cannot format timestamp")
}
