use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::info;

use sipkit_core::adaptor::SourceAdaptor;
use sipkit_core::pipeline::{cleanup, CompileOptions, SipCompiler};
use sipkit_core::toolkit::Toolkit;

pub fn run(
    source_path: &Path,
    tar_file: Option<&Path>,
    temp_path: Option<&Path>,
    config_path: Option<&Path>,
    validation: bool,
) -> Result<()> {
    let config = super::load_config(config_path)?;
    let registry = sipkit_adaptors::builtin_registry()?;
    let adaptor = registry.get(&config.script.adaptor)?;

    info!(source = %source_path.display(), adaptor = config.script.adaptor, "populating metadata");
    let graph = adaptor.populate(source_path, &config)?;

    let (temp, temp_is_default) = match temp_path {
        Some(path) => (path.to_path_buf(), false),
        None => (default_temp_path()?, true),
    };
    fs::create_dir_all(&temp)
        .with_context(|| format!("cannot create temporary directory {}", temp.display()))?;

    let toolkit = Toolkit::default();
    let mut compiler = SipCompiler::new(source_path, &temp, &config, adaptor, &graph, &toolkit)
        .with_options(CompileOptions { validation });
    if let Some(tar) = tar_file {
        compiler = compiler.with_tar_file(tar);
    }
    let tar_path = compiler.create_sip()?;

    // A defaulted temporary directory is transient: remove everything it
    // accumulated, the directory included.
    if temp_is_default {
        cleanup::clean_temp_files(&temp, None, None, true)?;
    }

    println!(
        "Compilation finished. The SIP is signed and packaged to: {}",
        tar_path.display()
    );
    Ok(())
}

/// Timestamp-named directory under the current directory.
fn default_temp_path() -> Result<PathBuf> {
    let format = format_description!("[year]-[month]-[day]T[hour]-[minute]-[second]");
    let stamp = OffsetDateTime::now_utc()
        .format(&format)
        .context("cannot format timestamp")?;
    Ok(PathBuf::from(stamp))
}
