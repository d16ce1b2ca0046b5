use std::path::Path;

use anyhow::{Context, Result};

use sipkit_core::config::{default_config_path, Config};

use crate::args::{Cli, Command};

mod clean;
mod compile;
mod validate;

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Compile {
            source_path,
            tar_file,
            temp_path,
            config,
            validation: _,
            no_validation,
        } => compile::run(
            &source_path,
            tar_file.as_deref(),
            temp_path.as_deref(),
            config.as_deref(),
            !no_validation,
        ),
        Command::Clean {
            temp_path,
            delete_path,
        } => clean::run(&temp_path, delete_path),
        Command::Validate {
            path,
            valid_output,
            invalid_output,
            summary,
            config,
            stdout,
        } => validate::run(
            &path,
            &valid_output,
            &invalid_output,
            summary,
            config.as_deref(),
            stdout,
        ),
    }
}

/// Load the configuration from an explicit path or the default location.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Ok(Config::from_file(path)?),
        None => {
            let path = default_config_path()
                .context("no user configuration directory; pass --config")?;
            Config::from_file(&path).with_context(|| {
                format!(
                    "cannot load default configuration {}; pass --config",
                    path.display()
                )
            })
        }
    }
}

/// Like [`load_config`], but absence of a default configuration is not an
/// error (used by surfaces where configuration only adds exclusions).
pub(crate) fn load_config_optional(explicit: Option<&Path>) -> Result<Option<Config>> {
    match explicit {
        Some(path) => Ok(Some(Config::from_file(path)?)),
        None => match default_config_path() {
            Some(path) if path.exists() => Ok(Some(Config::from_file(&path)?)),
            _ => Ok(None),
        },
    }
}
