//! Configuration management command.

use std::path::Path;

use anyhow::{Result, bail};

use super::write_output;
use crate::cli::{ConfigAction, OutputFormat};
use crate::config::Config;
use crate::format::format_json;

pub fn cmd_config(
    action: ConfigAction,
    config: &Config,
    path: &Path,
    format: OutputFormat,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let output = match format {
                OutputFormat::Text => toml::to_string_pretty(config)?,
                OutputFormat::Json => format_json(config)?,
            };
            write_output(&output)
        }
        ConfigAction::Path => write_output(&format!("{}\n", path.display())),
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "Config file already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(path)?;
            write_output(&format!("Wrote default config to {}\n", path.display()))
        }
    }
}
