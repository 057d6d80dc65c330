//! Init-config command - write a settings file with the defaults.

use std::path::PathBuf;

use colored::Colorize;

use crate::settings::Settings;

pub fn run(output: PathBuf, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if output.exists() && !force {
        return Err(format!(
            "{} already exists. Use --force to overwrite.",
            output.display()
        )
        .into());
    }

    std::fs::write(&output, Settings::default_toml())?;
    println!("{} {}", "Wrote".green().bold(), output.display());
    Ok(())
}
