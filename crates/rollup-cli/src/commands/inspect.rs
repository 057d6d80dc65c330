//! Inspect command - show column classification for a data file.

use std::path::PathBuf;

use colored::Colorize;
use rollup::{ColumnClassification, Rollup};

use crate::settings::Settings;

pub fn run(file: PathBuf, json_output: bool, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let rollup = Rollup::with_config(settings.rollup_config()?);
    let loaded = rollup.inspect(&file)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&loaded)?);
        return Ok(());
    }

    let source = &loaded.source;
    println!("{} {}", "Inspecting".cyan().bold(), file.display().to_string().white());
    println!(
        "  {} rows, {} columns ({})",
        source.row_count.to_string().white().bold(),
        source.column_count.to_string().white().bold(),
        source.format
    );
    println!();

    println!("{}", "Columns:".yellow().bold());
    let width = loaded
        .profile
        .columns
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0);
    for column in &loaded.profile.columns {
        let class = match column.classification {
            ColumnClassification::Numeric => "numeric".green(),
            ColumnClassification::Temporal => "temporal".blue(),
            ColumnClassification::Mixed => "mixed".magenta(),
            ColumnClassification::Categorical => "categorical".normal(),
        };
        println!(
            "  {:<width$}  {:<11}  time {:>5.1}%  numeric {:>5.1}%  missing {}",
            column.name,
            class,
            column.time_parse_ratio * 100.0,
            column.numeric_parse_ratio * 100.0,
            column.missing_count,
            width = width
        );
    }
    println!();

    let list = |names: Vec<&str>| {
        if names.is_empty() {
            "(none)".dimmed().to_string()
        } else {
            names.join(", ")
        }
    };
    println!("{} {}", "Time columns (X):".cyan(), list(loaded.profile.time_candidates()));
    println!("{} {}", "Metric columns (Y):".cyan(), list(loaded.profile.numeric_candidates()));

    Ok(())
}
