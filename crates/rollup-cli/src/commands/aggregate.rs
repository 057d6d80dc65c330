//! Aggregate command - group, reduce, filter and print or export.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use colored::Colorize;
use rollup::export::{self, ExportFormat, ExportOptions};
use rollup::schema::format_number;
use rollup::{
    AggregatedView, EmptyView, FilterDomain, FilterSpec, FilteredView, Outcome, PipelineConfig,
    Rollup,
};
use tracing::info;

use crate::cli::AggregateArgs;
use crate::settings::Settings;

pub fn run(args: AggregateArgs, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let rollup = Rollup::with_config(settings.rollup_config()?);
    let (table, source) = rollup.load(&args.file)?;
    info!(file = %source.file, rows = source.row_count, "loaded");

    let config = PipelineConfig::new(args.x_column.clone())
        .derive(args.derivation)
        .metrics(args.y_columns.iter().cloned())
        .reduce(args.reduction);

    // Aggregate unfiltered first; open-ended date bounds come from the view
    let view = match rollup.run(&table, &config)? {
        Outcome::Ready(result) => result.view,
        Outcome::Empty(empty) => return report_empty(&empty, args.json),
    };

    let spec = filter_spec(&args, &rollup.range_filter().domain(&view));
    let outcome = match spec {
        FilterSpec::All => Outcome::Ready(FilteredView::unfiltered(view)),
        spec => rollup.range_filter().apply(&view, &spec)?,
    };

    let result = match outcome {
        Outcome::Ready(result) => result,
        Outcome::Empty(empty) => return report_empty(&empty, args.json),
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "status": "ready",
                "metadata": result.metadata(),
                "view": result.view,
            }))?
        );
        return Ok(());
    }

    match &args.output {
        Some(path) => {
            let format = args
                .format
                .or_else(|| format_from_extension(path))
                .unwrap_or(settings.output.format);
            let options = ExportOptions::new(format).with_bom(args.bom || settings.output.bom);
            let writer = BufWriter::new(File::create(path)?);
            export::write_view(&result.view, options, writer)?;
            println!(
                "{} {} rows to {} ({})",
                "Wrote".green().bold(),
                result.rows().len(),
                path.display(),
                format
            );
        }
        None => print_view(&result),
    }

    Ok(())
}

/// Filter requested on the command line. A single date bound is completed
/// from the view's own range.
fn filter_spec(args: &AggregateArgs, domain: &FilterDomain) -> FilterSpec {
    if let Some(range) = args.range {
        return FilterSpec::NumericRange {
            min: range.min,
            max: range.max,
        };
    }
    if let Some(values) = &args.include {
        return FilterSpec::Categories {
            values: values.clone(),
        };
    }
    if args.from.is_none() && args.to.is_none() {
        return FilterSpec::All;
    }

    let (lo, hi) = match domain {
        FilterDomain::DateRange { start, end } => (Some(*start), Some(*end)),
        _ => (None, None),
    };
    match (args.from.or(lo), args.to.or(hi)) {
        (Some(start), Some(end)) => FilterSpec::DateRange { start, end },
        // Not a date key; let the filter report the mismatch
        (Some(day), None) | (None, Some(day)) => FilterSpec::DateRange {
            start: day,
            end: day,
        },
        (None, None) => FilterSpec::All,
    }
}

fn format_from_extension(path: &Path) -> Option<ExportFormat> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(|e| e.parse().ok())
}

fn report_empty(empty: &EmptyView, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json_output {
        let outcome: Outcome<FilteredView> = Outcome::Empty(empty.clone());
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("{} {}", "No data:".yellow().bold(), empty.reason.describe());
    println!(
        "  source rows: {}, dropped: {}",
        empty.source_rows, empty.dropped_rows
    );
    Ok(())
}

fn print_view(result: &FilteredView) {
    let view: &AggregatedView = &result.view;
    let meta = result.metadata();

    let header: Vec<String> = view.columns().iter().map(|c| c.to_string()).collect();
    let body: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| {
            std::iter::once(row.key.label())
                .chain(row.values.iter().map(|v| match v {
                    Some(v) => format_number(*v),
                    None => "-".to_string(),
                }))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            body.iter()
                .map(|r| r[i].len())
                .chain(std::iter::once(header[i].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, w))| {
                if i == 0 {
                    format!("{:<w$}", cell, w = w)
                } else {
                    format!("{:>w$}", cell, w = w)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!(
        "{} {} by {} ({} key)",
        view.reduction.to_string().cyan().bold(),
        view.metric_columns.join(", ").white(),
        view.key_column.white(),
        view.key_type
    );
    println!();
    println!("{}", line(&header).bold());
    for row in &body {
        println!("{}", line(row));
    }
    println!();
    println!(
        "{} {} source, {} dropped, {} groups, {} shown",
        "Rows:".dimmed(),
        meta.source_rows,
        meta.dropped_rows,
        meta.aggregated_rows,
        meta.filtered_rows
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use chrono::NaiveDate;
    use clap::Parser;

    fn args(extra: &[&str]) -> AggregateArgs {
        let mut argv = vec!["rollup", "aggregate", "f.csv", "-x", "ts", "-y", "v"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Aggregate(args) => args,
            _ => panic!("expected aggregate"),
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_open_date_bound_uses_domain() {
        let domain = FilterDomain::DateRange {
            start: ymd(2024, 1, 1),
            end: ymd(2024, 1, 31),
        };
        assert_eq!(
            filter_spec(&args(&["--from", "2024-01-10"]), &domain),
            FilterSpec::DateRange {
                start: ymd(2024, 1, 10),
                end: ymd(2024, 1, 31),
            }
        );
    }

    #[test]
    fn test_no_filter_flags_keeps_everything() {
        let domain = FilterDomain::Categories { values: vec![] };
        assert_eq!(filter_spec(&args(&[]), &domain), FilterSpec::All);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(format_from_extension(Path::new("out.tsv")), Some(ExportFormat::Tsv));
        assert_eq!(format_from_extension(Path::new("out.JSON")), Some(ExportFormat::Json));
        assert_eq!(format_from_extension(Path::new("out")), None);
    }

    #[test]
    fn test_run_writes_export() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sales.csv");
        let output = dir.path().join("hourly.tsv");
        std::fs::write(
            &input,
            "ts,amount\n2024-01-01T08:00:00,10\n2024-01-01T08:30:00,8\n2024-01-01T09:15:00,7\n",
        )
        .unwrap();

        let argv = [
            "rollup",
            "aggregate",
            input.to_str().unwrap(),
            "-x",
            "ts",
            "--derive",
            "hour",
            "-y",
            "amount",
            "-o",
            output.to_str().unwrap(),
        ];
        let Commands::Aggregate(args) = Cli::parse_from(argv).command else {
            panic!("expected aggregate");
        };
        run(args, &Settings::default()).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, "hour\tamount\n8\t18\n9\t7\n");
    }
}
