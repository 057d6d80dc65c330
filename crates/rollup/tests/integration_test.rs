//! Integration tests for Rollup.

use std::io::Write;
use tempfile::NamedTempFile;

use rollup::export::{self, ExportFormat, ExportOptions};
use rollup::{
    ColumnClassification, DerivationMode, EmptyReason, FilterSpec, KeyType, PipelineConfig,
    Reduction, Rollup, RollupError, run_pipeline,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

const SALES: &str = "ts,category,amount\n\
                     2024-01-01T08:00:00,A,10\n\
                     2024-01-01T08:30:00,B,5\n\
                     2024-01-01T09:15:00,A,7\n\
                     2024-01-02T08:00:00,A,3\n";

fn load(content: &str) -> rollup::DataTable {
    let file = create_test_file(content);
    let (table, _) = Rollup::new().load(file.path()).expect("Load failed");
    table
}

// =============================================================================
// Loading and Profiling
// =============================================================================

#[test]
fn test_load_records_source_metadata() {
    let file = create_test_file(SALES);
    let (table, source) = Rollup::new().load(file.path()).expect("Load failed");

    assert_eq!(table.row_count(), 4);
    assert_eq!(source.row_count, 4);
    assert_eq!(source.column_count, 3);
    assert_eq!(source.format, "csv");
    assert!(source.hash.starts_with("sha256:"));
    assert!(!source.file.is_empty());
}

#[test]
fn test_inspect_classifies_columns() {
    let file = create_test_file(SALES);
    let loaded = Rollup::new().inspect(file.path()).expect("Inspect failed");

    let profile = &loaded.profile;
    assert_eq!(profile.column("ts").unwrap().classification, ColumnClassification::Temporal);
    assert_eq!(profile.column("category").unwrap().classification, ColumnClassification::Categorical);
    assert_eq!(profile.column("amount").unwrap().classification, ColumnClassification::Numeric);
    assert_eq!(profile.time_candidates(), vec!["ts"]);
    assert_eq!(profile.numeric_candidates(), vec!["amount"]);
}

#[test]
fn test_epoch_column_is_both_time_and_numeric() {
    let table = load("epoch,v\n1704096000,1\n1704099600,2\n");
    let profile = Rollup::new().profile(&table);
    assert_eq!(profile.column("epoch").unwrap().classification, ColumnClassification::Mixed);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Rollup::new().load("/definitely/not/here.csv").unwrap_err();
    assert!(matches!(err, RollupError::Io { .. }));
}

#[test]
fn test_ragged_file_is_malformed() {
    let file = create_test_file("a,b\n1,2\n3\n");
    let err = Rollup::new().load(file.path()).unwrap_err();
    assert!(matches!(err, RollupError::MalformedTable { .. }));
}

// =============================================================================
// End-to-end Scenarios
// =============================================================================

#[test]
fn test_hourly_sum() {
    let table = load(SALES);
    let config = PipelineConfig::new("ts")
        .derive(DerivationMode::Hour)
        .metric("amount")
        .reduce(Reduction::Sum);

    let result = run_pipeline(&table, &config).unwrap().into_ready().unwrap();
    assert_eq!(result.view.key_column, "hour");
    assert_eq!(result.view.labels(), vec!["8", "9"]);
    assert_eq!(result.view.value("8", "amount"), Some(18.0));
    assert_eq!(result.view.value("9", "amount"), Some(7.0));
    assert_eq!(result.metadata().dropped_rows, 0);
}

#[test]
fn test_category_count() {
    let table = load(SALES);
    let config = PipelineConfig::new("category")
        .metric("amount")
        .reduce(Reduction::Count);

    let result = run_pipeline(&table, &config).unwrap().into_ready().unwrap();
    assert_eq!(result.view.labels(), vec!["A", "B"]);
    assert_eq!(result.view.value("A", "amount"), Some(3.0));
    assert_eq!(result.view.value("B", "amount"), Some(1.0));
}

#[test]
fn test_weekday_order_ignores_input_order() {
    let table = load("ts,amount\n2024-01-02T10:00:00,1\n2024-01-01T10:00:00,2\n");
    let config = PipelineConfig::new("ts")
        .derive(DerivationMode::Weekday)
        .metric("amount");

    let result = run_pipeline(&table, &config).unwrap().into_ready().unwrap();
    assert_eq!(result.view.key_type, KeyType::FixedCategorical);
    assert_eq!(result.view.labels(), vec!["Monday", "Tuesday"]);
}

#[test]
fn test_no_metric_selected() {
    let table = load(SALES);
    let config = PipelineConfig::new("ts").derive(DerivationMode::Hour);

    let outcome = run_pipeline(&table, &config).unwrap();
    assert_eq!(outcome.empty().map(|e| e.reason), Some(EmptyReason::NoMetrics));
}

#[test]
fn test_all_missing_group_mean_is_missing() {
    let table = load("k,v\nA,1\nB,\nB,NA\n");
    let config = PipelineConfig::new("k").metric("v").reduce(Reduction::Mean);

    let result = run_pipeline(&table, &config).unwrap().into_ready().unwrap();
    assert_eq!(result.view.value("A", "v"), Some(1.0));
    assert_eq!(result.view.row("B").unwrap().values, vec![None]);
}

#[test]
fn test_date_range_filter() {
    let table = load(
        "day,amount\n\
         2024-01-05,1\n\
         2024-02-10,2\n\
         2024-02-20,3\n\
         2024-03-01,4\n",
    );
    let config = PipelineConfig::new("day")
        .derive(DerivationMode::Date)
        .metric("amount")
        .filter(FilterSpec::DateRange {
            start: chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        });

    let result = run_pipeline(&table, &config).unwrap().into_ready().unwrap();
    assert_eq!(result.view.labels(), vec!["2024-02-10", "2024-02-20"]);
    let meta = result.metadata();
    assert_eq!(meta.aggregated_rows, 4);
    assert_eq!(meta.filtered_rows, 2);
}

#[test]
fn test_filter_removing_everything() {
    let table = load(SALES);
    let config = PipelineConfig::new("category")
        .metric("amount")
        .filter(FilterSpec::Categories {
            values: vec!["Z".to_string()],
        });

    let outcome = run_pipeline(&table, &config).unwrap();
    let empty = outcome.empty().unwrap();
    assert_eq!(empty.reason, EmptyReason::FilteredOut);
    assert_eq!(empty.source_rows, 4);
}

#[test]
fn test_configuration_errors_are_flagged() {
    let table = load(SALES);
    let bad = [
        PipelineConfig::new("missing").metric("amount"),
        PipelineConfig::new("category").derive(DerivationMode::Month).metric("amount"),
        PipelineConfig::new("ts").metrics(["amount", "amount"]),
        PipelineConfig::new("ts").derive(DerivationMode::Hour).metric("amount").filter(
            FilterSpec::NumericRange {
                min: 10.0,
                max: 2.0,
            },
        ),
    ];
    for config in &bad {
        let err = run_pipeline(&table, config).unwrap_err();
        assert!(err.is_configuration(), "{err}");
    }
}

// =============================================================================
// Export
// =============================================================================

#[test]
fn test_export_reparses_to_same_view() {
    let table = load(SALES);
    let config = PipelineConfig::new("ts")
        .derive(DerivationMode::Date)
        .metrics(["amount"])
        .reduce(Reduction::Mean);
    let result = run_pipeline(&table, &config).unwrap().into_ready().unwrap();

    let options = ExportOptions::new(ExportFormat::Csv).with_bom(true);
    let bytes = export::to_bytes(&result.view, options).unwrap();
    let reparsed = export::read_back(&bytes).unwrap();

    assert_eq!(reparsed.headers, vec!["date", "amount"]);
    assert_eq!(reparsed.row_count(), result.rows().len());
    for (row, original) in reparsed.rows.iter().zip(result.rows()) {
        assert_eq!(row[0], original.key.label());
        assert_eq!(row[1].parse::<f64>().ok(), original.values[0]);
    }
}

#[test]
fn test_export_keeps_sub_second_keys_apart() {
    let table = load(
        "ts,amount\n\
         2024-01-01 09:15:00.250,1\n\
         2024-01-01 09:15:00.500,2\n\
         2024-01-01 09:16:00,4\n",
    );
    let config = PipelineConfig::new("ts").metric("amount").reduce(Reduction::Sum);
    let result = run_pipeline(&table, &config).unwrap().into_ready().unwrap();

    let bytes = export::to_bytes(&result.view, ExportOptions::default()).unwrap();
    let reparsed = export::read_back(&bytes).unwrap();

    assert_eq!(reparsed.row_count(), 3);
    assert_eq!(
        reparsed.column_by_name("ts"),
        Some(vec![
            "2024-01-01 09:15:00.250",
            "2024-01-01 09:15:00.500",
            "2024-01-01 09:16:00",
        ])
    );
    assert_eq!(reparsed.column_by_name("amount"), Some(vec!["1", "2", "4"]));
}
