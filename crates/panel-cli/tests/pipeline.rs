//! Integration tests for the run pipeline.

use std::fs;
use std::path::Path;

use panel_cli::pipeline::{RunRequest, classify, load_config, run};
use panel_ingest::IngestOptions;
use panel_model::{CheckStatus, PrefixConfig, ReshapeConfig};
use tempfile::tempdir;

fn respondent_config(max_wave: u32) -> ReshapeConfig {
    ReshapeConfig::new("hhidpn", max_wave)
        .with_prefix(PrefixConfig::new("r").with_invariant_prefix("ra"))
        .with_in_wave_prefix("inw")
        .with_sequential_years(1992, 2)
        .with_required_column("R.shlt")
        .with_range_check("R.shlt", 1.0, 5.0)
}

fn write_input(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("wide.csv");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn run_writes_long_csv_and_report() {
    let dir = tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "hhidpn,ragender,inw1,inw2,inw3,r1shlt,r3shlt\n\
         101,1,1,0,1,2,4\n\
         102,2,1,1,1,.,\n\
         103,1,1,1,0,,\n",
    );

    let result = run(&RunRequest::new(&input, respondent_config(3))).unwrap();

    let output = dir.path().join("wide_long.csv");
    let csv = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 10);
    assert_eq!(lines[0], "hhidpn,wave,year,ragender,R.shlt,INW");
    assert_eq!(lines[1], "101,1,1992,1,2,1");
    assert_eq!(lines[2], "101,2,1994,1,,0");
    assert_eq!(lines[3], "101,3,1996,1,4,1");
    assert_eq!(lines[4], "102,1,1992,2,,1");

    let report = &result.report;
    assert_eq!(report.subject_count, 3);
    assert_eq!(report.row_count, 9);
    assert!(report.validation.all_passed(), "{:?}", report.validation);
    assert_eq!(report.input_sha256.as_ref().map(String::len), Some(64));
    assert!(report.output_sha256.is_some());

    let report_path = result.report_path.unwrap();
    assert_eq!(report_path, dir.path().join("wide_long.report.json"));
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report_path).unwrap()).unwrap();
    assert_eq!(json["row_count"], 9);
}

#[test]
fn ambiguous_columns_write_nothing() {
    let dir = tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "hhidpn,raracem,r10shlt,R10SHLT\n1,1,2,3\n",
    );
    let mut request = RunRequest::new(&input, respondent_config(10));
    request.config.in_wave_prefix = None;

    let error = run(&request).unwrap_err();

    assert!(format!("{error:#}").contains("ClassificationAmbiguity"));
    assert!(!dir.path().join("wide_long.csv").exists());
    assert!(!dir.path().join("wide_long.report.json").exists());
}

#[test]
fn alternative_wave_reading_writes_nothing() {
    let dir = tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "hhidpn,raracem,r1shlt,r10x,r20x\n1,1,2,3,4\n",
    );
    let mut request = RunRequest::new(&input, respondent_config(10));
    request.config.in_wave_prefix = None;

    let error = run(&request).unwrap_err();

    assert!(format!("{error:#}").contains("ClassificationAmbiguity"));
    assert!(!dir.path().join("wide_long.csv").exists());
    assert!(!dir.path().join("wide_long.report.json").exists());
}

#[test]
fn zero_padded_values_are_written_unchanged() {
    let dir = tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "hhidpn,racode,r1shlt\n010,07,2\n10,08,3\n",
    );
    let config = ReshapeConfig::new("hhidpn", 1)
        .with_prefix(PrefixConfig::new("r").with_invariant_prefix("ra"))
        .with_sequential_years(1992, 2);

    let result = run(&RunRequest::new(&input, config)).unwrap();

    assert_eq!(result.report.subject_count, 2);
    let csv = fs::read_to_string(dir.path().join("wide_long.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[1], "010,1,1992,07,2");
    assert_eq!(lines[2], "10,1,1992,08,3");
}

#[test]
fn failed_report_write_leaves_no_output() {
    let dir = tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "hhidpn,ragender,inw1,inw2,r1shlt,r2shlt\n1,1,1,1,2,3\n",
    );
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();
    let request = RunRequest {
        report: Some(blocker.join("report.json")),
        ..RunRequest::new(&input, respondent_config(2))
    };

    assert!(run(&request).is_err());
    assert!(!dir.path().join("wide_long.csv").exists());
    assert!(!dir.path().join("wide_long.csv.tmp").exists());
}

#[test]
fn dry_run_validates_without_writing() {
    let dir = tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "hhidpn,ragender,inw1,inw2,r1shlt,r2shlt\n1,1,1,1,9,3\n",
    );
    let request = RunRequest {
        dry_run: true,
        ..RunRequest::new(&input, respondent_config(2))
    };

    let result = run(&request).unwrap();

    assert!(result.dry_run);
    assert!(result.has_validation_failures());
    assert!(result.report_path.is_none());
    assert_eq!(
        result.report.validation.get("range:R.shlt").unwrap().status,
        CheckStatus::Fail
    );
    assert!(!dir.path().join("wide_long.csv").exists());
}

#[test]
fn classify_lists_stubs() {
    let dir = tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "hhidpn,ragender,inw1,inw11,r1shlt,r11shlt,r11SHLT_x\n1,1,1,1,2,3,4\n",
    );

    let result = classify(&input, &respondent_config(11), &IngestOptions::default()).unwrap();

    assert_eq!(result.classification.time_invariant_columns().len(), 2);
    assert_eq!(result.stubs.len(), 3);
}

#[test]
fn config_file_is_loaded_and_validated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        serde_json::to_string(&respondent_config(2)).unwrap(),
    )
    .unwrap();
    assert_eq!(load_config(Some(&path), None).unwrap(), respondent_config(2));

    fs::write(&path, r#"{"subject_key":"id","prefixes":[],"max_wave":2,"wave_years":{}}"#).unwrap();
    assert!(load_config(Some(&path), None).is_err());
}
