// tests/export.rs
//
// Writing aggregated tables to disk, without the network.
//
use std::fs;

use paatshala_scrape::config::options::{ExportFormat, ExportOptions};
use paatshala_scrape::csv::parse_rows;
use paatshala_scrape::data::{self, DataSet};
use paatshala_scrape::file;
use paatshala_scrape::specs::assign::{DetailRecord, Field};
use paatshala_scrape::specs::course::Target;
use paatshala_scrape::specs::grading::GradingRow;

fn export_to(dir: &std::path::Path, format: ExportFormat, include_headers: bool) -> ExportOptions {
    ExportOptions { format, out_dir: dir.to_path_buf(), include_headers }
}

fn tasks() -> DataSet {
    let targets = vec![Target::assignment("Task 1: Setup, part A", "101"), Target::assignment("Task 2", "102")];
    let mut rec = DetailRecord::default();
    rec.set(Field::DueDate, "Friday, 14 June 2024, 11:59 PM");
    rec.set(Field::Participants, "32");
    data::task_table(&targets, &[rec, DetailRecord::default()])
}

#[test]
fn tasks_land_in_course_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let export = export_to(tmp.path(), ExportFormat::Csv, true);

    let path = file::write_export(&export, 450, &file::tasks_stem(450), &tasks()).unwrap();
    assert_eq!(path, tmp.path().join("course_450").join("tasks_450.csv"));

    let rows = parse_rows(&fs::read_to_string(&path).unwrap(), ExportFormat::Csv).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], "Task Name");
    assert_eq!(rows[0].last().unwrap(), "URL");
    assert_eq!(rows[1][0], "Task 1: Setup, part A");
    assert_eq!(rows[1][2], "Friday, 14 June 2024, 11:59 PM");
    assert_eq!(rows[2][2], "");
}

#[test]
fn tsv_without_headers_overwrites() {
    let tmp = tempfile::tempdir().unwrap();
    let export = export_to(tmp.path(), ExportFormat::Tsv, false);

    let row = GradingRow { name: s("Anu"), submission: s("a.pdf, b.pdf"), ..GradingRow::default() };
    let per_task = vec![(Target::assignment("Task 1", "101"), vec![row])];
    let ds = data::submission_table(&per_task, Some("3345"));

    let stem = file::submissions_stem(450, Some("101"), Some("3345"));
    let first = file::write_export(&export, 450, &stem, &ds).unwrap();
    let second = file::write_export(&export, 450, &stem, &ds).unwrap();
    assert_eq!(first, second);
    assert!(first.ends_with("course_450/submissions_450_mod101_grp3345.tsv"));

    let text = fs::read_to_string(&second).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert_eq!(text, "Task 1\t101\t3345\tAnu\t\t\ta.pdf, b.pdf\t\t\n");
}

#[test]
fn file_in_place_of_directory_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("course_9"), "not a dir").unwrap();
    let export = export_to(tmp.path(), ExportFormat::Csv, true);
    assert!(file::write_export(&export, 9, "tasks_9", &tasks()).is_err());
}

fn s(v: &str) -> String {
    v.to_string()
}
