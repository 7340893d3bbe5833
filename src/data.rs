// src/data.rs
//
// Aggregation of per-target records into export-ready tables.
//
// - DataSet: headers + rows, the only shape the export layer sees.
// - quiz_matrix: students × quizzes, sparse, empty cell for "no attempt".
// - task_table / submission_table: one row per task, or per (task, student).
//
// Inputs are index-aligned with the discovered targets. Output order comes
// from those targets, never from when a fetch finished.

use std::collections::BTreeSet;

use crate::core::net::FetchError;
use crate::specs::assign::{DetailRecord, Field};
use crate::specs::course::Target;
use crate::specs::grading::GradingRow;
use crate::specs::quiz::ScoreRecord;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataSet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataSet {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    pub fn is_empty(&self) -> bool { self.rows.is_empty() }
    pub fn len(&self) -> usize { self.rows.len() }

    /// Index of a header, exact match.
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}

/// Failed targets become empty records, in place.
pub fn or_empty<R: Default>(results: Vec<Result<R, FetchError>>) -> Vec<R> {
    results.into_iter().map(Result::unwrap_or_default).collect()
}

/// Display form of a grade: `75`, `7.5`, `0`.
pub fn format_grade(g: f64) -> String {
    format!("{g}")
}

/// Students (sorted) × quizzes (discovery order). A student missing from a
/// quiz gets an empty cell, which is not the same as a `0` grade.
pub fn quiz_matrix(quizzes: &[Target], scores: &[ScoreRecord]) -> DataSet {
    debug_assert_eq!(quizzes.len(), scores.len());

    let mut headers = vec![s!("Student Name")];
    headers.extend(quizzes.iter().map(|q| q.name.clone()));
    let mut ds = DataSet::new(headers);

    let students: BTreeSet<&str> = scores
        .iter()
        .flat_map(|rec| rec.iter().map(|(name, _)| name))
        .collect();

    for student in students {
        let mut row = Vec::with_capacity(scores.len() + 1);
        row.push(s!(student));
        row.extend(scores.iter().map(|rec| rec.get(student).map(format_grade).unwrap_or_default()));
        ds.rows.push(row);
    }
    ds
}

/// One row per assignment, discovery order.
pub fn task_table(tasks: &[Target], details: &[DetailRecord]) -> DataSet {
    debug_assert_eq!(tasks.len(), details.len());

    let mut headers = vec![s!("Task Name"), s!("Module ID")];
    headers.extend(Field::ALL.iter().map(|f| s!(f.header())));
    headers.push(s!("URL"));
    let mut ds = DataSet::new(headers);

    for (task, rec) in tasks.iter().zip(details) {
        let mut row = vec![task.name.clone(), task.module_id.clone()];
        row.extend(rec.row());
        row.push(task.url.clone());
        ds.rows.push(row);
    }
    ds
}

/// One row per (assignment, student), assignments in discovery order and
/// students in page order. `Group ID` is present only when `group` is.
pub fn submission_table(per_task: &[(Target, Vec<GradingRow>)], group: Option<&str>) -> DataSet {
    let mut headers = vec![s!("Task Name"), s!("Module ID")];
    if group.is_some() {
        headers.push(s!("Group ID"));
    }
    headers.extend(
        ["Name", "Status", "Last Modified", "Submission", "Feedback Comments", "Final Grade"]
            .map(String::from),
    );
    let mut ds = DataSet::new(headers);

    for (task, rows) in per_task {
        for r in rows {
            let mut row = vec![task.name.clone(), task.module_id.clone()];
            if let Some(g) = group {
                row.push(s!(g));
            }
            row.extend([
                r.name.clone(),
                r.status.clone(),
                r.last_modified.clone(),
                r.submission.clone(),
                r.feedback.clone(),
                r.final_grade.clone(),
            ]);
            ds.rows.push(row);
        }
    }
    ds
}
