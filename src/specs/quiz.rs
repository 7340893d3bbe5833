// src/specs/quiz.rs
//! Scraping *spec* for the quiz attempts report
//! (`/mod/quiz/report.php?id=N&mode=overview`).
//!
//! Positional contract (as served today):
//! - col 2: student link (`user/view.php`)
//! - col 8: grade, first decimal number in the cell
//!
//! Rows with fewer than 9 cells, without a student link, or without a
//! parseable grade are skipped: that is an unattempted or ungraded row.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::core::html::{cells, has_class, selector, text_tight};

const MIN_CELLS: usize = 9;
const NAME_COL: usize = 2;
const GRADE_COL: usize = 8;

/// Best grade per student for one quiz.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreRecord {
    scores: BTreeMap<String, f64>,
    /// Attempt rows that carried a grade.
    pub attempts: usize,
}

impl ScoreRecord {
    /// Keep the higher of the stored and the new grade. Never sums, never
    /// lowers.
    pub fn insert_max(&mut self, student: &str, grade: f64) {
        match self.scores.get_mut(student) {
            Some(best) if *best >= grade => {}
            Some(best) => *best = grade,
            None => {
                self.scores.insert(s!(student), grade);
            }
        }
    }

    pub fn get(&self, student: &str) -> Option<f64> {
        self.scores.get(student).copied()
    }

    /// Students in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize { self.scores.len() }
    pub fn is_empty(&self) -> bool { self.scores.is_empty() }
}

static RESULTS_TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table.generaltable"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static USER_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href*=\"user/view.php\"]"));

static GRADE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)").expect("static regex"));

/// Parse the attempts report. `None` when there is no results table.
pub fn parse_report(body: &str) -> Option<ScoreRecord> {
    let doc = Html::parse_document(body);
    let table = doc.select(&RESULTS_TABLE).next()?;

    let mut rec = ScoreRecord::default();
    for tr in table.select(&ROWS).skip(1) {
        if has_class(tr, "emptyrow") { continue; }

        let cols = cells(tr);
        if cols.len() < MIN_CELLS { continue; }

        let Some(link) = cols[NAME_COL].select(&USER_LINK).next() else { continue };
        let name = text_tight(link);
        if name.is_empty() { continue; }

        let grade_text = text_tight(cols[GRADE_COL]);
        let Some(grade) = parse_grade(&grade_text) else { continue };

        rec.insert_max(&name, grade);
        rec.attempts += 1;
    }
    Some(rec)
}

/// First decimal number in the cell text.
pub fn parse_grade(text: &str) -> Option<f64> {
    GRADE.captures(text).and_then(|c| c[1].parse().ok())
}
