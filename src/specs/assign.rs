// src/specs/assign.rs
//! Scraping *spec* for the assignment page (`/mod/assign/view.php?id=N`).
//!
//! The page carries two label/value tables:
//! - an **overview** table (participants, drafts, submitted, needs grading,
//!   due date, time remaining, late submissions), shown to graders;
//! - a **status** table (submission status, grading status, due date, time
//!   remaining, last modified, submission comments), shown per student.
//!
//! Both can mention the same logical field. The status table is authoritative.
//! Tables are told apart by content: any table with a status-only label is a
//! status table, everything else is overview.
//!
//! Values are kept as displayed ("3 days 4 hours" stays a string).

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::core::html::{selector, text_of};

/// Fixed field set of one assignment row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    DueDate,
    TimeRemaining,
    LatePolicy,
    MaxGrade,
    SubmissionStatus,
    GradingStatus,
    LastModified,
    CommentCount,
    Participants,
    Drafts,
    Submitted,
    NeedsGrading,
}

impl Field {
    /// Export column order.
    pub const ALL: [Field; 12] = [
        Field::DueDate,
        Field::TimeRemaining,
        Field::LatePolicy,
        Field::MaxGrade,
        Field::SubmissionStatus,
        Field::GradingStatus,
        Field::LastModified,
        Field::CommentCount,
        Field::Participants,
        Field::Drafts,
        Field::Submitted,
        Field::NeedsGrading,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Field::DueDate => "Due Date",
            Field::TimeRemaining => "Time Remaining",
            Field::LatePolicy => "Late Policy",
            Field::MaxGrade => "Max Grade",
            Field::SubmissionStatus => "Submission Status",
            Field::GradingStatus => "Grading Status",
            Field::LastModified => "Last Modified",
            Field::CommentCount => "Submission Comments",
            Field::Participants => "Participants",
            Field::Drafts => "Drafts",
            Field::Submitted => "Submitted",
            Field::NeedsGrading => "Needs Grading",
        }
    }
}

/// Everything read from one assignment page. Absent fields are empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetailRecord {
    values: HashMap<Field, String>,
}

impl DetailRecord {
    pub fn get(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(String::is_empty)
    }

    /// Values in [`Field::ALL`] order.
    pub fn row(&self) -> Vec<String> {
        Field::ALL.iter().map(|&f| s!(self.get(f))).collect()
    }
}

/// Where a matched label's value goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Slot {
    Field(Field),
    /// Raw "submission comments" cell; only mined for a count.
    CommentsText,
}

/// `(label substring, slot)`; evaluated in order, first match per slot wins.
type LabelTable = &'static [(&'static str, Slot)];

const OVERVIEW_LABELS: LabelTable = &[
    ("participants", Slot::Field(Field::Participants)),
    ("drafts", Slot::Field(Field::Drafts)),
    ("submitted", Slot::Field(Field::Submitted)),
    ("needs grading", Slot::Field(Field::NeedsGrading)),
    ("due date", Slot::Field(Field::DueDate)),
    ("time remaining", Slot::Field(Field::TimeRemaining)),
    ("late submissions", Slot::Field(Field::LatePolicy)),
];

const STATUS_LABELS: LabelTable = &[
    ("submission status", Slot::Field(Field::SubmissionStatus)),
    ("grading status", Slot::Field(Field::GradingStatus)),
    ("due date", Slot::Field(Field::DueDate)),
    ("time remaining", Slot::Field(Field::TimeRemaining)),
    ("last modified", Slot::Field(Field::LastModified)),
    ("submission comments", Slot::CommentsText),
];

/// Labels that only ever appear in the status table.
const STATUS_ONLY: &[&str] = &["submission status", "grading status", "last modified", "submission comments"];

/// Looked up in any table, in preference order.
const MAX_GRADE_LABELS: &[&str] = &["maximum grade", "max grade"];

static TABLES: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static TH: LazyLock<Selector> = LazyLock::new(|| selector("th"));
static TD: LazyLock<Selector> = LazyLock::new(|| selector("td"));
static LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a"));

static COMMENTS_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Comments\s*\((\d+)\)").expect("static regex"));
static PAREN_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)\)").expect("static regex"));

/// Parse an assignment page. Missing tables or labels give empty fields.
pub fn parse(body: &str) -> DetailRecord {
    let doc = Html::parse_document(body);

    let mut overview: HashMap<Slot, String> = HashMap::new();
    let mut status: HashMap<Slot, String> = HashMap::new();
    let mut grades: HashMap<&'static str, String> = HashMap::new();

    for table in doc.select(&TABLES) {
        let rows = label_rows(table);
        let is_status = rows
            .iter()
            .any(|(label, _)| STATUS_ONLY.iter().any(|k| label.contains(k)));
        let (labels, found) = if is_status {
            (STATUS_LABELS, &mut status)
        } else {
            (OVERVIEW_LABELS, &mut overview)
        };

        for (label, value) in &rows {
            if value.is_empty() { continue; }
            for &(key, slot) in labels {
                if label.contains(key) {
                    found.entry(slot).or_insert_with(|| value.clone());
                }
            }
            for &key in MAX_GRADE_LABELS {
                if label.contains(key) {
                    grades.entry(key).or_insert_with(|| value.clone());
                }
            }
        }
    }

    let mut rec = DetailRecord::default();
    for field in Field::ALL {
        let slot = Slot::Field(field);
        if let Some(v) = status.get(&slot).or_else(|| overview.get(&slot)) {
            rec.set(field, v.clone());
        }
    }

    if let Some(v) = MAX_GRADE_LABELS.iter().find_map(|k| grades.get(k)) {
        rec.set(Field::MaxGrade, v.clone());
    }

    let comments = comment_count_from_links(&doc).or_else(|| {
        status
            .get(&Slot::CommentsText)
            .and_then(|t| PAREN_COUNT.captures(t).map(|c| s!(&c[1])))
    });
    if let Some(n) = comments {
        rec.set(Field::CommentCount, n);
    }

    rec
}

/// `(lowercased th text, td text)` for every row that has both.
fn label_rows(table: ElementRef<'_>) -> Vec<(String, String)> {
    table
        .select(&ROWS)
        .filter_map(|tr| {
            let th = tr.select(&TH).next()?;
            let td = tr.select(&TD).next()?;
            Some((text_of(th).to_lowercase(), text_of(td)))
        })
        .collect()
}

/// First "Comments (N)" link anywhere on the page.
fn comment_count_from_links(doc: &Html) -> Option<String> {
    doc.select(&LINKS).find_map(|a| {
        COMMENTS_LINK.captures(&text_of(a)).map(|c| s!(&c[1]))
    })
}
