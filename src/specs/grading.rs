// src/specs/grading.rs
//! Scraping *spec* for the grading table
//! (`/mod/assign/view.php?id=N&action=grading[&group=G]`).
//!
//! Columns read (0-based, 14 cells minimum):
//! `2` name link, `4` status divs, `7` last modified, `8` submission,
//! `11` feedback comments, `13` final grade.
//!
//! The submission cell renders three ways: file uploads, online text in a
//! `.no-overflow` box, or plain text ("No submission"). Tried in that order.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::core::html::{attr, cells, children_named, has_class, selector, text_of, text_tight};

const MIN_CELLS: usize = 14;
const NAME_COL: usize = 2;
const STATUS_COL: usize = 4;
const MODIFIED_COL: usize = 7;
const SUBMISSION_COL: usize = 8;
const FEEDBACK_COL: usize = 11;
const GRADE_COL: usize = 13;

/// One student's line in one assignment's grading table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GradingRow {
    pub name: String,
    /// Sub-statuses joined with `" | "`.
    pub status: String,
    pub last_modified: String,
    /// File names (`", "`-joined) or online text.
    pub submission: String,
    pub feedback: String,
    pub final_grade: String,
}

/// An entry of the group filter on the grading page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub name: String,
}

static GRADING_TABLE: LazyLock<Selector> =
    LazyLock::new(|| selector("table.flexible.generaltable.generalbox"));
static TBODY: LazyLock<Selector> = LazyLock::new(|| selector("tbody"));
static ANY_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static DIVS: LazyLock<Selector> = LazyLock::new(|| selector("div"));
static FILE_DIVS: LazyLock<Selector> = LazyLock::new(|| selector("div.fileuploadsubmission"));
static FILE_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href*=\"pluginfile.php\"]"));
static NO_OVERFLOW: LazyLock<Selector> = LazyLock::new(|| selector("div.no-overflow"));
static GROUP_OPTIONS: LazyLock<Selector> =
    LazyLock::new(|| selector("select[name=\"group\"] option"));

/// Parse the grading table. `None` when the table is not on the page.
pub fn parse_grading(body: &str) -> Option<Vec<GradingRow>> {
    let doc = Html::parse_document(body);
    let table = doc.select(&GRADING_TABLE).next()?;
    let Some(tbody) = table.select(&TBODY).next() else {
        return Some(Vec::new());
    };

    let rows = children_named(tbody, "tr")
        .into_iter()
        .filter(|tr| !has_class(*tr, "emptyrow"))
        .filter_map(parse_row)
        .collect();
    Some(rows)
}

fn parse_row(tr: ElementRef<'_>) -> Option<GradingRow> {
    let c = cells(tr);
    if c.len() < MIN_CELLS {
        return None;
    }

    let name = c[NAME_COL].select(&ANY_LINK).next().map(text_tight).unwrap_or_default();

    let status = c[STATUS_COL]
        .select(&DIVS)
        .map(text_tight)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");

    Some(GradingRow {
        name,
        status,
        last_modified: text_of(c[MODIFIED_COL]),
        submission: submission(c[SUBMISSION_COL]),
        feedback: text_of(c[FEEDBACK_COL]),
        final_grade: text_of(c[GRADE_COL]),
    })
}

/// Uploaded file names, online text, or the cell's own text.
fn submission(cell: ElementRef<'_>) -> String {
    let files: Vec<ElementRef<'_>> = cell.select(&FILE_DIVS).collect();
    if !files.is_empty() {
        return files
            .iter()
            .filter_map(|div| div.select(&FILE_LINK).next())
            .map(text_tight)
            .collect::<Vec<_>>()
            .join(", ");
    }

    match cell.select(&NO_OVERFLOW).next() {
        Some(text) => text_of(text),
        None => text_of(cell),
    }
}

/// Groups offered by the grading page's group selector, in page order.
/// Options with an empty value or label are dropped.
pub fn parse_groups(body: &str) -> Vec<Group> {
    let doc = Html::parse_document(body);
    doc.select(&GROUP_OPTIONS)
        .map(|o| Group { id: s!(attr(o, "value")), name: text_tight(o) })
        .filter(|g| !g.id.is_empty() && !g.name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, submission_cell: &str, cells_total: usize) -> String {
        let mut tds = Vec::new();
        for i in 0..cells_total {
            let td = match i {
                2 => format!(r#"<td class="cell c2"><a href="user/view.php?id=1">{name}</a><span>{name}@x.org</span></td>"#),
                4 => s!(r#"<td class="cell c4"><div class="submissionstatussubmitted">Submitted for grading</div><div class="submissiongraded">Graded</div></td>"#),
                7 => s!(r#"<td class="cell c7">Monday, 3 June 2024, 10:00 AM</td>"#),
                8 => format!(r#"<td class="cell c8">{submission_cell}</td>"#),
                11 => s!(r#"<td class="cell c11">Well done</td>"#),
                13 => s!(r#"<td class="cell c13">9.00 / 10.00</td>"#),
                _ => format!(r#"<td class="cell c{i}"></td>"#),
            };
            tds.push(td);
        }
        format!("<tr>{}</tr>", tds.concat())
    }

    fn table(rows: &[String]) -> String {
        format!(
            r#"<html><body>
            <select name="group"><option value="0">All participants</option><option value="3345">Batch A</option><option value="">--</option></select>
            <table class="flexible generaltable generalbox" id="submissions"><thead><tr><th>Select</th></tr></thead>
            <tbody>{}</tbody></table></body></html>"#,
            rows.concat()
        )
    }

    const FILES: &str = r#"
        <div class="fileuploadsubmission"><img src="pdf.png"><a target="_blank" href="https://paatshala.ictkerala.org/pluginfile.php/1/assignsubmission_file/submission_files/7/a.pdf?forcedownload=1">a.pdf</a></div>
        <div class="fileuploadsubmission"><img src="pdf.png"><a target="_blank" href="https://paatshala.ictkerala.org/pluginfile.php/1/assignsubmission_file/submission_files/7/b.pdf?forcedownload=1">b.pdf</a></div>
    "#;

    #[test]
    fn full_row_is_extracted() {
        let rows = parse_grading(&table(&[row("Anu S", FILES, 14)])).unwrap();
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.name, "Anu S");
        assert_eq!(r.status, "Submitted for grading | Graded");
        assert_eq!(r.last_modified, "Monday, 3 June 2024, 10:00 AM");
        assert_eq!(r.submission, "a.pdf, b.pdf");
        assert_eq!(r.feedback, "Well done");
        assert_eq!(r.final_grade, "9.00 / 10.00");
    }

    #[test]
    fn short_rows_are_dropped_not_blanked() {
        let rows = parse_grading(&table(&[row("Short", FILES, 13), row("Full", FILES, 14)])).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Full");
    }

    #[test]
    fn online_text_uses_no_overflow_box() {
        let cell = r#"<div class="summary">ignored</div><div class="no-overflow"><p>https://github.com/anu/task1</p></div>"#;
        let rows = parse_grading(&table(&[row("Anu", cell, 14)])).unwrap();
        assert_eq!(rows[0].submission, "https://github.com/anu/task1");
        assert!(!rows[0].submission.contains("ignored"));
    }

    #[test]
    fn plain_cell_text_is_last_resort() {
        let rows = parse_grading(&table(&[row("Anu", "No submission", 14)])).unwrap();
        assert_eq!(rows[0].submission, "No submission");
    }

    #[test]
    fn empty_rows_and_missing_table() {
        let empty = s!(r#"<tr class="emptyrow"><td></td><td></td><td></td><td></td><td></td><td></td><td></td><td></td><td></td><td></td><td></td><td></td><td></td><td></td></tr>"#);
        assert_eq!(parse_grading(&table(&[empty])), Some(vec![]));
        assert_eq!(parse_grading("<table class=\"generaltable\"><tbody></tbody></table>"), None);
    }

    #[test]
    fn groups_from_selector() {
        let groups = parse_groups(&table(&[]));
        assert_eq!(
            groups,
            vec![
                Group { id: s!("0"), name: s!("All participants") },
                Group { id: s!("3345"), name: s!("Batch A") },
            ]
        );
    }
}
