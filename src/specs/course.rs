// src/specs/course.rs
//! Scraping *spec* for the course page (`/course/view.php?id=N`).
//!
//! Purpose:
//! - Enumerate assignment and quiz modules in page order. This is the
//!   discovery step every parallel run starts from.
//!
//! Non-Responsibilities:
//! - No fetching of the module pages themselves.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::consts::BASE;
use crate::core::html::{attr, selector, visible_text};

/// One unit of parallel work: a module page to fetch and parse.
///
/// `(name, module_id)` is what the site shows, and it is not unique. Results
/// are keyed by position in the discovered list, never by this pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub module_id: String,
    pub url: String,
}

impl Target {
    pub fn assignment(name: &str, module_id: &str) -> Self {
        Self {
            name: s!(name),
            module_id: s!(module_id),
            url: site!("/mod/assign/view.php?id={module_id}"),
        }
    }

    /// Targets the attempts report, not the quiz landing page.
    pub fn quiz(name: &str, module_id: &str) -> Self {
        Self {
            name: s!(name),
            module_id: s!(module_id),
            url: site!("/mod/quiz/report.php?id={module_id}&mode=overview"),
        }
    }

    /// The grading table of this assignment, optionally filtered by group.
    pub fn grading(&self, group: Option<&str>) -> Self {
        let mut url = site!("/mod/assign/view.php?id={}&action=grading", self.module_id);
        if let Some(g) = group {
            url.push_str(&format!("&group={g}"));
        }
        Self { name: self.name.clone(), module_id: self.module_id.clone(), url }
    }
}

static COURSE_CONTENT: LazyLock<Selector> =
    LazyLock::new(|| selector(".course-content, li.activity, li[class*=\"modtype_\"]"));
static ITEMS: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

static ASSIGN_VIEW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"mod/assign/view\.php\?id=\d+").expect("static regex"));
static QUIZ_VIEW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"mod/quiz/view\.php\?id=\d+").expect("static regex"));
static ID_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]id=(\d+)").expect("static regex"));

/// True when the body looks like a course page at all. A login form or an
/// error page served with 200 fails this.
pub fn has_course_content(doc: &Html) -> bool {
    doc.select(&COURSE_CONTENT).next().is_some()
}

/// Assignments in page order. `None` when the page has no course content.
pub fn parse_assignments(body: &str) -> Option<Vec<Target>> {
    let doc = Html::parse_document(body);
    if !has_course_content(&doc) {
        return None;
    }

    let mut out = Vec::new();
    for li in module_items(&doc, "modtype_assign") {
        let link = first_link(li, |href| ASSIGN_VIEW.is_match(href))
            .or_else(|| first_link(li, |href| href.contains("/mod/assign/")));
        let Some(link) = link else { continue };

        let href = attr(link, "href");
        let name = visible_text(link);
        let module_id = module_id(href).unwrap_or_default();
        out.push(Target { name, module_id, url: absolutize(href) });
    }
    Some(out)
}

/// Quizzes in page order, filtered by `keep(name)`. `None` when the page has
/// no course content.
pub fn parse_quizzes(body: &str, keep: impl Fn(&str) -> bool) -> Option<Vec<Target>> {
    let doc = Html::parse_document(body);
    if !has_course_content(&doc) {
        return None;
    }

    let mut out = Vec::new();
    for li in module_items(&doc, "modtype_quiz") {
        let Some(link) = first_link(li, |href| QUIZ_VIEW.is_match(href)) else { continue };
        let name = visible_text(link);
        if !keep(&name) {
            logd!("Quiz skipped by filter: {name}");
            continue;
        }
        if let Some(mid) = module_id(attr(link, "href")) {
            out.push(Target::quiz(&name, &mid));
        }
    }
    Some(out)
}

fn module_items<'a>(doc: &'a Html, class: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    doc.select(&ITEMS)
        .filter(move |li| li.value().classes().any(|c| c == class))
}

fn first_link<'a>(li: ElementRef<'a>, pred: impl Fn(&str) -> bool) -> Option<ElementRef<'a>> {
    li.select(&LINKS).find(|a| pred(attr(*a, "href")))
}

pub fn module_id(href: &str) -> Option<String> {
    ID_PARAM.captures(href).map(|c| s!(&c[1]))
}

pub fn absolutize(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        s!(href)
    } else if href.starts_with('/') {
        join!(BASE, href)
    } else {
        join!(BASE, "/", href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COURSE: &str = r#"
        <html><body><div class="course-content"><ul class="topics">
          <li class="activity assign modtype_assign" id="module-101">
            <a href="https://paatshala.ictkerala.org/mod/assign/view.php?id=101">
              <span class="instancename">Task 1: Setup<span class="accesshide "> Assignment</span></span></a>
          </li>
          <li class="activity quiz modtype_quiz" id="module-201">
            <a href="https://paatshala.ictkerala.org/mod/quiz/view.php?id=201">
              <span class="instancename">Practice Quiz 1<span class="accesshide "> Quiz</span></span></a>
          </li>
          <li class="activity quiz modtype_quiz" id="module-202">
            <a href="https://paatshala.ictkerala.org/mod/quiz/view.php?id=202">
              <span class="instancename">Final Exam</span></a>
          </li>
          <li class="activity quiz modtype_quiz" id="module-203">
            <a href="https://paatshala.ictkerala.org/mod/quiz/view.php?id=203">
              <span class="instancename">Week 3 Practice Quiz<span class="accesshide "> Quiz</span></span></a>
          </li>
          <li class="activity assign modtype_assign" id="module-102">
            <a href="/mod/assign/view.php?id=102">Task 2</a>
          </li>
          <li class="activity assign modtype_assign" id="module-103">
            <span>Restricted, no link</span>
          </li>
        </ul></div></body></html>
    "#;

    #[test]
    fn assignments_in_page_order_with_absolute_urls() {
        let tasks = parse_assignments(COURSE).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].name, "Task 1: Setup");
        assert_eq!(tasks[0].module_id, "101");
        assert_eq!(tasks[1].name, "Task 2");
        assert_eq!(tasks[1].url, "https://paatshala.ictkerala.org/mod/assign/view.php?id=102");
    }

    #[test]
    fn quizzes_are_filtered_and_point_at_report() {
        let quizzes = parse_quizzes(COURSE, |n| n.to_lowercase().contains("practice quiz")).unwrap();
        assert_eq!(quizzes.len(), 2);
        assert_eq!(quizzes[0].name, "Practice Quiz 1");
        assert_eq!(quizzes[1].name, "Week 3 Practice Quiz");
        assert_eq!(
            quizzes[0].url,
            "https://paatshala.ictkerala.org/mod/quiz/report.php?id=201&mode=overview"
        );

        let all = parse_quizzes(COURSE, |_| true).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn login_page_is_not_a_course_page() {
        let body = r#"<html><body><form id="login"><input name="username"></form></body></html>"#;
        assert!(parse_assignments(body).is_none());
        assert!(parse_quizzes(body, |_| true).is_none());
    }

    #[test]
    fn empty_course_yields_empty_list() {
        let body = r#"<div class="course-content"><ul></ul></div>"#;
        assert_eq!(parse_assignments(body), Some(vec![]));
    }

    #[test]
    fn grading_url_carries_group() {
        let t = Target::assignment("Task 1", "101");
        assert_eq!(t.grading(None).url, "https://paatshala.ictkerala.org/mod/assign/view.php?id=101&action=grading");
        assert!(t.grading(Some("3345")).url.ends_with("&action=grading&group=3345"));
        assert_eq!(t.grading(None).name, "Task 1");
    }

    #[test]
    fn module_id_and_absolutize() {
        assert_eq!(module_id("view.php?foo=1&id=42").as_deref(), Some("42"));
        assert_eq!(module_id("view.php").as_deref(), None);
        assert_eq!(absolutize("mod/assign/view.php?id=1"), "https://paatshala.ictkerala.org/mod/assign/view.php?id=1");
    }
}
