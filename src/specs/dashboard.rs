// src/specs/dashboard.rs
//! Scraping *spec* for the dashboard (`/my/`), the login form, and the
//! Moodle AJAX course endpoints.
//!
//! - `sesskey` is embedded in page JS config (`"sesskey":"..."`) and in
//!   logout/hidden form inputs. AJAX calls need it as a query parameter.
//! - Course listing comes from two AJAX methods; the dashboard's course links
//!   are the fallback when both return nothing.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::core::html::{attr, selector, text_tight};

pub const ENROLLED_METHOD: &str = "core_course_get_enrolled_courses_by_timeline_classification";
pub const RECENT_METHOD: &str = "core_course_get_recent_courses";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub category: String,
    pub starred: bool,
}

static SESSKEY_JS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""sesskey":"([^"]+)""#).expect("static regex"));
static COURSE_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/course/view\.php\?id=(\d+)").expect("static regex"));

static SESSKEY_INPUT: LazyLock<Selector> = LazyLock::new(|| selector("input[name=\"sesskey\"]"));
static LOGINTOKEN_INPUT: LazyLock<Selector> = LazyLock::new(|| selector("input[name=\"logintoken\"]"));
static COURSE_LINKS: LazyLock<Selector> =
    LazyLock::new(|| selector("a[href*=\"/course/view.php?id=\"]"));

/// `sesskey` from the page's JS config block.
pub fn sesskey(body: &str) -> Option<String> {
    SESSKEY_JS.captures(body).map(|c| s!(&c[1]))
}

/// `sesskey` from a hidden form input (logout forms use this).
pub fn sesskey_input(body: &str) -> Option<String> {
    input_value(body, &SESSKEY_INPUT).or_else(|| sesskey(body))
}

/// Hidden CSRF token on the login form, if the site version uses one.
pub fn login_token(body: &str) -> Option<String> {
    input_value(body, &LOGINTOKEN_INPUT)
}

fn input_value(body: &str, sel: &Selector) -> Option<String> {
    let doc = Html::parse_document(body);
    doc.select(sel)
        .map(|i| s!(attr(i, "value")))
        .find(|v| !v.is_empty())
}

/// `lib/ajax/service.php` URL for one method call.
pub fn ajax_url(sesskey: &str, method: &str) -> String {
    site!("/lib/ajax/service.php?sesskey={sesskey}&info={method}")
}

pub fn enrolled_payload() -> Value {
    json!([{
        "index": 0,
        "methodname": ENROLLED_METHOD,
        "args": {
            "offset": 0, "limit": 0, "classification": "all",
            "sort": "fullname", "customfieldname": "", "customfieldvalue": ""
        }
    }])
}

pub fn recent_payload() -> Value {
    json!([{
        "index": 0,
        "methodname": RECENT_METHOD,
        "args": { "userid": 0, "limit": 0, "offset": 0, "sort": "fullname" }
    }])
}

#[derive(Debug, Deserialize)]
struct AjaxReply<T> {
    #[serde(default)]
    error: Value,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct EnrolledData {
    #[serde(default)]
    courses: Vec<AjaxCourse>,
}

#[derive(Debug, Deserialize)]
struct AjaxCourse {
    id: Value,
    #[serde(default)]
    fullname: String,
    #[serde(default)]
    coursecategory: String,
    #[serde(default)]
    isfavourite: bool,
}

impl From<AjaxCourse> for Course {
    fn from(c: AjaxCourse) -> Self {
        let id = match c.id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Course { id, name: c.fullname, category: c.coursecategory, starred: c.isfavourite }
    }
}

/// `error` is `false` on success and `true` (or an exception object) otherwise.
fn reply_ok(error: &Value) -> bool {
    matches!(error, Value::Null | Value::Bool(false))
}

fn first_reply<T: for<'de> Deserialize<'de>>(body: &str) -> Option<T> {
    let mut replies: Vec<AjaxReply<T>> = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            logd!("AJAX reply not understood: {e}");
            return None;
        }
    };
    if replies.is_empty() { return None; }
    let first = replies.swap_remove(0);
    if !reply_ok(&first.error) {
        logw!("AJAX reply flagged an error: {}", first.error);
        return None;
    }
    first.data
}

/// Courses from the enrolled-courses reply. Unreadable replies give nothing.
pub fn parse_enrolled(body: &str) -> Vec<Course> {
    first_reply::<EnrolledData>(body)
        .map(|d| d.courses.into_iter().map(Course::from).collect())
        .unwrap_or_default()
}

/// Courses from the recent-courses reply. Unreadable replies give nothing.
pub fn parse_recent(body: &str) -> Vec<Course> {
    first_reply::<Vec<AjaxCourse>>(body)
        .map(|d| d.into_iter().map(Course::from).collect())
        .unwrap_or_default()
}

/// Fallback: course links on the dashboard, first occurrence of each id.
pub fn courses_from_links(body: &str) -> Vec<Course> {
    let doc = Html::parse_document(body);
    let mut out: Vec<Course> = Vec::new();
    for a in doc.select(&COURSE_LINKS) {
        let Some(cap) = COURSE_HREF.captures(attr(a, "href")) else { continue };
        let id = s!(&cap[1]);
        let name = text_tight(a);
        if name.is_empty() || out.iter().any(|c| c.id == id) { continue; }
        out.push(Course { id, name, category: s!(), starred: false });
    }
    out
}

/// Append `more` to `into`, skipping ids already present.
pub fn merge_courses(into: &mut Vec<Course>, more: Vec<Course>) {
    for c in more {
        if !c.id.is_empty() && !into.iter().any(|x| x.id == c.id) {
            into.push(c);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sesskey_from_js_config_and_input() {
        let body = r#"<script>M.cfg = {"wwwroot":"https:\/\/x","sesskey":"AbC123xyz","sessiontimeout":"7200"};</script>"#;
        assert_eq!(sesskey(body).as_deref(), Some("AbC123xyz"));

        let form = r#"<form><input type="hidden" name="sesskey" value="K9"></form>"#;
        assert_eq!(sesskey_input(form).as_deref(), Some("K9"));
        assert_eq!(sesskey_input(body).as_deref(), Some("AbC123xyz"));
        assert_eq!(sesskey("<html></html>"), None);
    }

    #[test]
    fn login_token_is_optional() {
        let form = r#"<form><input type="hidden" name="logintoken" value="tok"></form>"#;
        assert_eq!(login_token(form).as_deref(), Some("tok"));
        assert_eq!(login_token("<form></form>"), None);
    }

    #[test]
    fn enrolled_reply_is_parsed() {
        let body = r#"[{"error":false,"data":{"courses":[
            {"id":450,"fullname":"Python Full Stack","coursecategory":"2024","isfavourite":true},
            {"id":451,"fullname":"Data Science"}
        ],"nextoffset":2}}]"#;
        let courses = parse_enrolled(body);
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0], Course { id: s!("450"), name: s!("Python Full Stack"), category: s!("2024"), starred: true });
        assert_eq!(courses[1].category, "");
    }

    #[test]
    fn error_reply_gives_nothing() {
        let body = r#"[{"error":true,"exception":{"message":"Invalid sesskey"}}]"#;
        assert!(parse_enrolled(body).is_empty());
        assert!(parse_recent("not json").is_empty());
    }

    #[test]
    fn recent_reply_and_merge() {
        let recent = parse_recent(r#"[{"error":false,"data":[{"id":451,"fullname":"Data Science"},{"id":9,"fullname":"Old"}]}]"#);
        let mut all = vec![Course { id: s!("451"), name: s!("Data Science"), category: s!(), starred: false }];
        merge_courses(&mut all, recent);
        assert_eq!(all.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["451", "9"]);
    }

    #[test]
    fn links_fallback_dedups() {
        let body = r#"<nav>
            <a href="https://paatshala.ictkerala.org/course/view.php?id=450">Python</a>
            <a href="https://paatshala.ictkerala.org/course/view.php?id=450&section=2">Python week 2</a>
            <a href="https://paatshala.ictkerala.org/course/view.php?id=77"></a>
            <a href="/course/view.php?id=12">Web</a>
        </nav>"#;
        let courses = courses_from_links(body);
        assert_eq!(courses.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["450", "12"]);
    }
}
