// src/scrape/scrape.rs
use crate::{
    config::consts::{AJAX_TIMEOUT, DETAIL_TIMEOUT, PROBE_TIMEOUT},
    config::options::{GroupSelector, ScrapeOptions, TaskSelector},
    core::net::{self, FetchError, Method, Session},
    data::{self, DataSet},
    error::{Error, Result},
    progress::Progress,
    specs::{
        assign::{self, DetailRecord},
        course::{self, Target},
        dashboard::{self, Course},
        grading::{self, GradingRow, Group},
        quiz::{self, ScoreRecord},
    },
};

use super::pool::{self, PoolOptions};

/// Result of a submissions run, with what the output name depends on.
#[derive(Clone, Debug)]
pub struct Submissions {
    pub data: DataSet,
    /// Set when exactly one task was scraped.
    pub module_id: Option<String>,
    pub group_id: Option<String>,
}

fn course_url(course_id: u32) -> String {
    site!("/course/view.php?id={course_id}")
}

/// Session for the calling thread. Workers build their own.
fn open(token: &str) -> Result<Session> {
    Session::acquire(token).map_err(Error::Discovery)
}

fn log_line(progress: &mut Option<&mut dyn Progress>, msg: &str) {
    logf!("{msg}");
    if let Some(p) = progress.as_deref_mut() {
        p.log(msg);
    }
}

/* ---------------- Discovery ---------------- */

pub fn discover_tasks(session: &Session, course_id: u32) -> Result<Vec<Target>> {
    let url = course_url(course_id);
    let page = session.get(&url, DETAIL_TIMEOUT).map_err(Error::Discovery)?;
    let tasks = course::parse_assignments(&page.body)
        .ok_or_else(|| Error::Discovery(FetchError::structure(&page.url, "course content")))?;
    logf!("Course {course_id}: {} assignments", tasks.len());
    if tasks.is_empty() {
        return Err(Error::NoTargets { course_id, kind: "assignments" });
    }
    Ok(tasks)
}

pub fn discover_quizzes(session: &Session, course_id: u32, opts: &ScrapeOptions) -> Result<Vec<Target>> {
    let url = course_url(course_id);
    let page = session.get(&url, DETAIL_TIMEOUT).map_err(Error::Discovery)?;
    let quizzes = course::parse_quizzes(&page.body, |name| opts.keeps_quiz(name))
        .ok_or_else(|| Error::Discovery(FetchError::structure(&page.url, "course content")))?;
    logf!("Course {course_id}: {} quizzes after filter {:?}", quizzes.len(), opts.quiz_filter);
    if quizzes.is_empty() {
        return Err(Error::NoTargets { course_id, kind: "quizzes" });
    }
    Ok(quizzes)
}

/// `Err(NoResults)` when not a single target resolved with data.
fn require_some<R>(kind: &'static str, results: &[std::result::Result<R, FetchError>]) -> Result<()> {
    let ok = results.iter().filter(|r| r.is_ok()).count();
    logf!("{kind}: {ok}/{} targets with data", results.len());
    if ok == 0 {
        return Err(Error::NoResults { kind, targets: results.len() });
    }
    Ok(())
}

/// `Err(NoResults)` when the aggregated table has no rows, even though some
/// targets resolved (every report or grading table came back empty).
fn require_rows(kind: &'static str, targets: usize, ds: &DataSet) -> Result<()> {
    if ds.is_empty() {
        logw!("{kind}: {targets} targets resolved, no rows");
        return Err(Error::NoResults { kind, targets });
    }
    Ok(())
}

/* ---------------- Per-target work ---------------- */

fn fetch_detail(s: &Session, t: &Target, opts: &ScrapeOptions) -> std::result::Result<DetailRecord, FetchError> {
    let page = s.get(&t.url, opts.detail_timeout)?;
    let rec = assign::parse(&page.body);
    if rec.is_empty() {
        return Err(FetchError::structure(&page.url, "assignment tables"));
    }
    Ok(rec)
}

fn fetch_scores(s: &Session, t: &Target, opts: &ScrapeOptions) -> std::result::Result<ScoreRecord, FetchError> {
    let page = s.get(&t.url, opts.detail_timeout)?;
    quiz::parse_report(&page.body).ok_or_else(|| FetchError::structure(&page.url, "results table"))
}

fn fetch_grading(s: &Session, t: &Target, opts: &ScrapeOptions) -> std::result::Result<Vec<GradingRow>, FetchError> {
    let page = s.get(&t.url, opts.detail_timeout)?;
    grading::parse_grading(&page.body).ok_or_else(|| FetchError::structure(&page.url, "grading table"))
}

/* ---------------- Collectors ---------------- */

/// Assignment metadata for every task in the course, discovery order.
pub fn collect_tasks(
    token: &str,
    course_id: u32,
    opts: &ScrapeOptions,
    mut progress: Option<&mut dyn Progress>,
) -> Result<DataSet> {
    let session = open(token)?;
    log_line(&mut progress, &format!("Discovering assignments in course {course_id}…"));
    let tasks = discover_tasks(&session, course_id)?;

    let results = pool::dispatch(
        &tasks,
        &PoolOptions::from(opts),
        || Session::acquire(token),
        |s, t| fetch_detail(s, t, opts),
        progress,
    );
    require_some("assignments", &results)?;

    Ok(data::task_table(&tasks, &data::or_empty(results)))
}

/// Best quiz grade per student per quiz that passes the filter.
pub fn collect_quiz_scores(
    token: &str,
    course_id: u32,
    opts: &ScrapeOptions,
    mut progress: Option<&mut dyn Progress>,
) -> Result<DataSet> {
    let session = open(token)?;
    log_line(&mut progress, &format!("Discovering quizzes in course {course_id}…"));
    let quizzes = discover_quizzes(&session, course_id, opts)?;

    let results = pool::dispatch(
        &quizzes,
        &PoolOptions::from(opts),
        || Session::acquire(token),
        |s, t| fetch_scores(s, t, opts),
        progress.as_mut().map(|p| &mut **p as &mut dyn Progress),
    );
    require_some("quizzes", &results)?;

    let scores = data::or_empty(results);
    let attempts: usize = scores.iter().map(|r| r.attempts).sum();
    let ds = data::quiz_matrix(&quizzes, &scores);
    log_line(&mut progress, &format!("Attempts counted: {attempts}, students: {}", ds.len()));
    require_rows("quizzes", quizzes.len(), &ds)?;
    Ok(ds)
}

/// Grading tables for the selected task(s), optionally for one group.
pub fn collect_submissions(
    token: &str,
    course_id: u32,
    opts: &ScrapeOptions,
    task: &TaskSelector,
    group: &GroupSelector,
    mut progress: Option<&mut dyn Progress>,
) -> Result<Submissions> {
    let session = open(token)?;

    let tasks = match task {
        TaskSelector::Module(mid) => vec![Target::assignment(&format!("Module {mid}"), mid)],
        TaskSelector::All | TaskSelector::Nth(_) => {
            log_line(&mut progress, &format!("Discovering assignments in course {course_id}…"));
            let all = discover_tasks(&session, course_id)?;
            select_tasks(all, task)?
        }
    };

    let group_id = match group {
        GroupSelector::None => None,
        GroupSelector::Id(g) => Some(g.clone()),
        GroupSelector::Nth(n) => {
            let first = tasks.first().ok_or(Error::NoTargets { course_id, kind: "assignments" })?;
            let groups = fetch_groups(&session, first)?;
            Some(select_group(&groups, *n)?.id.clone())
        }
    };
    if let Some(g) = &group_id {
        log_line(&mut progress, &format!("Filtering by group {g}"));
    }

    let targets: Vec<Target> = tasks.iter().map(|t| t.grading(group_id.as_deref())).collect();
    let results = pool::dispatch(
        &targets,
        &PoolOptions::from(opts),
        || Session::acquire(token),
        |s, t| fetch_grading(s, t, opts),
        progress,
    );
    require_some("grading tables", &results)?;

    let per_task: Vec<(Target, Vec<GradingRow>)> = tasks
        .iter()
        .cloned()
        .zip(data::or_empty(results))
        .collect();

    let module_id = match tasks.as_slice() {
        [one] if !matches!(task, TaskSelector::All) => Some(one.module_id.clone()),
        _ => None,
    };

    let data = data::submission_table(&per_task, group_id.as_deref());
    require_rows("grading tables", targets.len(), &data)?;

    Ok(Submissions { data, module_id, group_id })
}

/// Narrow discovered tasks by selector. `Nth` is 1-based.
pub fn select_tasks(tasks: Vec<Target>, sel: &TaskSelector) -> Result<Vec<Target>> {
    match sel {
        TaskSelector::All => Ok(tasks),
        TaskSelector::Nth(n) => {
            let total = tasks.len();
            n.checked_sub(1)
                .and_then(|i| tasks.into_iter().nth(i))
                .map(|t| vec![t])
                .ok_or_else(|| Error::InvalidSelection(format!("task {n} of {total}")))
        }
        // A module id names its task directly and never goes through discovery.
        TaskSelector::Module(mid) => {
            Err(Error::InvalidSelection(format!("module {mid} is not chosen from discovered tasks")))
        }
    }
}

/// Pick a group by 1-based position.
pub fn select_group(groups: &[Group], n: usize) -> Result<&Group> {
    n.checked_sub(1)
        .and_then(|i| groups.get(i))
        .ok_or_else(|| Error::InvalidSelection(format!("group {n} of {}", groups.len())))
}

/* ---------------- Listings ---------------- */

fn fetch_groups(session: &Session, task: &Target) -> Result<Vec<Group>> {
    let url = task.grading(None).url;
    let page = session.get(&url, DETAIL_TIMEOUT).map_err(Error::Discovery)?;
    Ok(grading::parse_groups(&page.body))
}

/// Groups offered on a task's grading page. Without `module_id`, the first
/// task of the course is used.
pub fn list_groups(token: &str, course_id: u32, module_id: Option<&str>) -> Result<Vec<Group>> {
    let session = open(token)?;
    let task = match module_id {
        Some(mid) => Target::assignment(mid, mid),
        None => discover_tasks(&session, course_id)?
            .into_iter()
            .next()
            .ok_or(Error::NoTargets { course_id, kind: "assignments" })?,
    };
    fetch_groups(&session, &task)
}

/// Courses the user is enrolled in: AJAX enrolled list, then recent
/// courses, then dashboard links as a last resort.
pub fn list_courses(token: &str) -> Result<Vec<Course>> {
    let session = open(token)?;
    let mut courses: Vec<Course> = Vec::new();

    match session.sesskey() {
        Some(key) => {
            for (method, payload) in [
                (dashboard::ENROLLED_METHOD, dashboard::enrolled_payload()),
                (dashboard::RECENT_METHOD, dashboard::recent_payload()),
            ] {
                let url = dashboard::ajax_url(&key, method);
                match net::fetch(&session, &url, &Method::Json(payload), AJAX_TIMEOUT) {
                    Ok(page) => {
                        let found = if method == dashboard::ENROLLED_METHOD {
                            dashboard::parse_enrolled(&page.body)
                        } else {
                            dashboard::parse_recent(&page.body)
                        };
                        logd!("{method}: {} courses", found.len());
                        dashboard::merge_courses(&mut courses, found);
                    }
                    Err(e) => logw!("{method} failed: {e}"),
                }
            }
        }
        None => logw!("No sesskey on dashboard; skipping AJAX course list"),
    }

    if courses.is_empty() {
        logf!("Falling back to dashboard course links");
        let page = session.get(&site!("/my/"), PROBE_TIMEOUT).map_err(Error::Discovery)?;
        courses = dashboard::courses_from_links(&page.body);
    }

    logf!("{} courses listed", courses.len());
    Ok(courses)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks() -> Vec<Target> {
        vec![Target::assignment("A", "1"), Target::assignment("B", "2"), Target::assignment("C", "2")]
    }

    #[test]
    fn nth_task_is_one_based() {
        let picked = select_tasks(tasks(), &TaskSelector::Nth(2)).unwrap();
        assert_eq!(picked, vec![Target::assignment("B", "2")]);
        assert!(matches!(select_tasks(tasks(), &TaskSelector::Nth(0)), Err(Error::InvalidSelection(_))));
        assert!(matches!(select_tasks(tasks(), &TaskSelector::Nth(4)), Err(Error::InvalidSelection(_))));
    }

    #[test]
    fn all_keeps_duplicates_and_module_is_not_a_filter() {
        assert_eq!(select_tasks(tasks(), &TaskSelector::All).unwrap().len(), 3);
        assert!(matches!(
            select_tasks(tasks(), &TaskSelector::Module(s!("2"))),
            Err(Error::InvalidSelection(_))
        ));
    }

    #[test]
    fn group_by_position() {
        let groups = vec![
            Group { id: s!("0"), name: s!("All participants") },
            Group { id: s!("3345"), name: s!("Batch A") },
        ];
        assert_eq!(select_group(&groups, 2).unwrap().id, "3345");
        assert!(select_group(&groups, 3).is_err());
        assert!(select_group(&[], 1).is_err());
    }

    #[test]
    fn all_failed_is_no_results() {
        let results: Vec<std::result::Result<(), FetchError>> = Vec::new();
        assert!(matches!(require_some("x", &results), Err(Error::NoResults { targets: 0, .. })));

        let results = vec![Err(FetchError::structure("u", "grading table")), Ok(())];
        assert!(require_some("x", &results).is_ok());
    }

    fn ungraded_report() -> String {
        s!(r#"<table class="generaltable"><tr><th>h</th></tr>
            <tr><td></td><td></td><td><a href="/user/view.php?id=1">Anu</a></td><td></td><td></td><td></td><td></td><td></td><td>Not yet graded</td></tr>
            </table>"#)
    }

    #[test]
    fn reports_without_graded_rows_are_no_results() {
        let quizzes = vec![
            Target::quiz("Practice Quiz 1", "11"),
            Target::quiz("Practice Quiz 2", "12"),
            Target::quiz("Practice Quiz 3", "13"),
        ];
        let results: Vec<std::result::Result<ScoreRecord, FetchError>> = quizzes
            .iter()
            .map(|t| quiz::parse_report(&ungraded_report()).ok_or_else(|| FetchError::structure(&t.url, "results table")))
            .collect();

        // Every fetch resolved, so the fetch-level check passes...
        assert!(require_some("quiz score", &results).is_ok());

        // ...but the matrix is empty and that is its own failure.
        let ds = data::quiz_matrix(&quizzes, &data::or_empty(results));
        assert!(ds.is_empty());
        assert!(matches!(
            require_rows("quiz score", quizzes.len(), &ds),
            Err(Error::NoResults { targets: 3, .. })
        ));
    }

    #[test]
    fn empty_grading_tables_are_no_results() {
        let per_task = vec![(Target::assignment("Task 1", "101"), Vec::new()), (Target::assignment("Task 2", "102"), Vec::new())];
        let ds = data::submission_table(&per_task, None);
        assert!(matches!(require_rows("submission", 2, &ds), Err(Error::NoResults { targets: 2, .. })));

        let per_task = vec![(Target::assignment("Task 1", "101"), vec![GradingRow { name: s!("Anu"), ..GradingRow::default() }])];
        assert!(require_rows("submission", 1, &data::submission_table(&per_task, None)).is_ok());
    }
}
