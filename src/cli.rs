// src/cli.rs
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::consts::{DEFAULT_QUIZ_FILTER, OUTPUT_DIR, WORKERS};
use crate::config::options::{
    AppOptions, ExportFormat, ExportOptions, GroupSelector, ScrapeOptions, TaskSelector,
};
use crate::core::net::{self, Session};
use crate::error::{Error, Result};
use crate::file;
use crate::progress::StderrProgress;
use crate::scrape;

#[derive(Parser, Debug)]
#[command(name = "paatshala", version)]
#[command(about = "Export assignments, quiz scores and submissions from Paathshala", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub auth: AuthArgs,

    /// Parallel requests
    #[arg(short = 't', long, default_value_t = WORKERS, global = true)]
    pub threads: usize,

    #[arg(long, value_enum, default_value_t = Format::Csv, global = true)]
    pub format: Format,

    /// Output root; files go to <out>/course_<id>/
    #[arg(short = 'o', long, default_value = OUTPUT_DIR, global = true)]
    pub out: PathBuf,

    /// Omit the header row
    #[arg(long, global = true)]
    pub no_headers: bool,

    /// Log level for .store/debug.log (RUST_LOG overrides)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct AuthArgs {
    /// MoodleSession cookie value
    #[arg(long, env = "MOODLE_SESSION_ID", hide_env_values = true, global = true)]
    pub cookie: Option<String>,

    #[arg(short = 'u', long, env = "MOODLE_USERNAME", global = true)]
    pub username: Option<String>,

    #[arg(short = 'p', long, env = "MOODLE_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Format {
    Csv,
    Tsv,
}

impl From<Format> for ExportFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Csv => ExportFormat::Csv,
            Format::Tsv => ExportFormat::Tsv,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct QuizArgs {
    /// Keep quizzes whose name contains this (case-insensitive)
    #[arg(long, default_value = DEFAULT_QUIZ_FILTER)]
    pub filter: String,

    /// Keep every quiz
    #[arg(long, conflicts_with = "filter")]
    pub all_quizzes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct GroupArgs {
    /// Group by 1-based position in the group selector
    #[arg(short = 'g', long)]
    pub group: Option<usize>,

    /// Group by exact id
    #[arg(long, conflicts_with = "group")]
    pub group_id: Option<String>,
}

impl GroupArgs {
    fn selector(&self) -> GroupSelector {
        match (&self.group_id, self.group) {
            (Some(id), _) => GroupSelector::Id(id.clone()),
            (None, Some(n)) => GroupSelector::Nth(n),
            (None, None) => GroupSelector::None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List enrolled courses
    Courses,
    /// Assignment metadata for every task in a course
    Tasks { course: u32 },
    /// Best quiz score per student per quiz
    Quiz {
        course: u32,
        #[command(flatten)]
        quiz: QuizArgs,
    },
    /// Grading tables for one or all tasks
    Submissions {
        course: u32,
        /// Task by 1-based position in the course
        #[arg(long)]
        task: Option<usize>,
        /// Task by module id (skips discovery)
        #[arg(long, conflicts_with = "task")]
        module: Option<String>,
        #[command(flatten)]
        group: GroupArgs,
    },
    /// Groups available on a task's grading page
    Groups {
        course: u32,
        #[arg(long)]
        module: Option<String>,
    },
    /// Tasks, quiz scores and all submissions
    All {
        course: u32,
        #[command(flatten)]
        quiz: QuizArgs,
        #[command(flatten)]
        group: GroupArgs,
    },
}

impl Cli {
    fn options(&self, quiz: Option<&QuizArgs>) -> AppOptions {
        let mut scrape = ScrapeOptions { workers: self.threads.max(1), ..ScrapeOptions::default() };
        if let Some(q) = quiz {
            scrape.quiz_filter = if q.all_quizzes { None } else { Some(q.filter.clone()) };
        }
        let export = ExportOptions {
            format: self.format.into(),
            out_dir: self.out.clone(),
            include_headers: !self.no_headers,
        };
        AppOptions { scrape, export }
    }
}

/// Token to use, and whether we created it (and so should close it).
fn authenticate(auth: &AuthArgs) -> Result<(String, bool)> {
    if let Some(token) = auth.cookie.as_deref().filter(|t| !t.is_empty()) {
        let session = Session::acquire(token).map_err(|e| Error::Auth(e.to_string()))?;
        if session.validate() {
            logf!("Session token accepted");
            return Ok((s!(token), false));
        }
        logw!("Session token rejected");
        eprintln!("Session token is invalid or expired.");
    }

    let (Some(user), Some(pass)) = (auth.username.as_deref(), auth.password.as_deref()) else {
        return Err(Error::Auth(s!(
            "no valid session; pass --cookie (MOODLE_SESSION_ID) or --username/--password"
        )));
    };

    let token = net::login(user, pass)?;
    let session = Session::acquire(&token).map_err(|e| Error::Auth(e.to_string()))?;
    if !session.validate() {
        return Err(Error::Auth(s!("login issued a session that does not validate")));
    }
    Ok((token, true))
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    crate::log::init(&cli.log_level);
    logf!("paatshala {} starting", env!("CARGO_PKG_VERSION"));

    let (token, logged_in) = authenticate(&cli.auth)?;
    let outcome = dispatch(&cli, &token);

    if logged_in {
        match Session::acquire(&token) {
            Ok(s) => s.logout(),
            Err(e) => logw!("Could not reopen session for logout: {e}"),
        }
    }
    outcome
}

fn dispatch(cli: &Cli, token: &str) -> Result<()> {
    let mut progress = StderrProgress::default();

    match &cli.command {
        Command::Courses => {
            for c in scrape::list_courses(token)? {
                let star = if c.starred { "*" } else { "" };
                println!("{}\t{}{}\t{}", c.id, c.name, star, c.category);
            }
        }
        Command::Groups { course, module } => {
            for g in scrape::list_groups(token, *course, module.as_deref())? {
                println!("{}\t{}", g.id, g.name);
            }
        }
        Command::Tasks { course } => {
            let opts = cli.options(None);
            let ds = scrape::collect_tasks(token, *course, &opts.scrape, Some(&mut progress))?;
            let path = file::write_export(&opts.export, *course, &file::tasks_stem(*course), &ds)?;
            println!("{}", path.display());
        }
        Command::Quiz { course, quiz } => {
            let opts = cli.options(Some(quiz));
            let ds = scrape::collect_quiz_scores(token, *course, &opts.scrape, Some(&mut progress))?;
            let path = file::write_export(&opts.export, *course, &file::quiz_stem(*course), &ds)?;
            println!("{}", path.display());
        }
        Command::Submissions { course, task, module, group } => {
            let opts = cli.options(None);
            let task = match (module, task) {
                (Some(m), _) => TaskSelector::Module(m.clone()),
                (None, Some(n)) => TaskSelector::Nth(*n),
                (None, None) => TaskSelector::All,
            };
            write_submissions(token, *course, &opts, &task, &group.selector(), &mut progress)?;
        }
        Command::All { course, quiz, group } => {
            run_all(token, *course, &cli.options(Some(quiz)), &group.selector(), &mut progress)?;
        }
    }
    Ok(())
}

fn write_submissions(
    token: &str,
    course: u32,
    opts: &AppOptions,
    task: &TaskSelector,
    group: &GroupSelector,
    progress: &mut StderrProgress,
) -> Result<()> {
    let subs = scrape::collect_submissions(token, course, &opts.scrape, task, group, Some(progress))?;
    let stem = file::submissions_stem(course, subs.module_id.as_deref(), subs.group_id.as_deref());
    let path = file::write_export(&opts.export, course, &stem, &subs.data)?;
    println!("{}", path.display());
    Ok(())
}

/// Every export for one course. A part that finds nothing is reported and
/// skipped; the run fails only if every part failed.
fn run_all(
    token: &str,
    course: u32,
    opts: &AppOptions,
    group: &GroupSelector,
    progress: &mut StderrProgress,
) -> Result<()> {
    let mut errors: Vec<Error> = Vec::new();

    match scrape::collect_tasks(token, course, &opts.scrape, Some(&mut *progress))
        .and_then(|ds| file::write_export(&opts.export, course, &file::tasks_stem(course), &ds))
    {
        Ok(path) => println!("{}", path.display()),
        Err(e) => {
            loge!("Tasks: {e}");
            eprintln!("Tasks: {e}");
            errors.push(e);
        }
    }

    match scrape::collect_quiz_scores(token, course, &opts.scrape, Some(&mut *progress))
        .and_then(|ds| file::write_export(&opts.export, course, &file::quiz_stem(course), &ds))
    {
        Ok(path) => println!("{}", path.display()),
        Err(e) => {
            loge!("Quiz scores: {e}");
            eprintln!("Quiz scores: {e}");
            errors.push(e);
        }
    }

    if let Err(e) = write_submissions(token, course, opts, &TaskSelector::All, group, progress) {
        loge!("Submissions: {e}");
        eprintln!("Submissions: {e}");
        errors.push(e);
    }

    if errors.len() == 3 {
        return Err(errors.remove(0));
    }
    Ok(())
}
