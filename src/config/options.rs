// src/config/options.rs
use std::path::PathBuf;
use std::time::Duration;

use super::consts::*;

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AppOptions {
    pub scrape: ScrapeOptions,
    pub export: ExportOptions,
}

/// Knobs for discovery and the worker pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub workers: usize,
    pub pause_ms: u64,
    pub jitter_ms: u64,
    pub detail_timeout: Duration,
    /// Case-insensitive substring a quiz name must contain. `None` keeps every quiz.
    pub quiz_filter: Option<String>,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            workers: WORKERS,
            pause_ms: REQUEST_PAUSE_MS,
            jitter_ms: JITTER_MS,
            detail_timeout: DETAIL_TIMEOUT,
            quiz_filter: Some(s!(DEFAULT_QUIZ_FILTER)),
        }
    }
}

impl ScrapeOptions {
    /// True when `name` passes the quiz filter.
    pub fn keeps_quiz(&self, name: &str) -> bool {
        match self.quiz_filter.as_deref() {
            None | Some("") => true,
            Some(f) => name.to_lowercase().contains(&f.to_lowercase()),
        }
    }
}

/// Which group a grading page should be filtered by.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum GroupSelector {
    #[default]
    None,
    /// 1-based position in the group selector of the first task.
    Nth(usize),
    /// Exact group id as used in `&group=`.
    Id(String),
}

/// Which tasks a submissions run covers.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum TaskSelector {
    #[default]
    All,
    /// 1-based position in discovery order.
    Nth(usize),
    /// Explicit module id; skips discovery.
    Module(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
}

impl ExportFormat {
    pub fn ext(&self) -> &'static str {
        match self { ExportFormat::Csv => "csv", ExportFormat::Tsv => "tsv" }
    }
    pub fn delim(&self) -> u8 {
        match self { ExportFormat::Csv => b',', ExportFormat::Tsv => b'\t' }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub out_dir: PathBuf,
    pub include_headers: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            out_dir: PathBuf::from(OUTPUT_DIR),
            include_headers: true,
        }
    }
}

impl ExportOptions {
    /// `<out_dir>/course_<id>`
    pub fn course_dir(&self, course_id: u32) -> PathBuf {
        self.out_dir.join(format!("course_{course_id}"))
    }

    /// `<out_dir>/course_<id>/<stem>.<ext>`
    pub fn out_path(&self, course_id: u32, stem: &str) -> PathBuf {
        self.course_dir(course_id).join(join!(stem, ".", self.format.ext()))
    }
}
