// src/specs/mod.rs
//! # Scraping “specs” module
//!
//! Page-specific scraping specifications for the site. Each spec covers a single
//! page or endpoint and encodes *where the data lives in the markup* and *how to
//! read it tolerantly*.
//!
//! ## What lives here
//! - **Pure parsing** of response bodies: `&str` in, records out. No I/O.
//! - **Selector choice & precedence** (e.g. the assignment status table beats
//!   the overview table for the same field).
//! - **Positional contracts** where the site gives nothing better (quiz report
//!   and grading table column indices are named constants in their spec).
//!
//! ## What does **not** live here
//! - Fetching, sessions, or concurrency (`core::net`, `scrape`).
//! - Cross-target merging and table shaping (`data`).
//! - Export formatting (`csv`, `file`).
//!
//! ## Typical call chain
//! ```text
//! cli → scrape::collect_* → pool::dispatch → core::net::fetch
//!                                          ↘ specs::<page>::parse*(body)
//!            data::*_table (aggregation, outside of specs)
//! ```
//!
//! ## Conventions
//! - Missing elements give empty strings / empty collections. `Option` is
//!   returned only where "page is not what we expected" must be told apart
//!   from "page has nothing in it" (no table at all vs. an empty table).
//! - Every indexed cell access sits behind an explicit length guard.
//!
//! ## Current specs
//! - `course`: assignment and quiz discovery on `/course/view.php`.
//! - `assign`: assignment detail tables.
//! - `quiz`: quiz attempt report, best grade per student.
//! - `grading`: grading table rows and the group selector.
//! - `dashboard`: `sesskey`, login token, AJAX course listing.
pub mod assign;
pub mod course;
pub mod dashboard;
pub mod grading;
pub mod quiz;
