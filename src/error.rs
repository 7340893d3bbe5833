// src/error.rs
//
// Run-level failures. Per-target failures are `core::net::FetchError` and never
// reach this type unless they happen during discovery.

use thiserror::Error;

use crate::core::net::FetchError;

#[derive(Debug, Error)]
pub enum Error {
    /// No usable session: login rejected or token failed validation.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The discovery page itself could not be fetched or read.
    #[error("discovery failed: {0}")]
    Discovery(#[source] FetchError),

    #[error("no {kind} found in course {course_id}")]
    NoTargets { course_id: u32, kind: &'static str },

    /// Every target resolved, none produced usable data.
    #[error("no usable {kind} data in any of {targets} targets")]
    NoResults { kind: &'static str, targets: usize },

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error(transparent)]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] ::csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
