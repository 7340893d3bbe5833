// src/config/consts.rs
use std::time::Duration;

// Net config
pub const HOST: &str = "paatshala.ictkerala.org";
pub const BASE: &str = "https://paatshala.ictkerala.org";
pub const SESSION_COOKIE: &str = "MoodleSession";

// The site serves a different (login-gated) page to unknown agents.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

// Timeouts
pub const DETAIL_TIMEOUT: Duration = Duration::from_secs(30);
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
pub const AJAX_TIMEOUT: Duration = Duration::from_secs(15);

// Local state
pub const LOG_FILE: &str = ".store/debug.log";

// Export
pub const OUTPUT_DIR: &str = "output";

// Discovery
pub const DEFAULT_QUIZ_FILTER: &str = "practice quiz";

// Concurrency
pub const WORKERS: usize = 4;
pub const REQUEST_PAUSE_MS: u64 = 75; // be polite
pub const JITTER_MS: u64 = 50; // extra 0..50 ms
