// src/core/net.rs
//
// Session provider and page fetcher.
//
// A `Session` owns its own blocking client and cookie jar. Sessions are never
// shared between threads: each pool worker builds one and keeps it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{StatusCode, Url, redirect};
use thiserror::Error;

use crate::config::consts::{BASE, HOST, PROBE_TIMEOUT, SESSION_COOKIE, USER_AGENT};
use crate::error::{Error, Result};
use crate::specs::dashboard;

/// Why one request (or one target) produced nothing.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Body arrived but the element we read from is not there.
    #[error("{what} not found at {url}")]
    Structure { url: String, what: &'static str },

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("worker panicked: {0}")]
    Panicked(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Transport { source, .. } if source.is_timeout())
    }

    pub fn structure(url: &str, what: &'static str) -> Self {
        FetchError::Structure { url: s!(url), what }
    }
}

#[derive(Clone, Debug)]
pub enum Method {
    Get,
    /// `application/x-www-form-urlencoded` body.
    Form(Vec<(String, String)>),
    /// JSON body (Moodle AJAX service).
    Json(serde_json::Value),
}

/// A successful response.
#[derive(Clone, Debug)]
pub struct Page {
    pub status: StatusCode,
    /// URL after redirects.
    pub url: String,
    pub body: String,
}

pub struct Session {
    client: Client,
}

impl Session {
    /// Bind `token` as the session cookie for the site host.
    ///
    /// The token is not checked here; a bad one shows up on first use
    /// (see [`Session::validate`]).
    pub fn acquire(token: &str) -> std::result::Result<Self, FetchError> {
        let base = base_url()?;
        let jar = Arc::new(Jar::default());
        jar.add_cookie_str(
            &format!("{SESSION_COOKIE}={token}; Domain={HOST}; Path=/"),
            &base,
        );
        Self::with_jar(jar)
    }

    fn with_jar(jar: Arc<Jar>) -> std::result::Result<Self, FetchError> {
        let client = Client::builder()
            .cookie_provider(jar)
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::limited(10))
            .build()
            .map_err(|source| FetchError::Transport { url: s!(BASE), source })?;

        Ok(Self { client })
    }

    /// Cheap probe against the dashboard.
    pub fn validate(&self) -> bool {
        self.probe(&site!("/my/"))
    }

    /// Never errors: anything that goes wrong reads as "not authenticated".
    fn probe(&self, url: &str) -> bool {
        match fetch(self, url, &Method::Get, PROBE_TIMEOUT) {
            Ok(page) => {
                logd!("Session probe: {url} -> {} ({})", page.url, page.status);
                is_authenticated(page.status, &page.url)
            }
            Err(e) => {
                logw!("Session probe failed: {e}");
                false
            }
        }
    }

    pub fn get(&self, url: &str, timeout: Duration) -> std::result::Result<Page, FetchError> {
        fetch(self, url, &Method::Get, timeout)
    }

    /// Page-scoped `sesskey` from the dashboard's JS config, needed by AJAX calls.
    pub fn sesskey(&self) -> Option<String> {
        match self.get(&site!("/my/"), PROBE_TIMEOUT) {
            Ok(page) => dashboard::sesskey(&page.body),
            Err(e) => {
                logw!("Could not load dashboard for sesskey: {e}");
                None
            }
        }
    }

    /// Best-effort logout. Reads `sesskey` from the dashboard first.
    pub fn logout(&self) {
        let sesskey = self
            .get(&site!("/my/"), PROBE_TIMEOUT)
            .ok()
            .and_then(|p| dashboard::sesskey_input(&p.body))
            .unwrap_or_default();
        match self.get(&site!("/login/logout.php?sesskey={sesskey}"), PROBE_TIMEOUT) {
            Ok(_) => logf!("Session closed"),
            Err(e) => logw!("Could not log out cleanly: {e}"),
        }
    }
}

/// Perform one request with a mandatory timeout and classify the outcome.
pub fn fetch(
    session: &Session,
    url: &str,
    method: &Method,
    timeout: Duration,
) -> std::result::Result<Page, FetchError> {
    let req = match method {
        Method::Get => session.client.get(url),
        Method::Form(fields) => session.client.post(url).form(fields),
        Method::Json(value) => session.client.post(url).json(value),
    };

    let t0 = Instant::now();
    let resp = req
        .timeout(timeout)
        .send()
        .map_err(|source| FetchError::Transport { url: s!(url), source })?;

    let status = resp.status();
    logd!("{} {} ({:.2?})", status.as_u16(), url, t0.elapsed());
    if !status.is_success() {
        return Err(FetchError::Status { url: s!(url), status: status.as_u16() });
    }

    let final_url = resp.url().to_string();
    let body = resp
        .text()
        .map_err(|source| FetchError::Transport { url: s!(url), source })?;

    Ok(Page { status, url: final_url, body })
}

/// 2xx and not bounced to a login page.
pub fn is_authenticated(status: StatusCode, final_url: &str) -> bool {
    status.is_success() && !final_url.to_ascii_lowercase().contains("login")
}

/// Post credentials to the login form and return the issued session token.
///
/// A rejected login is a 200 that re-renders the form, so success is judged
/// by where the redirects end, not by the status code.
pub fn login(username: &str, password: &str) -> Result<String> {
    let jar = Arc::new(Jar::default());
    let session = Session::with_jar(Arc::clone(&jar)).map_err(login_error)?;
    let url = site!("/login/index.php");

    // Newer login forms carry a CSRF token bound to the pre-login cookie.
    let token = session
        .get(&url, PROBE_TIMEOUT)
        .ok()
        .and_then(|page| dashboard::login_token(&page.body));

    let mut form = vec![(s!("username"), s!(username)), (s!("password"), s!(password))];
    if let Some(t) = token {
        form.push((s!("logintoken"), t));
    }

    logf!("Logging in as {username}");
    let page = fetch(&session, &url, &Method::Form(form), PROBE_TIMEOUT).map_err(login_error)?;
    if !is_authenticated(page.status, &page.url) {
        return Err(Error::Auth(format!("login rejected (landed on {})", page.url)));
    }

    match session_cookie(&jar) {
        Some(v) if !v.is_empty() => {
            logf!("Login succeeded");
            Ok(v)
        }
        _ => Err(Error::Auth(format!("no {SESSION_COOKIE} cookie after login"))),
    }
}

fn login_error(e: FetchError) -> Error {
    match e {
        FetchError::Transport { source, .. } => Error::Client(source),
        other => Error::Auth(other.to_string()),
    }
}

fn base_url() -> std::result::Result<Url, FetchError> {
    BASE.parse::<Url>().map_err(|e| FetchError::InvalidUrl { url: s!(BASE), reason: e.to_string() })
}

fn session_cookie(jar: &Jar) -> Option<String> {
    let header = jar.cookies(&base_url().ok()?)?;
    cookie_value(header.to_str().ok()?, SESSION_COOKIE)
}

/// Value of `name` in a `Cookie:` header (`a=1; b=2`).
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == name).then(|| s!(v))
    })
}
