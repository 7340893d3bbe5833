// src/scrape/pool.rs
//! Bounded worker pool for per-target fetch-and-parse.
//!
//! Workers claim the next index from a shared counter and report
//! `(index, outcome)` over a channel; the calling thread is the only
//! receiver. Output is written by index, so completion order never shows.
//!
//! Each worker owns its session. It is built lazily on the first claimed
//! target and kept for the rest; nothing but the inputs is shared.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::options::ScrapeOptions;
use crate::core::net::FetchError;
use crate::progress::Progress;
use crate::specs::course::Target;

/// Anything the pool can report progress for.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for Target {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolOptions {
    pub workers: usize,
    pub pause_ms: u64,
    pub jitter_ms: u64,
}

impl From<&ScrapeOptions> for PoolOptions {
    fn from(o: &ScrapeOptions) -> Self {
        Self { workers: o.workers, pause_ms: o.pause_ms, jitter_ms: o.jitter_ms }
    }
}

impl PoolOptions {
    /// No courtesy pause; for tests and local fixtures.
    pub fn unpaced(workers: usize) -> Self {
        Self { workers, pause_ms: 0, jitter_ms: 0 }
    }

    fn pause_for(&self, index: usize) -> Duration {
        let jitter = if self.jitter_ms > 0 { index as u64 % self.jitter_ms } else { 0 };
        Duration::from_millis(self.pause_ms + jitter)
    }
}

/// Run `work` once per target across at most `opts.workers` threads.
///
/// The result has exactly `targets.len()` entries, entry `i` belonging to
/// `targets[i]`. A failed target never stops the others.
pub fn dispatch<T, S, R, M, W>(
    targets: &[T],
    opts: &PoolOptions,
    make_session: M,
    work: W,
    mut progress: Option<&mut dyn Progress>,
) -> Vec<Result<R, FetchError>>
where
    T: Named + Sync,
    R: Send,
    M: Fn() -> Result<S, FetchError> + Sync,
    W: Fn(&mut S, &T) -> Result<R, FetchError> + Sync,
{
    let total = targets.len();
    let mut slots: Vec<Option<Result<R, FetchError>>> = (0..total).map(|_| None).collect();

    if let Some(p) = progress.as_deref_mut() {
        p.begin(total);
    }
    if total == 0 {
        if let Some(p) = progress.as_deref_mut() {
            p.finish();
        }
        return Vec::new();
    }

    let workers = opts.workers.min(total).max(1);
    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<(usize, Result<R, FetchError>)>();
    let t0 = Instant::now();

    logf!("Dispatching {total} targets over {workers} workers");

    thread::scope(|scope| {
        for w in 0..workers {
            let tx = tx.clone();
            let next = &next;
            let make_session = &make_session;
            let work = &work;

            let spawned = thread::Builder::new()
                .name(format!("w{w}"))
                .spawn_scoped(scope, move || {
                    let mut session: Option<S> = None;
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        if i >= total {
                            break;
                        }
                        let target = &targets[i];
                        let started = Instant::now();
                        let outcome = run_one(&mut session, make_session, work, target);
                        match &outcome {
                            Ok(_) => logd!("[W{w}] #{i} {} ok in {:.2?}", target.name(), started.elapsed()),
                            Err(e) => logw!("[W{w}] #{i} {} failed in {:.2?}: {e}", target.name(), started.elapsed()),
                        }
                        if tx.send((i, outcome)).is_err() {
                            break;
                        }
                        let pause = opts.pause_for(i);
                        if !pause.is_zero() {
                            thread::sleep(pause); // be polite
                        }
                    }
                });

            if let Err(e) = spawned {
                loge!("Could not start worker {w}: {e}");
            }
        }
        drop(tx); // workers hold the only senders now

        for (i, outcome) in rx {
            if let Some(p) = progress.as_deref_mut() {
                let name = targets[i].name();
                match &outcome {
                    Ok(_) => p.item_done(i, name),
                    Err(e) => p.item_failed(i, name, &e.to_string()),
                }
            }
            slots[i] = Some(outcome);
        }
    });

    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }
    logf!("Dispatch finished in {:.2?}", t0.elapsed());

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err(FetchError::Panicked(s!("target was never picked up")))))
        .collect()
}

/// One target on one worker. A panic in session setup or `work` is caught
/// here and drops the session, so the next target starts clean.
fn run_one<T, S, R>(
    session: &mut Option<S>,
    make_session: &impl Fn() -> Result<S, FetchError>,
    work: &impl Fn(&mut S, &T) -> Result<R, FetchError>,
    target: &T,
) -> Result<R, FetchError> {
    let caught = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut s = match session.take() {
            Some(s) => s,
            None => make_session()?,
        };
        let out = work(&mut s, target);
        *session = Some(s);
        out
    }));

    match caught {
        Ok(out) => out,
        Err(payload) => Err(FetchError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s!(*s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        s!("unknown panic payload")
    }
}
