//! Session expiration records and the background sweep.
//!
//! A write to the session medium with an expiration stores a record next to
//! the namespace root: key `<path>.expires`, value the absolute expiry in
//! epoch milliseconds. Expired values are evicted lazily when read (the read
//! path and every ancestor of it are checked) and eagerly by a periodic
//! sweep that stops itself once no live records remain.

use crate::error::KandoResult;
use crate::namespace;
use crate::path::prefixes;
use kando_storage::Medium;
use kando_util::now_millis;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Suffix that marks a medium key as an expiration record.
pub const EXPIRATION_SUFFIX: &str = ".expires";

/// Medium key of the record for `path`.
pub fn expiration_key(path: &str) -> String {
    format!("{path}{EXPIRATION_SUFFIX}")
}

/// The path a record key belongs to, if `key` is a record key.
pub fn record_path(key: &str) -> Option<&str> {
    key.strip_suffix(EXPIRATION_SUFFIX)
        .filter(|path| !path.is_empty())
}

fn parse_timestamp(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Store the expiry for `path`.
pub fn write_record(medium: &dyn Medium, path: &str, expires_at: i64) -> KandoResult<()> {
    medium.set_item(&expiration_key(path), &expires_at.to_string())?;
    Ok(())
}

/// Remove the record for `path`, if any.
pub fn remove_record(medium: &dyn Medium, path: &str) -> KandoResult<()> {
    medium.remove_item(&expiration_key(path))?;
    Ok(())
}

/// Read the expiry for `path`. Malformed records are dropped.
pub fn read_record(medium: &dyn Medium, path: &str) -> KandoResult<Option<i64>> {
    let key = expiration_key(path);
    let Some(raw) = medium.get_item(&key)? else {
        return Ok(None);
    };

    match parse_timestamp(&raw) {
        Some(expires_at) => Ok(Some(expires_at)),
        None => {
            warn!(key = %key, value = %raw, "Dropping malformed expiration record");
            medium.remove_item(&key)?;
            Ok(None)
        }
    }
}

/// Lazy eviction on read.
///
/// Checks the record of `path` and of each of its prefixes. The first one
/// whose expiry is strictly before `now` has its value evicted and its record
/// removed. Returns whether an eviction happened.
pub fn evict_if_expired(medium: &dyn Medium, path: &str, now: i64) -> KandoResult<bool> {
    for prefix in prefixes(path) {
        let Some(expires_at) = read_record(medium, prefix)? else {
            continue;
        };

        if expires_at < now {
            info!(path = prefix, expires_at, "Evicting expired session value");
            namespace::remove_path(medium, prefix)?;
            remove_record(medium, prefix)?;
            return Ok(true);
        }
    }
    Ok(false)
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired records removed together with their values.
    pub evicted: usize,
    /// Records that have not expired yet.
    pub live: usize,
    /// Records that could not be parsed and were removed.
    pub malformed: usize,
}

/// Scan every record in `medium` and evict the expired ones.
pub fn sweep_once(medium: &dyn Medium, now: i64) -> KandoResult<SweepReport> {
    let mut report = SweepReport::default();

    for key in medium.keys()? {
        let Some(path) = record_path(&key) else {
            continue;
        };
        let Some(raw) = medium.get_item(&key)? else {
            continue;
        };

        match parse_timestamp(&raw) {
            Some(expires_at) if expires_at < now => {
                namespace::remove_path(medium, path)?;
                medium.remove_item(&key)?;
                report.evicted += 1;
            }
            Some(_) => report.live += 1,
            None => {
                warn!(key = %key, value = %raw, "Dropping malformed expiration record");
                medium.remove_item(&key)?;
                report.malformed += 1;
            }
        }
    }

    Ok(report)
}

/// Background sweep over one medium.
///
/// Two states: idle (no task) and running. [`ExpirationSweep::ensure_running`]
/// moves idle to running; a tick that finds no live record moves back to
/// idle by ending the task. Both transitions happen under the shared
/// operation lock, so a record written concurrently is never missed.
pub struct ExpirationSweep {
    interval: Duration,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ExpirationSweep {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a sweep task is alive.
    pub fn is_running(&self) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }
        match self.handle.lock() {
            Ok(handle) => handle.as_ref().is_some_and(|task| !task.is_finished()),
            Err(_) => false,
        }
    }

    /// Start the sweep unless it is already running.
    ///
    /// Must be called while holding `lock`. Without a tokio runtime the sweep
    /// cannot start; lazy eviction still applies. Returns whether a new task
    /// was spawned.
    pub fn ensure_running(&self, medium: Arc<dyn Medium>, lock: Arc<Mutex<()>>) -> bool {
        if self.is_running() {
            return false;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No async runtime, expiration sweep not started");
            return false;
        };

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let period = self.interval;

        let task = runtime.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            loop {
                ticker.tick().await;
                if !run_tick(medium.as_ref(), &lock, &running) {
                    break;
                }
            }
        });

        match self.handle.lock() {
            Ok(mut handle) => {
                if let Some(previous) = handle.replace(task) {
                    previous.abort();
                }
            }
            Err(e) => {
                warn!(error = %e, "Sweep handle lock poisoned");
                task.abort();
                self.running.store(false, Ordering::SeqCst);
                return false;
            }
        }

        debug!(interval_ms = period.as_millis() as u64, "Started expiration sweep");
        true
    }

    /// Cancel the sweep task, if any.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Ok(mut handle) = self.handle.lock() {
            if let Some(task) = handle.take() {
                task.abort();
            }
        }
    }
}

impl Drop for ExpirationSweep {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One sweep tick. Returns whether the sweep should keep running.
///
/// Runs inline on the runtime: the operation lock is a blocking
/// `std::sync::Mutex` shared with the synchronous API, and each tick is a
/// bounded scan of in-process medium keys, so it never awaits while holding it.
fn run_tick(medium: &dyn Medium, lock: &Mutex<()>, running: &AtomicBool) -> bool {
    let _guard = match lock.lock() {
        Ok(guard) => guard,
        Err(e) => {
            warn!(error = %e, "Operation lock poisoned, stopping expiration sweep");
            running.store(false, Ordering::SeqCst);
            return false;
        }
    };

    match sweep_once(medium, now_millis()) {
        Ok(report) => {
            if report.evicted > 0 {
                info!(
                    evicted = report.evicted,
                    live = report.live,
                    "Expiration sweep evicted entries"
                );
            }
            if report.live == 0 {
                debug!("No live expiration records, stopping sweep");
                running.store(false, Ordering::SeqCst);
                return false;
            }
            true
        }
        Err(e) => {
            warn!(error = %e, "Expiration sweep tick failed");
            true
        }
    }
}
