// src/store.rs
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{RunError, StoreError};
use crate::snapshot::Snapshot;

/// JSON file holding the last persisted snapshot.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Previous snapshot, or an empty one on the very first run.
    ///
    /// An undecodable file is logged and treated as empty: the run then
    /// re-baselines instead of failing every cycle until someone fixes it.
    pub fn load(&self) -> Result<Snapshot, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                logf!("Store: no previous state at {}; baseline run", self.path.display());
                return Ok(Snapshot::new());
            }
            Err(source) => return Err(self.io_err(source)),
        };

        if text.trim().is_empty() {
            return Ok(Snapshot::new());
        }
        match serde_json::from_str::<Snapshot>(&text) {
            Ok(snap) => Ok(snap.sanitize()),
            Err(e) => {
                loge!("Store: {} is not a valid snapshot ({e}); starting from empty", self.path.display());
                Ok(Snapshot::new())
            }
        }
    }

    /// Replace the stored snapshot wholesale.
    ///
    /// Writes `<path>.tmp`, syncs it, then renames over the target, so an
    /// interrupted run leaves either the old file or the new one.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }

        let tmp = self.tmp_path();
        let write = || -> Result<(), StoreError> {
            let file = File::create(&tmp).map_err(|e| self.io_err(e))?;
            let mut out = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut out, snapshot).map_err(StoreError::Encode)?;
            out.write_all(b"\n").map_err(|e| self.io_err(e))?;
            let file = out.into_inner().map_err(|e| self.io_err(e.into_error()))?;
            file.sync_all().map_err(|e| self.io_err(e))
        };

        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            self.io_err(e)
        })?;
        logd!("Store: saved {} entries → {}", snapshot.len(), self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_err(&self, source: io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }
}

/* ---------------- Single-flight guard ---------------- */

static LOCK_SEQ: AtomicU64 = AtomicU64::new(0);

/// Lock file held for the duration of one run.
///
/// The file carries an owner token; drop only removes it while it still
/// holds ours, so a run that outlived its stale window cannot free a lock
/// someone else has since taken over.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    token: String,
}

impl RunLock {
    /// Take the lock, or fail with [`RunError::Locked`] if another run holds it.
    /// A lock file older than `stale_after` is treated as abandoned.
    pub fn acquire(path: &Path, stale_after: Duration) -> Result<Self, RunError> {
        let token = new_token();
        let locked = || RunError::Locked(path.to_path_buf());
        let io_err = |source: io::Error| RunError::Store(StoreError::Io { path: path.to_path_buf(), source });

        match Self::create(path, &token) {
            Ok(lock) => return Ok(lock),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(io_err(e)),
        }
        if !is_stale(path, stale_after) {
            return Err(locked());
        }

        // Takeovers go through a guard file, so of several runs that all
        // saw the same stale lock only one replaces it; the rest re-check
        // and find a fresh owner.
        let guard = match Guard::create(sibling(path, "takeover")) {
            Ok(g) => g,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let guard_path = sibling(path, "takeover");
                if is_stale(&guard_path, stale_after) {
                    logw!("Lock: removing abandoned {}", guard_path.display());
                    let _ = fs::remove_file(&guard_path);
                }
                return Err(locked());
            }
            Err(e) => return Err(io_err(e)),
        };
        if !is_stale(path, stale_after) {
            return Err(locked());
        }

        logw!("Lock: {} is stale; taking over", path.display());
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(e)),
        }
        let lock = Self::create(path, &token).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => locked(),
            _ => io_err(e),
        })?;
        drop(guard);
        Ok(lock)
    }

    fn create(path: &Path, token: &str) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut f = OpenOptions::new().write(true).create_new(true).open(path)?;
        if let Err(e) = writeln!(f, "{token}").and_then(|_| f.sync_all()) {
            let _ = fs::remove_file(path);
            return Err(e);
        }
        Ok(Self { path: path.to_path_buf(), token: s!(token) })
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Owner token written into the lock file (`<pid>.<nanos>.<seq>`).
    pub fn token(&self) -> &str { &self.token }

    /// Whether the file on disk still names this lock as its owner.
    pub fn is_owned(&self) -> bool {
        fs::read_to_string(&self.path).is_ok_and(|t| t.trim() == self.token)
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if !self.is_owned() {
            logw!("Lock: {} was taken over by another run; leaving it", self.path.display());
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            logw!("Lock: could not remove {}: {e}", self.path.display());
        }
    }
}

/// Short-lived marker serializing stale-lock takeovers. Removed on drop.
struct Guard(PathBuf);

impl Guard {
    fn create(path: PathBuf) -> io::Result<Self> {
        OpenOptions::new().write(true).create_new(true).open(&path)?;
        Ok(Self(path))
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

fn new_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = LOCK_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}.{nanos}.{seq}", std::process::id())
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn is_stale(path: &Path, stale_after: Duration) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| SystemTime::now().duration_since(t).ok())
        .is_some_and(|age| age > stale_after)
}
