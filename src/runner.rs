// src/runner.rs
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::{
    compose::{compose, NotificationMessage},
    config::Config,
    diff::diff,
    dispatch::{Delivery, Dispatcher},
    error::RunError,
    fetch::{fetch_snapshot, Source},
    progress::Progress,
    store::{RunLock, SnapshotStore},
};

/// What became of one composed alert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Delivered,
    Failed(String),
    Skipped(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Delivered => f.write_str("delivered"),
            Outcome::Failed(why) => write!(f, "failed: {why}"),
            Outcome::Skipped(why) => write!(f, "skipped: {why}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityReport {
    pub name: String,
    pub message: String,
    pub outcome: Outcome,
}

/// Summary of one completed run (fetch and persist both succeeded).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Entities in the fresh snapshot.
    pub fetched: usize,
    /// First sightings, stored without alerting.
    pub baseline: Vec<String>,
    /// Known entities with no alert-worthy change.
    pub unchanged: usize,
    /// One per composed alert, sorted by entity name.
    pub outcomes: Vec<EntityReport>,
}

impl RunReport {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn delivered(&self) -> usize { self.count(|o| matches!(o, Outcome::Delivered)) }
    pub fn failed(&self) -> usize { self.count(|o| matches!(o, Outcome::Failed(_))) }
    pub fn skipped(&self) -> usize { self.count(|o| matches!(o, Outcome::Skipped(_))) }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entities ({} new, {} unchanged); alerts: {} delivered, {} failed, {} skipped",
            self.fetched,
            self.baseline.len(),
            self.unchanged,
            self.delivered(),
            self.failed(),
            self.skipped(),
        )
    }
}

/// One poll cycle: fetch → load prior → diff → compose/dispatch → persist.
///
/// Fetch and header failures abort before anything on disk changes.
/// Once the fetch succeeded the run always persists, whatever happened to
/// individual alerts; those only show up in the report.
pub fn run(
    cfg: &Config,
    source: &dyn Source,
    dispatcher: &dyn Dispatcher,
    mut progress: Option<&mut dyn Progress>,
) -> Result<RunReport, RunError> {
    let _lock = RunLock::acquire(&cfg.lock_path(), Duration::from_secs(cfg.run.lock_stale_secs))?;

    logf!("Run: checking {}", source.locator());
    let current = match fetch_snapshot(source, &cfg.source) {
        Ok(s) => s,
        Err(e) => {
            loge!("Run: aborted, state left untouched: {e}");
            return Err(e);
        }
    };
    logf!("Run: fetched {} entities", current.len());
    if let Some(p) = progress.as_deref_mut() {
        p.log(&format!("Fetched {} entities from {}", current.len(), source.locator()));
    }

    let store = SnapshotStore::new(&cfg.store.path);
    let prior = store.load()?;

    let changes = diff(&prior, &current);
    if !prior.is_empty() && !changes.baseline.is_empty() {
        logf!("Run: {} new entities recorded without alert", changes.baseline.len());
    }

    let messages: Vec<NotificationMessage> = changes
        .changed
        .iter()
        .inspect(|e| {
            let fields: Vec<&str> = e.changes.iter().map(|c| c.field.key()).collect();
            logf!("Change: {} [{}]", e.entity, fields.join(", "));
        })
        .flat_map(|e| compose(e, &cfg.push.title))
        .collect();

    if let Some(p) = progress.as_deref_mut() {
        p.begin(messages.len());
    }

    let mut on_done = |r: &EntityReport| {
        if let Some(p) = progress.as_deref_mut() {
            p.item_done(r);
        }
    };
    let mut outcomes = dispatch_all(&messages, dispatcher, cfg.run.dispatch_workers, &mut on_done);
    outcomes.sort_by(|a, b| a.name.cmp(&b.name));

    store.save(&current)?;

    let report = RunReport {
        fetched: current.len(),
        baseline: changes.baseline,
        unchanged: changes.unchanged,
        outcomes,
    };
    logf!("Run: done; {report}");
    if let Some(p) = progress.as_deref_mut() {
        p.finish(&report);
    }
    Ok(report)
}

fn deliver(dispatcher: &dyn Dispatcher, msg: &NotificationMessage) -> EntityReport {
    let outcome = match dispatcher.dispatch(msg) {
        Ok(Delivery::Sent) => {
            logf!("Push: {} delivered", msg.entity);
            Outcome::Delivered
        }
        Ok(Delivery::Held(why)) => Outcome::Skipped(why),
        Err(e) => {
            loge!("Push: {} failed: {e}", msg.entity);
            Outcome::Failed(e.to_string())
        }
    };
    EntityReport { name: msg.entity.clone(), message: msg.body.clone(), outcome }
}

/// Send every message; a failure never stops the others.
fn dispatch_all(
    messages: &[NotificationMessage],
    dispatcher: &dyn Dispatcher,
    workers: usize,
    on_done: &mut dyn FnMut(&EntityReport),
) -> Vec<EntityReport> {
    let mut done = Vec::with_capacity(messages.len());
    let workers = workers.min(messages.len()).max(1);

    if workers == 1 {
        for msg in messages {
            let r = deliver(dispatcher, msg);
            on_done(&r);
            done.push(r);
        }
        return done;
    }

    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<EntityReport>();

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let next = &next;
            scope.spawn(move || {
                loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    let Some(msg) = messages.get(i) else { break };
                    if tx.send(deliver(dispatcher, msg)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx); // main thread is sole receiver now

        for r in rx {
            on_done(&r);
            done.push(r);
        }
    });

    done
}
