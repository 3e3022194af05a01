//! Worker-pool simulation for scoped stores
//!
//! Runs many short units of work over a few recycled workers. Each unit
//! stores its request id in its scoped store and reads it back from a
//! downstream call that never receives the id as a parameter. Two failures
//! are counted:
//! - leaked: the unit found state left behind by a previous unit
//! - crossed: the unit read another unit's request id

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use anyhow::anyhow;
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{info, instrument};

use crate::error::StoreError;
use crate::key::Key;
use crate::pool::LocalStorePool;
use crate::scope::{TaskScope, ThreadScope};
use crate::store::KeyValueStore;

const REQUEST_ID: Key<u64> = Key::new("request.id");

/// Which execution-context model to exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// tokio tasks, one `TaskScope` each
    Task,
    /// OS worker threads reusing their `ThreadScope`
    Thread,
    /// OS worker threads leasing from a `LocalStorePool`
    Pool,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Task => write!(f, "task"),
            Mode::Thread => write!(f, "thread"),
            Mode::Pool => write!(f, "pool"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub mode: Mode,
    pub workers: usize,
    pub requests: u64,
    pub leaked: u64,
    pub crossed: u64,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.leaked == 0 && self.crossed == 0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mode: {} requests on {} workers, {} leaked, {} crossed",
            self.mode, self.requests, self.workers, self.leaked, self.crossed
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Outcome {
    leaked: bool,
    crossed: bool,
}

/// Run `requests` units of work over `workers` workers
#[instrument(skip_all, fields(mode = %mode, workers = workers, requests = requests))]
pub async fn run(mode: Mode, workers: usize, requests: u64) -> anyhow::Result<Report> {
    let workers = workers.max(1);

    let outcomes = match mode {
        Mode::Task => run_tasks(workers, requests).await?,
        Mode::Thread => {
            tokio::task::spawn_blocking(move || {
                run_workers(workers, |next| {
                    drain_queue(next, requests, |id| {
                        let _scope = ThreadScope::enter();
                        handle(&ThreadScope, id)
                    })
                })
            })
            .await??
        }
        Mode::Pool => {
            let pool = LocalStorePool::with_capacity(workers);
            tokio::task::spawn_blocking(move || {
                run_workers(workers, |next| {
                    drain_queue(next, requests, |id| handle(&*pool.lease(), id))
                })
            })
            .await??
        }
    };

    let report = Report {
        mode,
        workers,
        requests,
        leaked: outcomes.iter().filter(|o| o.leaked).count() as u64,
        crossed: outcomes.iter().filter(|o| o.crossed).count() as u64,
    };
    info!(leaked = report.leaked, crossed = report.crossed, "simulation finished");
    Ok(report)
}

async fn run_tasks(workers: usize, requests: u64) -> anyhow::Result<Vec<Outcome>> {
    stream::iter(0..requests)
        .map(|id| tokio::spawn(TaskScope::run(handle_in_task(id))))
        .buffer_unordered(workers)
        .map(|joined| Ok::<_, anyhow::Error>(joined??))
        .try_collect()
        .await
}

async fn handle_in_task(id: u64) -> Result<Outcome, StoreError> {
    let leaked = TaskScope.has(REQUEST_ID.name());
    TaskScope.set_key(&REQUEST_ID, id)?;
    // let other tasks run on this worker before reading back
    tokio::task::yield_now().await;
    let seen = current_request(&TaskScope)?;
    Ok(Outcome {
        leaked,
        crossed: seen != id,
    })
}

fn handle<S: KeyValueStore>(store: &S, id: u64) -> Result<Outcome, StoreError> {
    let leaked = store.has(REQUEST_ID.name());
    store.set_key(&REQUEST_ID, id)?;
    thread::yield_now();
    let seen = current_request(store)?;
    Ok(Outcome {
        leaked,
        crossed: seen != id,
    })
}

/// Stands in for code deep in a call chain
fn current_request<S: KeyValueStore>(store: &S) -> Result<u64, StoreError> {
    Ok(*store.get_key(&REQUEST_ID)?)
}

fn drain_queue(
    next: &AtomicU64,
    requests: u64,
    mut each: impl FnMut(u64) -> Result<Outcome, StoreError>,
) -> Result<Vec<Outcome>, StoreError> {
    let mut outcomes = Vec::new();
    loop {
        let id = next.fetch_add(1, Ordering::Relaxed);
        if id >= requests {
            return Ok(outcomes);
        }
        outcomes.push(each(id)?);
    }
}

fn run_workers<F>(workers: usize, work: F) -> anyhow::Result<Vec<Outcome>>
where
    F: Fn(&AtomicU64) -> Result<Vec<Outcome>, StoreError> + Sync,
{
    let next = AtomicU64::new(0);
    thread::scope(|s| {
        let handles: Vec<_> = (0..workers).map(|_| s.spawn(|| work(&next))).collect();

        let mut outcomes = Vec::new();
        for worker in handles {
            let batch = worker
                .join()
                .map_err(|_| anyhow!("worker thread panicked"))??;
            outcomes.extend(batch);
        }
        Ok(outcomes)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn task_mode_is_clean() {
        let report = run(Mode::Task, 4, 200).await.unwrap();
        assert_eq!(report.requests, 200);
        assert!(report.is_clean(), "{report}");
    }

    #[tokio::test]
    async fn thread_mode_is_clean() {
        let report = run(Mode::Thread, 3, 100).await.unwrap();
        assert!(report.is_clean(), "{report}");
    }

    #[tokio::test]
    async fn pool_mode_is_clean() {
        let report = run(Mode::Pool, 3, 100).await.unwrap();
        assert!(report.is_clean(), "{report}");
    }

    #[tokio::test]
    async fn zero_workers_still_runs() {
        let report = run(Mode::Thread, 0, 5).await.unwrap();
        assert_eq!(report.workers, 1);
        assert!(report.is_clean());
    }

    #[test]
    fn handle_detects_leftover_state() {
        let store = crate::store::LocalStore::new();
        store.set_key(&REQUEST_ID, 1).unwrap();

        let outcome = handle(&store, 2).unwrap();
        assert!(outcome.leaked);
        assert!(!outcome.crossed);
    }

    #[test]
    fn report_display() {
        let report = Report {
            mode: Mode::Pool,
            workers: 2,
            requests: 10,
            leaked: 0,
            crossed: 0,
        };
        assert_eq!(
            report.to_string(),
            "pool mode: 10 requests on 2 workers, 0 leaked, 0 crossed"
        );
    }
}
