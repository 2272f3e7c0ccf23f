//! Collector Scheduler
//!
//! Runs every enabled collector on its own tokio task, at its own interval,
//! until the shutdown token is cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::collectors::{Collector, CollectorSet};
use crate::config::ExporterConfig;
use crate::domain::GlusterBackend;
use crate::error::{Error, Result};

/// A collector selected to run, with its interval.
#[derive(Clone)]
struct Job {
    collector: Arc<dyn Collector>,
    interval: Duration,
}

/// Starts and owns the per-collector polling loops.
pub struct Scheduler {
    backend: Arc<dyn GlusterBackend>,
    jobs: Vec<Job>,
    shutdown: CancellationToken,
}

impl Scheduler {
    /// Select the collectors that are not disabled in `config`.
    pub fn new(
        backend: Arc<dyn GlusterBackend>,
        collectors: &CollectorSet,
        config: &ExporterConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let jobs = collectors
            .iter()
            .filter_map(|collector| {
                let settings = config.collector(collector.name());
                if settings.disabled {
                    info!(collector = collector.name(), "Collector disabled");
                    return None;
                }
                Some(Job {
                    collector: collector.clone(),
                    interval: settings.interval(),
                })
            })
            .collect();

        Self {
            backend,
            jobs,
            shutdown,
        }
    }

    /// Names of the collectors that will run.
    pub fn enabled(&self) -> Vec<&'static str> {
        self.jobs.iter().map(|j| j.collector.name()).collect()
    }

    /// Spawn one loop per enabled collector.
    pub fn start(&self) -> Result<Vec<JoinHandle<()>>> {
        if self.jobs.is_empty() {
            return Err(Error::NoCollectorsEnabled);
        }

        Ok(self
            .jobs
            .iter()
            .cloned()
            .map(|job| {
                info!(
                    collector = job.collector.name(),
                    interval_secs = job.interval.as_secs(),
                    "Starting collector"
                );
                tokio::spawn(run_loop(
                    job,
                    self.backend.clone(),
                    self.shutdown.clone(),
                ))
            })
            .collect())
    }

    /// Stop every loop at its next suspension point.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

async fn run_loop(job: Job, backend: Arc<dyn GlusterBackend>, shutdown: CancellationToken) {
    let name = job.collector.name();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            result = job.collector.run_once(backend.as_ref()) => match result {
                Ok(()) => debug!(collector = name, "Collection finished"),
                Err(e) => warn!(collector = name, error = %e, "Collection failed"),
            },
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(job.interval) => {}
        }
    }
    info!(collector = name, "Collector stopped");
}
