//! Async worker pool: one task per source unit.
//!
//! Units share nothing, so tasks only contend for a semaphore permit. The
//! CPU-bound pass runs on the blocking thread pool with a cooperative
//! [`Deadline`]; a tokio timeout slightly past the deadline guards against
//! a pass that stops checking it. Each task returns its own
//! [`AnalysisReport`], merged as tasks complete.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{Analyzer, Deadline, EngineError};
use crate::report::AnalysisReport;
use crate::source::SourceUnit;

/// Slack between the cooperative deadline and the hard timeout.
const HARD_TIMEOUT_GRACE: Duration = Duration::from_millis(250);

/// Runs an [`Analyzer`] over many units concurrently.
#[derive(Debug, Clone)]
pub struct AnalysisPool {
    analyzer: Arc<Analyzer>,
    workers: usize,
    unit_timeout: Duration,
}

impl AnalysisPool {
    /// Create a pool running at most `workers` units at a time.
    pub fn new(analyzer: Arc<Analyzer>, workers: usize, unit_timeout: Duration) -> Self {
        Self {
            analyzer,
            workers: workers.max(1),
            unit_timeout,
        }
    }

    /// Create a pool sized by the analyzer's engine settings.
    pub fn from_settings(analyzer: Arc<Analyzer>) -> Self {
        let engine = analyzer.settings().engine.clone();
        Self::new(analyzer, engine.workers, engine.unit_timeout())
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Analyse every unit and merge the results.
    ///
    /// Never fails: a unit that times out or faults is reported as a
    /// rejection, and so is one whose task is lost. The merged report is in
    /// completion order; call [`AnalysisReport::sort`] for a stable order.
    pub async fn run(&self, units: Vec<SourceUnit>) -> AnalysisReport {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        let unit_count = units.len();
        let mut pending: Vec<String> = units.iter().map(|u| u.path.clone()).collect();

        for unit in units {
            let analyzer = Arc::clone(&self.analyzer);
            let semaphore = Arc::clone(&semaphore);
            let unit_timeout = self.unit_timeout;

            tasks.spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                let path = unit.path.clone();
                (path, run_unit(analyzer, unit, unit_timeout).await)
            });
        }

        let mut report = AnalysisReport::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((path, unit_report)) => {
                    if let Some(index) = pending.iter().position(|p| *p == path) {
                        pending.swap_remove(index);
                    }
                    report.merge(unit_report);
                }
                Err(err) => warn!(error = %err, "analysis task failed"),
            }
        }
        reject_lost(&mut report, pending);

        debug!(
            units = unit_count,
            statements = report.statements.len(),
            rejections = report.rejections.len(),
            "pool run finished"
        );
        report
    }
}

/// Record a unit-level rejection for every unit whose task never returned.
fn reject_lost(report: &mut AnalysisReport, lost: Vec<String>) {
    for path in lost {
        let err = EngineError::Internal("analysis task did not complete".to_string());
        warn!(path = %path, error = %err, "unit lost by pool");
        report.merge(AnalysisReport::rejected(err.to_rejection(&path)));
    }
}

async fn run_unit(analyzer: Arc<Analyzer>, unit: SourceUnit, unit_timeout: Duration) -> AnalysisReport {
    let path = unit.path.clone();
    let started = Instant::now();
    let deadline = Deadline::after(unit_timeout);

    let work = tokio::task::spawn_blocking(move || analyzer.analyze_isolated(&unit, &deadline));
    let hard_timeout = unit_timeout.saturating_add(HARD_TIMEOUT_GRACE);

    let err = match tokio::time::timeout(hard_timeout, work).await {
        Ok(Ok(outcome)) => return outcome.into_report(),
        Ok(Err(join_err)) => EngineError::Internal(join_err.to_string()),
        Err(_) => EngineError::Timeout {
            path: path.clone(),
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        },
    };
    warn!(path = %path, error = %err, "unit abandoned by pool");
    AnalysisReport::rejected(err.to_rejection(&path))
}
