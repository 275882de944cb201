//! Monte Carlo orchestration: many independent trials, one report.
//!
//! Trials share only read-only state (the Parameter Set and the
//! precomputed loan schedules). Results are collected in trial-index
//! order, so the report does not depend on how rayon schedules work.

use crate::{
    aggregate::AggregateReport,
    config::ParameterSet,
    error::{SimResult, TrialError},
    statement::TrialResult,
    trial::TrialRunner,
    types::TrialIndex,
};
use rayon::prelude::*;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

/// Advisory progress hook, called once per finished trial from worker
/// threads. Implementations must be cheap.
pub trait ProgressObserver: Send + Sync {
    fn on_trial_finished(&self, finished: u64, total: u64);
}

/// Ignores progress.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_trial_finished(&self, _finished: u64, _total: u64) {}
}

/// Logs at each 10% step.
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_trial_finished(&self, finished: u64, total: u64) {
        let step = (total / 10).max(1);
        if finished % step == 0 || finished == total {
            log::info!("{finished}/{total} trials finished");
        }
    }
}

/// Shared abort flag. Cancelling skips trials that have not started yet;
/// trials already running finish normally.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Raw outcome of a batch before aggregation.
#[derive(Debug, Default)]
pub struct TrialBatch {
    /// Completed trials, ascending by trial index.
    pub results:   Vec<TrialResult>,
    pub failures:  Vec<(TrialIndex, TrialError)>,
    pub skipped:   u64,
}

impl TrialBatch {
    pub fn cancelled(&self) -> bool {
        self.skipped > 0
    }
}

enum Outcome {
    Done(TrialResult),
    Failed(TrialIndex, TrialError),
    Skipped,
}

pub struct MonteCarloRunner<'a> {
    params: &'a ParameterSet,
}

impl<'a> MonteCarloRunner<'a> {
    pub fn new(params: &'a ParameterSet) -> Self {
        Self { params }
    }

    /// Run every trial and aggregate.
    pub fn run(&self) -> SimResult<AggregateReport> {
        self.run_with(&NoProgress, &CancelToken::new())
    }

    pub fn run_with(
        &self,
        observer: &dyn ProgressObserver,
        cancel: &CancelToken,
    ) -> SimResult<AggregateReport> {
        let batch = self.run_trials(observer, cancel)?;
        Ok(AggregateReport::build(
            self.params,
            &batch.results,
            batch.failures.len() as u64,
            batch.cancelled(),
        ))
    }

    /// Run every trial without aggregating, on a dedicated pool when the
    /// scenario pins a thread count.
    pub fn run_trials(
        &self,
        observer: &dyn ProgressObserver,
        cancel: &CancelToken,
    ) -> SimResult<TrialBatch> {
        let runner = TrialRunner::new(self.params)?;
        let total = self.params.trials() as u64;
        log::info!(
            "Running '{}': {total} trials x {} months, seed {}",
            self.params.config().name,
            self.params.horizon(),
            self.params.seed()
        );

        let batch = match self.params.simulation().threads {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
                pool.install(|| execute(&runner, total, observer, cancel))
            }
            None => execute(&runner, total, observer, cancel),
        };

        for (index, err) in &batch.failures {
            log::warn!("Trial {index} failed: {err}");
        }
        if batch.cancelled() {
            log::info!("Run cancelled; {} trials skipped", batch.skipped);
        }
        log::info!(
            "Finished '{}': {} completed, {} failed",
            self.params.config().name,
            batch.results.len(),
            batch.failures.len()
        );
        Ok(batch)
    }
}

fn execute(
    runner: &TrialRunner<'_>,
    total: u64,
    observer: &dyn ProgressObserver,
    cancel: &CancelToken,
) -> TrialBatch {
    let finished = AtomicU64::new(0);
    let outcomes: Vec<Outcome> = (0..total as usize)
        .into_par_iter()
        .map(|i| {
            let index = i as TrialIndex;
            if cancel.is_cancelled() {
                return Outcome::Skipped;
            }
            let outcome = match runner.run(index) {
                Ok(result) => Outcome::Done(result),
                Err(err) => Outcome::Failed(index, err),
            };
            observer.on_trial_finished(finished.fetch_add(1, Ordering::Relaxed) + 1, total);
            outcome
        })
        .collect();

    let mut batch = TrialBatch::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Done(result) => batch.results.push(result),
            Outcome::Failed(index, err) => batch.failures.push((index, err)),
            Outcome::Skipped => batch.skipped += 1,
        }
    }
    batch
}
