//! Bulk row generation
//!
//! A run inserts `total_items - 1` items, each followed by two subitems that
//! reference it, and reports cumulative progress (three logical rows per item)
//! as a pull-based sequence:
//!
//! - every `progress_interval`-th iteration yields `iteration × 3`, and the next
//!   pull first suspends on the host [`Scheduler`];
//! - after the loop a final `total_items × 3` is yielded, even though the loop
//!   stops one item short of `total_items`;
//! - afterwards, or after a failed insert, the sequence is exhausted for good.
//!
//! Rows are committed one statement at a time. Stopping early, or an aborted
//! run, leaves every completed iteration in the store.

use crate::config::DEFAULT_PROGRESS_INTERVAL;
use crate::database::{Store, StoreHandle};
use crate::error::{Error, Result};
use crate::generator::scheduler::Scheduler;
use crate::names::NameSource;
use crate::types::Progress;
use crate::utils::Helpers;
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Instant;

/// Subitems inserted after every item.
pub const SUBITEMS_PER_ITEM: usize = 2;

/// Entry point for bulk generation runs
#[derive(Debug, Clone)]
pub struct BulkGenerator {
    handle: StoreHandle,
    progress_interval: u64,
}

impl BulkGenerator {
    /// Create a generator reporting progress every 200 iterations
    ///
    /// # Arguments
    /// * `handle` - Store the rows are written to
    pub fn new(handle: StoreHandle) -> Self {
        Self {
            handle,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Report progress every `interval` iterations instead (minimum 1)
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Iterations between progress reports
    pub fn progress_interval(&self) -> u64 {
        self.progress_interval
    }

    /// Start a fresh generation run
    ///
    /// Nothing is inserted until the returned sequence is pulled.
    ///
    /// # Arguments
    /// * `total_items` - Item count the run is sized for, at least 1
    /// * `scheduler` - Suspension point between batches
    /// * `names` - Source of row names
    ///
    /// # Returns
    /// `Ok(Generation)` ready to be pulled, `Err(Error::NotReady)` before the
    /// store is initialized, `Err(Error::InvalidItemCount)` for zero items
    pub fn generate<S, N>(&self, total_items: u64, scheduler: S, names: N) -> Result<Generation<S, N>>
    where
        S: Scheduler,
        N: NameSource,
    {
        let store = self.handle.ready()?;
        if total_items == 0 {
            return Err(Error::InvalidItemCount(total_items));
        }

        info!(
            "starting bulk generation sized for {} items (progress every {} iterations)",
            total_items, self.progress_interval
        );
        Ok(Generation {
            store,
            scheduler,
            names,
            total_items,
            progress_interval: self.progress_interval,
            iteration: 1,
            completed: 0,
            suspend_pending: false,
            finished: false,
            started: None,
        })
    }
}

/// One generation run, consumed by pulling [`Generation::next`]
pub struct Generation<S, N> {
    store: Arc<Store>,
    scheduler: S,
    names: N,
    total_items: u64,
    progress_interval: u64,
    /// Next loop iteration to run
    iteration: u64,
    /// Iterations whose three rows are all committed
    completed: u64,
    suspend_pending: bool,
    finished: bool,
    started: Option<Instant>,
}

impl<S, N> Generation<S, N>
where
    S: Scheduler,
    N: NameSource,
{
    /// Pull the next progress value
    ///
    /// # Returns
    /// `Some(Ok(progress))` for each report, `Some(Err(_))` once if an insert
    /// fails, `None` when the run is over
    pub async fn next(&mut self) -> Option<Result<Progress>> {
        if self.finished {
            return None;
        }
        let started = *self.started.get_or_insert_with(Instant::now);

        if self.suspend_pending {
            self.suspend_pending = false;
            self.scheduler.yield_control().await;
        }

        while self.iteration < self.total_items {
            let iteration = self.iteration;
            self.iteration += 1;

            if let Err(e) = self.insert_family() {
                self.finished = true;
                error!("bulk generation aborted at iteration {}: {}", iteration, e);
                return Some(Err(Error::GenerationAborted {
                    iteration,
                    source: Box::new(e),
                }));
            }
            self.completed += 1;

            if iteration % self.progress_interval == 0 {
                self.suspend_pending = true;
                let progress = Progress::after_items(iteration);
                debug!("generated {} rows", progress);
                return Some(Ok(progress));
            }
        }

        self.finished = true;
        info!(
            "bulk generation finished: {} items in {}",
            self.completed,
            Helpers::format_duration_from(started.elapsed())
        );
        Some(Ok(Progress::after_items(self.total_items)))
    }

    /// Drain the run, handing every progress value to `on_progress`
    ///
    /// # Returns
    /// The final progress value, or the error that aborted the run
    pub async fn run<F>(mut self, mut on_progress: F) -> Result<Progress>
    where
        F: FnMut(Progress),
    {
        let mut last = Progress::after_items(0);
        while let Some(step) = self.next().await {
            last = step?;
            on_progress(last);
        }
        Ok(last)
    }

    fn insert_family(&mut self) -> Result<()> {
        let item_id = self.store.insert_item(&self.names.next_name())?;
        for _ in 0..SUBITEMS_PER_ITEM {
            self.store.insert_subitem(item_id, &self.names.next_name())?;
        }
        Ok(())
    }

    /// Item count the run is sized for
    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    /// Items whose subitems are committed too
    pub fn items_completed(&self) -> u64 {
        self.completed
    }

    /// Whether the sequence is exhausted
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
