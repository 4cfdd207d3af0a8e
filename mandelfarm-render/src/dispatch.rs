use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::aggregate::Aggregator;
use crate::error::RenderError;
use crate::partition::Partition;
use crate::pool::{JobHandle, WorkerPool};
use crate::request::{Job, RenderRequest};

/// Job ids are unique for the lifetime of the process.
static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(0);

fn next_job_id() -> u64 {
    NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed)
}

/// Fans jobs out to a [`WorkerPool`] and feeds their rows to an [`Aggregator`].
pub struct Dispatcher<P: WorkerPool> {
    pool: P,
    worker_wait: Duration,
}

impl<P: WorkerPool> Dispatcher<P> {
    /// `worker_wait` bounds each wait for pool connections to become active.
    pub fn new(pool: P, worker_wait: Duration) -> Self {
        Self { pool, worker_wait }
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Make sure the pool has `parallelism` active connections.
    ///
    /// Waits for the first connection, resizes the pool if its size is off,
    /// then waits for all of them.  Called on every render since connections
    /// can come and go between renders.
    pub fn ensure_workers(&mut self, parallelism: usize) -> crate::Result<()> {
        self.pool.await_active(1, self.worker_wait)?;

        let current = self.pool.connection_count();
        if current != parallelism {
            self.pool.set_size(parallelism)?;
        }

        let active = self.pool.await_active(parallelism, self.worker_wait)?;
        debug!(parallelism, active, "Worker pool ready");
        Ok(())
    }

    /// Submit the tasks starting at index `first_task` as one job.
    ///
    /// Returns as soon as the pool has accepted the job.
    pub fn submit(
        &mut self,
        first_task: usize,
        requests: &[RenderRequest],
    ) -> crate::Result<JobHandle> {
        let id = next_job_id();
        let last_task = first_task + requests.len().saturating_sub(1);
        let name = format!("job-{id}-{first_task}-{last_task}");
        debug!(job = %name, "Creating job");
        self.pool.submit(Job::new(id, name, requests))
    }

    /// Run every job of `partition`, feeding the rows into `aggregator`.
    ///
    /// All jobs are submitted before any is awaited; they are then awaited in
    /// submission order.  The first failed task aborts the render.  Jobs not
    /// yet awaited are abandoned and finish on their own.
    pub fn execute(
        &mut self,
        partition: &Partition,
        aggregator: &mut Aggregator,
    ) -> crate::Result<()> {
        self.ensure_workers(partition.parallelism())?;

        let handles = partition
            .jobs()
            .map(|(first_task, requests)| self.submit(first_task, requests))
            .collect::<crate::Result<Vec<_>>>()?;

        for handle in handles {
            let job = handle.name().to_string();
            for outcome in handle.await_results()? {
                match outcome.result {
                    Ok(rows) => {
                        for row in rows {
                            aggregator.accept(row)?;
                        }
                    }
                    Err(cause) => {
                        warn!(%job, task = %outcome.task_id, %cause, "Task failed, abandoning render");
                        return Err(RenderError::TaskFailed {
                            task_id: outcome.task_id,
                            cause,
                        });
                    }
                }
            }
            debug!(%job, rows = aggregator.received(), "Job complete");
        }
        Ok(())
    }

    /// Tear down the pool's connections.
    pub fn close(&mut self) {
        info!("Closing worker pool...");
        self.pool.close();
        info!("Closing worker pool... done");
    }
}
