use std::time::{Duration, Instant};

use tracing::info;

use mandelfarm_core::ViewState;

use crate::aggregate::{Aggregator, RenderedImage};
use crate::dispatch::Dispatcher;
use crate::error::RenderError;
use crate::partition::{partition, TASKS_PER_JOB};
use crate::pool::WorkerPool;

/// Partition → dispatch → aggregate, for one image at a time.
///
/// `parallelism` is fixed for the engine's lifetime; it is both the number of
/// jobs per render and the worker-pool size the dispatcher maintains.
pub struct RenderEngine<P: WorkerPool> {
    dispatcher: Dispatcher<P>,
    parallelism: usize,
}

impl<P: WorkerPool> RenderEngine<P> {
    pub fn new(pool: P, parallelism: usize, worker_wait: Duration) -> crate::Result<Self> {
        if parallelism == 0 {
            return Err(RenderError::InvalidParallelism(parallelism));
        }
        Ok(Self {
            dispatcher: Dispatcher::new(pool, worker_wait),
            parallelism,
        })
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn dispatcher(&self) -> &Dispatcher<P> {
        &self.dispatcher
    }

    /// Render a `width × height` image of `view`.
    ///
    /// Either every row comes back, in row order, or the render fails as a
    /// whole and no rows are returned.
    pub fn render_image(
        &mut self,
        width: u32,
        height: u32,
        view: &ViewState,
    ) -> crate::Result<RenderedImage> {
        let partition = partition(width, height, view, self.parallelism)?;
        let number_of_tasks = partition.requests().len();
        info!(
            lines = height,
            jobs = self.parallelism,
            tasks = number_of_tasks,
            tasks_per_job = TASKS_PER_JOB,
            lines_per_task = height as usize / number_of_tasks,
            "Starting render"
        );

        let start = Instant::now();
        let mut aggregator = Aggregator::new(width, height);
        self.dispatcher.execute(&partition, &mut aggregator)?;
        let image = aggregator.finish()?;

        let elapsed = start.elapsed();
        info!(
            lines = height,
            elapsed_ms = elapsed.as_millis(),
            "Render complete"
        );
        Ok(image)
    }

    /// Release the worker pool.
    pub fn close(&mut self) {
        self.dispatcher.close();
    }
}
