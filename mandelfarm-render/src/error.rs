use std::time::Duration;

use thiserror::Error;

use crate::wire::WireError;

/// Errors originating from the partition → dispatch → aggregate pipeline.
///
/// `InvalidDimensions`, `InvalidParallelism` and `Core` come from
/// partitioning; `WorkerPool`, `PoolStart` and `PoolClosed` from sizing the
/// pool; `TaskFailed` and `JobLost` from awaiting results.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid image dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("invalid parallelism: {0} (must be >= 1)")]
    InvalidParallelism(usize),

    #[error("worker pool has {active} of {requested} workers active after waiting {waited:?}")]
    WorkerPool {
        requested: usize,
        active: usize,
        waited: Duration,
    },

    #[error("failed to start worker pool: {0}")]
    PoolStart(#[from] rayon::ThreadPoolBuildError),

    #[error("worker pool is closed")]
    PoolClosed,

    #[error("task {task_id} threw exception: {cause}")]
    TaskFailed { task_id: String, cause: String },

    #[error("job {job} lost after {received} of {expected} task results")]
    JobLost {
        job: String,
        received: usize,
        expected: usize,
    },

    #[error("cannot assemble image: {reason}")]
    Aggregation { reason: String },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Core(#[from] mandelfarm_core::CoreError),
}
