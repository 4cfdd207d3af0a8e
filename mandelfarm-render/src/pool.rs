use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use crate::band::render_band;
use crate::error::RenderError;
use crate::request::{Job, RenderRequest, Row, Task, TaskOutcome};
use crate::wire;

// ---------------------------------------------------------------------------
// Transport contract
// ---------------------------------------------------------------------------

/// A set of worker connections that can run render jobs.
///
/// Implementations may run tasks on local threads or ship them to remote
/// nodes; the dispatcher only relies on this contract.  `submit` must not
/// block on computation.  The returned [`JobHandle`] is how results come back.
pub trait WorkerPool {
    /// Number of connections the pool holds, whether active yet or not.
    fn connection_count(&self) -> usize;

    /// Grow or shrink the pool to `size` connections.
    fn set_size(&mut self, size: usize) -> crate::Result<()>;

    /// Block until at least `count` connections are active, giving up after
    /// `timeout`.  Returns the number of active connections.
    fn await_active(&self, count: usize, timeout: Duration) -> crate::Result<usize>;

    /// Queue a job for execution and return immediately.
    fn submit(&mut self, job: Job) -> crate::Result<JobHandle>;

    /// Tear down every connection.  Further submissions fail with
    /// [`RenderError::PoolClosed`].
    fn close(&mut self);
}

/// Pending results of one submitted job.
///
/// Workers push one [`TaskOutcome`] per task into the handle's channel, in
/// whatever order they finish.
pub struct JobHandle {
    name: String,
    expected: usize,
    outcomes: Receiver<TaskOutcome>,
}

impl JobHandle {
    pub fn new(name: String, expected: usize, outcomes: Receiver<TaskOutcome>) -> Self {
        Self {
            name,
            expected,
            outcomes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until every task of the job has reported back.
    ///
    /// Outcomes are returned in task order.  If the transport drops the job
    /// before all tasks have reported, the job is lost.
    pub fn await_results(self) -> crate::Result<Vec<TaskOutcome>> {
        let mut outcomes = Vec::with_capacity(self.expected);
        while outcomes.len() < self.expected {
            match self.outcomes.recv() {
                Ok(outcome) => outcomes.push(outcome),
                Err(_) => {
                    return Err(RenderError::JobLost {
                        job: self.name,
                        received: outcomes.len(),
                        expected: self.expected,
                    })
                }
            }
        }
        outcomes.sort_by_key(|o| o.index);
        Ok(outcomes)
    }
}

// ---------------------------------------------------------------------------
// Local thread pool
// ---------------------------------------------------------------------------

/// The computation a worker runs for one band.
pub type TaskExecutor =
    Arc<dyn Fn(&RenderRequest) -> Result<Vec<Row>, String> + Send + Sync + 'static>;

/// Worker pool backed by a Rayon thread pool, one thread per connection.
///
/// With `encode_tasks` set, every task and outcome makes a round trip through
/// the [`wire`] encoding, exactly as it would on its way to and from a remote
/// node.
pub struct LocalPool {
    threads: Option<ThreadPool>,
    size: usize,
    executor: TaskExecutor,
    encode_tasks: bool,
}

impl LocalPool {
    /// A pool of `size` threads running the escape-time band renderer.
    pub fn new(size: usize) -> crate::Result<Self> {
        Self::with_executor(
            size,
            Arc::new(|request: &RenderRequest| -> Result<Vec<Row>, String> {
                Ok(render_band(request))
            }),
        )
    }

    /// A pool of `size` threads running `executor` for each task.
    pub fn with_executor(size: usize, executor: TaskExecutor) -> crate::Result<Self> {
        Ok(Self {
            threads: Some(build_threads(size)?),
            size,
            executor,
            encode_tasks: false,
        })
    }

    /// Route tasks and outcomes through the wire encoding.
    pub fn encode_tasks(mut self, encode: bool) -> Self {
        self.encode_tasks = encode;
        self
    }
}

fn build_threads(size: usize) -> crate::Result<ThreadPool> {
    if size == 0 {
        return Err(RenderError::InvalidParallelism(size));
    }
    let threads = ThreadPoolBuilder::new()
        .num_threads(size)
        .thread_name(|i| format!("mandelfarm-worker-{i}"))
        .build()?;
    Ok(threads)
}

impl WorkerPool for LocalPool {
    fn connection_count(&self) -> usize {
        if self.threads.is_some() {
            self.size
        } else {
            0
        }
    }

    fn set_size(&mut self, size: usize) -> crate::Result<()> {
        info!(from = self.size, to = size, "Resizing worker pool");
        // Dropping the old pool lets its threads drain queued work and exit.
        self.threads = Some(build_threads(size)?);
        self.size = size;
        Ok(())
    }

    fn await_active(&self, count: usize, _timeout: Duration) -> crate::Result<usize> {
        // Local threads are active as soon as the pool is built.
        let threads = self.threads.as_ref().ok_or(RenderError::PoolClosed)?;
        let active = threads.current_num_threads();
        if active < count {
            return Err(RenderError::WorkerPool {
                requested: count,
                active,
                waited: Duration::ZERO,
            });
        }
        Ok(active)
    }

    fn submit(&mut self, job: Job) -> crate::Result<JobHandle> {
        let threads = self.threads.as_ref().ok_or(RenderError::PoolClosed)?;
        let (tx, rx) = crossbeam_channel::bounded(job.tasks.len());
        let expected = job.tasks.len();

        for task in job.tasks {
            let tx: Sender<TaskOutcome> = tx.clone();
            let executor = Arc::clone(&self.executor);
            let encode = self.encode_tasks;
            threads.spawn(move || {
                let outcome = if encode {
                    run_encoded(task, &executor)
                } else {
                    run_task(task, &executor)
                };
                // The receiver is gone if the render was abandoned.
                let _ = tx.send(outcome);
            });
        }

        debug!(job = %job.name, tasks = expected, "Submitted job");
        Ok(JobHandle::new(job.name, expected, rx))
    }

    fn close(&mut self) {
        if self.threads.take().is_some() {
            info!(size = self.size, "Closed worker pool");
        }
    }
}

/// Run one task, turning a panic inside the executor into a failed outcome.
fn run_task(task: Task, executor: &TaskExecutor) -> TaskOutcome {
    debug!(task = %task.id, "Running task...");
    let result = panic::catch_unwind(AssertUnwindSafe(|| executor(&task.request)))
        .unwrap_or_else(|payload| Err(panic_message(payload.as_ref())));
    if let Err(cause) = &result {
        warn!(task = %task.id, %cause, "Task failed");
    }
    debug!(task = %task.id, "Running task... done");
    TaskOutcome {
        task_id: task.id,
        index: task.index,
        result,
    }
}

/// Run one task the way a remote node would: decode the task bytes, execute,
/// and encode the outcome for the trip back.
fn run_encoded(task: Task, executor: &TaskExecutor) -> TaskOutcome {
    let request_bytes = wire::encode_task(&task);
    let reply = wire::decode_task(&request_bytes)
        .map(|decoded| wire::encode_outcome(&run_task(decoded, executor)))
        .and_then(|bytes| wire::decode_outcome(&bytes));
    match reply {
        Ok(outcome) => outcome,
        Err(e) => TaskOutcome {
            task_id: task.id,
            index: task.index,
            result: Err(format!("wire error: {e}")),
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
