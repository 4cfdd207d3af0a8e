use tracing::debug;

use mandelfarm_core::ViewState;

use crate::error::RenderError;
use crate::request::RenderRequest;

/// Number of row bands per job.  Several bands per job keep each worker busy
/// with more than one unit of work.
pub const TASKS_PER_JOB: usize = 4;

/// An image split into row bands, grouped into jobs.
#[derive(Debug, Clone)]
pub struct Partition {
    requests: Vec<RenderRequest>,
    parallelism: usize,
}

impl Partition {
    /// All bands in row order.
    pub fn requests(&self) -> &[RenderRequest] {
        &self.requests
    }

    /// Number of jobs, which is also the worker-pool size the partition was built for.
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Jobs as `(index of first task, tasks)`, each with [`TASKS_PER_JOB`]
    /// consecutive bands.
    pub fn jobs(&self) -> impl Iterator<Item = (usize, &[RenderRequest])> {
        self.requests
            .chunks(TASKS_PER_JOB)
            .enumerate()
            .map(|(job, tasks)| (job * TASKS_PER_JOB, tasks))
    }
}

/// Split a `width × height` image of `view` into `parallelism × TASKS_PER_JOB`
/// row bands.
///
/// Every band but the last gets `height / number_of_tasks` rows; the last one
/// takes whatever is left, so the bands always tile `[0, height)` exactly.
/// When the image has fewer rows than there are tasks, the leading bands are
/// empty and the last one owns the whole image.
pub fn partition(
    width: u32,
    height: u32,
    view: &ViewState,
    parallelism: usize,
) -> crate::Result<Partition> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidDimensions { width, height });
    }
    if parallelism == 0 {
        return Err(RenderError::InvalidParallelism(parallelism));
    }
    let number_of_tasks = parallelism
        .checked_mul(TASKS_PER_JOB)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(RenderError::InvalidParallelism(parallelism))?;
    let rows_per_task = height / number_of_tasks;

    // Plane height covered by each band.
    let origin = view.origin();
    let plane_per_task = height as f64 * view.scale() / number_of_tasks as f64;

    let band = |s: u32, rows: u32| RenderRequest {
        first_row: rows_per_task * s,
        width,
        height: rows,
        view: view.with_origin(origin.with_min_y(origin.min_y + plane_per_task * s as f64)),
    };

    let last = number_of_tasks - 1;
    let mut requests: Vec<RenderRequest> = (0..last).map(|s| band(s, rows_per_task)).collect();
    requests.push(band(last, height - last * rows_per_task));

    debug!(
        height,
        parallelism,
        number_of_tasks,
        rows_per_task,
        "Partitioned image into row bands"
    );

    Ok(Partition {
        requests,
        parallelism,
    })
}
