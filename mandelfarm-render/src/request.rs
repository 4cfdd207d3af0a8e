use mandelfarm_core::ViewState;

/// One row band to render.
///
/// `first_row` is the band's offset in the final image and `height` the number
/// of rows it owns.  `view` is already shifted so that its origin sits on the
/// band's first row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub first_row: u32,
    pub width: u32,
    pub height: u32,
    pub view: ViewState,
}

impl RenderRequest {
    /// Absolute row indices this band covers.
    pub fn rows(&self) -> std::ops::Range<u32> {
        self.first_row..self.first_row + self.height
    }
}

/// One fully computed image row.
///
/// `y` is the absolute row index in the final image, which is what lets rows
/// arrive from workers in any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub y: u32,
    pub pixels: Vec<u32>,
}

impl Row {
    pub fn new(y: u32, pixels: Vec<u32>) -> Self {
        Self { y, pixels }
    }
}

/// A request tagged with the identity it carries through a worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// `"{job_name}-task-{i}"`, used in logs and failure reports.
    pub id: String,
    /// Position of the task within its job.
    pub index: usize,
    pub request: RenderRequest,
}

/// A group of tasks submitted and awaited as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: u64,
    pub name: String,
    pub tasks: Vec<Task>,
}

impl Job {
    /// Build a job whose task ids derive from `name`.
    pub fn new(id: u64, name: String, requests: &[RenderRequest]) -> Self {
        let tasks = requests
            .iter()
            .enumerate()
            .map(|(index, &request)| Task {
                id: format!("{name}-task-{index}"),
                index,
                request,
            })
            .collect();
        Self { id, name, tasks }
    }
}

/// What a worker reports back for a single task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub task_id: String,
    pub index: usize,
    /// The band's rows, or the message of whatever made the task fail.
    pub result: Result<Vec<Row>, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(first_row: u32, height: u32) -> RenderRequest {
        RenderRequest {
            first_row,
            width: 4,
            height,
            view: ViewState::initial(),
        }
    }

    #[test]
    fn task_ids_derive_from_job_name() {
        let job = Job::new(7, "job-7-0-1".into(), &[request(0, 2), request(2, 2)]);
        let ids: Vec<_> = job.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["job-7-0-1-task-0", "job-7-0-1-task-1"]);
        assert_eq!(job.tasks[1].index, 1);
        assert_eq!(job.tasks[1].request.first_row, 2);
    }

    #[test]
    fn request_rows() {
        assert_eq!(request(6, 3).rows(), 6..9);
        assert!(request(0, 0).rows().is_empty());
    }
}
