pub mod aggregate;
pub mod band;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod partition;
pub mod pool;
pub mod request;
pub mod wire;

pub use aggregate::{Aggregator, RenderedImage};
pub use band::render_band;
pub use dispatch::Dispatcher;
pub use engine::RenderEngine;
pub use error::RenderError;
pub use partition::{partition, Partition, TASKS_PER_JOB};
pub use pool::{JobHandle, LocalPool, TaskExecutor, WorkerPool};
pub use request::{Job, RenderRequest, Row, Task, TaskOutcome};
pub use wire::{WireError, WIRE_VERSION};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
