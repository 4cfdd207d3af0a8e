pub mod coords;
pub mod error;
pub mod history;
pub mod kernel;
pub mod view;

// Re-export primary types for convenience.
pub use coords::{PixelRect, PixelSize, PlaneOrigin};
pub use error::CoreError;
pub use history::ViewHistory;
pub use kernel::{escape_iterations, pixel_color, rgb, ColorTable, COLOR_TABLE, MAX_ITERATIONS};
pub use view::{ViewState, INITIAL_IMAGE_SIZE};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
