use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use mandelfarm_core::{PixelSize, INITIAL_IMAGE_SIZE};

use crate::debounce::Debouncer;

/// Runtime settings, read once at startup.
///
/// Every field has a default, so a partial file (or none at all) is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Jobs per render, and the size of the worker pool.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Quiet period after the last resize before the image is recomputed.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// How long to wait for worker connections before giving up on a render.
    #[serde(default = "default_worker_wait_ms")]
    pub worker_wait_ms: u64,
    /// Send every task through the wire encoding, as a remote pool would.
    #[serde(default)]
    pub encode_tasks: bool,
    #[serde(default = "default_image_side")]
    pub initial_width: u32,
    #[serde(default = "default_image_side")]
    pub initial_height: u32,
}

fn default_parallelism() -> usize {
    1
}
fn default_debounce_ms() -> u64 {
    Debouncer::DEFAULT_DELAY.as_millis() as u64
}
fn default_worker_wait_ms() -> u64 {
    10_000
}
fn default_image_side() -> u32 {
    INITIAL_IMAGE_SIZE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            debounce_ms: default_debounce_ms(),
            worker_wait_ms: default_worker_wait_ms(),
            encode_tasks: false,
            initial_width: default_image_side(),
            initial_height: default_image_side(),
        }
    }
}

impl Settings {
    /// Load settings from `mandelfarm.json` next to the executable, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&crate::app_dir::settings_path())
    }

    /// Load settings from `path`, falling back to defaults if it is missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(json) => match serde_json::from_str::<Settings>(&json) {
                    Ok(settings) => {
                        info!("Loaded settings from {}", path.display());
                        return settings;
                    }
                    Err(e) => {
                        error!("Failed to parse settings: {e}");
                    }
                },
                Err(e) => {
                    error!("Failed to read settings file: {e}");
                }
            }
        } else {
            debug!("No settings file at {}", path.display());
        }
        Self::default()
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn worker_wait(&self) -> Duration {
        Duration::from_millis(self.worker_wait_ms)
    }

    pub fn initial_size(&self) -> PixelSize {
        PixelSize::new(self.initial_width, self.initial_height)
    }
}
