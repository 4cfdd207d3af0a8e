//! Directory where the executable lives. Settings are read from here so a
//! standalone install carries its configuration alongside the binary.

use std::path::PathBuf;

/// Directory containing the running executable. Falls back to current directory if unavailable.
pub fn exe_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Default location of the settings file.
pub fn settings_path() -> PathBuf {
    exe_directory().join("mandelfarm.json")
}
