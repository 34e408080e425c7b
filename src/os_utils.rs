//! Utilities pertaining to filesystem and other os-level settings
//!

use camino::Utf8Path;
use log::info;

/// Create a novel directory path if it does not exist already
///
/// If the directory already exists no operations are performed
///
/// * `label` - used to describe the directory in an error message
///
pub fn create_dir_all(dir: &Utf8Path, label: &str) {
    if !dir.is_dir() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            panic!("Can't create new {} directory at '{}': {}", label, dir, e);
        }
    }
}

/// Remove a transient workspace artifact if present
///
/// Removal failures are logged and ignored, a leftover intermediate file does not
/// invalidate the completed run.
///
pub fn remove_transient_file(path: &Utf8Path) {
    if !path.is_file() {
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!("Removed transient workspace file: '{path}'");
        }
        Err(e) => {
            info!("Unable to remove transient workspace file '{path}': {e}");
        }
    }
}

/// Attempt to increase open file limit to the system's hard limit on *nix-like systems
///
/// This is an optional increase so continue through all failure cases without error.
///
pub fn attempt_max_open_file_limit() {
    use rlimit::Resource;

    let (soft, hard) = match Resource::NOFILE.get() {
        Ok(x) => x,
        Err(_) => return,
    };

    if soft < hard {
        rlimit::setrlimit(Resource::NOFILE, hard, hard).unwrap_or_default();
    }
}
