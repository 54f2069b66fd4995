// Platform-specific code module

pub mod autostart;
pub mod single_instance;

// Re-exports for cleaner imports
pub use autostart::set_autostart;
pub use single_instance::{acquire as acquire_single_instance, InstanceGuard};

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Per-user data directory for runtime files (lock file, log file).
pub fn app_data_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .with_context(|| "Could not determine data directory")?;

    Ok(base.join("sdm"))
}
