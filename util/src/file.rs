//! Small filesystem helpers shared by the config loader and the chain's
//! persistence layer.

use std::fs;
use std::io;
use std::path::Path;

/// Creates `path` (and any missing parents) if it doesn't already exist.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
