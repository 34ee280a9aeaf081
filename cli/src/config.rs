use anyhow::{Context, Result};
use std::path::PathBuf;

pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// Resolve the catalog location, creating its parent directory if needed.
    pub fn load(database: PathBuf) -> Result<Self> {
        if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
        }
        tracing::debug!(path = %database.display(), "using database");
        Ok(Config { db_path: database })
    }
}
