use crate::models::CityCatalog;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when reading the city list
#[derive(Debug, Error)]
pub enum CityError {
    #[error("Failed to read city list: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid city list: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Reads the static city list from disk on each request
#[derive(Debug, Clone)]
pub struct CityList {
    path: PathBuf,
}

impl CityList {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<CityCatalog, CityError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&contents)?)
    }
}
