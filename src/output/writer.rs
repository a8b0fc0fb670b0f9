use super::*;
use crate::config::OutputConfig;
use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

pub struct StatsWriter {
    path: PathBuf,
    pretty: bool,
}

impl StatsWriter {
    pub fn new(path: impl Into<PathBuf>, pretty: bool) -> Self {
        Self {
            path: path.into(),
            pretty,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.path.clone(), config.pretty)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the payload as UTF-8 JSON, creating missing parent directories.
    pub async fn write(&self, payload: &Value) -> Result<(), WriteError> {
        let content = if self.pretty {
            serde_json::to_string_pretty(payload)
        } else {
            serde_json::to_string(payload)
        }
        .map_err(WriteError::Serialize)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        debug!("Writing {} bytes to {}", content.len(), self.path.display());
        fs::write(&self.path, content)
            .await
            .map_err(|source| self.io_error(source))?;

        info!("Stats saved to {}", self.path.display());
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> WriteError {
        WriteError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
