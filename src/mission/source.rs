//! Mission retrieval from external storage.
//!
//! The relay fetches mission files by name from wherever the deployment
//! keeps them: a local directory on the companion computer, or an object
//! store in the field. The trait keeps the service code independent of the
//! backend; only the local-directory source ships with the crate.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::RelayError;

/// Pluggable backend supplying mission file content by name.
///
/// Implementations must be `Send + Sync` so a source can be shared as
/// `Arc<dyn MissionSource>` between tasks.
#[async_trait]
pub trait MissionSource: Send + Sync {
    /// Fetch the raw content of the named mission file.
    async fn fetch(&self, name: &str) -> Result<String, RelayError>;
}

/// Normalize a requested mission name to a `.txt` file name.
///
/// Console requests may name the mission with or without the extension.
pub fn normalize_mission_name(name: &str) -> String {
    if name.ends_with(".txt") {
        name.to_string()
    } else {
        format!("{name}.txt")
    }
}

/// Mission source reading files from a local directory.
pub struct LocalMissionSource {
    dir: PathBuf,
}

impl LocalMissionSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl MissionSource for LocalMissionSource {
    async fn fetch(&self, name: &str) -> Result<String, RelayError> {
        let path = self.dir.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RelayError::MissionNotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
