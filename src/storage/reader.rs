//! Read access to persisted shard outputs.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use super::shard::{shard_file_name, SHARD_EXTENSION};
use crate::error::StoreError;
use crate::generator::Record;

/// Lists and loads the shard documents in an output directory.
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file names of all shard documents, sorted.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be read.
    pub async fn list_outputs(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                continue;
            }
            let path = entry.path();
            if path.extension() != Some(OsStr::new(SHARD_EXTENSION)) {
                continue;
            }
            let file_name = entry.file_name();
            let name = match file_name.to_str() {
                Some(name) => name.to_string(),
                None => {
                    let lossy = file_name.to_string_lossy().into_owned();
                    debug!(name = %lossy, "Output name is not valid UTF-8");
                    lossy
                }
            };
            debug!(name = %name, "Found output");
            names.push(name);
        }

        names.sort();
        info!(dir = ?self.dir, count = names.len(), "Listed outputs");
        Ok(names)
    }

    /// Loads and parses the document of shard `id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the shard has never been written,
    /// `StoreError::Parse` if its content is not a valid record.
    pub async fn read_output(&self, id: u64) -> Result<Record, StoreError> {
        let path = self.dir.join(shard_file_name(id));

        let content = fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                info!(path = ?path, "Output not found");
                StoreError::NotFound { id }
            } else {
                StoreError::Io(e)
            }
        })?;

        let record =
            serde_yaml::from_str(&content).map_err(|source| StoreError::Parse { path, source })?;

        debug!(id, "Output read");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{RecordSource, RecordSynthesizer};
    use crate::scheduler::TaskId;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_outputs_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("output_1.yml"), "").unwrap();
        std::fs::write(dir.path().join("output_0.yml"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested.yml")).unwrap();

        let names = OutputStore::new(dir.path()).list_outputs().await.unwrap();
        assert_eq!(names, vec!["output_0.yml", "output_1.yml"]);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_list_outputs_keeps_non_utf8_names() {
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("output_0.yml"), "").unwrap();
        std::fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff.yml")), "").unwrap();

        let names = OutputStore::new(dir.path()).list_outputs().await.unwrap();
        assert_eq!(names, vec!["bad\u{fffd}.yml", "output_0.yml"]);
    }

    #[tokio::test]
    async fn test_list_outputs_missing_dir() {
        let dir = TempDir::new().unwrap();
        let store = OutputStore::new(dir.path().join("missing"));
        assert!(matches!(store.list_outputs().await, Err(StoreError::Io(_))));
    }

    #[tokio::test]
    async fn test_read_output() {
        let dir = TempDir::new().unwrap();
        let record = RecordSynthesizer::new().synthesize(TaskId::new(2));
        std::fs::write(
            dir.path().join("output_2.yml"),
            serde_yaml::to_string(&record).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.path().join("output_3.yml"), "id: [not a number").unwrap();

        let store = OutputStore::new(dir.path());
        assert_eq!(store.read_output(2).await.unwrap(), record);
        assert!(matches!(
            store.read_output(9).await,
            Err(StoreError::NotFound { id: 9 })
        ));
        assert!(matches!(
            store.read_output(3).await,
            Err(StoreError::Parse { .. })
        ));
    }
}
