//! Output sinks
//!
//! A converted document is handed to an [`UploadSink`], which stores it
//! and reports where it can be fetched from.

use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use url::Url;

use crate::config::{DEFAULT_FILE_PREFIX, OutputConfig};
use crate::error::UploadError;
use crate::security::sanitize_file_name;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReceipt {
    pub access_url: Option<String>,
}

/// Destination for finished documents
#[async_trait]
pub trait UploadSink: Send + Sync {
    async fn upload(&self, data: Vec<u8>, file_name: &str) -> Result<UploadReceipt, UploadError>;
}

/// Writes documents into a local directory and answers with `file://` URLs.
///
/// Pruning only touches `.docx` files named `<file_prefix>-*`; anything
/// else in the directory is left alone.
#[derive(Debug, Clone)]
pub struct LocalDirSink {
    dir: PathBuf,
    file_prefix: String,
    keep_files: bool,
    max_files: usize,
}

impl LocalDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LocalDirSink {
            dir: dir.into(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            keep_files: false,
            max_files: 10,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        LocalDirSink {
            dir: config.dir.clone(),
            file_prefix: sanitize_file_name(&config.file_prefix),
            keep_files: config.keep_files,
            max_files: config.max_files,
        }
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = sanitize_file_name(&prefix.into());
        self
    }

    pub fn keep_files(mut self, keep: bool) -> Self {
        self.keep_files = keep;
        self
    }

    pub fn max_files(mut self, max: usize) -> Self {
        self.max_files = max;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn is_own_output(&self, name: &str) -> bool {
        name.strip_prefix(self.file_prefix.as_str())
            .is_some_and(|rest| rest.starts_with('-') && rest.ends_with(".docx"))
    }

    /// Remove our oldest outputs so at most `max_files` remain, `current` included
    async fn prune(&self, current: &str) -> Result<usize, UploadError> {
        let mut outputs: Vec<(SystemTime, PathBuf)> = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name == current || !self.is_own_output(name) {
                continue;
            }
            let path = entry.path();
            let modified = entry
                .metadata()
                .await?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            outputs.push((modified, path));
        }

        let keep = self.max_files.saturating_sub(1);
        if outputs.len() <= keep {
            return Ok(0);
        }

        // Newest first; name breaks ties between equal timestamps
        outputs.sort_by(|a, b| b.cmp(a));
        let mut removed = 0;
        for (_, path) in outputs.into_iter().skip(keep) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Could not remove old output {}: {e}", path.display()),
            }
        }

        debug!("Pruned {removed} old output file(s)");
        Ok(removed)
    }
}

#[async_trait]
impl UploadSink for LocalDirSink {
    async fn upload(&self, data: Vec<u8>, file_name: &str) -> Result<UploadReceipt, UploadError> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(UploadError::Rejected(format!(
                "invalid file name '{file_name}'"
            )));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, &data).await?;
        info!("Wrote {} bytes to {}", data.len(), path.display());

        if !self.keep_files {
            self.prune(file_name).await?;
        }

        let absolute = tokio::fs::canonicalize(&path).await?;
        let access_url = Url::from_file_path(&absolute).ok().map(String::from);
        Ok(UploadReceipt { access_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalDirSink::new(dir.path().join("out"));

        let receipt = sink.upload(b"docx".to_vec(), "a.docx").await.unwrap();
        let url = receipt.access_url.unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("/a.docx"));
        assert_eq!(
            std::fs::read(dir.path().join("out").join("a.docx")).unwrap(),
            b"docx"
        );
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_prunes_beyond_max_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalDirSink::new(dir.path()).max_files(2);
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        for name in [
            "markdown-to-docx-1.docx",
            "markdown-to-docx-2.docx",
            "markdown-to-docx-3.docx",
        ] {
            sink.upload(Vec::new(), name).await.unwrap();
        }

        let names = names(dir.path());
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"notes.txt".to_string()));
        assert!(names.contains(&"markdown-to-docx-3.docx".to_string()));
    }

    #[tokio::test]
    async fn test_pruning_leaves_foreign_documents() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalDirSink::new(dir.path()).max_files(2);
        std::fs::write(dir.path().join("thesis.docx"), "mine").unwrap();
        std::fs::write(dir.path().join("markdown-to-docxish.docx"), "mine").unwrap();

        for name in ["markdown-to-docx-1.docx", "markdown-to-docx-2.docx"] {
            sink.upload(Vec::new(), name).await.unwrap();
        }
        let receipt = sink
            .upload(Vec::new(), "markdown-to-docx-3.docx")
            .await
            .unwrap();

        assert!(receipt.access_url.unwrap().ends_with("/markdown-to-docx-3.docx"));
        assert_eq!(
            names(dir.path()),
            vec![
                "markdown-to-docx-2.docx",
                "markdown-to-docx-3.docx",
                "markdown-to-docxish.docx",
                "thesis.docx",
            ]
        );
    }

    #[tokio::test]
    async fn test_prefix_comes_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            dir: dir.path().to_path_buf(),
            file_prefix: "report".to_string(),
            keep_files: false,
            max_files: 1,
        };
        let sink = LocalDirSink::from_config(&config);
        std::fs::write(dir.path().join("markdown-to-docx-0.docx"), "other").unwrap();

        for name in ["report-1.docx", "report-2.docx"] {
            sink.upload(Vec::new(), name).await.unwrap();
        }
        assert_eq!(
            names(dir.path()),
            vec!["markdown-to-docx-0.docx", "report-2.docx"]
        );
    }

    #[tokio::test]
    async fn test_keep_files_disables_pruning() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalDirSink::new(dir.path()).max_files(1).keep_files(true);

        for name in ["markdown-to-docx-1.docx", "markdown-to-docx-2.docx"] {
            sink.upload(Vec::new(), name).await.unwrap();
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_rejects_path_in_name() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalDirSink::new(dir.path());
        assert!(matches!(
            sink.upload(Vec::new(), "../escape.docx").await,
            Err(UploadError::Rejected(_))
        ));
    }
}
