//! Image upload.
//!
//! Files are sent one at a time, in order. The first failure stops the batch
//! and is returned; files after it are not attempted. On success the local
//! references of the files are returned so they can be added to the
//! annotation set.

use std::path::{Path, PathBuf};

use crate::error::{AnnotatorError, Result};

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name sent to the server
    pub name: String,
    /// Local reference the canvas loads the image from
    pub source: String,
}

impl UploadFile {
    /// A file on disk, named after its last path component.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            name,
            source: path.to_string_lossy().to_string(),
        }
    }
}

/// Sends one file to an upload target.
pub trait Uploader {
    fn upload_file(&mut self, target_url: &str, file: &UploadFile) -> Result<()>;
}

/// Upload `files` sequentially. Returns their local references in input order.
pub fn upload_batch(
    uploader: &mut dyn Uploader,
    target_url: &str,
    files: &[UploadFile],
) -> Result<Vec<String>> {
    log::info!("Uploading {} files to {}", files.len(), target_url);

    for (i, file) in files.iter().enumerate() {
        if let Err(e) = uploader.upload_file(target_url, file) {
            log::error!(
                "Upload of {} failed ({} of {}), stopping batch: {}",
                file.name,
                i + 1,
                files.len(),
                e
            );
            return Err(e);
        }
        log::debug!("Uploaded {} ({} of {})", file.name, i + 1, files.len());
    }

    log::info!("Upload finished: {} files", files.len());
    Ok(files.iter().map(|f| f.source.clone()).collect())
}

/// Uploads by copying into a local directory. `target_url` is the directory.
#[derive(Debug, Clone, Default)]
pub struct DirectoryUploader {
    uploaded: Vec<PathBuf>,
}

impl DirectoryUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destination paths written so far.
    pub fn uploaded(&self) -> &[PathBuf] {
        &self.uploaded
    }
}

impl Uploader for DirectoryUploader {
    fn upload_file(&mut self, target_url: &str, file: &UploadFile) -> Result<()> {
        if file.name.is_empty() {
            return Err(AnnotatorError::upload(&file.source, "file has no name"));
        }
        let target_dir = Path::new(target_url);
        std::fs::create_dir_all(target_dir)?;
        let dest = target_dir.join(&file.name);
        std::fs::copy(&file.source, &dest)
            .map_err(|e| AnnotatorError::upload(&file.name, e.to_string()))?;
        self.uploaded.push(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records calls and fails on a chosen file name.
    struct FakeUploader {
        calls: Vec<String>,
        fail_on: Option<&'static str>,
    }

    impl Uploader for FakeUploader {
        fn upload_file(&mut self, target_url: &str, file: &UploadFile) -> Result<()> {
            self.calls.push(format!("{target_url}:{}", file.name));
            if self.fail_on == Some(file.name.as_str()) {
                return Err(AnnotatorError::upload(&file.name, "server said no"));
            }
            Ok(())
        }
    }

    fn files(names: &[&str]) -> Vec<UploadFile> {
        names
            .iter()
            .map(|n| UploadFile {
                name: n.to_string(),
                source: format!("local/{n}"),
            })
            .collect()
    }

    #[test]
    fn test_batch_is_sequential_and_returns_sources() {
        let mut uploader = FakeUploader {
            calls: Vec::new(),
            fail_on: None,
        };
        let sources = upload_batch(&mut uploader, "/up", &files(&["a.png", "b.png"]))
            .expect("upload succeeds");
        assert_eq!(uploader.calls, vec!["/up:a.png", "/up:b.png"]);
        assert_eq!(sources, vec!["local/a.png", "local/b.png"]);
    }

    #[test]
    fn test_batch_stops_at_first_failure() {
        let mut uploader = FakeUploader {
            calls: Vec::new(),
            fail_on: Some("b.png"),
        };
        let result = upload_batch(&mut uploader, "/up", &files(&["a.png", "b.png", "c.png"]));
        assert!(matches!(result, Err(AnnotatorError::Upload { ref file, .. }) if file == "b.png"));
        assert_eq!(uploader.calls, vec!["/up:a.png", "/up:b.png"]);
    }

    #[test]
    fn test_empty_batch() {
        let mut uploader = FakeUploader {
            calls: Vec::new(),
            fail_on: None,
        };
        let sources = upload_batch(&mut uploader, "/up", &[]).expect("nothing to do");
        assert!(sources.is_empty());
        assert!(uploader.calls.is_empty());
    }

    #[test]
    fn test_upload_file_from_path() {
        let file = UploadFile::from_path("/tmp/photos/cat.jpg");
        assert_eq!(file.name, "cat.jpg");
        assert_eq!(file.source, "/tmp/photos/cat.jpg");
    }

    #[test]
    fn test_directory_uploader_copies() {
        let root = std::env::temp_dir().join(format!("imgannot-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&root).expect("create temp dir");
        let src = root.join("in.png");
        std::fs::write(&src, b"not really a png").expect("write source");
        let target = root.join("uploads");

        let mut uploader = DirectoryUploader::new();
        let batch = vec![UploadFile::from_path(&src)];
        let sources = upload_batch(&mut uploader, &target.to_string_lossy(), &batch)
            .expect("copy succeeds");

        assert_eq!(sources, vec![src.to_string_lossy().to_string()]);
        assert_eq!(uploader.uploaded(), &[target.join("in.png")]);
        assert!(target.join("in.png").exists());

        let missing = vec![UploadFile::from_path(root.join("missing.png"))];
        let err = upload_batch(&mut uploader, &target.to_string_lossy(), &missing);
        assert!(matches!(err, Err(AnnotatorError::Upload { .. })));

        let _ = std::fs::remove_dir_all(&root);
    }
}
