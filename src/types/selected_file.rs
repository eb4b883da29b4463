use std::path::Path;

use bytes::Bytes;

use crate::error::{Error, Result};

/// A file the user picked for upload or transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// File name sent as the multipart filename.
    pub name: String,

    /// File contents.
    pub bytes: Bytes,

    /// Content type, when it can be inferred from the extension.
    pub mime: Option<String>,
}

impl SelectedFile {
    /// Create a selected file from in-memory contents.
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime = mime_for_name(&name).map(String::from);
        Self {
            name,
            bytes: bytes.into(),
            mime,
        }
    }

    /// Read a selected file from disk.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or a validation
    /// error if the path has no file name.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::validation(
                    format!("{} does not name a file", path.display()),
                    Some("file".to_string()),
                )
            })?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        Ok(Self::new(name, bytes))
    }

    /// Size of the file in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the file is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn mime_for_name(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "txt" => Some("text/plain"),
        "md" => Some("text/markdown"),
        "pdf" => Some("application/pdf"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        "m4a" => Some("audio/mp4"),
        "ogg" => Some("audio/ogg"),
        "webm" => Some("audio/webm"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn mime_inference() {
        assert_eq!(
            SelectedFile::new("notes.PDF", "x").mime.as_deref(),
            Some("application/pdf")
        );
        assert_eq!(
            SelectedFile::new("clip.wav", "x").mime.as_deref(),
            Some("audio/wav")
        );
        assert!(SelectedFile::new("README", "x").mime.is_none());
    }

    #[tokio::test]
    async fn reads_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"photosynthesis notes").unwrap();
        let selected = SelectedFile::from_path(file.path()).await.unwrap();
        assert_eq!(selected.bytes.as_ref(), b"photosynthesis notes");
        assert_eq!(selected.mime.as_deref(), Some("text/plain"));
        assert!(selected.name.ends_with(".txt"));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = SelectedFile::from_path("/nonexistent/notechat/notes.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
