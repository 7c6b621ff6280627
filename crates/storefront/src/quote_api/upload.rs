//! Model files selected for quoting.

use std::path::Path;

use super::QuoteApiError;

/// File extensions the backend can analyse, lowercase and without the dot.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["stl", "obj", "step", "stp"];

/// A 3D model ready to be uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct ModelFile {
    file_name: String,
    bytes: Vec<u8>,
}

impl ModelFile {
    /// Wrap an in-memory model.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a model from disk. The file name is taken from the path.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteApiError::Io`] if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, QuoteApiError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Lowercased text after the last dot, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    /// Whether the extension is on the allow-list (case-insensitive).
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.extension()
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Reject files whose extension is not on the allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteApiError::UnsupportedFormat`] for anything else.
    pub fn ensure_supported(&self) -> Result<(), QuoteApiError> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(QuoteApiError::UnsupportedFormat {
                file_name: self.file_name.clone(),
            })
        }
    }

    /// Content type sent with the multipart part.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("stl") => "model/stl",
            Some("obj") => "model/obj",
            Some("step" | "stp") => "model/step",
            _ => "application/octet-stream",
        }
    }
}

impl std::fmt::Debug for ModelFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}
