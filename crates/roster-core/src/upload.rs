//! Profile picture uploads.

use async_trait::async_trait;

use crate::error::{Error, Result};

/// A file received from a form submission.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original file name, as sent by the browser.
    pub file_name: String,
    /// MIME type, if the browser sent one.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Returns `true` if the form field carried no file.
    ///
    /// Browsers submit an empty part with an empty file name when the
    /// file input is left blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty() && self.file_name.is_empty()
    }
}

/// Stores images and returns the URL they can be fetched from.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Uploads a file and returns its public URL.
    async fn upload(&self, file: UploadedFile) -> Result<String>;
}

/// Uploader used when no storage provider is configured. Every upload fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledUploader;

#[async_trait]
impl ImageUploader for DisabledUploader {
    async fn upload(&self, file: UploadedFile) -> Result<String> {
        tracing::warn!(file = %file.file_name, "Upload attempted but no image storage is configured");
        Err(Error::upload("image storage is not configured"))
    }
}
