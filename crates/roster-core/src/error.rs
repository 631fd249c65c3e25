//! Error types for Roster.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Roster.
#[derive(Error, Debug)]
pub enum Error {
    /// A submitted form field failed validation.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// The image upload provider rejected or failed the upload.
    #[error("Upload failed: {message}")]
    Upload {
        /// Error message.
        message: String,
    },

    /// The request body could not be read as a form.
    #[error("Malformed form data: {message}")]
    MalformedForm {
        /// Error message.
        message: String,
    },

    /// A page template failed to render.
    #[error("Render error: {message}")]
    Render {
        /// Error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Returns `true` if this error was caused by the client's input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::MalformedForm { .. })
    }

    /// Creates a validation error for the given field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Creates an upload error with the given message.
    #[must_use]
    pub fn upload(message: impl Into<String>) -> Self {
        Self::Upload {
            message: message.into(),
        }
    }

    /// Creates a malformed form error with the given message.
    #[must_use]
    pub fn malformed_form(message: impl Into<String>) -> Self {
        Self::MalformedForm {
            message: message.into(),
        }
    }

    /// Creates a render error with the given message.
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Creates an internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = Error::validation("post_count", "must be a whole number");
        assert_eq!(err.to_string(), "Invalid post_count: must be a whole number");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_upload_is_not_client_error() {
        assert!(!Error::upload("timeout").is_client_error());
    }

    #[test]
    fn test_malformed_form_is_client_error() {
        let err = Error::malformed_form("missing boundary");
        assert_eq!(err.to_string(), "Malformed form data: missing boundary");
        assert!(err.is_client_error());
        assert!(!Error::render("unknown template").is_client_error());
    }
}
