use miette::Diagnostic;
use thiserror::Error;

/// Main error type for marble operations
#[derive(Error, Diagnostic, Debug)]
pub enum MarbleError {
    #[error("IO error: {0}")]
    #[diagnostic(code(marble::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(marble::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(marble::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Validation error: {message}")]
    #[diagnostic(code(marble::validate))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Image error: {message}")]
    #[diagnostic(code(marble::image))]
    Image { message: String },

    #[error("Store error: {message}")]
    #[diagnostic(code(marble::store))]
    Store { message: String },

    #[error("No template with key '{key}'")]
    #[diagnostic(code(marble::not_found), help("Run `marble list` to see stored templates"))]
    NotFound { key: String },
}

impl MarbleError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        MarbleError::Validation {
            message: message.into(),
            help: None,
        }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        MarbleError::Parse {
            message: message.into(),
            help: None,
        }
    }
}

impl From<image::ImageError> for MarbleError {
    fn from(e: image::ImageError) -> Self {
        MarbleError::Image {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MarbleError>;
