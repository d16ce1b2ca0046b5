//! Error taxonomy for sipkit.
//!
//! Every fatal condition stops the pipeline at the current stage; nothing is
//! retried. Missing-input and vocabulary errors carry enough context to name
//! the offending file or value. Cleanup problems are reported as warnings by
//! the cleanup module and never surface here.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type SipResult<T> = Result<T, SipError>;

#[derive(Debug, Error)]
pub enum SipError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown adaptor '{0}' (check the 'adaptor' key in the configuration)")]
    UnknownAdaptor(String),

    #[error("metadata feed ending with '{ending}' was not found under {path}")]
    MissingMetadataFeed { path: PathBuf, ending: String },

    #[error("digital object '{0}' was not found")]
    MissingDigitalObject(String),

    #[error("no descriptive metadata ending with '{ending}' under {path}")]
    MissingDescriptiveMetadata { path: PathBuf, ending: String },

    /// New event types must be supported explicitly before they can be
    /// described; an unknown type is never silently rendered.
    #[error("unsupported event type '{0}'")]
    UnsupportedEventType(String),

    #[error("metadata feed error: {0}")]
    Feed(String),

    #[error("invalid feed row: {0}")]
    FeedRow(String),

    #[error("{stage} failed: {message}")]
    Stage {
        stage: &'static str,
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SipError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn feed(message: impl Into<String>) -> Self {
        Self::Feed(message.into())
    }

    pub fn feed_row(message: impl Into<String>) -> Self {
        Self::FeedRow(message.into())
    }

    pub fn stage(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            message: message.into(),
        }
    }
}
