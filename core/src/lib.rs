pub mod buffer;
pub mod runtime;

pub use buffer::*;
pub use runtime::{current_cpu_threads, init_global_thread_pool};

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("Channel mismatch: expected {expected:?}, found {found:?}")]
    ChannelMismatch {
        expected: ChannelLayout,
        found: ChannelLayout,
    },

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Unreadable image path {}: {reason}", path.display())]
    UnreadablePath { path: PathBuf, reason: String },

    #[error("Unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    pub fn channel_mismatch(expected: ChannelLayout, found: ChannelLayout) -> Self {
        Self::ChannelMismatch { expected, found }
    }

    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::UnreadablePath {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
