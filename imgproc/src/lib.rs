pub mod color;
pub mod contours;
pub mod convolve;
pub mod drawing;
pub mod edges;
pub mod morph;
pub mod threshold;

pub use color::*;
pub use contours::*;
pub use convolve::*;
pub use drawing::*;
pub use edges::*;
pub use morph::*;
pub use threshold::*;

pub type Result<T> = std::result::Result<T, ImgprocError>;

#[derive(Debug, thiserror::Error)]
pub enum ImgprocError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Core error: {0}")]
    Core(#[from] cv_core::Error),
}

impl ImgprocError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }
}
