//! Frame state machine
//!
//! A [`Frame`] owns exactly one [`RawBuffer`](cv_core::RawBuffer) and the
//! [`DisplayImage`] derived from it. Every successful mutation, whether a
//! load or one of the menu [`Operation`]s, regenerates the display image and
//! then notifies subscribers before returning.

pub mod config;
pub mod display;
pub mod frame;
pub mod notify;
pub mod operation;
pub mod viewport;

pub use config::{FrameConfig, TransformParams};
pub use display::{to_display, DisplayImage};
pub use frame::{Frame, FrameState};
pub use notify::{ChangeNotifier, SubscriptionId};
pub use operation::{horizontal_line_element, vertical_line_element, Operation};
pub use viewport::{ScalingPolicy, Viewport, ViewportConfig};

pub type Result<T> = std::result::Result<T, FrameError>;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Cannot apply {operation}: frame holds no image")]
    EmptyBuffer { operation: Operation },

    #[error("Core error: {0}")]
    Core(#[from] cv_core::Error),

    #[error("Imgproc error: {0}")]
    Imgproc(#[from] cv_imgproc::ImgprocError),
}
