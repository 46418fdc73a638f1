use crate::config::FrameConfig;
use crate::display::{to_display, DisplayImage};
use crate::notify::{ChangeNotifier, SubscriptionId};
use crate::operation::Operation;
use crate::viewport::Viewport;
use crate::Result;
use cv_core::RawBuffer;
use image::RgbImage;
use std::path::PathBuf;

/// What the raw buffer currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FrameState {
    /// Nothing has been loaded yet.
    #[default]
    Empty,
    Loaded,
    /// The last `open_image` could not read its path; the buffer is empty.
    LoadFailed { path: PathBuf, reason: String },
}

/// One raster buffer, its display image and the operations that replace it.
///
/// Every method runs synchronously on the caller's thread. A successful
/// mutation regenerates the display image and then calls every subscriber
/// exactly once before returning; a rejected one changes nothing and calls
/// nobody.
#[derive(Debug, Default)]
pub struct Frame {
    raw: RawBuffer,
    display: DisplayImage,
    state: FrameState,
    notifier: ChangeNotifier,
    config: FrameConfig,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty frame that renders and transforms with `config`.
    ///
    /// Fails with [`FrameError::Core`](crate::FrameError::Core) when `config`
    /// would make an operation or the viewport unusable.
    pub fn with_config(config: FrameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn raw(&self) -> &RawBuffer {
        &self.raw
    }

    /// Snapshot of the current display image. It stays unchanged when the
    /// frame is mutated later.
    pub fn display(&self) -> DisplayImage {
        self.display.clone()
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        !self.raw.is_empty()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut() + Send + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Replace the raw buffer with the image at `url` (optionally
    /// `file://`-prefixed).
    ///
    /// Valid in any state. On failure the buffer becomes empty, the state
    /// records the failure and subscribers are still notified, since the
    /// displayed image changed. Returns whether an image was loaded.
    pub fn open_image(&mut self, url: &str) -> bool {
        match cv_io::try_load(url) {
            Ok(buffer) => {
                tracing::info!(url, width = buffer.width(), height = buffer.height(), "image opened");
                self.replace(buffer, FrameState::Loaded);
                true
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "failed to open image");
                let path = cv_io::strip_scheme(url).unwrap_or(url);
                let state = FrameState::LoadFailed {
                    path: PathBuf::from(path),
                    reason: e.to_string(),
                };
                self.replace(RawBuffer::empty(), state);
                false
            }
        }
    }

    /// Replace the raw buffer directly.
    pub fn set_raw(&mut self, buffer: RawBuffer) {
        let state = if buffer.is_empty() {
            FrameState::Empty
        } else {
            FrameState::Loaded
        };
        self.replace(buffer, state);
    }

    /// Apply `operation` to the current buffer.
    ///
    /// Fails with [`FrameError::EmptyBuffer`] when nothing is loaded; on any
    /// failure the frame is left as it was and nobody is notified.
    pub fn try_apply(&mut self, operation: Operation) -> Result<()> {
        let output = match operation.apply_with(&self.raw, &self.config.params) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(operation = operation.name(), error = %e, "operation rejected");
                return Err(e);
            }
        };
        tracing::debug!(
            operation = operation.name(),
            width = output.width(),
            height = output.height(),
            layout = ?output.layout(),
            "operation applied"
        );
        self.replace(output, FrameState::Loaded);
        Ok(())
    }

    pub fn smooth_image(&mut self) -> bool {
        self.try_apply(Operation::Smooth).is_ok()
    }

    pub fn erode_image(&mut self) -> bool {
        self.try_apply(Operation::Erode).is_ok()
    }

    pub fn dilate_image(&mut self) -> bool {
        self.try_apply(Operation::Dilate).is_ok()
    }

    pub fn apply_canny(&mut self) -> bool {
        self.try_apply(Operation::Canny).is_ok()
    }

    pub fn find_horizontal_lines(&mut self) -> bool {
        self.try_apply(Operation::HorizontalLines).is_ok()
    }

    pub fn find_vertical_lines(&mut self) -> bool {
        self.try_apply(Operation::VerticalLines).is_ok()
    }

    pub fn laplacian_filter(&mut self) -> bool {
        self.try_apply(Operation::Laplacian).is_ok()
    }

    pub fn find_image_contours(&mut self) -> bool {
        self.try_apply(Operation::Contours).is_ok()
    }

    /// The display image scaled onto the configured viewport.
    pub fn render(&self) -> RgbImage {
        Viewport::new(self.config.viewport).render(&self.display)
    }

    fn replace(&mut self, raw: RawBuffer, state: FrameState) {
        self.display = display_for(&raw);
        self.raw = raw;
        self.state = state;
        self.notifier.notify();
    }
}

// The conversion reads the buffer's own layout, so it cannot mismatch.
fn display_for(raw: &RawBuffer) -> DisplayImage {
    to_display(raw).unwrap_or_else(|e| {
        tracing::error!(error = %e, "display conversion failed");
        DisplayImage::empty()
    })
}

impl From<RawBuffer> for Frame {
    fn from(raw: RawBuffer) -> Self {
        let mut frame = Frame::new();
        frame.set_raw(raw);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameError;
    use cv_core::ChannelLayout;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counted(frame: &mut Frame) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        frame.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        hits
    }

    #[test]
    fn starts_empty() {
        let frame = Frame::new();
        assert!(frame.raw().is_empty());
        assert!(frame.display().is_empty());
        assert_eq!(frame.state(), &FrameState::Empty);
    }

    #[test]
    fn set_raw_regenerates_display_and_notifies() {
        let mut frame = Frame::new();
        let hits = counted(&mut frame);
        let raw = RawBuffer::from_pixel(4, 3, ChannelLayout::Bgr, &[1, 2, 3]).unwrap();

        frame.set_raw(raw);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(frame.state(), &FrameState::Loaded);
        assert_eq!(frame.display().dimensions(), (4, 3));
        assert_eq!(&frame.display().as_raw()[..3], &[3, 2, 1]);
    }

    #[test]
    fn rejected_operation_changes_nothing() {
        let mut frame = Frame::new();
        let hits = counted(&mut frame);
        assert!(!frame.erode_image());
        assert!(matches!(
            frame.try_apply(Operation::Laplacian),
            Err(FrameError::EmptyBuffer { operation: Operation::Laplacian })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(frame.state(), &FrameState::Empty);
    }

    #[test]
    fn render_uses_configured_viewport() {
        let mut config = FrameConfig::default();
        config.viewport.width = 32;
        config.viewport.height = 16;
        let mut frame = Frame::with_config(config).unwrap();
        assert_eq!(frame.render().dimensions(), (32, 16));

        frame.set_raw(RawBuffer::from_pixel(2, 2, ChannelLayout::Gray, &[9]).unwrap());
        assert!(frame.render().as_raw().iter().all(|&v| v == 9));
    }

    #[test]
    fn with_config_rejects_invalid_params() {
        let mut config = FrameConfig::default();
        config.params.blur_kernel = 4;
        assert!(matches!(
            Frame::with_config(config),
            Err(FrameError::Core(cv_core::Error::Config(_)))
        ));

        let mut config = FrameConfig::default();
        config.viewport.width = 0;
        assert!(Frame::with_config(config).is_err());
    }

    #[test]
    fn frame_moves_between_threads() {
        fn is_send<T: Send>() {}
        is_send::<Frame>();

        let mut frame = Frame::new();
        frame.set_raw(RawBuffer::from_pixel(8, 8, ChannelLayout::Bgr, &[50, 50, 50]).unwrap());
        let mut frame = std::thread::spawn(move || {
            assert!(frame.dilate_image());
            frame
        })
        .join()
        .unwrap();
        assert!(frame.erode_image());
    }

    #[test]
    fn from_buffer_is_loaded() {
        let frame = Frame::from(RawBuffer::new(3, 3, ChannelLayout::Gray));
        assert_eq!(frame.state(), &FrameState::Loaded);
        assert!(frame.is_loaded());
    }
}
