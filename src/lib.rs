pub use cv_core as core;
pub use cv_frame as frame;
pub use cv_imgproc as imgproc;
pub use cv_io as io;

pub use cv_frame::{DisplayImage, Frame, FrameConfig, FrameError, FrameState, Operation};

/// Size the shared rayon pool that the raster kernels run on and return the
/// number of worker threads.
///
/// An explicit count beats `CVFRAME_CPU_THREADS`; with neither, rayon decides.
/// Only the first call builds the pool, so call it before the first frame is
/// transformed if the size matters.
pub fn init_thread_pool(num_threads: Option<usize>) -> cv_core::Result<usize> {
    cv_core::init_global_thread_pool(num_threads)
}
