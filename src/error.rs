//! The things that can go wrong, from construction through persistence.
//!
//! Nothing here is recoverable mid-job: every one of these aborts the
//! render or the movie it belongs to, and the binaries turn them into a
//! message on stderr and a nonzero exit.

use std::io;

/// Errors raised by the renderer and the movie driver.
#[derive(Debug, Fail)]
pub enum Error {
    /// The viewport rectangle has no area, or its corners are swapped.
    #[fail(display = "empty viewport: x spans {}..{}, y spans {}..{}", xmin, xmax, ymin, ymax)]
    EmptyViewport {
        /// Left edge of the rejected rectangle.
        xmin: f64,
        /// Right edge of the rejected rectangle.
        xmax: f64,
        /// Low edge of the rejected rectangle.
        ymin: f64,
        /// High edge of the rejected rectangle.
        ymax: f64,
    },

    /// One of the raster dimensions is zero.
    #[fail(display = "image dimensions must be nonzero, got {}x{}", width, height)]
    EmptyImage {
        /// Requested width in pixels.
        width: usize,
        /// Requested height in pixels.
        height: usize,
    },

    /// The per-point iteration budget is zero.
    #[fail(display = "the iteration limit must be nonzero")]
    ZeroLimit,

    /// A render was asked for with no workers to run it.
    #[fail(display = "a render needs at least one worker")]
    NoWorkers,

    /// A movie was asked for with no frames or no process slots.
    #[fail(display = "a movie needs at least one frame and one process slot")]
    EmptySequence,

    /// A zoom endpoint is zero or negative; the geometric schedule is
    /// only defined over positive scales.
    #[fail(display = "zoom scales must be positive, got {} and {}", start, end)]
    BadZoom {
        /// Scale requested for the opening frame.
        start: f64,
        /// Scale the sequence closes in on.
        end: f64,
    },

    /// A frame process could not be started at all.
    #[fail(display = "could not launch frame {}: {}", frame, cause)]
    FrameLaunch {
        /// 1-indexed frame that failed to launch.
        frame: usize,
        /// The underlying system error.
        #[fail(cause)]
        cause: io::Error,
    },

    /// A frame process was started but could not be waited on.
    #[fail(display = "could not collect frame {}: {}", frame, cause)]
    FrameWait {
        /// 1-indexed frame that could not be collected.
        frame: usize,
        /// The underlying system error.
        #[fail(cause)]
        cause: io::Error,
    },
}
