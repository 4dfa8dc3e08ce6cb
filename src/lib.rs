#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer and zoom-movie driver
//!
//! The Mandelbrot set is the collection of complex numbers c for which
//! the iteration z → z² + c, started at the point itself, never leaves
//! the disk of radius two.  Points outside the set leave, and the
//! number of steps it takes them to leave makes a fine color; that is
//! the classic escape-time image this crate computes.  A frame is cut
//! into horizontal bands, one band per worker thread, and every worker
//! fills its own disjoint slice of one shared pixel buffer, so the
//! whole render needs no locks at all.
//!
//! The other half of the crate makes a *movie*: many independent
//! single-frame renders launched as child processes, never more than a
//! configured number at once, with the per-frame scale following a
//! geometric schedule so the zoom looks smooth on playback.  Frames
//! are launched in order; they are allowed to finish in any order,
//! since each one writes its own uniquely-named file.

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate itertools;
extern crate num;

pub mod error;
pub mod escape;
pub mod movie;
pub mod planes;
pub mod render;

pub use error::Error;
pub use escape::{iteration_to_color, iterations_at, make_rgba, pixel_color};
pub use movie::{drive, FrameSequenceSpec, ProcessSpawner};
pub use planes::{Pixel, PlaneMapper, Viewport};
pub use render::{ImageSpec, RenderJob};
