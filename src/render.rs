// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! One frame of the Mandelbrot set: a pixel buffer cut into row bands,
//! one band per worker thread.  The partition is static; per-pixel
//! cost varies, but not enough to be worth a work queue, and handing
//! each worker an exclusive slice of the buffer means the whole render
//! runs without a single lock.

extern crate crossbeam;

use std::ops::Range;

use itertools::iproduct;

use error::Error;
use escape::{make_rgba, pixel_color};
use planes::{Pixel, PlaneMapper, Viewport};

/// Raster dimensions and the per-point iteration budget for one
/// image.  All three must be nonzero.
#[derive(Copy, Clone, Debug)]
pub struct ImageSpec {
    /// Width of the output raster in pixels.
    pub width: usize,
    /// Height of the output raster in pixels.
    pub height: usize,
    /// Maximum escape iterations per point.
    pub limit: u32,
}

impl ImageSpec {
    /// Constructor.  Refuses empty rasters and a zero iteration
    /// budget.
    pub fn new(width: usize, height: usize, limit: u32) -> Result<ImageSpec, Error> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage { width, height });
        }
        if limit == 0 {
            return Err(Error::ZeroLimit);
        }
        Ok(ImageSpec {
            width,
            height,
            limit,
        })
    }
}

/// One complete unit of work producing one image: the plane rectangle,
/// the raster to fill, and the number of worker threads to fill it
/// with.  Immutable once constructed; each `render` call owns its
/// buffer from allocation through return.
#[derive(Copy, Clone, Debug)]
pub struct RenderJob {
    /// The rectangle of the plane being rendered.
    pub viewport: Viewport,
    /// Output dimensions and iteration budget.
    pub spec: ImageSpec,
    /// Worker threads to cut the image across.
    pub workers: usize,
}

impl RenderJob {
    /// Constructor.  Requires at least one worker.
    pub fn new(viewport: Viewport, spec: ImageSpec, workers: usize) -> Result<RenderJob, Error> {
        if workers == 0 {
            return Err(Error::NoWorkers);
        }
        Ok(RenderJob {
            viewport,
            spec,
            workers,
        })
    }

    /// Render the frame and return the packed-RGBA buffer, row-major
    /// from the top of the raster.  The buffer is carved into disjoint
    /// row bands, every band is filled on its own scoped thread, and
    /// the scope join is the barrier: no partial image is ever visible
    /// to the caller.  One worker and many workers produce identical
    /// bytes.
    pub fn render(&self) -> Vec<u32> {
        let columns = self.spec.width;
        let limit = self.spec.limit;
        // The dark blue backing fill; every band below overwrites its
        // rows completely, so it can only be seen in a debugger.
        let mut buffer = vec![make_rgba(0, 0, 255, 0); columns * self.spec.height];
        let mapper = PlaneMapper::new(self.viewport, columns, self.spec.height);
        {
            let mapper = &mapper;
            crossbeam::scope(|spawner| {
                let mut rest: &mut [u32] = &mut buffer;
                for rows in row_bands(self.spec.height, self.workers) {
                    // Move the remainder out before splitting so the
                    // band is good for the whole scope, not just this
                    // iteration.
                    let whole = rest;
                    let (band, tail) = whole.split_at_mut(rows.len() * columns);
                    rest = tail;
                    spawner.spawn(move |_| render_band(band, rows, mapper, limit));
                }
            })
            .unwrap();
        }
        buffer
    }
}

/// Cut `0..height` into one row range per worker.  Worker t takes
/// `[(height/workers)*t, (height/workers)*(t+1))` and the last worker
/// runs to `height`, absorbing the remainder of the integer division.
/// The ranges tile `[0, height)` with no gaps and no overlaps for
/// every worker count; when workers outnumber rows the leading bands
/// are empty and the last band takes everything.
pub fn row_bands(height: usize, workers: usize) -> Vec<Range<usize>> {
    assert!(workers > 0);
    let band = height / workers;
    (0..workers)
        .map(|t| {
            let start = band * t;
            let end = if t + 1 == workers { height } else { start + band };
            start..end
        })
        .collect()
}

/// Fill one band of the image.  `band` holds exactly the rows in
/// `rows`, so the offset arithmetic is relative to the band's first
/// row.
fn render_band(band: &mut [u32], rows: Range<usize>, mapper: &PlaneMapper, limit: u32) {
    let columns = mapper.columns;
    let first = rows.start;
    for (row, column) in iproduct!(rows, 0..columns) {
        let point = mapper.pixel_to_point(&Pixel(column, row));
        band[(row - first) * columns + column] = pixel_color(point, limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escape::iteration_to_color;

    fn job(width: usize, height: usize, limit: u32, workers: usize) -> RenderJob {
        let viewport = Viewport::new(-2.0, 2.0, -2.0, 2.0).unwrap();
        let spec = ImageSpec::new(width, height, limit).unwrap();
        RenderJob::new(viewport, spec, workers).unwrap()
    }

    fn assert_tiling(height: usize, workers: usize) {
        let bands = row_bands(height, workers);
        assert_eq!(bands.len(), workers);
        let mut next = 0;
        for band in bands {
            assert_eq!(band.start, next);
            assert!(band.end >= band.start);
            next = band.end;
        }
        assert_eq!(next, height);
    }

    #[test]
    fn bands_tile_the_image_exactly() {
        let height = 37;
        for workers in 1..=height {
            assert_tiling(height, workers);
        }
        for workers in &[height + 1, height * 2, height * 5] {
            assert_tiling(height, *workers);
        }
    }

    #[test]
    fn worker_count_cannot_change_the_image() {
        let reference = job(64, 48, 120, 1).render();
        for workers in &[2usize, 3, 7, 48, 100] {
            assert_eq!(job(64, 48, 120, *workers).render(), reference);
        }
    }

    #[test]
    fn the_center_of_the_classic_view_is_in_the_set() {
        // The 500x500 render of -2..2 puts the origin at pixel
        // (250, 250), and the origin never escapes.
        let pixels = job(500, 500, 1000, 1).render();
        assert_eq!(pixels[250 * 500 + 250], iteration_to_color(1000, 1000));
    }

    #[test]
    fn every_pixel_is_written() {
        // No pixel may survive with the backing fill; the fill color
        // is not in the palette's range for this limit.
        let fill = make_rgba(0, 0, 255, 0);
        let pixels = job(32, 17, 60, 5).render();
        assert!(pixels.iter().all(|p| *p != fill));
    }

    #[test]
    fn construction_rejects_empty_work() {
        let viewport = Viewport::new(-2.0, 2.0, -2.0, 2.0).unwrap();
        assert!(ImageSpec::new(0, 10, 100).is_err());
        assert!(ImageSpec::new(10, 0, 100).is_err());
        assert!(ImageSpec::new(10, 10, 0).is_err());
        let spec = ImageSpec::new(10, 10, 100).unwrap();
        assert!(RenderJob::new(viewport, spec, 0).is_err());
    }
}
