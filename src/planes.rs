//! Contains the Viewport struct, which describes the rectangle of the
//! complex plane being rendered, and the PlaneMapper, which relates
//! that rectangle to the integral pixel grid of the output raster.
//! The pixel grid is assumed to start at 0,0 with y growing downward.

use num::Complex;

use error::Error;

/// A rectangle on the complex plane, treating the real axis as x and
/// the imaginary axis as y.  Invariant: `xmin < xmax` and
/// `ymin < ymax`; the constructors refuse anything else.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Left edge, on the real axis.
    pub xmin: f64,
    /// Right edge, on the real axis.
    pub xmax: f64,
    /// Low edge, on the imaginary axis.
    pub ymin: f64,
    /// High edge, on the imaginary axis.
    pub ymax: f64,
}

impl Viewport {
    /// Constructor from explicit edges.
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Result<Viewport, Error> {
        if !(xmin < xmax) || !(ymin < ymax) {
            return Err(Error::EmptyViewport {
                xmin,
                xmax,
                ymin,
                ymax,
            });
        }
        Ok(Viewport {
            xmin,
            xmax,
            ymin,
            ymax,
        })
    }

    /// Derive the rectangle from a center point and a scalar scale:
    /// `center ± scale` on both axes.  The region is square in plane
    /// space no matter what shape the raster is; rendering a square
    /// region onto a non-square raster stretches the fractal, and that
    /// is the documented behavior, not an accident of this function.
    pub fn centered(center: Complex<f64>, scale: f64) -> Result<Viewport, Error> {
        Viewport::new(
            center.re - scale,
            center.re + scale,
            center.im - scale,
            center.im + scale,
        )
    }

    /// Extent along the real axis.
    pub fn span_x(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Extent along the imaginary axis.
    pub fn span_y(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// Describes the column and row of a point on the pixel grid.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps points on the pixel grid to points on the complex plane.  The
/// mapping only runs in that one direction; nothing in the render ever
/// needs to go back the other way.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    /// The plane rectangle the raster is spread over.
    pub viewport: Viewport,
    /// Raster width in pixels.  Expected nonzero; `ImageSpec` enforces
    /// it for every job built through the front door.
    pub columns: usize,
    /// Raster height in pixels.  Same expectation as `columns`.
    pub rows: usize,
}

impl PlaneMapper {
    /// Constructor.
    pub fn new(viewport: Viewport, columns: usize, rows: usize) -> PlaneMapper {
        PlaneMapper {
            viewport,
            columns,
            rows,
        }
    }

    /// Given a pixel, return the point on the complex plane it stands
    /// for.  Column i lands on `xmin + i*(xmax-xmin)/width`, and rows
    /// likewise on the imaginary axis; the multiply happens before the
    /// divide, so every worker computing the same pixel computes the
    /// same bits.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex {
            re: self.viewport.xmin + (pixel.0 as f64) * self.viewport.span_x() / (self.columns as f64),
            im: self.viewport.ymin + (pixel.1 as f64) * self.viewport.span_y() / (self.rows as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_fails_on_swapped_corners() {
        assert!(Viewport::new(1.0, -1.0, -1.0, 1.0).is_err());
        assert!(Viewport::new(-1.0, 1.0, 1.0, -1.0).is_err());
    }

    #[test]
    fn viewport_fails_on_zero_scale() {
        assert!(Viewport::centered(Complex::new(0.0, 0.0), 0.0).is_err());
        assert!(Viewport::centered(Complex::new(0.0, 0.0), -1.0).is_err());
    }

    #[test]
    fn centered_viewport_is_square_in_plane_space() {
        let v = Viewport::centered(Complex::new(-0.5, 0.25), 2.0).unwrap();
        assert_eq!(v.xmin, -2.5);
        assert_eq!(v.xmax, 1.5);
        assert_eq!(v.ymin, -1.75);
        assert_eq!(v.ymax, 2.25);
        assert_eq!(v.span_x(), v.span_y());
    }

    #[test]
    fn pixel_to_point_spans_the_viewport() {
        let v = Viewport::new(-2.0, 2.0, -2.0, 2.0).unwrap();
        let pm = PlaneMapper::new(v, 4, 4);
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-2.0, -2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 4)), Complex::new(2.0, 2.0));
    }

    #[test]
    fn pixel_to_point_on_positive_viewports() {
        let v = Viewport::new(0.0, 5.0, 0.0, 5.0).unwrap();
        let pm = PlaneMapper::new(v, 5, 5);
        assert_eq!(pm.pixel_to_point(&Pixel(2, 3)), Complex::new(2.0, 3.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 1)), Complex::new(4.0, 1.0));
    }

    #[test]
    fn non_square_rasters_keep_the_square_plane_region() {
        // A raster twice as wide as tall still covers the same square
        // region of the plane; the stretch is in the pixels.
        let v = Viewport::centered(Complex::new(0.0, 0.0), 2.0).unwrap();
        let pm = PlaneMapper::new(v, 800, 400);
        assert_eq!(pm.pixel_to_point(&Pixel(800, 400)), Complex::new(2.0, 2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(400, 200)), Complex::new(0.0, 0.0));
    }
}
