//! Integer bounding boxes in 1-based inclusive pixel coordinates.

use serde::Serialize;

/// An axis-aligned bounding box as written in VOC `<bndbox>` elements.
///
/// Coordinates are 1-based and inclusive on both ends, so a box covering a
/// single pixel has `xmin == xmax`. The constructor does not enforce
/// `min <= max`; a malformed box still has a well-defined (possibly
/// non-positive) area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct BBox {
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

impl BBox {
    /// Creates a box from explicit coordinates.
    #[inline]
    pub fn new(xmin: i64, ymin: i64, xmax: i64, ymax: i64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Creates a box that covers a whole `width` x `height` frame.
    #[inline]
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self::new(1, 1, i64::from(width), i64::from(height))
    }

    /// Inclusive pixel width, saturating at the `i64` bounds.
    #[inline]
    pub fn width(&self) -> i64 {
        self.xmax.saturating_sub(self.xmin).saturating_add(1)
    }

    /// Inclusive pixel height, saturating at the `i64` bounds.
    #[inline]
    pub fn height(&self) -> i64 {
        self.ymax.saturating_sub(self.ymin).saturating_add(1)
    }

    /// Inclusive pixel area, `(xmax - xmin + 1) * (ymax - ymin + 1)`,
    /// saturating at the `i64` bounds.
    #[inline]
    pub fn area(&self) -> i64 {
        self.width().saturating_mul(self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_is_pixel_inclusive() {
        assert_eq!(BBox::new(1, 1, 10, 10).area(), 100);
        assert_eq!(BBox::new(1, 1, 5, 5).area(), 25);
        assert_eq!(BBox::new(7, 7, 7, 7).area(), 1);
    }

    #[test]
    fn full_frame_spans_image() {
        let bbox = BBox::full_frame(640, 480);
        assert_eq!(bbox, BBox::new(1, 1, 640, 480));
        assert_eq!(bbox.area(), 640 * 480);
    }

    #[test]
    fn extreme_coordinates_saturate() {
        let huge = BBox::new(i64::MIN, i64::MIN, i64::MAX, i64::MAX);
        assert_eq!(huge.width(), i64::MAX);
        assert_eq!(huge.area(), i64::MAX);

        let inverted = BBox::new(i64::MAX, 0, i64::MIN, 0);
        assert_eq!(inverted.width(), i64::MIN + 1);
        assert_eq!(inverted.area(), i64::MIN + 1);
    }
}
