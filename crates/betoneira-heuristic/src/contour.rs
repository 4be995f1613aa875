//! Connected-component analysis of binary masks.
//!
//! Each detection strategy reduces the image to a binary mask; this
//! module traces the outer contours and summarizes each one into the
//! geometric features the strategies filter on.

use betoneira_core::BBox;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{approximate_polygon_dp, arc_length, convex_hull};
use imageproc::point::Point;

/// Fraction of the contour perimeter used as the polygon-approximation
/// tolerance.
const APPROX_EPSILON_FRAC: f64 = 0.02;

/// Geometric summary of one outer contour of a binary mask.
#[derive(Clone, Copy, Debug)]
pub struct MaskComponent {
    /// Tight bounding box of the contour, clamped to the image.
    pub bbox: BBox,
    /// Contour area in pixels (shoelace over the traced polygon).
    pub area: f64,
    /// Contour area over convex-hull area, in `(0, 1]`.
    pub solidity: f64,
    /// Contour area over bounding-box area, in `(0, 1]`.
    pub extent: f64,
    /// Vertex count of the simplified polygon.
    pub vertices: usize,
}

/// Trace the outer contours of `mask` and summarize each into a
/// [`MaskComponent`]. Holes and degenerate contours are skipped.
pub fn mask_components(mask: &GrayImage) -> Vec<MaskComponent> {
    let (img_w, img_h) = mask.dimensions();
    let mut components = Vec::new();

    for contour in find_contours::<i32>(mask) {
        if contour.border_type != BorderType::Outer || contour.points.len() < 3 {
            continue;
        }

        let area = polygon_area(&contour.points);
        if area <= 0.0 {
            continue;
        }

        let mut min_x = i32::MAX;
        let mut min_y = i32::MAX;
        let mut max_x = i32::MIN;
        let mut max_y = i32::MIN;
        for p in &contour.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let Some(bbox) = BBox::new(
            min_x as i64,
            min_y as i64,
            max_x as i64 + 1,
            max_y as i64 + 1,
            img_w,
            img_h,
        ) else {
            continue;
        };

        let hull = convex_hull(contour.points.clone());
        let hull_area = polygon_area(&hull);
        let solidity = if hull_area > 0.0 {
            (area / hull_area).min(1.0)
        } else {
            1.0
        };
        let extent = (area / bbox.area() as f64).min(1.0);

        let perimeter = arc_length(&contour.points, true);
        let simplified =
            approximate_polygon_dp(&contour.points, APPROX_EPSILON_FRAC * perimeter, true);

        components.push(MaskComponent {
            bbox,
            area,
            solidity,
            extent,
            vertices: simplified.len(),
        });
    }

    components
}

/// Shoelace area of a closed polygon given by its vertices in order.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut doubled = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        doubled += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    doubled.abs() as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn rect_mask(w: u32, h: u32, rect: Rect) -> GrayImage {
        let mut mask = GrayImage::new(w, h);
        draw_filled_rect_mut(&mut mask, rect, Luma([255]));
        mask
    }

    #[test]
    fn filled_rectangle_yields_one_compact_component() {
        let mask = rect_mask(200, 200, Rect::at(40, 50).of_size(80, 60));
        let comps = mask_components(&mask);
        assert_eq!(comps.len(), 1);
        let c = &comps[0];
        assert_eq!((c.bbox.x1, c.bbox.y1), (40, 50));
        assert_eq!((c.bbox.width(), c.bbox.height()), (80, 60));
        // The traced boundary polygon is one pixel inside the filled
        // extent on each side, so the shoelace area is (w-1)*(h-1).
        assert!((c.area - 79.0 * 59.0).abs() < 1.0);
        assert!(c.solidity > 0.95);
        assert!(c.extent > 0.9);
        assert!(c.vertices <= 6, "rectangle simplified to {}", c.vertices);
    }

    #[test]
    fn l_shape_has_lower_solidity_than_rectangle() {
        let mut mask = GrayImage::new(200, 200);
        draw_filled_rect_mut(&mut mask, Rect::at(20, 20).of_size(100, 30), Luma([255]));
        draw_filled_rect_mut(&mut mask, Rect::at(20, 20).of_size(30, 100), Luma([255]));
        let comps = mask_components(&mask);
        assert_eq!(comps.len(), 1);
        assert!(comps[0].solidity < 0.9);
    }

    #[test]
    fn separate_blobs_yield_separate_components() {
        let mut mask = GrayImage::new(300, 200);
        draw_filled_rect_mut(&mut mask, Rect::at(10, 10).of_size(50, 50), Luma([255]));
        draw_filled_rect_mut(&mut mask, Rect::at(200, 100).of_size(60, 40), Luma([255]));
        assert_eq!(mask_components(&mask).len(), 2);
    }

    #[test]
    fn empty_mask_yields_nothing() {
        assert!(mask_components(&GrayImage::new(100, 100)).is_empty());
    }

    #[test]
    fn tiny_speckle_is_skipped_or_degenerate() {
        let mut mask = GrayImage::new(50, 50);
        mask.put_pixel(10, 10, Luma([255]));
        // A single pixel has no polygon area.
        assert!(mask_components(&mask).is_empty());
    }
}
