//! Result annotation.
//!
//! Draws each detection onto a copy of the input: a two-pixel hollow
//! rectangle plus a filled label strip above the box, green for remote
//! detections and blue for local ones.

use betoneira_core::{Detection, DetectionSource};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

pub const REMOTE_BOX_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
pub const LOCAL_BOX_COLOR: Rgb<u8> = Rgb([30, 90, 220]);

const LABEL_STRIP_HEIGHT: u32 = 14;
const LABEL_STRIP_MAX_WIDTH: u32 = 64;

/// Render `detections` over a copy of `image`.
pub fn annotate(image: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut canvas = image.clone();
    for det in detections {
        let color = match det.source {
            DetectionSource::Remote => REMOTE_BOX_COLOR,
            DetectionSource::Local => LOCAL_BOX_COLOR,
        };
        let (w, h) = (det.bbox.width(), det.bbox.height());
        let (x, y) = (det.bbox.x1 as i32, det.bbox.y1 as i32);

        draw_hollow_rect_mut(&mut canvas, Rect::at(x, y).of_size(w, h), color);
        if w > 2 && h > 2 {
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(x + 1, y + 1).of_size(w - 2, h - 2),
                color,
            );
        }

        // Label strip above the box, skipped when the box touches the top.
        let strip_y = y - LABEL_STRIP_HEIGHT as i32;
        if strip_y >= 0 {
            let strip_w = w.min(LABEL_STRIP_MAX_WIDTH);
            draw_filled_rect_mut(
                &mut canvas,
                Rect::at(x, strip_y).of_size(strip_w, LABEL_STRIP_HEIGHT),
                color,
            );
        }
    }
    canvas
}
