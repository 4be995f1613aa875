//! Dominant color classification for a detected region.
//!
//! The crop is resampled to a small fixed grid so every region votes
//! with the same number of samples, then only chromatic pixels (enough
//! saturation, mid-range brightness) contribute to an 18-bin hue
//! histogram. Achromatic regions fall back to a white/black/gray call
//! from mean brightness.

use image::{imageops, RgbImage};
use serde::{Deserialize, Serialize};

use crate::bbox::BBox;
use crate::hsv::rgb_to_hsv;

/// Side of the square resampling grid.
const SAMPLE_SIDE: u32 = 100;
/// Minimum saturation for a pixel to carry reliable hue information.
const MIN_CHROMATIC_SATURATION: u8 = 40;
/// Exclusive value range for chromatic pixels; outside it hue is noise.
const CHROMATIC_VALUE_LO: u8 = 30;
const CHROMATIC_VALUE_HI: u8 = 230;
/// Hue histogram bins over `[0, 180)`.
const HUE_BINS: usize = 18;
const HUE_BIN_WIDTH: u8 = 10;
/// Mean-brightness cutoffs for the achromatic fallback.
const WHITE_BRIGHTNESS: f64 = 180.0;
const BLACK_BRIGHTNESS: f64 = 60.0;

/// Color label attached to every detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorName {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    White,
    Black,
    Gray,
    Undefined,
}

impl ColorName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorName::Red => "red",
            ColorName::Orange => "orange",
            ColorName::Yellow => "yellow",
            ColorName::Green => "green",
            ColorName::Blue => "blue",
            ColorName::Purple => "purple",
            ColorName::Pink => "pink",
            ColorName::White => "white",
            ColorName::Black => "black",
            ColorName::Gray => "gray",
            ColorName::Undefined => "undefined",
        }
    }
}

impl std::fmt::Display for ColorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a hue in OpenCV units to one of the seven named hues.
///
/// The red band wraps around the hue origin, so 180 behaves as 0.
pub fn hue_to_color(hue: u8) -> ColorName {
    match hue {
        0..=8 | 172..=180 => ColorName::Red,
        9..=20 => ColorName::Orange,
        21..=35 => ColorName::Yellow,
        36..=85 => ColorName::Green,
        86..=130 => ColorName::Blue,
        131..=145 => ColorName::Purple,
        146..=171 => ColorName::Pink,
        _ => ColorName::Undefined,
    }
}

/// Classify the dominant color of `bbox` inside `image`.
///
/// Pure and total: a degenerate or out-of-bounds region yields
/// [`ColorName::Undefined`] rather than an error.
pub fn classify_color(image: &RgbImage, bbox: BBox) -> ColorName {
    let (w, h) = image.dimensions();
    let Some(bbox) = BBox::new(
        bbox.x1 as i64,
        bbox.y1 as i64,
        bbox.x2 as i64,
        bbox.y2 as i64,
        w,
        h,
    ) else {
        return ColorName::Undefined;
    };

    let roi = imageops::crop_imm(image, bbox.x1, bbox.y1, bbox.width(), bbox.height()).to_image();
    let sampled = imageops::resize(&roi, SAMPLE_SIDE, SAMPLE_SIDE, imageops::FilterType::Nearest);

    let mut histogram = [0u32; HUE_BINS];
    let mut chromatic = 0u32;
    let mut brightness_sum = 0.0f64;

    for px in sampled.pixels() {
        let [r, g, b] = px.0;
        brightness_sum += 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;

        let hsv = rgb_to_hsv(r, g, b);
        if hsv.s > MIN_CHROMATIC_SATURATION
            && hsv.v > CHROMATIC_VALUE_LO
            && hsv.v < CHROMATIC_VALUE_HI
        {
            let bin = ((hsv.h / HUE_BIN_WIDTH) as usize).min(HUE_BINS - 1);
            histogram[bin] += 1;
            chromatic += 1;
        }
    }

    if chromatic == 0 {
        let mean = brightness_sum / (SAMPLE_SIDE as f64 * SAMPLE_SIDE as f64);
        return if mean > WHITE_BRIGHTNESS {
            ColorName::White
        } else if mean < BLACK_BRIGHTNESS {
            ColorName::Black
        } else {
            ColorName::Gray
        };
    }

    let peak_bin = histogram
        .iter()
        .enumerate()
        .max_by_key(|&(i, &count)| (count, std::cmp::Reverse(i)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let midpoint = peak_bin as u8 * HUE_BIN_WIDTH + HUE_BIN_WIDTH / 2;
    hue_to_color(midpoint)
}
