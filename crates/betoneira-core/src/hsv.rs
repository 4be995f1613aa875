//! RGB to HSV conversion in OpenCV value ranges.
//!
//! Hue is reported in `[0, 180)` (degrees halved), saturation and value
//! in `[0, 255]`. All hue-band tables in this workspace use these
//! ranges, matching the inference service's training-time conventions.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hsv {
    /// Hue in `[0, 180)`.
    pub h: u8,
    /// Saturation in `[0, 255]`.
    pub s: u8,
    /// Value (brightness) in `[0, 255]`.
    pub v: u8,
}

/// Convert an 8-bit RGB triple to OpenCV-range HSV.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = (max - min) as f32;

    let v = max;
    let s = if max == 0 {
        0
    } else {
        (255.0 * delta / max as f32).round() as u8
    };

    if delta == 0.0 {
        return Hsv { h: 0, s, v };
    }

    let rf = r as f32;
    let gf = g as f32;
    let bf = b as f32;
    let mut h_deg = if max == r {
        60.0 * (gf - bf) / delta
    } else if max == g {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    if h_deg < 0.0 {
        h_deg += 360.0;
    }

    let h = ((h_deg / 2.0).round() as u16 % 180) as u8;
    Hsv { h, s, v }
}

/// An inclusive hue interval in OpenCV hue units.
///
/// Bands never wrap internally; the red band around the hue origin is
/// expressed as two separate `HueBand`s, exactly as the segmentation
/// tables list them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HueBand {
    pub lo: u8,
    pub hi: u8,
}

impl HueBand {
    pub const fn new(lo: u8, hi: u8) -> Self {
        Self { lo, hi }
    }

    #[inline]
    pub fn contains(&self, hue: u8) -> bool {
        self.lo <= hue && hue <= self.hi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries() {
        assert_eq!(rgb_to_hsv(255, 0, 0), Hsv { h: 0, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(0, 255, 0), Hsv { h: 60, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(0, 0, 255), Hsv { h: 120, s: 255, v: 255 });
    }

    #[test]
    fn grays_have_zero_saturation() {
        for v in [0u8, 60, 128, 255] {
            let hsv = rgb_to_hsv(v, v, v);
            assert_eq!(hsv.s, 0);
            assert_eq!(hsv.v, v);
        }
    }

    #[test]
    fn orange_lands_in_the_orange_band() {
        // A typical betoneira drum orange.
        let hsv = rgb_to_hsv(230, 120, 30);
        assert!(HueBand::new(10, 25).contains(hsv.h), "hue was {}", hsv.h);
        assert!(hsv.s > 100);
    }

    #[test]
    fn hue_stays_below_180() {
        // Reddish purple sits just under the wrap point.
        let hsv = rgb_to_hsv(255, 0, 10);
        assert!(hsv.h < 180);
    }
}
