//! Image enhancement ahead of detection.
//!
//! The pipeline normalizes lighting, suppresses noise while keeping
//! edges, and emphasizes the hue bands betoneiras are painted in. It is
//! total: every stage is a pure transform and a degenerate input is
//! returned unchanged, so callers never need a failure path here.

use betoneira_core::{rgb_to_hsv, HueBand};
use image::{imageops, GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::equalize_histogram;
use imageproc::distance_transform::Norm;
use imageproc::filter::{bilateral_filter, median_filter};
use imageproc::morphology::{close, dilate, open};
use serde::{Deserialize, Serialize};

/// Configuration for [`Preprocessor`]. All values are fixed heuristics,
/// not learned.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreprocessParams {
    /// Longest image side after the initial downscale.
    pub max_side: u32,
    /// Tiles per axis for localized luma equalization.
    pub tile_grid: u32,
    /// Histogram clip limit (multiples of the uniform bin height).
    pub clip_limit: f32,
    /// Run a global equalization pass after the tiled one.
    pub global_equalize: bool,
    pub bilateral_window: u32,
    pub bilateral_sigma_color: f32,
    pub bilateral_sigma_spatial: f32,
    /// Median filter radius; 0 disables the filter.
    pub median_radius: u32,
    /// Hue bands OR-ed into the emphasis mask.
    pub bands: Vec<HueBand>,
    pub band_min_saturation: u8,
    pub band_min_value: u8,
    /// Low-saturation "metallic" band for unpainted drums.
    pub metallic_max_saturation: u8,
    pub metallic_min_value: u8,
    pub metallic_max_value: u8,
    pub mask_close_radius: u8,
    pub mask_open_radius: u8,
    pub mask_dilate_radius: u8,
    /// Minimum mask coverage in pixels before the blend is applied.
    pub min_mask_pixels: u32,
    /// Weight of the masked image in the final blend.
    pub blend_weight: f32,
    pub contrast_gain: f32,
    pub brightness_bias: f32,
}

impl Default for PreprocessParams {
    fn default() -> Self {
        Self {
            max_side: 1280,
            tile_grid: 8,
            clip_limit: 2.0,
            global_equalize: false,
            bilateral_window: 9,
            bilateral_sigma_color: 75.0,
            bilateral_sigma_spatial: 75.0,
            median_radius: 0,
            bands: vec![
                HueBand::new(10, 25),
                HueBand::new(0, 10),
                HueBand::new(170, 179),
                HueBand::new(100, 130),
                HueBand::new(26, 35),
            ],
            band_min_saturation: 100,
            band_min_value: 100,
            metallic_max_saturation: 60,
            metallic_min_value: 80,
            metallic_max_value: 220,
            mask_close_radius: 2,
            mask_open_radius: 1,
            mask_dilate_radius: 1,
            min_mask_pixels: 1_000,
            blend_weight: 0.7,
            contrast_gain: 1.1,
            brightness_bias: 8.0,
        }
    }
}

/// Binary mask of pixels whose hue falls inside `band` with sufficient
/// saturation and brightness. Shared by the preprocessor and the color
/// strategy of the local detector.
pub fn hue_band_mask(
    image: &RgbImage,
    band: HueBand,
    min_saturation: u8,
    min_value: u8,
) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let hsv = rgb_to_hsv(r, g, b);
        if band.contains(hsv.h) && hsv.s >= min_saturation && hsv.v >= min_value {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Downscale so the longest side equals `target`, preserving aspect
/// ratio. Images already within the target are returned unchanged.
pub fn downscale_long_side(image: &RgbImage, target: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    let long = w.max(h);
    if long <= target || long == 0 {
        return image.clone();
    }
    let scale = target as f64 / long as f64;
    let nw = ((w as f64 * scale).round() as u32).max(1);
    let nh = ((h as f64 * scale).round() as u32).max(1);
    imageops::resize(image, nw, nh, imageops::FilterType::Triangle)
}

/// The enhancement pipeline. See module docs for the stage order.
#[derive(Clone, Debug, Default)]
pub struct Preprocessor {
    params: PreprocessParams,
}

impl Preprocessor {
    pub fn new(params: PreprocessParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PreprocessParams {
        &self.params
    }

    /// Run the full pipeline. Never fails; a degenerate input is
    /// returned unchanged.
    pub fn enhance(&self, image: &RgbImage) -> RgbImage {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return image.clone();
        }

        let mut img = if w.max(h) > self.params.max_side {
            downscale_long_side(image, self.params.max_side)
        } else {
            image.clone()
        };

        img = self.normalize_lighting(&img);
        img = self.denoise(&img);
        img = self.emphasize_chroma(&img);
        self.linear_adjust(&img)
    }

    /// Localized contrast enhancement on the luma channel; chroma is
    /// preserved by scaling each pixel by the luma ratio.
    fn normalize_lighting(&self, image: &RgbImage) -> RgbImage {
        let luma = imageops::grayscale(image);
        let mut equalized = tile_equalize(&luma, self.params.tile_grid, self.params.clip_limit);
        if self.params.global_equalize {
            equalized = equalize_histogram(&equalized);
        }

        let mut out = image.clone();
        for (x, y, px) in out.enumerate_pixels_mut() {
            let old = luma.get_pixel(x, y)[0] as f32;
            if old == 0.0 {
                continue;
            }
            let ratio = equalized.get_pixel(x, y)[0] as f32 / old;
            for c in px.0.iter_mut() {
                *c = (*c as f32 * ratio).round().clamp(0.0, 255.0) as u8;
            }
        }
        out
    }

    fn denoise(&self, image: &RgbImage) -> RgbImage {
        let mut channels = split_channels(image);
        for chan in channels.iter_mut() {
            *chan = bilateral_filter(
                chan,
                self.params.bilateral_window,
                self.params.bilateral_sigma_color,
                self.params.bilateral_sigma_spatial,
            );
        }
        let mut out = merge_channels(&channels);
        if self.params.median_radius > 0 {
            out = median_filter(&out, self.params.median_radius, self.params.median_radius);
        }
        out
    }

    /// Build the combined chroma mask, consolidate it morphologically
    /// and blend the masked image back over the input when the mask
    /// covers enough pixels.
    fn emphasize_chroma(&self, image: &RgbImage) -> RgbImage {
        let (w, h) = image.dimensions();
        let mut combined = GrayImage::new(w, h);
        for band in &self.params.bands {
            let mask = hue_band_mask(
                image,
                *band,
                self.params.band_min_saturation,
                self.params.band_min_value,
            );
            or_mask(&mut combined, &mask);
        }
        or_mask(&mut combined, &self.metallic_mask(image));

        combined = close(&combined, Norm::LInf, self.params.mask_close_radius);
        combined = open(&combined, Norm::LInf, self.params.mask_open_radius);
        combined = dilate(&combined, Norm::LInf, self.params.mask_dilate_radius);

        let coverage = combined.pixels().filter(|p| p[0] > 0).count() as u32;
        if coverage < self.params.min_mask_pixels {
            log::debug!("chroma mask covered {coverage} px, below threshold; skipping blend");
            return image.clone();
        }

        let w_masked = self.params.blend_weight;
        let w_orig = 1.0 - w_masked;
        let mut out = image.clone();
        for (x, y, px) in out.enumerate_pixels_mut() {
            let on = combined.get_pixel(x, y)[0] > 0;
            for c in px.0.iter_mut() {
                let masked = if on { *c as f32 } else { 0.0 };
                *c = (w_masked * masked + w_orig * *c as f32).round() as u8;
            }
        }
        out
    }

    fn metallic_mask(&self, image: &RgbImage) -> GrayImage {
        GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let [r, g, b] = image.get_pixel(x, y).0;
            let hsv = rgb_to_hsv(r, g, b);
            if hsv.s <= self.params.metallic_max_saturation
                && hsv.v >= self.params.metallic_min_value
                && hsv.v <= self.params.metallic_max_value
            {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    fn linear_adjust(&self, image: &RgbImage) -> RgbImage {
        let gain = self.params.contrast_gain;
        let bias = self.params.brightness_bias;
        let mut out = image.clone();
        for px in out.pixels_mut() {
            for c in px.0.iter_mut() {
                *c = (*c as f32 * gain + bias).round().clamp(0.0, 255.0) as u8;
            }
        }
        out
    }
}

fn or_mask(dst: &mut GrayImage, src: &GrayImage) {
    for (d, s) in dst.pixels_mut().zip(src.pixels()) {
        if s[0] > 0 {
            d.0[0] = 255;
        }
    }
}

fn split_channels(image: &RgbImage) -> [GrayImage; 3] {
    let (w, h) = image.dimensions();
    let mut channels = [
        GrayImage::new(w, h),
        GrayImage::new(w, h),
        GrayImage::new(w, h),
    ];
    for (x, y, px) in image.enumerate_pixels() {
        for (c, chan) in channels.iter_mut().enumerate() {
            chan.put_pixel(x, y, Luma([px.0[c]]));
        }
    }
    channels
}

fn merge_channels(channels: &[GrayImage; 3]) -> RgbImage {
    let (w, h) = channels[0].dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        Rgb([
            channels[0].get_pixel(x, y)[0],
            channels[1].get_pixel(x, y)[0],
            channels[2].get_pixel(x, y)[0],
        ])
    })
}

/// Clip-limited tiled histogram equalization on a grayscale image.
///
/// Per-tile lookup tables are built from clipped histograms and blended
/// bilinearly between tile centers, which avoids the blocky seams of
/// naive per-tile equalization.
fn tile_equalize(luma: &GrayImage, grid: u32, clip_limit: f32) -> GrayImage {
    let (w, h) = luma.dimensions();
    if w == 0 || h == 0 {
        return luma.clone();
    }
    let grid = grid.clamp(1, w.min(h).max(1));
    let tile_w = w.div_ceil(grid);
    let tile_h = h.div_ceil(grid);

    let mut luts = vec![[0u8; 256]; (grid * grid) as usize];
    for ty in 0..grid {
        for tx in 0..grid {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);
            if x0 >= x1 || y0 >= y1 {
                continue;
            }

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[luma.get_pixel(x, y)[0] as usize] += 1;
                }
            }
            let n = ((x1 - x0) * (y1 - y0)) as u32;
            let limit = ((clip_limit * n as f32 / 256.0).max(1.0)) as u32;
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > limit {
                    excess += *bin - limit;
                    *bin = limit;
                }
            }
            let redistribute = excess / 256;
            for bin in hist.iter_mut() {
                *bin += redistribute;
            }

            let total: u64 = hist.iter().map(|&c| c as u64).sum();
            let lut = &mut luts[(ty * grid + tx) as usize];
            let mut cdf = 0u64;
            for (v, entry) in lut.iter_mut().enumerate() {
                cdf += hist[v] as u64;
                *entry = ((255 * cdf + total / 2) / total.max(1)) as u8;
            }
        }
    }

    let max_tile = (grid - 1) as f32;
    GrayImage::from_fn(w, h, |x, y| {
        let v = luma.get_pixel(x, y)[0] as usize;
        let fx = ((x as f32 + 0.5) / tile_w as f32 - 0.5).clamp(0.0, max_tile);
        let fy = ((y as f32 + 0.5) / tile_h as f32 - 0.5).clamp(0.0, max_tile);
        let tx0 = fx.floor() as u32;
        let ty0 = fy.floor() as u32;
        let tx1 = (tx0 + 1).min(grid - 1);
        let ty1 = (ty0 + 1).min(grid - 1);
        let wx = fx - tx0 as f32;
        let wy = fy - ty0 as f32;

        let sample = |tx: u32, ty: u32| luts[(ty * grid + tx) as usize][v] as f32;
        let top = sample(tx0, ty0) * (1.0 - wx) + sample(tx1, ty0) * wx;
        let bottom = sample(tx0, ty1) * (1.0 - wx) + sample(tx1, ty1) * wx;
        Luma([(top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn enhance_preserves_dimensions_below_cap() {
        let img = RgbImage::from_pixel(320, 240, Rgb([120, 110, 100]));
        let out = Preprocessor::default().enhance(&img);
        assert_eq!(out.dimensions(), (320, 240));
    }

    #[test]
    fn enhance_downscales_oversized_input() {
        let img = RgbImage::from_pixel(2560, 1440, Rgb([120, 110, 100]));
        let out = Preprocessor::default().enhance(&img);
        assert_eq!(out.dimensions().0.max(out.dimensions().1), 1280);
        // Aspect ratio preserved.
        assert_eq!(out.dimensions(), (1280, 720));
    }

    #[test]
    fn enhance_returns_degenerate_input_unchanged() {
        let img = RgbImage::new(0, 0);
        let out = Preprocessor::default().enhance(&img);
        assert_eq!(out.dimensions(), (0, 0));
    }

    #[test]
    fn downscale_leaves_small_images_alone() {
        let img = RgbImage::from_pixel(100, 50, Rgb([1, 2, 3]));
        assert_eq!(downscale_long_side(&img, 640).dimensions(), (100, 50));
    }

    #[test]
    fn hue_band_mask_selects_saturated_band_pixels() {
        let mut img = RgbImage::from_pixel(10, 10, Rgb([120, 120, 120]));
        img.put_pixel(3, 3, Rgb([220, 120, 30])); // orange
        let mask = hue_band_mask(&img, HueBand::new(10, 25), 100, 100);
        assert_eq!(mask.get_pixel(3, 3)[0], 255);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn tile_equalize_spreads_a_flat_midtone() {
        // A split image: dark left half, bright right half. Equalization
        // must keep ordering and stay within range.
        let img = GrayImage::from_fn(64, 64, |x, _| if x < 32 { Luma([40]) } else { Luma([200]) });
        let eq = tile_equalize(&img, 4, 2.0);
        assert!(eq.get_pixel(0, 0)[0] <= eq.get_pixel(63, 0)[0]);
    }
}
