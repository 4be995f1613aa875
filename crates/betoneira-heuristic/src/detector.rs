//! Three-strategy local detector.
//!
//! Runs the color-band, edge-shape and bright-blob strategies over the
//! input image, pools their candidate regions and deduplicates
//! overlapping ones. The result is an unscored candidate list; the
//! orchestrator assigns confidences when the local path is used.

use betoneira_core::{dedup_regions, DetectMethod, Region};
use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{close, dilate};

use crate::contour::mask_components;
use crate::params::HeuristicParams;
use crate::preprocess::hue_band_mask;

/// Pure-local betoneira detector. Stateless apart from its parameters;
/// one instance can serve any number of images.
#[derive(Clone, Debug, Default)]
pub struct LocalHeuristicDetector {
    params: HeuristicParams,
}

impl LocalHeuristicDetector {
    pub fn new(params: HeuristicParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &HeuristicParams {
        &self.params
    }

    /// Detect candidate regions in `image`.
    ///
    /// Returns the deduplicated pool from all three strategies, each
    /// region tagged with the strategy that produced it. An image where
    /// no strategy fires yields an empty vector, never an error.
    pub fn detect(&self, image: &RgbImage) -> Vec<Region> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Vec::new();
        }

        let mut pool = self.color_candidates(image);
        log::debug!("color strategy yielded {} candidate(s)", pool.len());

        let shape = self.shape_candidates(image);
        log::debug!("shape strategy yielded {} candidate(s)", shape.len());
        pool.extend(shape);

        let size = self.size_candidates(image);
        log::debug!("size strategy yielded {} candidate(s)", size.len());
        pool.extend(size);

        let regions = dedup_regions(pool, self.params.iou_threshold);
        log::info!("local detector kept {} region(s) after dedup", regions.len());
        regions
    }

    /// Saturated blobs inside the configured hue bands.
    fn color_candidates(&self, image: &RgbImage) -> Vec<Region> {
        let p = &self.params.color;
        let image_area = image.width() as f64 * image.height() as f64;
        let max_area = p.max_area_frac * image_area;

        let mut regions = Vec::new();
        for band in &p.bands {
            let mask = hue_band_mask(image, *band, p.min_saturation, p.min_value);
            for c in mask_components(&mask) {
                let aspect = c.bbox.aspect_ratio();
                if c.area >= p.min_area
                    && c.area <= max_area
                    && aspect >= p.min_aspect
                    && aspect <= p.max_aspect
                    && c.solidity > p.min_solidity
                {
                    regions.push(Region::new(c.bbox, DetectMethod::Color, c.area));
                }
            }
        }
        regions
    }

    /// Closed edge contours that simplify to a betoneira-like polygon.
    fn shape_candidates(&self, image: &RgbImage) -> Vec<Region> {
        let p = &self.params.shape;
        let image_area = image.width() as f64 * image.height() as f64;
        let max_area = p.max_area_frac * image_area;

        let gray = imageops::grayscale(image);
        let blurred = gaussian_blur_f32(&gray, p.blur_sigma);
        let edges = canny(&blurred, p.canny_low, p.canny_high);
        let closed = close(&edges, Norm::LInf, p.close_radius);
        let mask = dilate(&closed, Norm::LInf, p.dilate_radius);

        mask_components(&mask)
            .into_iter()
            .filter(|c| {
                let aspect = c.bbox.aspect_ratio();
                c.area >= p.min_area
                    && c.area <= max_area
                    && c.vertices >= p.min_vertices
                    && c.vertices <= p.max_vertices
                    && aspect >= p.min_aspect
                    && aspect <= p.max_aspect
                    && c.extent > p.min_extent
            })
            .map(|c| Region::new(c.bbox, DetectMethod::Shape, c.area))
            .collect()
    }

    /// Large bright blobs away from the image border.
    fn size_candidates(&self, image: &RgbImage) -> Vec<Region> {
        let p = &self.params.size;
        let (w, h) = image.dimensions();
        let max_area = p.max_area_frac * (w as f64 * h as f64);

        let gray = imageops::grayscale(image);
        let mask = GrayImage::from_fn(w, h, |x, y| {
            if gray.get_pixel(x, y)[0] > p.brightness_threshold {
                Luma([255])
            } else {
                Luma([0])
            }
        });

        mask_components(&mask)
            .into_iter()
            .filter(|c| {
                let aspect = c.bbox.aspect_ratio();
                c.area >= p.min_area
                    && c.area <= max_area
                    && aspect >= p.min_aspect
                    && aspect <= p.max_aspect
                    && !c.bbox.touches_border(w, h, p.border_margin_frac)
            })
            .map(|c| Region::new(c.bbox, DetectMethod::Size, c.area))
            .collect()
    }
}
