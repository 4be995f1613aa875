//! JPEG submission payloads.
//!
//! Every remote attempt submits the image as a JPEG. The payload keeps
//! the encoded bytes in memory for base64 transmission and mirrors them
//! into a named temporary file so external tooling can inspect exactly
//! what was sent; the file is removed when the payload is dropped.

use std::io::Write;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tempfile::NamedTempFile;
use thiserror::Error;

const BASE_JPEG_QUALITY: u8 = 85;
const HIGH_JPEG_QUALITY: u8 = 100;

/// Which rendition of the input image a payload carries. The
/// orchestrator tries the variants in declaration order until the
/// remote model returns usable predictions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionVariant {
    /// The image as given.
    Original,
    /// After the local enhancement pipeline.
    Enhanced,
    /// Downscaled rendition for models that favor smaller inputs.
    Downscaled,
    /// The original image re-encoded at maximum JPEG quality.
    HighQuality,
}

impl SubmissionVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionVariant::Original => "original",
            SubmissionVariant::Enhanced => "enhanced",
            SubmissionVariant::Downscaled => "downscaled",
            SubmissionVariant::HighQuality => "high-quality",
        }
    }

    fn jpeg_quality(&self) -> u8 {
        match self {
            SubmissionVariant::HighQuality => HIGH_JPEG_QUALITY,
            _ => BASE_JPEG_QUALITY,
        }
    }
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("jpeg encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("payload temp file: {0}")]
    Io(#[from] std::io::Error),
}

/// One encoded submission: the JPEG bytes plus their on-disk mirror.
#[derive(Debug)]
pub struct SubmissionPayload {
    variant: SubmissionVariant,
    bytes: Vec<u8>,
    temp: NamedTempFile,
}

impl SubmissionPayload {
    /// Encode `image` as a JPEG at the variant's quality setting.
    pub fn jpeg(image: &RgbImage, variant: SubmissionVariant) -> Result<Self, PayloadError> {
        let mut bytes = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut bytes, variant.jpeg_quality());
        image.write_with_encoder(encoder)?;

        let mut temp = tempfile::Builder::new()
            .prefix("betoneira-")
            .suffix(".jpg")
            .tempfile()?;
        temp.write_all(&bytes)?;

        Ok(Self {
            variant,
            bytes,
            temp,
        })
    }

    pub fn variant(&self) -> SubmissionVariant {
        self.variant
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Path of the temporary JPEG mirror. Valid for the payload's lifetime.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }
}
