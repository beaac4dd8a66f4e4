// 圧縮プロファイル: 最大辺 + JPEG品質 + 色空間

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::encode::{ColorMode, EncodingConfig, ImageEncoding};
use crate::error::PdfSearchError;

/// One rung of the compression ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionProfile {
    pub name: String,
    /// Longest edge in pixels after resizing. `None` keeps the original size.
    #[serde(default)]
    pub max_dimension: Option<u32>,
    /// JPEG quality (1-100). `None` encodes losslessly.
    #[serde(default)]
    pub quality: Option<u8>,
    /// Target color space. `None` keeps grayscale as grayscale and turns everything else into RGB.
    #[serde(default)]
    pub color: Option<ColorMode>,
}

impl CompressionProfile {
    /// Full resolution, lossless: the first attempt for every page.
    pub fn identity() -> Self {
        Self {
            name: "identity".to_string(),
            max_dimension: None,
            quality: None,
            color: None,
        }
    }

    pub fn jpeg(name: impl Into<String>, max_dimension: u32, quality: u8) -> Self {
        Self {
            name: name.into(),
            max_dimension: Some(max_dimension),
            quality: Some(quality),
            color: None,
        }
    }

    pub fn with_color(mut self, color: ColorMode) -> Self {
        self.color = Some(color);
        self
    }

    /// 縮小倍率 = min(1, max_dimension / 長辺)。拡大はしない。
    pub fn scale_for(&self, width: u32, height: u32) -> f64 {
        let longest = width.max(height);
        match self.max_dimension {
            Some(max) if longest > 0 => (max as f64 / longest as f64).min(1.0),
            _ => 1.0,
        }
    }

    pub fn encoding_for(&self, image: &DynamicImage) -> EncodingConfig {
        EncodingConfig {
            encoding: match self.quality {
                Some(quality) => ImageEncoding::Jpeg { quality },
                None => ImageEncoding::Lossless,
            },
            color: self.color.unwrap_or_else(|| ColorMode::for_image(image)),
        }
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.name.trim().is_empty() {
            return Err(PdfSearchError::config("compression profile needs a name"));
        }
        if self.max_dimension == Some(0) {
            return Err(PdfSearchError::config(format!(
                "profile '{}': max_dimension must be positive",
                self.name
            )));
        }
        if let Some(q) = self.quality
            && !(1..=100).contains(&q)
        {
            return Err(PdfSearchError::config(format!(
                "profile '{}': quality must be 1-100, got {}",
                self.name, q
            )));
        }
        Ok(())
    }
}

/// Two RGB rungs: 1200 px longest edge at JPEG 85, then at JPEG 70.
pub fn default_ladder() -> Vec<CompressionProfile> {
    vec![
        CompressionProfile::jpeg("max-1200-q85", 1200, 85).with_color(ColorMode::Rgb),
        CompressionProfile::jpeg("max-1200-q70", 1200, 70).with_color(ColorMode::Rgb),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_never_upscales() {
        let p = CompressionProfile::jpeg("p", 1200, 85);
        assert_eq!(p.scale_for(800, 600), 1.0);
        assert_eq!(p.scale_for(1200, 900), 1.0);
        assert_eq!(p.scale_for(2400, 1000), 0.5);
        assert_eq!(p.scale_for(1000, 1600), 0.75);
    }

    #[test]
    fn test_identity_is_lossless_full_size() {
        let p = CompressionProfile::identity();
        assert_eq!(p.scale_for(5000, 5000), 1.0);
        let img = DynamicImage::ImageRgba8(image::RgbaImage::new(2, 2));
        let enc = p.encoding_for(&img);
        assert_eq!(enc.encoding, ImageEncoding::Lossless);
        assert_eq!(enc.color, ColorMode::Rgb);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(CompressionProfile::jpeg("p", 0, 80).validate().is_err());
        assert!(CompressionProfile::jpeg("p", 100, 0).validate().is_err());
        assert!(CompressionProfile::jpeg("p", 100, 101).validate().is_err());
        assert!(CompressionProfile::jpeg(" ", 100, 50).validate().is_err());
        assert!(CompressionProfile::jpeg("p", 100, 50).validate().is_ok());
    }

    #[test]
    fn test_explicit_color_overrides_natural() {
        let p = CompressionProfile::jpeg("p", 100, 50).with_color(ColorMode::Grayscale);
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        assert_eq!(p.encoding_for(&img).color, ColorMode::Grayscale);
    }
}
