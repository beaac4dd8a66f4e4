// ページ画像 → PDF画像XObject用バイト列 (Flate / DCT)

pub mod flate;
pub mod jpeg;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::PdfSearchError;

/// Output color space of the page background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Rgb,
    Grayscale,
}

impl ColorMode {
    pub fn pdf_color_space(self) -> &'static str {
        match self {
            ColorMode::Rgb => "DeviceRGB",
            ColorMode::Grayscale => "DeviceGray",
        }
    }

    /// Natural target for an image: grayscale stays grayscale, anything else is RGB.
    pub fn for_image(image: &DynamicImage) -> Self {
        if image.color().has_color() {
            ColorMode::Rgb
        } else {
            ColorMode::Grayscale
        }
    }
}

/// Image stream encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// Raw 8-bit samples, zlib compressed.
    Lossless,
    /// JPEG at the given quality (1-100).
    Jpeg { quality: u8 },
}

/// Everything the compositor needs to encode the page background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingConfig {
    pub encoding: ImageEncoding,
    pub color: ColorMode,
}

/// Encoded image data ready to be wrapped in an image XObject.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub filter: &'static str,
    pub color_space: &'static str,
    pub bits_per_component: u8,
}

/// 指定設定で画像をエンコードする。アルファチャンネルは常に破棄される。
pub fn encode_image(
    image: &DynamicImage,
    config: &EncodingConfig,
) -> crate::error::Result<EncodedImage> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(PdfSearchError::encode(format!(
            "cannot encode empty image ({}x{})",
            width, height
        )));
    }

    let (data, filter) = match (config.encoding, config.color) {
        (ImageEncoding::Lossless, ColorMode::Rgb) => {
            (flate::encode_samples(image.to_rgb8().as_raw())?, "FlateDecode")
        }
        (ImageEncoding::Lossless, ColorMode::Grayscale) => {
            (flate::encode_samples(image.to_luma8().as_raw())?, "FlateDecode")
        }
        (ImageEncoding::Jpeg { quality }, ColorMode::Rgb) => {
            (jpeg::encode_rgb_to_jpeg(&image.to_rgb8(), quality)?, "DCTDecode")
        }
        (ImageEncoding::Jpeg { quality }, ColorMode::Grayscale) => {
            (jpeg::encode_gray_to_jpeg(&image.to_luma8(), quality)?, "DCTDecode")
        }
    };

    Ok(EncodedImage {
        data,
        width,
        height,
        filter,
        color_space: config.color.pdf_color_space(),
        bits_per_component: 8,
    })
}
