// image crate: RGB/Gray → JPEG bytes

use crate::error::PdfSearchError;
use image::{GrayImage, RgbImage};
use std::io::Cursor;

fn check_quality(quality: u8) -> crate::error::Result<()> {
    if !(1..=100).contains(&quality) {
        return Err(PdfSearchError::encode(format!(
            "JPEG quality must be 1-100, got {}",
            quality
        )));
    }
    Ok(())
}

/// Encode an RGB image to JPEG bytes at the given quality (1-100).
pub fn encode_rgb_to_jpeg(rgb: &RgbImage, quality: u8) -> crate::error::Result<Vec<u8>> {
    check_quality(quality)?;
    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)?;
    Ok(buf.into_inner())
}

/// Encode a grayscale image to JPEG bytes at the given quality (1-100).
pub fn encode_gray_to_jpeg(gray: &GrayImage, quality: u8) -> crate::error::Result<Vec<u8>> {
    check_quality(quality)?;
    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    gray.write_with_encoder(encoder)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range_quality() {
        let rgb = RgbImage::new(4, 4);
        assert!(encode_rgb_to_jpeg(&rgb, 0).is_err());
        assert!(encode_rgb_to_jpeg(&rgb, 101).is_err());
    }

    #[test]
    fn test_lower_quality_is_not_larger() {
        let mut rgb = RgbImage::new(64, 64);
        for (x, y, p) in rgb.enumerate_pixels_mut() {
            *p = image::Rgb([(x * 4) as u8, (y * 4) as u8, ((x ^ y) * 4) as u8]);
        }
        let high = encode_rgb_to_jpeg(&rgb, 95).expect("q95");
        let low = encode_rgb_to_jpeg(&rgb, 20).expect("q20");
        assert!(low.len() <= high.len());
    }
}
