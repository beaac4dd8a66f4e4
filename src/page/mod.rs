pub mod filter;
pub mod region;

use image::DynamicImage;
use image::imageops::FilterType;

use region::TextRegion;

/// One rasterized page and the resolution it was rasterized at.
///
/// Resizing produces a new `PageImage`; the original is left untouched so
/// geometry recorded against it stays valid.
#[derive(Debug, Clone)]
pub struct PageImage {
    image: DynamicImage,
    dpi: f64,
}

impl PageImage {
    pub fn new(image: DynamicImage, dpi: f64) -> Self {
        Self { image, dpi }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Effective resolution of this raster. Halves when the image is resized by 0.5.
    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    pub fn longest_edge(&self) -> u32 {
        self.width().max(self.height())
    }

    /// Resize by a uniform factor. A factor of exactly 1 returns a copy.
    pub fn resized(&self, scale: f64) -> Self {
        if scale == 1.0 {
            return self.clone();
        }
        let width = scaled_dimension(self.width(), scale);
        let height = scaled_dimension(self.height(), scale);
        Self {
            image: self.image.resize_exact(width, height, FilterType::Lanczos3),
            dpi: self.dpi * scale,
        }
    }
}

fn scaled_dimension(dim: u32, scale: f64) -> u32 {
    ((dim as f64 * scale).round() as u32).max(1)
}

/// A page image together with the OCR regions measured against it.
///
/// The pair is immutable: resizing goes through [`PagePair::rescaled`],
/// which replaces image and geometry together.
#[derive(Debug, Clone)]
pub struct PagePair {
    image: PageImage,
    regions: Vec<TextRegion>,
}

impl PagePair {
    /// Regions are clamped into the image bounds.
    pub fn new(image: PageImage, regions: Vec<TextRegion>) -> Self {
        let (w, h) = (image.width() as f64, image.height() as f64);
        let regions = regions.into_iter().map(|r| r.clamped(w, h)).collect();
        Self { image, regions }
    }

    pub fn image(&self) -> &PageImage {
        &self.image
    }

    pub fn regions(&self) -> &[TextRegion] {
        &self.regions
    }

    /// 画像と全領域を同一の倍率で縮小した新しいペアを返す。
    pub fn rescaled(&self, scale: f64) -> Self {
        if scale == 1.0 {
            return self.clone();
        }
        let image = self.image.resized(scale);
        let regions = self.regions.iter().map(|r| r.scaled(scale)).collect();
        Self::new(image, regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::region::Quad;
    use image::RgbImage;

    fn page(width: u32, height: u32) -> PageImage {
        PageImage::new(DynamicImage::ImageRgb8(RgbImage::new(width, height)), 150.0)
    }

    #[test]
    fn test_resized_scales_dimensions_and_dpi() {
        let resized = page(1600, 400).resized(0.75);
        assert_eq!((resized.width(), resized.height()), (1200, 300));
        assert_eq!(resized.dpi(), 112.5);
    }

    #[test]
    fn test_resized_never_collapses_to_zero() {
        let resized = page(10, 1).resized(0.01);
        assert_eq!((resized.width(), resized.height()), (1, 1));
    }

    #[test]
    fn test_rescaled_moves_regions_with_image() {
        let region = TextRegion::new(Quad::from_rect(400.0, 100.0, 800.0, 40.0), "Total", 0.9);
        let pair = PagePair::new(page(1600, 400), vec![region]);
        let scaled = pair.rescaled(0.75);
        assert_eq!(scaled.image().width(), 1200);
        assert_eq!(
            scaled.regions()[0].quad,
            Quad::from_rect(300.0, 75.0, 600.0, 30.0)
        );
        // Source pair is unchanged.
        assert_eq!(pair.image().width(), 1600);
        assert_eq!(pair.regions()[0].quad.top_left().x, 400.0);
    }

    #[test]
    fn test_new_clamps_out_of_bounds_regions() {
        let region = TextRegion::new(Quad::from_rect(90.0, 10.0, 50.0, 10.0), "edge", 0.9);
        let pair = PagePair::new(page(100, 50), vec![region]);
        let (_, _, x1, _) = pair.regions()[0].quad.bounds();
        assert_eq!(x1, 100.0);
    }
}
