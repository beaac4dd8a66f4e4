// テスト用のフェイク: ラスタライザ・OCRエンジン・ノイズ画像

#![allow(dead_code)]

use image::{DynamicImage, RgbImage};
use pdf_searchable::error::PdfSearchError;
use pdf_searchable::ocr::OcrEngine;
use pdf_searchable::page::PageImage;
use pdf_searchable::page::region::{Quad, TextRegion};
use pdf_searchable::render::Rasterizer;

/// Deterministic noise. Flate can barely shrink it, so lossless pages stay large.
pub fn noise_image(width: u32, height: u32, seed: u32) -> DynamicImage {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let img = RgbImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        image::Rgb([r, g, b])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn region(left: f64, top: f64, width: f64, height: f64, text: &str, conf: f32) -> TextRegion {
    TextRegion::new(Quad::from_rect(left, top, width, height), text, conf)
}

/// Documents are plain text descriptions, e.g. `pages=3`, `pages=2;rasterize=fail`,
/// `pages=3;actual=2`. Anything else fails the page-count probe.
pub fn fake_doc(description: &str) -> Vec<u8> {
    description.as_bytes().to_vec()
}

struct DocShape {
    probed: u32,
    actual: u32,
    fail: bool,
}

fn parse_doc(bytes: &[u8]) -> Option<DocShape> {
    let text = std::str::from_utf8(bytes).ok()?;
    let mut probed = None;
    let mut actual = None;
    let mut fail = false;
    for part in text.split(';') {
        let (key, value) = part.split_once('=')?;
        match key {
            "pages" => probed = Some(value.parse().ok()?),
            "actual" => actual = Some(value.parse().ok()?),
            "rasterize" => fail = value == "fail",
            _ => return None,
        }
    }
    let probed = probed?;
    Some(DocShape {
        probed,
        actual: actual.unwrap_or(probed),
        fail,
    })
}

/// Rasterizer over [`fake_doc`] descriptions producing noise pages.
pub struct FakeRasterizer {
    pub width: u32,
    pub height: u32,
}

impl Default for FakeRasterizer {
    fn default() -> Self {
        Self {
            width: 120,
            height: 80,
        }
    }
}

impl Rasterizer for FakeRasterizer {
    fn page_count(&self, document: &[u8]) -> pdf_searchable::error::Result<u32> {
        parse_doc(document)
            .map(|shape| shape.probed)
            .ok_or_else(|| PdfSearchError::input("not a PDF document"))
    }

    fn rasterize(
        &self,
        document: &[u8],
        dpi: u32,
    ) -> pdf_searchable::error::Result<Vec<PageImage>> {
        let shape =
            parse_doc(document).ok_or_else(|| PdfSearchError::render("not a PDF document"))?;
        if shape.fail {
            return Err(PdfSearchError::render("broken page tree"));
        }
        Ok((0..shape.actual)
            .map(|i| PageImage::new(noise_image(self.width, self.height, i), dpi as f64))
            .collect())
    }
}

/// OCR engine that returns the same regions for every page.
/// Calls listed in `fail_calls` (0-based) return an error instead.
#[derive(Default)]
pub struct ScriptedOcr {
    pub regions: Vec<TextRegion>,
    pub fail_calls: Vec<usize>,
    pub calls: usize,
}

impl ScriptedOcr {
    pub fn new(regions: Vec<TextRegion>) -> Self {
        Self {
            regions,
            ..Default::default()
        }
    }
}

impl OcrEngine for ScriptedOcr {
    fn recognize(&mut self, _page: &PageImage) -> pdf_searchable::error::Result<Vec<TextRegion>> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_calls.contains(&call) {
            return Err(PdfSearchError::ocr("recognition crashed"));
        }
        Ok(self.regions.clone())
    }
}
