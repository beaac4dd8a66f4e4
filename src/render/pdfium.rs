// pdfium-render wrapper: PDF bytes -> page images (in-memory only)

use pdfium_render::prelude::*;
use std::path::PathBuf;

use super::Rasterizer;
use crate::error::PdfSearchError;
use crate::page::PageImage;
use crate::pdf::reader::PdfReader;

/// Resolves the path to the pdfium shared library.
///
/// Search order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` environment variable
/// 2. `vendor/pdfium/lib/` relative to the project root (for development)
fn resolve_pdfium_lib_path() -> crate::error::Result<PathBuf> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Ok(p);
        }
        return Err(PdfSearchError::render(format!(
            "PDFIUM_DYNAMIC_LIB_PATH is set to '{}' but the path does not exist",
            path
        )));
    }

    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let vendor_path = PathBuf::from(&manifest_dir).join("vendor/pdfium/lib");
        if vendor_path.exists() {
            return Ok(vendor_path);
        }
    }

    Err(PdfSearchError::render(
        "pdfium library not found: set PDFIUM_DYNAMIC_LIB_PATH or place libpdfium.so in vendor/pdfium/lib/",
    ))
}

/// Rasterizer backed by a dynamically loaded pdfium library.
///
/// The library is bound once in [`PdfiumRasterizer::new`] and reused for every document.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    pub fn new() -> crate::error::Result<Self> {
        let lib_path = resolve_pdfium_lib_path()?;
        let lib_path_str = lib_path.to_str().ok_or_else(|| {
            PdfSearchError::render("pdfium library path contains non-UTF-8 characters")
        })?;
        let bindings =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(lib_path_str))?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn page_count(&self, document: &[u8]) -> crate::error::Result<u32> {
        Ok(PdfReader::from_bytes(document)?.page_count())
    }

    /// Renders every page at the given DPI.
    ///
    /// PDF default user unit: 1 point = 1/72 inch, so each point maps to
    /// `dpi / 72` pixels.
    fn rasterize(&self, document: &[u8], dpi: u32) -> crate::error::Result<Vec<PageImage>> {
        let doc = self.pdfium.load_pdf_from_byte_slice(document, None)?;

        let mut pages = Vec::new();
        for page in doc.pages().iter() {
            let width_px = (page.width().value * dpi as f32 / 72.0).round() as i32;
            let height_px = (page.height().value * dpi as f32 / 72.0).round() as i32;

            let config = PdfRenderConfig::new()
                .set_target_width(width_px)
                .set_target_height(height_px);
            let bitmap = page.render_with_config(&config)?;
            pages.push(PageImage::new(bitmap.as_image(), dpi as f64));
        }

        Ok(pages)
    }
}
