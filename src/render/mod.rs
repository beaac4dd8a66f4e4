pub mod pdfium;

use crate::page::PageImage;

/// Source document → page images.
pub trait Rasterizer {
    /// Page count without rasterizing. Used to size progress before any work starts.
    fn page_count(&self, document: &[u8]) -> crate::error::Result<u32>;

    /// Rasterize every page, in page order, at `dpi`.
    fn rasterize(&self, document: &[u8], dpi: u32) -> crate::error::Result<Vec<PageImage>>;
}
