// オーバーレイ合成: ページ画像 + フィルタ済み領域 → 単一ページPDF

use tracing::{debug, warn};

use crate::encode::{EncodingConfig, encode_image};
use crate::error::PdfSearchError;
use crate::page::PagePair;
use crate::page::region::TextRegion;
use crate::pdf::text_layer::{PageSpace, place_region};
use crate::pdf::writer::SearchablePageWriter;

/// PDF user space unit: 1 point = 1/72 inch.
const POINTS_PER_INCH: f64 = 72.0;

/// One assembled single-page searchable document.
#[derive(Debug, Clone)]
pub struct PageDocument {
    pub bytes: Vec<u8>,
    /// Pixel size of the image embedded in `bytes`.
    pub image_width: u32,
    pub image_height: u32,
    /// Regions that made it into the text layer, in the embedded image's pixel space.
    pub placed_regions: Vec<TextRegion>,
    /// Regions dropped because their text run could not be placed.
    pub skipped_regions: usize,
}

impl PageDocument {
    /// Encoded size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Builds a page document from an image/region pair.
pub trait Compositor {
    fn compose(
        &self,
        pair: &PagePair,
        encoding: &EncodingConfig,
    ) -> crate::error::Result<PageDocument>;
}

/// lopdfで不可視テキスト付きPDFを書き出すコンポジタ。
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfCompositor;

impl Compositor for PdfCompositor {
    fn compose(
        &self,
        pair: &PagePair,
        encoding: &EncodingConfig,
    ) -> crate::error::Result<PageDocument> {
        let page = pair.image();
        if !(page.dpi() > 0.0) {
            return Err(PdfSearchError::compose(format!(
                "page image has invalid resolution {} dpi",
                page.dpi()
            )));
        }

        let encoded = encode_image(page.image(), encoding)?;

        let pts_per_px = POINTS_PER_INCH / page.dpi();
        let page_width_pts = page.width() as f64 * pts_per_px;
        let page_height_pts = page.height() as f64 * pts_per_px;
        let space = PageSpace {
            pts_per_px,
            page_height_pts,
        };

        // 1領域の失敗でページ全体を失敗させない
        let mut placements = Vec::with_capacity(pair.regions().len());
        let mut placed_regions = Vec::with_capacity(pair.regions().len());
        let mut skipped_regions = 0;
        for region in pair.regions() {
            match place_region(region, &space) {
                Ok(placement) => {
                    placements.push(placement);
                    placed_regions.push(region.clone());
                }
                Err(e) => {
                    warn!(text = %region.text, error = %e, "skipping text region");
                    skipped_regions += 1;
                }
            }
        }

        let mut writer = SearchablePageWriter::new();
        writer.write_page(&encoded, page_width_pts, page_height_pts, &placements)?;
        let bytes = writer.save_to_bytes()?;

        debug!(
            width = encoded.width,
            height = encoded.height,
            filter = encoded.filter,
            regions = placements.len(),
            skipped = skipped_regions,
            size = bytes.len(),
            "composed page"
        );

        Ok(PageDocument {
            bytes,
            image_width: encoded.width,
            image_height: encoded.height,
            placed_regions,
            skipped_regions,
        })
    }
}
