// ページ単位処理: OCR → 信頼度フィルタ → 圧縮ラダー

use std::fmt;

use tracing::debug;

use crate::compress::{CompressionLadder, LadderOutcome};
use crate::error::PdfSearchError;
use crate::ocr::OcrEngine;
use crate::page::filter::{CONFIDENCE_THRESHOLD, filter_regions};
use crate::page::{PageImage, PagePair};
use crate::pipeline::compositor::Compositor;
use crate::pipeline::progress::Phase;

/// A page-level failure and the stage it happened in.
#[derive(Debug)]
pub struct StageError {
    pub phase: Phase,
    pub source: PdfSearchError,
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.phase, self.source)
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// OCR result for one page, filtered and paired with its image.
pub struct RecognizedPage {
    pub pair: PagePair,
    /// Regions the engine returned before filtering.
    pub recognized: usize,
}

/// Run OCR on a page and keep the confident regions.
pub fn recognize_page(
    ocr: &mut dyn OcrEngine,
    image: PageImage,
) -> Result<RecognizedPage, StageError> {
    let regions = ocr.recognize(&image).map_err(|source| StageError {
        phase: Phase::Recognizing,
        source,
    })?;
    let recognized = regions.len();
    let kept = filter_regions(regions, CONFIDENCE_THRESHOLD);
    debug!(recognized, kept = kept.len(), "regions filtered");

    Ok(RecognizedPage {
        pair: PagePair::new(image, kept),
        recognized,
    })
}

/// Compose the page and drive it under `budget`.
pub fn assemble_page(
    ladder: &CompressionLadder,
    compositor: &dyn Compositor,
    pair: &PagePair,
    budget: u64,
) -> Result<LadderOutcome, StageError> {
    ladder
        .compress(compositor, pair, budget)
        .map_err(|source| StageError {
            phase: Phase::Assembling,
            source,
        })
}
