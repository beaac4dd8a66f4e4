// バッチ実行: 事前スキャン → アイテム毎にラスタライズ → ページ毎にOCR・合成・圧縮

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::compress::CompressionLadder;
use crate::error::PdfSearchError;
use crate::ocr::OcrEngine;
use crate::page::PageImage;
use crate::pipeline::compositor::Compositor;
use crate::pipeline::naming::{item_id, new_output_filename};
use crate::pipeline::page_processor::{assemble_page, recognize_page};
use crate::pipeline::progress::{Phase, ProgressEvent, ProgressSink, ProgressState};
use crate::render::Rasterizer;

/// One source document handed to the batch.
#[derive(Debug, Clone)]
pub struct BatchInput {
    /// Display name used in progress and the manifest.
    pub name: String,
    pub bytes: Vec<u8>,
    /// Dates the emitted filenames.
    pub created: DateTime<Local>,
}

/// Lifecycle of one batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Pending,
    Rasterizing,
    OcrRunning,
    Assembling,
    Done,
    Failed,
}

/// A searchable single-page document ready to be written out.
#[derive(Debug, Clone, Serialize)]
pub struct EmittedDocument {
    pub filename: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub page_index: usize,
    pub size: u64,
    pub budget_met: bool,
    pub profile: String,
    pub attempts: usize,
    /// Regions in the text layer.
    pub regions: usize,
}

/// `page_index` is `None` for failures that cover the whole item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFailure {
    pub item_id: String,
    pub page_index: Option<usize>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub item_id: String,
    pub name: String,
    pub state: ItemState,
    /// Pages the rasterizer produced (0 when the item never got that far).
    pub page_count: usize,
    pub documents: Vec<EmittedDocument>,
    pub failures: Vec<PageFailure>,
}

impl ItemReport {
    fn new(input: &BatchInput) -> Self {
        Self {
            item_id: item_id(&input.bytes),
            name: input.name.clone(),
            state: ItemState::Pending,
            page_count: 0,
            documents: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// An input that could not be read at all. Without source bytes the
    /// identifier is derived from the name.
    pub fn unreadable(name: &str, error: &PdfSearchError) -> Self {
        let mut report = Self {
            item_id: item_id(name.as_bytes()),
            name: name.to_string(),
            state: ItemState::Pending,
            page_count: 0,
            documents: Vec::new(),
            failures: Vec::new(),
        };
        report.fail_item(error);
        report
    }

    pub(crate) fn transition(&mut self, to: ItemState) {
        if self.state != to {
            debug!(item = %self.item_id, from = ?self.state, to = ?to, "item state");
            self.state = to;
        }
    }

    fn fail_item(&mut self, error: &PdfSearchError) {
        self.failures.push(PageFailure {
            item_id: self.item_id.clone(),
            page_index: None,
            reason: error.to_string(),
        });
        self.transition(ItemState::Failed);
    }
}

/// Result of a batch run, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    pub fn documents(&self) -> impl Iterator<Item = &EmittedDocument> {
        self.items.iter().flat_map(|item| item.documents.iter())
    }

    pub fn failures(&self) -> impl Iterator<Item = &PageFailure> {
        self.items.iter().flat_map(|item| item.failures.iter())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Adds items that never entered the batch and restores name order.
    pub fn include(&mut self, items: Vec<ItemReport>) {
        self.items.extend(items);
        self.items.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

/// Per-run parameters.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub dpi: u32,
    /// Maximum size of each emitted document in bytes.
    pub byte_budget: u64,
    pub ladder: CompressionLadder,
}

/// Drives a batch through rasterizer, OCR engine and compositor.
///
/// Items and pages run strictly one after another. A failing page or item
/// is recorded and the batch moves on; `run_batch` itself never fails.
pub struct Orchestrator<'a> {
    rasterizer: &'a dyn Rasterizer,
    ocr: &'a mut dyn OcrEngine,
    compositor: &'a dyn Compositor,
    config: BatchConfig,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        rasterizer: &'a dyn Rasterizer,
        ocr: &'a mut dyn OcrEngine,
        compositor: &'a dyn Compositor,
        config: BatchConfig,
    ) -> Self {
        Self {
            rasterizer,
            ocr,
            compositor,
            config,
        }
    }

    pub fn run_batch(
        &mut self,
        items: Vec<BatchInput>,
        sink: &mut dyn ProgressSink,
    ) -> BatchReport {
        // 事前スキャン: 全アイテムのページ数を処理開始前に確定させる
        let mut scanned = Vec::with_capacity(items.len());
        let mut total = 0u64;
        for input in items {
            let mut report = ItemReport::new(&input);
            let probed = match self.rasterizer.page_count(&input.bytes) {
                Ok(0) => Err(PdfSearchError::input("document has no pages")),
                Ok(n) => Ok(n as usize),
                Err(e @ PdfSearchError::InputError(_)) => Err(e),
                Err(e) => Err(PdfSearchError::input(e.to_string())),
            };
            match probed {
                Ok(n) => {
                    total += n as u64;
                    scanned.push((input, report, Some(n)));
                }
                Err(e) => {
                    warn!(item = %report.item_id, name = %input.name, error = %e, "rejected input");
                    report.fail_item(&e);
                    scanned.push((input, report, None));
                }
            }
        }
        info!(items = scanned.len(), pages = total, "batch started");

        let mut progress = ProgressState::new(total);
        let mut reports = Vec::with_capacity(scanned.len());
        for (input, mut report, probed) in scanned {
            if let Some(probed) = probed {
                self.run_item(&input, &mut report, probed, &mut progress, sink);
            }
            reports.push(report);
        }

        let report = BatchReport { items: reports };
        info!(
            documents = report.documents().count(),
            failures = report.failures().count(),
            "batch finished"
        );
        report
    }

    fn run_item(
        &mut self,
        input: &BatchInput,
        report: &mut ItemReport,
        probed: usize,
        progress: &mut ProgressState,
        sink: &mut dyn ProgressSink,
    ) {
        info!(item = %report.item_id, name = %input.name, pages = probed, "processing item");
        report.transition(ItemState::Rasterizing);

        let pages = match self.rasterize(&input.bytes) {
            Ok(pages) => pages,
            Err(e) => {
                warn!(item = %report.item_id, error = %e, "rasterization failed");
                report.fail_item(&e);
                for page_index in 0..probed {
                    progress.complete_page();
                    sink.publish(&event(
                        input,
                        page_index,
                        probed,
                        progress,
                        Phase::Rasterizing,
                        true,
                    ));
                }
                return;
            }
        };

        if pages.len() != probed {
            warn!(
                item = %report.item_id,
                probed,
                rasterized = pages.len(),
                "page count differs from pre-scan"
            );
            progress.rebase_item(probed as u64, pages.len() as u64);
        }
        let page_count = pages.len();
        report.page_count = page_count;

        for (page_index, image) in pages.into_iter().enumerate() {
            let (phase, failed) = self.run_page(input, report, page_index, image);
            progress.complete_page();
            sink.publish(&event(
                input, page_index, page_count, progress, phase, failed,
            ));
        }

        if report.documents.is_empty() {
            report.transition(ItemState::Failed);
        } else {
            report.transition(ItemState::Done);
        }
        info!(
            item = %report.item_id,
            documents = report.documents.len(),
            failures = report.failures.len(),
            state = ?report.state,
            "item finished"
        );
    }

    fn rasterize(&self, bytes: &[u8]) -> crate::error::Result<Vec<PageImage>> {
        let pages = self.rasterizer.rasterize(bytes, self.config.dpi)?;
        if pages.is_empty() {
            return Err(PdfSearchError::render("rasterizer produced no pages"));
        }
        Ok(pages)
    }

    /// Returns the phase the page reached and whether it failed there.
    fn run_page(
        &mut self,
        input: &BatchInput,
        report: &mut ItemReport,
        page_index: usize,
        image: PageImage,
    ) -> (Phase, bool) {
        report.transition(ItemState::OcrRunning);
        let outcome = recognize_page(&mut *self.ocr, image).and_then(|page| {
            report.transition(ItemState::Assembling);
            assemble_page(
                &self.config.ladder,
                self.compositor,
                &page.pair,
                self.config.byte_budget,
            )
        });

        match outcome {
            Ok(outcome) => {
                if !outcome.budget_met {
                    warn!(
                        item = %report.item_id,
                        page = page_index,
                        size = outcome.document.size(),
                        budget = self.config.byte_budget,
                        "page exceeds byte budget after all profiles"
                    );
                }
                report.documents.push(EmittedDocument {
                    filename: new_output_filename(&input.created),
                    size: outcome.document.size(),
                    regions: outcome.document.placed_regions.len(),
                    bytes: outcome.document.bytes,
                    page_index,
                    budget_met: outcome.budget_met,
                    profile: outcome.profile,
                    attempts: outcome.attempts,
                });
                (Phase::Done, false)
            }
            Err(e) => {
                warn!(item = %report.item_id, page = page_index, error = %e, "page failed");
                report.failures.push(PageFailure {
                    item_id: report.item_id.clone(),
                    page_index: Some(page_index),
                    reason: e.to_string(),
                });
                (e.phase, true)
            }
        }
    }
}

fn event(
    input: &BatchInput,
    page_index: usize,
    total_pages_in_item: usize,
    progress: &ProgressState,
    phase: Phase,
    failed: bool,
) -> ProgressEvent {
    ProgressEvent {
        item_name: input.name.clone(),
        page_index,
        total_pages_in_item,
        completed_pages_overall: progress.completed(),
        total_pages_overall: progress.total(),
        phase,
        failed,
    }
}
