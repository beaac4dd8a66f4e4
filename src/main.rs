use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{info, warn};

use pdf_searchable::compress::CompressionLadder;
use pdf_searchable::config::{self, settings::Settings};
use pdf_searchable::ocr::OcrEngine;
use pdf_searchable::ocr::tesseract::{TesseractConfig, TesseractEngine};
use pdf_searchable::pipeline::compositor::PdfCompositor;
use pdf_searchable::pipeline::files;
use pdf_searchable::pipeline::{
    BatchConfig, BatchInput, BatchReport, EmittedDocument, Orchestrator, PageFailure,
    ProgressEvent,
};
use pdf_searchable::render::pdfium::PdfiumRasterizer;

const MANIFEST_FILE: &str = "manifest.json";

/// Written next to the emitted documents.
#[derive(Serialize)]
struct Manifest<'a> {
    generated_at: DateTime<Local>,
    byte_budget: u64,
    documents: Vec<&'a EmittedDocument>,
    failures: Vec<&'a PageFailure>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: pdf_searchable <input_dir> [output_dir]");
        eprintln!("  OCR every PDF in <input_dir> and write one searchable PDF per page.");
        eprintln!("  Output goes to [output_dir] (default: <input_dir>) with a manifest.json.");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("pdf_searchable {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if args.len() > 2 {
        eprintln!("ERROR: expected at most two arguments, got {}", args.len());
        return ExitCode::FAILURE;
    }

    let input_dir = PathBuf::from(&args[0]);
    let output_dir = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| input_dir.clone());

    if !input_dir.is_dir() {
        eprintln!("ERROR: {} is not a directory", input_dir.display());
        return ExitCode::FAILURE;
    }

    let settings = match config::load_settings_for_dir(&input_dir) {
        Ok(s) => s,
        Err(e) => {
            eprintln!(
                "ERROR: Failed to load settings for {}: {e}",
                input_dir.display()
            );
            return ExitCode::FAILURE;
        }
    };

    let report = match run(&input_dir, &output_dir, &settings) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };

    for doc in report.documents() {
        eprintln!(
            "OK: {} ({} bytes, {}{})",
            doc.filename,
            doc.size,
            doc.profile,
            if doc.budget_met { "" } else { ", over budget" }
        );
    }
    for failure in report.failures() {
        match failure.page_index {
            Some(page) => eprintln!(
                "ERROR: {} page {}: {}",
                failure.item_id,
                page + 1,
                failure.reason
            ),
            None => eprintln!("ERROR: {}: {}", failure.item_id, failure.reason),
        }
    }

    if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(
    input_dir: &Path,
    output_dir: &Path,
    settings: &Settings,
) -> pdf_searchable::error::Result<BatchReport> {
    let collected = files::collect_inputs(input_dir)?;
    std::fs::create_dir_all(output_dir)?;

    if collected.is_empty() {
        warn!(dir = %input_dir.display(), "no PDF files found");
    }
    let mut report = if collected.inputs.is_empty() {
        BatchReport::default()
    } else {
        process(collected.inputs, settings)?
    };
    report.include(collected.unreadable);

    files::write_documents(output_dir, &mut report);
    write_manifest(output_dir, &report, settings)?;
    Ok(report)
}

fn process(
    inputs: Vec<BatchInput>,
    settings: &Settings,
) -> pdf_searchable::error::Result<BatchReport> {
    let rasterizer = PdfiumRasterizer::new()?;
    let mut engine = TesseractEngine::open(TesseractConfig {
        binary: settings.tesseract_path.clone(),
        language: settings.language.clone(),
        accelerator: settings.accelerator,
        opencl_device: settings.opencl_device.clone(),
    })?;
    info!(device = ?engine.device(), language = %settings.language, "OCR engine ready");

    let compositor = PdfCompositor;
    let mut orchestrator = Orchestrator::new(
        &rasterizer,
        &mut engine,
        &compositor,
        BatchConfig {
            dpi: settings.dpi,
            byte_budget: settings.byte_budget,
            ladder: CompressionLadder::new(settings.ladder.clone())?,
        },
    );

    let mut sink = |event: &ProgressEvent| info!("{event}");
    Ok(orchestrator.run_batch(inputs, &mut sink))
}

fn write_manifest(
    output_dir: &Path,
    report: &BatchReport,
    settings: &Settings,
) -> pdf_searchable::error::Result<()> {
    let manifest = Manifest {
        generated_at: Local::now(),
        byte_budget: settings.byte_budget,
        documents: report.documents().collect(),
        failures: report.failures().collect(),
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(output_dir.join(MANIFEST_FILE), json)?;
    Ok(())
}
