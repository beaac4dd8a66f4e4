// tesseract CLIラッパー: ページ画像(PNG) → 単語単位のTSV → TextRegion

use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use image::ImageFormat;
use tracing::{debug, instrument};

use super::{AcceleratorPreference, Device, OcrEngine, select_device};
use crate::error::PdfSearchError;
use crate::page::PageImage;
use crate::page::region::{Quad, TextRegion};

/// Environment variable tesseract's OpenCL backend reads to pick a device.
const OPENCL_DEVICE_ENV: &str = "TESSERACT_OPENCL_DEVICE";

/// TSV row level for a single word.
const WORD_LEVEL: u32 = 5;

#[derive(Debug, Clone)]
pub struct TesseractConfig {
    /// tesseract executable; resolved through PATH when relative.
    pub binary: PathBuf,
    /// Recognition language (`-l`), e.g. `eng`.
    pub language: String,
    pub accelerator: AcceleratorPreference,
    /// OpenCL device index exported when running accelerated.
    pub opencl_device: Option<String>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            accelerator: AcceleratorPreference::Auto,
            opencl_device: None,
        }
    }
}

/// OCR engine backed by the `tesseract` command-line tool.
///
/// tesseract must be available (PATH or `TesseractConfig::binary`).
pub struct TesseractEngine {
    config: TesseractConfig,
    device: Device,
}

impl TesseractEngine {
    /// Check that tesseract runs and decide the device once.
    pub fn open(config: TesseractConfig) -> crate::error::Result<Self> {
        let version = tesseract_version(&config)?;
        debug!(version = %version.lines().next().unwrap_or_default(), "found tesseract");
        let device = select_device(config.accelerator, || Ok(reports_opencl(&version)));
        Ok(Self { config, device })
    }

    fn command(&self, dpi: u32) -> Command {
        let mut cmd = Command::new(&self.config.binary);
        cmd.arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.config.language)
            .arg("--dpi")
            .arg(dpi.to_string())
            .arg("tsv");
        match (self.device, &self.config.opencl_device) {
            (Device::Accelerated, Some(device)) => {
                cmd.env(OPENCL_DEVICE_ENV, device);
            }
            (Device::Accelerated, None) => {}
            (Device::Cpu, _) => {
                cmd.env_remove(OPENCL_DEVICE_ENV);
            }
        }
        cmd
    }
}

impl OcrEngine for TesseractEngine {
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    fn recognize(&mut self, page: &PageImage) -> crate::error::Result<Vec<TextRegion>> {
        let mut png = Vec::new();
        page.image()
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| PdfSearchError::ocr(format!("failed to encode page as PNG: {e}")))?;

        let dpi = page.dpi().round().max(1.0) as u32;
        let output = run_with_stdin(self.command(dpi), &png)?;

        let regions = parse_tsv(&String::from_utf8_lossy(&output.stdout))?;
        debug!(words = regions.len(), "tesseract recognition complete");
        Ok(regions)
    }

    fn device(&self) -> Device {
        self.device
    }
}

/// 子プロセスの標準入力に `input` を流し込み、終了まで待って出力を回収する。
///
/// 書き込みに失敗しても子プロセスは必ず回収し、エラーには stderr を含める。
fn run_with_stdin(mut cmd: Command, input: &[u8]) -> crate::error::Result<Output> {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| PdfSearchError::ocr(format!("failed to execute tesseract: {e}")))?;

    // tesseract reads all of stdin before writing any output.
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(input),
        None => Ok(()),
    };

    let output = child
        .wait_with_output()
        .map_err(|e| PdfSearchError::ocr(format!("tesseract did not finish: {e}")))?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        return Err(PdfSearchError::ocr(format!(
            "tesseract failed (exit code {}): {}",
            output
                .status
                .code()
                .map_or_else(|| "unknown".to_string(), |c| c.to_string()),
            stderr.trim()
        )));
    }
    if let Err(e) = written {
        return Err(PdfSearchError::ocr(format!(
            "failed to send page to tesseract: {e}: {}",
            stderr.trim()
        )));
    }
    Ok(output)
}

fn tesseract_version(config: &TesseractConfig) -> crate::error::Result<String> {
    let output = Command::new(&config.binary)
        .arg("--version")
        .output()
        .map_err(|e| {
            PdfSearchError::ocr(format!(
                "failed to execute {}: {e}",
                config.binary.display()
            ))
        })?;
    if !output.status.success() {
        return Err(PdfSearchError::ocr(format!(
            "{} --version exited with {}",
            config.binary.display(),
            output.status
        )));
    }
    // Older releases print the version banner on stderr.
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(text)
}

/// `tesseract --version` の出力にOpenCLの記載があるかを判定する。
pub fn reports_opencl(version_output: &str) -> bool {
    version_output.lines().any(|line| line.contains("OpenCL"))
}

/// tesseractのTSV出力を単語単位のTextRegionに変換する。
///
/// level 5 (単語) の行のみを対象とし、`conf < 0` の行と空テキストの行は捨てる。
/// 信頼度は 0-100 から 0-1 に正規化する。
pub fn parse_tsv(tsv: &str) -> crate::error::Result<Vec<TextRegion>> {
    let mut regions = Vec::new();

    for (line_no, line) in tsv.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with("level") {
            continue;
        }
        let cols: Vec<&str> = line.splitn(12, '\t').collect();
        if cols.len() < 11 {
            return Err(PdfSearchError::ocr(format!(
                "malformed TSV line {}: expected at least 11 columns, got {}",
                line_no + 1,
                cols.len()
            )));
        }

        let level: u32 = parse_column(cols[0], "level", line_no)?;
        if level != WORD_LEVEL {
            continue;
        }
        let conf: f32 = parse_column(cols[10], "conf", line_no)?;
        let text = cols.get(11).map(|t| t.trim()).unwrap_or_default();
        if conf < 0.0 || text.is_empty() {
            continue;
        }

        let left: f64 = parse_column(cols[6], "left", line_no)?;
        let top: f64 = parse_column(cols[7], "top", line_no)?;
        let width: f64 = parse_column(cols[8], "width", line_no)?;
        let height: f64 = parse_column(cols[9], "height", line_no)?;

        regions.push(TextRegion::new(
            Quad::from_rect(left, top, width, height),
            text,
            (conf / 100.0).clamp(0.0, 1.0),
        ));
    }

    Ok(regions)
}

fn parse_column<T: std::str::FromStr>(
    value: &str,
    name: &str,
    line_no: usize,
) -> crate::error::Result<T> {
    value.trim().parse().map_err(|_| {
        PdfSearchError::ocr(format!(
            "malformed TSV line {}: invalid {} '{}'",
            line_no + 1,
            name,
            value
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_opencl() {
        let with = "tesseract 5.3.0\n leptonica-1.82.0\n Found AVX2\n OpenCL info:\n";
        let without = "tesseract 5.3.0\n leptonica-1.82.0\n Found AVX2\n Found OpenMP 201511\n";
        assert!(reports_opencl(with));
        assert!(!reports_opencl(without));
    }
}
