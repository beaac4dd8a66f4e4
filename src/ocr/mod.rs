// OCRエンジン境界: トレイト定義とアクセラレータのフォールバック

pub mod tesseract;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::page::PageImage;
use crate::page::region::TextRegion;

/// Requested OCR execution device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceleratorPreference {
    /// Use an accelerator when the engine reports one, otherwise run on CPU.
    #[default]
    Auto,
    /// Never use an accelerator.
    Cpu,
}

/// Device an engine actually runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Accelerated,
    Cpu,
}

/// Turns a page image into text regions measured against that image.
///
/// `recognize` takes `&mut self`: engine handles are not shared between
/// concurrent callers.
pub trait OcrEngine {
    fn recognize(&mut self, page: &PageImage) -> crate::error::Result<Vec<TextRegion>>;

    fn device(&self) -> Device {
        Device::Cpu
    }
}

/// エンジン構築時に一度だけデバイスを決定する。
///
/// アクセラレータが使えない場合はエラーにせず、警告を1回出してCPUで続行する。
pub fn select_device<F>(preference: AcceleratorPreference, probe: F) -> Device
where
    F: FnOnce() -> crate::error::Result<bool>,
{
    match preference {
        AcceleratorPreference::Cpu => Device::Cpu,
        AcceleratorPreference::Auto => match probe() {
            Ok(true) => {
                info!("OCR accelerator available");
                Device::Accelerated
            }
            Ok(false) => {
                warn!("OCR accelerator unavailable, continuing on CPU");
                Device::Cpu
            }
            Err(e) => {
                warn!(error = %e, "OCR accelerator probe failed, continuing on CPU");
                Device::Cpu
            }
        },
    }
}
