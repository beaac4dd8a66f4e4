use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::compress::CompressionProfile;
use crate::compress::profile::default_ladder;
use crate::error::PdfSearchError;
use crate::ocr::AcceleratorPreference;

/// 1 MiB
pub const DEFAULT_BYTE_BUDGET: u64 = 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rasterization resolution.
    pub dpi: u32,
    /// Upper bound for each emitted single-page document, in bytes.
    pub byte_budget: u64,
    /// tesseract language code(s), e.g. `eng` or `eng+jpn`.
    pub language: String,
    pub tesseract_path: PathBuf,
    pub accelerator: AcceleratorPreference,
    pub opencl_device: Option<String>,
    /// Profiles tried, in order, when a page is over budget.
    pub ladder: Vec<CompressionProfile>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            dpi: 150,
            byte_budget: DEFAULT_BYTE_BUDGET,
            language: "eng".to_string(),
            tesseract_path: PathBuf::from("tesseract"),
            accelerator: AcceleratorPreference::Auto,
            opencl_device: None,
            ladder: default_ladder(),
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml).map_err(|e| {
            PdfSearchError::config(format!("Failed to parse settings YAML: {e}"))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.dpi == 0 {
            return Err(PdfSearchError::config("dpi must be greater than 0"));
        }
        if self.byte_budget == 0 {
            return Err(PdfSearchError::config("byte_budget must be greater than 0"));
        }
        if self.language.trim().is_empty() {
            return Err(PdfSearchError::config("language must not be empty"));
        }
        if self.ladder.is_empty() {
            return Err(PdfSearchError::config(
                "ladder must contain at least one profile",
            ));
        }
        for profile in &self.ladder {
            profile.validate()?;
        }
        Ok(())
    }
}
