use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfSearchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Input error: {0}")]
    InputError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("OCR error: {0}")]
    OcrError(String),

    #[error("Image encode error: {0}")]
    EncodeError(String),

    #[error("Compose error: {0}")]
    ComposeError(String),

    #[error("PDF write error: {0}")]
    PdfWriteError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`PdfSearchError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl PdfSearchError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create an input (unreadable source document) error.
    input => InputError,
    /// Create a render error.
    render => RenderError,
    /// Create an OCR error.
    ocr => OcrError,
    /// Create an image encode error.
    encode => EncodeError,
    /// Create a region composition error.
    compose => ComposeError,
    /// Create a PDF write error.
    pdf_write => PdfWriteError,
}

impl From<lopdf::Error> for PdfSearchError {
    fn from(e: lopdf::Error) -> Self {
        Self::InputError(e.to_string())
    }
}

impl From<serde_json::Error> for PdfSearchError {
    fn from(e: serde_json::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<serde_yml::Error> for PdfSearchError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<pdfium_render::prelude::PdfiumError> for PdfSearchError {
    fn from(e: pdfium_render::prelude::PdfiumError) -> Self {
        Self::RenderError(e.to_string())
    }
}

impl From<image::ImageError> for PdfSearchError {
    fn from(e: image::ImageError) -> Self {
        Self::EncodeError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PdfSearchError>;
