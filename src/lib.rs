pub mod compress;
pub mod config;
pub mod encode;
pub mod error;
pub mod ocr;
pub mod page;
pub mod pdf;
pub mod pipeline;
pub mod render;
