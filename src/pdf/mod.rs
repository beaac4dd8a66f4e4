pub mod reader;
pub mod text_layer;
pub mod writer;
