pub mod compositor;
pub mod files;
pub mod naming;
pub mod orchestrator;
pub mod page_processor;
pub mod progress;

pub use orchestrator::{
    BatchConfig, BatchInput, BatchReport, EmittedDocument, ItemReport, ItemState, Orchestrator,
    PageFailure,
};
pub use progress::{Phase, ProgressEvent, ProgressSink};
