//! Capabilities the engine consumes: planner, task executor, summarizer and
//! the completion backend that model-driven implementations sit on.

pub mod citations;
pub mod model;
pub mod prompts;
pub mod traits;

pub use citations::extract_citations;
pub use model::ModelCapabilities;
pub use traits::{
    CompletionBackend, ExecutionEvent, ExecutionStream, Planner, Summarizer, TaskExecutor,
    TaskOutput, TaskRequest, TextStream,
};
