use std::sync::Arc;

use anyhow::Result;
use taskpilot_core::api::{AppConfig, CompletionBackend, EventRenderer};

use crate::backend::{CommandBackend, EchoBackend};
use crate::render::{JsonlRenderer, TextRenderer};

pub fn build_backend(cfg: &AppConfig, dry_run: bool) -> Result<Arc<dyn CompletionBackend>> {
    if dry_run {
        return Ok(Arc::new(EchoBackend::new()));
    }
    match CommandBackend::from_config(&cfg.backend) {
        Some(backend) => {
            tracing::info!(cmd = backend.name(), "using command backend");
            Ok(Arc::new(backend))
        }
        None => Err(anyhow::anyhow!(
            "no model backend configured: set [backend].command or TASKPILOT_BACKEND_CMD, or pass --dry-run"
        )),
    }
}

/// Knobs shared by the renderers `build_renderer` can produce.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub ascii_only: bool,
    /// Text: echo streamed task output.
    pub show_output: bool,
    /// JSONL: emit a record for every plan snapshot.
    pub snapshots: bool,
}

pub fn build_renderer(format: &str, opts: RenderOptions) -> Box<dyn EventRenderer> {
    match format {
        "jsonl" => Box::new(JsonlRenderer::new(false).with_snapshots(opts.snapshots)),
        // anything other than jsonl renders as text
        _ => Box::new(TextRenderer::new(opts.ascii_only).with_chunks(opts.show_output)),
    }
}
