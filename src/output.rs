//! CLI output formatting — display of pipeline progress events.
//!
//! Pure formatting: events in, display lines out. The binary owns the
//! printing (a printer thread draining the event channel), so these
//! functions stay testable without capturing stdout.

use crate::pipeline::PipelineEvent;

/// Format one pipeline event as display lines.
pub fn format_event(event: &PipelineEvent) -> Vec<String> {
    match event {
        PipelineEvent::FrameLoaded { done, total } => {
            let percent = (*done as f64 / (*total).max(1) as f64 * 100.0).round();
            vec![format!("  loaded {done}/{total} ({percent:.0}%)")]
        }
        PipelineEvent::FrameSkipped { path, reason } => {
            vec![format!("  skipped {}: {reason}", path.display())]
        }
        PipelineEvent::StageStarted { stage, frames } => {
            vec![format!("==> {stage}: {frames} frames")]
        }
        PipelineEvent::Encoded { path, frames } => {
            vec![format!("==> wrote {} ({frames} frames)", path.display())]
        }
    }
}
