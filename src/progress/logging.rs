use super::{ProgressEvent, ProgressHandler};
use tracing::{info, warn};

/// Reports build progress through `tracing`; used by the CLI
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started {
                app_name,
                transcript_chars,
            } => info!(app = %app_name, transcript_chars, "Reading transcript"),
            ProgressEvent::PhaseStarted { phase } => info!(phase, "Extracting"),
            ProgressEvent::PhaseComplete {
                phase,
                items,
                duration,
            } => info!(
                phase,
                items,
                elapsed_ms = duration.as_millis() as u64,
                "Extracted"
            ),
            ProgressEvent::Completed {
                screens,
                flows,
                interactions,
                total_time,
            } => info!(
                screens,
                flows,
                interactions,
                elapsed_ms = total_time.as_millis() as u64,
                "Repository ready"
            ),
            ProgressEvent::Failed { phase, error } => {
                warn!(phase, error = %error, "Extraction failed")
            }
        }
    }
}
