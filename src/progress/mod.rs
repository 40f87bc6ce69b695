//! Progress reporting for repository builds
//!
//! [`RepositoryBuilder`](crate::pipeline::RepositoryBuilder) emits one
//! `Started`, then a `PhaseStarted`/`PhaseComplete` pair per extraction
//! phase, and finally `Completed` or `Failed`.

mod logging;

pub use logging::LoggingHandler;

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started {
        app_name: String,
        transcript_chars: usize,
    },

    PhaseStarted {
        phase: &'static str,
    },

    /// `items` counts what the phase extracted (screens, flows or interactions)
    PhaseComplete {
        phase: &'static str,
        items: usize,
        duration: Duration,
    },

    Completed {
        screens: usize,
        flows: usize,
        interactions: usize,
        total_time: Duration,
    },

    Failed {
        phase: &'static str,
        error: String,
    },
}

impl ProgressEvent {
    /// Extraction phase the event belongs to, if any
    pub fn phase(&self) -> Option<&'static str> {
        match self {
            ProgressEvent::PhaseStarted { phase }
            | ProgressEvent::PhaseComplete { phase, .. }
            | ProgressEvent::Failed { phase, .. } => Some(*phase),
            ProgressEvent::Started { .. } | ProgressEvent::Completed { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Completed { .. } | ProgressEvent::Failed { .. }
        )
    }
}

/// Receives build progress. Called synchronously from the build task, so
/// implementations should return quickly.
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}
