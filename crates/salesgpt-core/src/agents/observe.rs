//! Diagnostics emitted by intent sources.

use std::time::Duration;

/// Something worth reporting about one extraction attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// The primary source answered and its intent was used.
    PrimaryUsed { source: &'static str, elapsed: Duration },
    /// The primary source failed; the fallback's intent was used instead.
    FallbackUsed {
        source: &'static str,
        fallback: &'static str,
        reason: String,
    },
    /// A remote source is configured but cannot run.
    SourceUnavailable { source: &'static str, reason: String },
}

/// Receives [`Diagnostic`]s. Never influences what gets extracted.
pub trait Observer: Send + Sync {
    fn observe(&self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn observe(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::PrimaryUsed { source, elapsed } => {
                tracing::debug!(source, elapsed_ms = elapsed.as_millis() as u64, "intent extracted");
            }
            Diagnostic::FallbackUsed {
                source,
                fallback,
                reason,
            } => {
                tracing::warn!(source, fallback, %reason, "intent source failed, using fallback");
            }
            Diagnostic::SourceUnavailable { source, reason } => {
                tracing::warn!(source, %reason, "intent source unavailable");
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn observe(&self, _diagnostic: &Diagnostic) {}
}
