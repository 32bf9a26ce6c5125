use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::agents::intent::IntentSource;
use crate::agents::observe::{Diagnostic, Observer};
use crate::dsl::intent::Intent;

/// An intent source that may fail, e.g. because it calls a remote service.
#[async_trait]
pub trait FallibleIntentSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn try_extract(&self, question: &str) -> anyhow::Result<Intent>;
}

/// Tries `primary` first and answers from `fallback` on any failure.
pub struct WithFallback<P> {
    primary: P,
    fallback: Arc<dyn IntentSource>,
    observer: Arc<dyn Observer>,
}

impl<P: FallibleIntentSource> WithFallback<P> {
    pub fn new(primary: P, fallback: Arc<dyn IntentSource>, observer: Arc<dyn Observer>) -> Self {
        Self {
            primary,
            fallback,
            observer,
        }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }
}

#[async_trait]
impl<P: FallibleIntentSource> IntentSource for WithFallback<P> {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn extract(&self, question: &str) -> Intent {
        let started = Instant::now();

        match self.primary.try_extract(question).await {
            Ok(intent) => {
                self.observer.observe(&Diagnostic::PrimaryUsed {
                    source: self.primary.name(),
                    elapsed: started.elapsed(),
                });
                intent
            }
            Err(err) => {
                self.observer.observe(&Diagnostic::FallbackUsed {
                    source: self.primary.name(),
                    fallback: self.fallback.name(),
                    reason: format!("{err:#}"),
                });
                self.fallback.extract(question).await
            }
        }
    }
}
