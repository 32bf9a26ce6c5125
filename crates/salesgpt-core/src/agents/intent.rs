use async_trait::async_trait;

use crate::dsl::intent::Intent;

/// Turns a natural-language question into an [`Intent`].
///
/// Implementations never fail outward: a source that can fail internally is
/// wrapped so that every call still yields some intent.
#[async_trait]
pub trait IntentSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, question: &str) -> Intent;
}
