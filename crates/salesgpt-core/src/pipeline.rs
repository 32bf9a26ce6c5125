use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::agents::intent::IntentSource;
use crate::agents::rules::RuleBasedExtractor;
use crate::dsl::compile::{plan_intent, PlanningError};
use crate::dsl::intent::Intent;
use crate::dsl::plan::PlannedQuery;
use crate::dsl::validate::{validate_intent, ValidationError};
use crate::report::chart::{assemble_chart, ChartResponse, Row};
use crate::report::title::derive_title;
use crate::schema::catalog::IntentCatalog;

/// Runs a planned query. Owns its own connection handling; one call is one
/// read.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn fetch(&self, plan: &PlannedQuery) -> anyhow::Result<Vec<Row>>;
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Planning(#[from] PlanningError),

    #[error("{0}")]
    Execution(String),
}

impl QueryError {
    /// Machine-readable code reported alongside [`QueryError::detail`].
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Validation(_) => "validation_error",
            QueryError::Planning(_) => "planner_error",
            QueryError::Execution(_) => "execution_error",
        }
    }

    pub fn detail(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub intent: Intent,
    pub plan: PlannedQuery,
    pub title: String,
}

/// Question in, chart out.
#[derive(Clone)]
pub struct QueryPipeline {
    catalog: Arc<IntentCatalog>,
    source: Arc<dyn IntentSource>,
}

impl QueryPipeline {
    pub fn new(catalog: Arc<IntentCatalog>, source: Arc<dyn IntentSource>) -> Self {
        Self { catalog, source }
    }

    pub fn rule_based() -> Self {
        Self::new(Arc::new(IntentCatalog::standard()), Arc::new(RuleBasedExtractor))
    }

    pub fn catalog(&self) -> &IntentCatalog {
        &self.catalog
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Plan an already extracted intent.
    pub fn plan(&self, intent: Intent) -> Result<PreparedQuery, QueryError> {
        let validated = validate_intent(&self.catalog, &intent)?;
        let plan = plan_intent(&validated)?;
        let title = derive_title(&intent);

        Ok(PreparedQuery { intent, plan, title })
    }

    pub async fn prepare(&self, question: &str) -> Result<PreparedQuery, QueryError> {
        let intent = self.source.extract(question).await;
        tracing::info!(intent = %intent.name, source = self.source.name(), "question classified");
        self.plan(intent)
    }

    pub async fn answer(&self, question: &str, executor: &dyn QueryExecutor) -> Result<ChartResponse, QueryError> {
        let prepared = self.prepare(question).await?;

        let rows = executor
            .fetch(&prepared.plan)
            .await
            .map_err(|e| QueryError::Execution(format!("{e:#}")))?;

        tracing::debug!(rows = rows.len(), "query executed");

        Ok(assemble_chart(Some(prepared.title), &prepared.plan, &rows))
    }
}
