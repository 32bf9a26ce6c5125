use serde::Serialize;
use thiserror::Error;

use crate::dsl::filters::Filters;
use crate::dsl::intent::Intent;
use crate::schema::catalog::{ChartType, Dimension, IntentCatalog, IntentName, IntentSpec, Metric};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported intent '{0}'")]
    UnknownIntent(String),

    #[error("unsupported metric '{metric}' for intent '{intent}'")]
    UnsupportedMetric { intent: IntentName, metric: String },

    #[error("unsupported dimension '{dimension}' for intent '{intent}'")]
    UnsupportedDimension { intent: IntentName, dimension: String },
}

/// An intent whose vocabulary has been checked against its catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedIntent {
    pub name: IntentName,
    pub metrics: Vec<Metric>,
    pub dimensions: Vec<Dimension>,
    pub filters: Filters,
    pub chart: ChartType,
    #[serde(skip)]
    pub spec: IntentSpec,
}

impl ValidatedIntent {
    /// First requested dimension, or the intent's primary one.
    pub fn primary_dimension(&self) -> Dimension {
        self.dimensions
            .first()
            .copied()
            .unwrap_or_else(|| self.spec.primary_dimension())
    }
}

pub fn validate_intent(catalog: &IntentCatalog, intent: &Intent) -> Result<ValidatedIntent, ValidationError> {
    let spec = catalog
        .lookup(&intent.name)
        .ok_or_else(|| ValidationError::UnknownIntent(intent.name.clone()))?;

    // Validate metrics
    let metrics = intent
        .metrics
        .iter()
        .map(|raw| {
            Metric::parse(raw)
                .filter(|m| spec.allows_metric(*m))
                .ok_or_else(|| ValidationError::UnsupportedMetric {
                    intent: spec.name,
                    metric: raw.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Validate dimensions
    let dimensions = intent
        .dimensions
        .iter()
        .map(|raw| {
            Dimension::parse(raw)
                .filter(|d| spec.allows_dimension(*d))
                .ok_or_else(|| ValidationError::UnsupportedDimension {
                    intent: spec.name,
                    dimension: raw.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Unknown chart hints fall back to the catalog default
    let chart = intent
        .chart
        .as_deref()
        .and_then(ChartType::parse)
        .unwrap_or(spec.default_chart);

    Ok(ValidatedIntent {
        name: spec.name,
        metrics,
        dimensions,
        filters: Filters::from_map(&intent.filters),
        chart,
        spec: spec.clone(),
    })
}
