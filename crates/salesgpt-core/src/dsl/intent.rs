use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::catalog::{ChartType, Dimension, IntentName, Metric};

/// What an analytic question is asking for, as produced by an intent source.
///
/// Fields are kept in their wire form: names are checked against the catalog
/// and filters are typed only once the intent passes validation. This is the
/// exact object shape a remote model must return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Intent {
    #[serde(rename = "intent")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: IndexSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dimensions: IndexSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filters: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub chart: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Intent {
    /// An intent over `total_revenue` grouped by `dimension`.
    pub fn new(name: IntentName, dimension: Dimension, chart: ChartType) -> Self {
        Self {
            name: name.as_str().to_string(),
            metrics: IndexSet::from([Metric::TotalRevenue.as_str().to_string()]),
            dimensions: IndexSet::from([dimension.as_str().to_string()]),
            filters: IndexMap::new(),
            chart: Some(chart.as_str().to_string()),
        }
    }

    pub fn with_filter(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.filters.insert(key.to_string(), value.into());
        self
    }

    pub fn filter(&self, key: &str) -> Option<&serde_json::Value> {
        self.filters.get(key)
    }
}
