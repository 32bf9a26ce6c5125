use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dsl::plan::PlannedQuery;
use crate::schema::catalog::{ChartType, Metric};

/// One value read back from the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
}

impl Cell {
    /// Numeric view for chart data. Anything non-numeric counts as zero.
    pub fn as_f64(&self) -> f64 {
        match self {
            Cell::Int(v) => *v as f64,
            Cell::Float(v) => *v,
            Cell::Decimal(v) => v.to_f64().unwrap_or(0.0),
            Cell::Text(s) => s.trim().parse().unwrap_or(0.0),
            Cell::Null | Cell::Bool(_) => 0.0,
        }
    }

    /// Label view. `Null` renders as `"None"` so positions stay aligned.
    pub fn as_label(&self) -> String {
        match self {
            Cell::Null => "None".to_string(),
            Cell::Bool(v) => v.to_string(),
            Cell::Int(v) => v.to_string(),
            Cell::Float(v) => v.to_string(),
            Cell::Decimal(v) => v.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

pub type Row = IndexMap<String, Cell>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartResponse {
    pub title: Option<String>,
    pub chart_type: ChartType,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartResponse {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Shape executor rows into a chart. Zero rows give an empty chart with no
/// datasets; otherwise a single `total_revenue` series aligned with the
/// labels.
pub fn assemble_chart(title: Option<String>, plan: &PlannedQuery, rows: &[Row]) -> ChartResponse {
    let (labels, data): (Vec<String>, Vec<f64>) = rows
        .iter()
        .map(|row| {
            let label = row.get(&plan.label_field).unwrap_or(&Cell::Null).as_label();
            let value = row.get(&plan.value_field).map(Cell::as_f64).unwrap_or(0.0);
            (label, value)
        })
        .unzip();

    let datasets = if labels.is_empty() {
        Vec::new()
    } else {
        vec![Dataset {
            label: Metric::TotalRevenue.as_str().to_string(),
            data,
        }]
    };

    ChartResponse {
        title,
        chart_type: plan.chart_type,
        labels,
        datasets,
    }
}
