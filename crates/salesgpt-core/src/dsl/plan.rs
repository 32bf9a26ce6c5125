use indexmap::IndexMap;
use serde::Serialize;

use crate::schema::catalog::ChartType;

// Each table used in the query, with an alias
#[derive(Debug, Clone, Serialize)]
pub struct PlanTable {
    pub name: String,  // e.g. "sales"
    pub alias: String, // e.g. "s"
}

// A single join between two tables
#[derive(Debug, Clone, Serialize)]
pub struct PlanJoin {
    pub left_alias: String,
    pub right_alias: String,
    pub join_type: JoinType,
    pub conditions: Vec<JoinCondition>,
}

// Equality predicate for a join
#[derive(Debug, Clone, Serialize)]
pub struct JoinCondition {
    pub left_field: String,  // e.g. "p.id"
    pub right_field: String, // e.g. "s.product_id"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JoinType {
    Inner,
    Left,
}

// A projected expression in the SELECT clause
#[derive(Debug, Clone, Serialize)]
pub struct PlanProjection {
    pub expression: String, // e.g. "SUM(s.revenue)::NUMERIC"
    pub alias: Option<String>,
}

impl PlanProjection {
    pub fn new(expression: impl Into<String>, alias: &str) -> Self {
        Self {
            expression: expression.into(),
            alias: Some(alias.to_string()),
        }
    }

    pub fn bare(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            alias: None,
        }
    }
}

// A predicate in the WHERE clause; values only ever appear as `:name` placeholders
#[derive(Debug, Clone, Serialize)]
pub struct PlanFilter {
    pub expression: String, // e.g. "s.year >= :year_from"
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanOrder {
    pub expression: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

// A named sub-query rendered in the WITH clause
#[derive(Debug, Clone, Serialize)]
pub struct PlanCte {
    pub name: String,
    pub query: IntermediatePlan,
}

/// Structured form of one aggregation query. `tables[0]` is the base
/// relation; an empty `tables` renders a SELECT without FROM.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntermediatePlan {
    pub ctes: Vec<PlanCte>,
    pub tables: Vec<PlanTable>,
    pub joins: Vec<PlanJoin>,
    pub projections: Vec<PlanProjection>,
    pub filters: Vec<PlanFilter>,
    pub group_by: Vec<String>,
    pub order_by: Vec<PlanOrder>,

    /// Name of the parameter bound to LIMIT.
    pub limit_param: Option<String>,
}

/// A typed value bound to a `:name` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    IntList(Vec<i64>),
    Text(String),
    TextList(Vec<String>),
}

impl ParamValue {
    /// Postgres type the positional placeholder is cast to.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "BIGINT",
            ParamValue::IntList(_) => "BIGINT[]",
            ParamValue::Text(_) => "TEXT",
            ParamValue::TextList(_) => "TEXT[]",
        }
    }
}

/// The planner's output: a parameterized template plus chart metadata.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedQuery {
    pub sql: String,
    pub params: IndexMap<String, ParamValue>,
    pub chart_type: ChartType,
    pub label_field: String,
    pub value_field: String,
}
