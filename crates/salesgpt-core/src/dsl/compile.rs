use indexmap::IndexMap;
use thiserror::Error;

use crate::compiler::join_elision::elide_joins;
use crate::dsl::filters::{Entity, Filters, RankOrder};
use crate::dsl::plan::{
    IntermediatePlan, ParamValue, PlanCte, PlanFilter, PlanOrder, PlanProjection, PlanTable, PlannedQuery,
    SortDirection,
};
use crate::dsl::validate::ValidatedIntent;
use crate::schema::catalog::{ChartType, Dimension, IntentName};
use crate::schema::join_graph::SALES;
use crate::sql::bind::placeholders;
use crate::sql::render::render_sql;

pub const LABEL_FIELD: &str = "label";
pub const VALUE_FIELD: &str = "value";

const REVENUE_SUM: &str = "SUM(s.revenue)::NUMERIC";

#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("{intent} requires filter {filter}")]
    MissingFilter { intent: IntentName, filter: &'static str },

    #[error("template placeholders {placeholders:?} do not match parameters {params:?}")]
    ParameterMismatch { placeholders: Vec<String>, params: Vec<String> },

    #[error(transparent)]
    Render(#[from] anyhow::Error),
}

/// Accepted range for a positive integer filter. Values below 1 mean "not
/// given" and take the default; values above `max` are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub max: i64,
    pub default: i64,
}

impl Bounds {
    pub fn resolve(self, value: Option<i64>) -> i64 {
        match value {
            Some(v) if v >= 1 => v.min(self.max),
            _ => self.default,
        }
    }
}

pub const SALES_BY_PRODUCT_LIMIT: Bounds = Bounds { max: 100, default: 20 };
pub const TOP_BOTTOM_LIMIT: Bounds = Bounds { max: 50, default: 5 };
pub const TOP_PRODUCTS_LIMIT: Bounds = Bounds { max: 50, default: 10 };
pub const YEAR_COUNT: Bounds = Bounds { max: 20, default: 3 };

/// Accumulates one query's clauses together with the parameters its
/// placeholders refer to.
#[derive(Debug, Default)]
struct QueryBuilder {
    plan: IntermediatePlan,
    params: IndexMap<String, ParamValue>,
}

impl QueryBuilder {
    fn over(table: PlanTable) -> Self {
        let mut q = Self::default();
        q.plan.tables.push(table);
        q
    }

    fn over_sales() -> Self {
        Self::over(SALES.plan_table())
    }

    fn select(&mut self, expression: &str, alias: &str) {
        self.plan.projections.push(PlanProjection::new(expression, alias));
    }

    fn predicate(&mut self, expression: impl Into<String>) {
        self.plan.filters.push(PlanFilter {
            expression: expression.into(),
        });
    }

    fn param(&mut self, name: &str, value: ParamValue) {
        self.params.insert(name.to_string(), value);
    }

    fn bind(&mut self, expression: &str, name: &str, value: ParamValue) {
        self.predicate(expression);
        self.param(name, value);
    }

    fn group_by(&mut self, expression: &str) {
        self.plan.group_by.push(expression.to_string());
    }

    fn order_by(&mut self, expression: &str, direction: SortDirection) {
        self.plan.order_by.push(PlanOrder {
            expression: expression.to_string(),
            direction,
        });
    }

    fn limit(&mut self, value: i64) {
        self.plan.limit_param = Some("limit".to_string());
        self.param("limit", ParamValue::Int(value));
    }

    fn with_cte(&mut self, name: &str, inner: QueryBuilder) {
        self.params.extend(inner.params);
        self.plan.ctes.push(PlanCte {
            name: name.to_string(),
            query: inner.plan,
        });
    }

    // --- filter fragments; each one tests the typed value before emitting SQL ---

    fn year_exact(&mut self, f: &Filters) -> bool {
        match f.year {
            Some(year) => {
                self.bind("s.year = :year", "year", ParamValue::Int(year));
                true
            }
            None => false,
        }
    }

    fn year_list(&mut self, f: &Filters) -> bool {
        match &f.years {
            Some(years) => {
                self.bind("s.year = ANY(:years)", "years", ParamValue::IntList(years.clone()));
                true
            }
            None => false,
        }
    }

    fn year_range(&mut self, f: &Filters) {
        if let Some(from) = f.year_from {
            self.bind("s.year >= :year_from", "year_from", ParamValue::Int(from));
        }
        if let Some(to) = f.year_to {
            self.bind("s.year <= :year_to", "year_to", ParamValue::Int(to));
        }
    }

    /// Explicit list wins over a range.
    fn years_or_range(&mut self, f: &Filters) {
        if !self.year_list(f) {
            self.year_range(f);
        }
    }

    /// List, then single year, then range.
    fn any_year_form(&mut self, f: &Filters) {
        if !self.year_list(f) {
            self.year_or_range(f);
        }
    }

    /// A single year wins over a range.
    fn year_or_range(&mut self, f: &Filters) {
        if !self.year_exact(f) {
            self.year_range(f);
        }
    }

    fn product_id(&mut self, f: &Filters) -> bool {
        match f.product_id {
            Some(id) => {
                self.bind("s.product_id = :product_id", "product_id", ParamValue::Int(id));
                true
            }
            None => false,
        }
    }

    fn category(&mut self, f: &Filters) -> bool {
        match &f.category {
            Some(category) => {
                self.bind(
                    "lower(p.category) = lower(:category)",
                    "category",
                    ParamValue::Text(category.clone()),
                );
                true
            }
            None => false,
        }
    }

    /// Single category, otherwise the element-wise list form.
    fn category_or_categories(&mut self, f: &Filters) {
        if self.category(f) {
            return;
        }
        if let Some(categories) = &f.categories {
            let lowered = categories.iter().map(|c| c.to_lowercase()).collect();
            self.bind(
                "lower(p.category) = ANY(:categories)",
                "categories",
                ParamValue::TextList(lowered),
            );
        }
    }

    fn product_name(&mut self, f: &Filters) -> bool {
        match &f.product_name {
            Some(name) => {
                let pattern = if name.contains('%') {
                    name.clone()
                } else {
                    format!("%{name}%")
                };
                self.bind("p.name ILIKE :product_name", "product_name", ParamValue::Text(pattern));
                true
            }
            None => false,
        }
    }

    // --- result shapes ---

    /// One row per year, ascending.
    fn yearly_series(&mut self) {
        self.select("s.year::TEXT", LABEL_FIELD);
        self.select(REVENUE_SUM, VALUE_FIELD);
        self.group_by("s.year");
        self.order_by("s.year", SortDirection::Asc);
    }

    /// One row per `label_expr`, ranked by revenue.
    fn ranked(&mut self, label_expr: &str, direction: SortDirection) {
        self.select(label_expr, LABEL_FIELD);
        self.select(REVENUE_SUM, VALUE_FIELD);
        self.group_by(label_expr);
        self.order_by("SUM(s.revenue)", direction);
    }

    fn finish(mut self, chart_type: ChartType) -> Result<PlannedQuery, PlanningError> {
        elide_joins(&mut self.plan)?;
        let sql = render_sql(&self.plan)?;

        let found = placeholders(&sql);
        let matches = found.len() == self.params.len() && found.iter().all(|n| self.params.contains_key(n));
        if !matches {
            return Err(PlanningError::ParameterMismatch {
                placeholders: found.into_iter().collect(),
                params: self.params.keys().cloned().collect(),
            });
        }

        Ok(PlannedQuery {
            sql,
            params: self.params,
            chart_type,
            label_field: LABEL_FIELD.to_string(),
            value_field: VALUE_FIELD.to_string(),
        })
    }
}

fn label_column(entity: Entity) -> &'static str {
    match entity {
        Entity::Product => "p.name",
        Entity::Category => "p.category",
    }
}

fn entity_for(dimension: Dimension) -> Entity {
    match dimension {
        Dimension::Category => Entity::Category,
        Dimension::Product | Dimension::Year => Entity::Product,
    }
}

/// Map a validated intent to its parameterized aggregation query.
pub fn plan_intent(intent: &ValidatedIntent) -> Result<PlannedQuery, PlanningError> {
    let f = &intent.filters;
    let chart = intent.chart;

    match intent.name {
        IntentName::SalesTrend | IntentName::SalesComparison | IntentName::SalesTrendOverTime => {
            let mut q = QueryBuilder::over_sales();
            q.any_year_form(f);
            q.product_id(f);
            q.category_or_categories(f);
            q.product_name(f);
            q.yearly_series();
            q.finish(chart)
        }

        IntentName::SalesComparisonByYear => {
            let mut q = QueryBuilder::over_sales();
            if !q.year_list(f) {
                // Range endpoints are compared as two discrete years.
                let mut years: Vec<i64> = [f.year_from, f.year_to].into_iter().flatten().collect();
                years.sort_unstable();
                years.dedup();
                if !years.is_empty() {
                    q.bind("s.year = ANY(:years)", "years", ParamValue::IntList(years));
                }
            }
            q.product_id(f);
            q.category(f);
            q.product_name(f);
            q.yearly_series();
            q.finish(chart)
        }

        IntentName::TotalSalesForPeriod => {
            let mut q = QueryBuilder::over_sales();
            let label = if q.year_exact(f) {
                f.year.map(|y| y.to_string()).unwrap_or_default()
            } else if q.year_list(f) {
                let years = f.years.as_deref().unwrap_or_default();
                years.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
            } else {
                q.year_range(f);
                match (f.year_from, f.year_to) {
                    (Some(from), Some(to)) => format!("{from}-{to}"),
                    _ => "total".to_string(),
                }
            };
            q.product_id(f);
            q.category(f);
            q.product_name(f);
            q.select(":label::TEXT", LABEL_FIELD);
            q.select("COALESCE(SUM(s.revenue), 0)::NUMERIC", VALUE_FIELD);
            q.param("label", ParamValue::Text(label));
            q.finish(chart)
        }

        IntentName::SalesByProduct => {
            let mut q = QueryBuilder::over_sales();
            q.year_or_range(f);
            q.category(f);
            q.ranked("p.name", SortDirection::Desc);
            q.limit(SALES_BY_PRODUCT_LIMIT.resolve(f.limit));
            q.finish(chart)
        }

        IntentName::ProductSalesTrend => {
            let mut q = QueryBuilder::over_sales();
            q.years_or_range(f);
            if !q.product_id(f) && !q.product_name(f) {
                return Err(PlanningError::MissingFilter {
                    intent: intent.name,
                    filter: "product_id or product_name",
                });
            }
            q.yearly_series();
            q.finish(chart)
        }

        IntentName::SalesByCategory => {
            let mut q = QueryBuilder::over_sales();
            q.year_or_range(f);
            q.ranked("p.category", SortDirection::Desc);
            q.finish(chart)
        }

        IntentName::RevenueByCategory => {
            let mut q = QueryBuilder::over_sales();
            q.year_exact(f);
            q.ranked("p.category", SortDirection::Desc);
            q.finish(chart)
        }

        IntentName::TopProducts => {
            let mut q = QueryBuilder::over_sales();
            q.year_exact(f);
            q.ranked("p.name", SortDirection::Desc);
            q.limit(TOP_PRODUCTS_LIMIT.resolve(f.limit));
            q.finish(chart)
        }

        IntentName::TopBottomPerformers => {
            let entity = f.entity.unwrap_or_else(|| entity_for(intent.primary_dimension()));
            // Only the two enum values ever reach the template.
            let direction = match f.order.unwrap_or(RankOrder::Top) {
                RankOrder::Top => SortDirection::Desc,
                RankOrder::Bottom => SortDirection::Asc,
            };

            let mut q = QueryBuilder::over_sales();
            q.year_or_range(f);
            q.category(f);
            q.ranked(label_column(entity), direction);
            q.limit(TOP_BOTTOM_LIMIT.resolve(f.limit));
            q.finish(chart)
        }

        IntentName::SalesBreakdownForYear => {
            let mut q = QueryBuilder::over_sales();
            if !q.year_exact(f) {
                return Err(PlanningError::MissingFilter {
                    intent: intent.name,
                    filter: "year",
                });
            }
            q.ranked(label_column(entity_for(intent.primary_dimension())), SortDirection::Desc);
            q.finish(chart)
        }

        IntentName::SalesGrowthAnalysis => {
            let mut yearly = QueryBuilder::over_sales();
            yearly.years_or_range(f);
            yearly.category(f);
            yearly.plan.projections.push(PlanProjection::bare("s.year"));
            yearly.select(REVENUE_SUM, "revenue");
            yearly.group_by("s.year");

            // The first year has no predecessor, so its delta is NULL.
            let mut q = QueryBuilder::over(PlanTable {
                name: "yearly".to_string(),
                alias: "y".to_string(),
            });
            q.with_cte("yearly", yearly);
            q.select("y.year::TEXT", LABEL_FIELD);
            q.select(
                "(y.revenue - LAG(y.revenue) OVER (ORDER BY y.year))::NUMERIC",
                VALUE_FIELD,
            );
            q.order_by("y.year", SortDirection::Asc);
            q.finish(chart)
        }

        IntentName::MultiYearComparison => {
            let year_count = YEAR_COUNT.resolve(f.year_count);

            let mut max_year = QueryBuilder::over_sales();
            max_year.select("MAX(s.year)", "y");

            let window = "s.year >= (SELECT y FROM max_year) - :year_count + 1";

            if f.average {
                let mut yearly = QueryBuilder::over_sales();
                yearly.bind(window, "year_count", ParamValue::Int(year_count));
                yearly.category(f);
                yearly.plan.projections.push(PlanProjection::bare("s.year"));
                yearly.select(REVENUE_SUM, "revenue");
                yearly.group_by("s.year");

                let mut q = QueryBuilder::over(PlanTable {
                    name: "yearly".to_string(),
                    alias: "y".to_string(),
                });
                q.with_cte("max_year", max_year);
                q.with_cte("yearly", yearly);
                q.select("'avg'::TEXT", LABEL_FIELD);
                q.select("AVG(y.revenue)::NUMERIC", VALUE_FIELD);
                return q.finish(chart);
            }

            let mut q = QueryBuilder::over_sales();
            q.with_cte("max_year", max_year);
            q.bind(window, "year_count", ParamValue::Int(year_count));
            q.category(f);
            q.yearly_series();
            q.finish(chart)
        }

        IntentName::ClarificationRequired => {
            // Deliberately empty: the caller asks a follow-up instead of guessing.
            let mut q = QueryBuilder::default();
            q.select("1::TEXT", LABEL_FIELD);
            q.select("0::NUMERIC", VALUE_FIELD);
            q.predicate("FALSE");
            q.finish(chart)
        }
    }
}
