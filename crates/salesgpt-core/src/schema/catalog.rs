use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every analytic question the planner knows how to answer.
///
/// The first four names are kept for prompts written against the older
/// vocabulary; they plan like their newer counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentName {
    SalesTrend,
    SalesComparison,
    RevenueByCategory,
    TopProducts,
    SalesComparisonByYear,
    SalesTrendOverTime,
    TotalSalesForPeriod,
    SalesByProduct,
    ProductSalesTrend,
    SalesByCategory,
    TopBottomPerformers,
    SalesBreakdownForYear,
    SalesGrowthAnalysis,
    ClarificationRequired,
    MultiYearComparison,
}

impl IntentName {
    pub const ALL: [IntentName; 15] = [
        IntentName::SalesTrend,
        IntentName::SalesComparison,
        IntentName::RevenueByCategory,
        IntentName::TopProducts,
        IntentName::SalesComparisonByYear,
        IntentName::SalesTrendOverTime,
        IntentName::TotalSalesForPeriod,
        IntentName::SalesByProduct,
        IntentName::ProductSalesTrend,
        IntentName::SalesByCategory,
        IntentName::TopBottomPerformers,
        IntentName::SalesBreakdownForYear,
        IntentName::SalesGrowthAnalysis,
        IntentName::ClarificationRequired,
        IntentName::MultiYearComparison,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IntentName::SalesTrend => "sales_trend",
            IntentName::SalesComparison => "sales_comparison",
            IntentName::RevenueByCategory => "revenue_by_category",
            IntentName::TopProducts => "top_products",
            IntentName::SalesComparisonByYear => "sales_comparison_by_year",
            IntentName::SalesTrendOverTime => "sales_trend_over_time",
            IntentName::TotalSalesForPeriod => "total_sales_for_period",
            IntentName::SalesByProduct => "sales_by_product",
            IntentName::ProductSalesTrend => "product_sales_trend",
            IntentName::SalesByCategory => "sales_by_category",
            IntentName::TopBottomPerformers => "top_bottom_performers",
            IntentName::SalesBreakdownForYear => "sales_breakdown_for_year",
            IntentName::SalesGrowthAnalysis => "sales_growth_analysis",
            IntentName::ClarificationRequired => "clarification_required",
            IntentName::MultiYearComparison => "multi_year_comparison",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|n| n.as_str() == raw)
    }

    /// Catalog entry for this intent. Adding a variant without a spec is a
    /// compile error here.
    fn spec(self) -> IntentSpec {
        use ChartType::*;
        use Dimension::*;

        let (dimensions, chart): (&'static [Dimension], ChartType) = match self {
            IntentName::SalesTrend => (&[Year], Line),
            IntentName::SalesComparison => (&[Year], Bar),
            IntentName::RevenueByCategory => (&[Category], Bar),
            IntentName::TopProducts => (&[Product], Bar),
            IntentName::SalesComparisonByYear => (&[Year], Bar),
            IntentName::SalesTrendOverTime => (&[Year], Line),
            IntentName::TotalSalesForPeriod => (&[Year], Bar),
            IntentName::SalesByProduct => (&[Product], Bar),
            IntentName::ProductSalesTrend => (&[Year], Line),
            IntentName::SalesByCategory => (&[Category], Bar),
            IntentName::TopBottomPerformers => (&[Product, Category], Bar),
            IntentName::SalesBreakdownForYear => (&[Product, Category], Bar),
            IntentName::SalesGrowthAnalysis => (&[Year], Line),
            IntentName::ClarificationRequired => (&[Year], Line),
            IntentName::MultiYearComparison => (&[Year], Bar),
        };

        IntentSpec {
            name: self,
            allowed_metrics: &[Metric::TotalRevenue],
            allowed_dimensions: dimensions,
            default_chart: chart,
        }
    }
}

impl fmt::Display for IntentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalRevenue,
}

impl Metric {
    pub const ALL: [Metric; 1] = [Metric::TotalRevenue];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::TotalRevenue => "total_revenue",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.as_str() == raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Year,
    Category,
    Product,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Year, Dimension::Category, Dimension::Product];

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Year => "year",
            Dimension::Category => "category",
            Dimension::Product => "product",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.as_str() == raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
}

impl ChartType {
    pub const ALL: [ChartType; 2] = [ChartType::Line, ChartType::Bar];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentSpec {
    pub name: IntentName,
    pub allowed_metrics: &'static [Metric],
    pub allowed_dimensions: &'static [Dimension],
    pub default_chart: ChartType,
}

impl IntentSpec {
    pub fn allows_metric(&self, metric: Metric) -> bool {
        self.allowed_metrics.contains(&metric)
    }

    pub fn allows_dimension(&self, dimension: Dimension) -> bool {
        self.allowed_dimensions.contains(&dimension)
    }

    /// Dimension used when an intent arrives without one.
    pub fn primary_dimension(&self) -> Dimension {
        self.allowed_dimensions.first().copied().unwrap_or(Dimension::Year)
    }
}

/// Read-only registry of supported intents, keyed by wire name.
#[derive(Debug, Clone)]
pub struct IntentCatalog {
    specs: IndexMap<&'static str, IntentSpec>,
}

impl IntentCatalog {
    pub fn standard() -> Self {
        let specs = IntentName::ALL
            .iter()
            .map(|name| (name.as_str(), name.spec()))
            .collect();
        Self { specs }
    }

    pub fn lookup(&self, name: &str) -> Option<&IntentSpec> {
        self.specs.get(name)
    }

    pub fn get(&self, name: IntentName) -> Option<&IntentSpec> {
        self.specs.get(name.as_str())
    }

    /// Intent names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for IntentCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
