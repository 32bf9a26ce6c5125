//! Rule-based intent extraction.
//!
//! Rules are tried top to bottom and the first whose predicate holds builds
//! the intent. Order matters: several keyword sets overlap (a question with
//! both "top" and "category" satisfies more than one rule), and the list
//! position decides which reading wins.

use async_trait::async_trait;
use serde_json::json;

use crate::agents::detect::{
    contains_any, extract_category, extract_limit, extract_quoted, extract_two_years, extract_year,
    extract_year_range,
};
use crate::agents::intent::IntentSource;
use crate::dsl::intent::Intent;
use crate::schema::catalog::{ChartType, Dimension, IntentName};

/// Everything the rules look at, computed once per question.
#[derive(Debug, Clone)]
pub struct Question {
    pub lower: String,
    pub category: Option<String>,
    pub year: Option<i64>,
    pub two_years: Option<[i64; 2]>,
    pub year_from: Option<i64>,
    pub year_to: Option<i64>,
    pub limit: Option<i64>,
    pub quoted: Option<String>,
}

impl Question {
    pub fn new(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        let (year_from, year_to) = extract_year_range(&lower);

        Self {
            category: extract_category(raw),
            year: extract_year(&lower),
            two_years: extract_two_years(&lower),
            year_from,
            year_to,
            limit: extract_limit(&lower),
            quoted: extract_quoted(raw),
            lower,
        }
    }

    fn has(&self, needles: &[&str]) -> bool {
        contains_any(&self.lower, needles)
    }

    fn mentions_category(&self) -> bool {
        self.has(&["category", "categories"])
    }

    fn mentions_entity(&self) -> bool {
        self.has(&["product"]) || self.mentions_category()
    }

    fn entity(&self) -> Dimension {
        if self.mentions_category() {
            Dimension::Category
        } else {
            Dimension::Product
        }
    }

    fn has_range(&self) -> bool {
        self.year_from.is_some() || self.year_to.is_some()
    }

    fn mentions_comparison(&self) -> bool {
        let padded = format!(" {} ", self.lower);
        contains_any(&padded, &[" vs ", " vs. ", " versus ", "compare", "comparison"])
    }
}

/// A predicate plus the intent it yields.
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&Question) -> bool,
    pub build: fn(&Question) -> Intent,
    /// Whether an extracted category is merged into the result.
    pub scoped: bool,
}

fn with_year(intent: Intent, q: &Question) -> Intent {
    match q.year {
        Some(year) => intent.with_filter("year", year),
        None => intent,
    }
}

fn with_range(mut intent: Intent, q: &Question) -> Intent {
    if let Some(from) = q.year_from {
        intent = intent.with_filter("year_from", from);
    }
    if let Some(to) = q.year_to {
        intent = intent.with_filter("year_to", to);
    }
    intent
}

fn performers(q: &Question, order: &str, default_limit: i64) -> Intent {
    let entity = q.entity();
    let intent = Intent::new(IntentName::TopBottomPerformers, entity, ChartType::Bar)
        .with_filter("limit", q.limit.filter(|n| *n > 0).unwrap_or(default_limit))
        .with_filter("order", order)
        .with_filter("entity", entity.as_str());
    with_year(intent, q)
}

const TREND_WORDS: &[&str] = &["trend", "over time", "year by year"];
const GROWTH_WORDS: &[&str] = &["year-over-year", "year over year", "yoy", "growth", "declin"];
const DELTA_WORDS: &[&str] = &["gap", "difference", "increase", "decrease"];

pub const RULES: &[Rule] = &[
    Rule {
        name: "category_grouping",
        matches: |q| {
            q.has(&[
                "by category",
                "per category",
                "group by category",
                "grouped by category",
                "breakdown by category",
            ])
        },
        build: |q| with_year(Intent::new(IntentName::SalesByCategory, Dimension::Category, ChartType::Bar), q),
        scoped: true,
    },
    Rule {
        name: "top_performers",
        matches: |q| q.has(&["top", "best-selling", "best selling"]) && q.mentions_entity(),
        build: |q| performers(q, "top", 10),
        scoped: true,
    },
    Rule {
        name: "bottom_performers",
        matches: |q| q.has(&["worst", "lowest", "bottom"]) && q.mentions_entity(),
        build: |q| performers(q, "bottom", 5),
        scoped: true,
    },
    Rule {
        name: "year_breakdown",
        matches: |q| q.has(&["break down", "breakdown", "category-wise", "category wise"]) && q.year.is_some(),
        build: |q| with_year(Intent::new(IntentName::SalesBreakdownForYear, q.entity(), ChartType::Bar), q),
        scoped: true,
    },
    Rule {
        name: "ranged_product_trend",
        matches: |q| q.has_range() && q.quoted.is_some() && q.has(TREND_WORDS),
        build: |q| {
            let intent = Intent::new(IntentName::ProductSalesTrend, Dimension::Year, ChartType::Line);
            let intent = with_range(intent, q);
            match &q.quoted {
                Some(name) => intent.with_filter("product_name", name.as_str()),
                None => intent,
            }
        },
        scoped: true,
    },
    Rule {
        name: "ranged_growth",
        matches: |q| q.has_range() && q.has(GROWTH_WORDS),
        build: |q| with_range(Intent::new(IntentName::SalesGrowthAnalysis, Dimension::Year, ChartType::Line), q),
        scoped: true,
    },
    Rule {
        name: "ranged_trend",
        matches: Question::has_range,
        build: |q| with_range(Intent::new(IntentName::SalesTrendOverTime, Dimension::Year, ChartType::Line), q),
        scoped: true,
    },
    Rule {
        name: "year_comparison",
        matches: |q| q.two_years.is_some() && (q.mentions_comparison() || q.has(DELTA_WORDS)),
        build: |q| {
            let intent = Intent::new(IntentName::SalesComparisonByYear, Dimension::Year, ChartType::Bar);
            match q.two_years {
                Some(years) => intent.with_filter("years", json!(years)),
                None => intent,
            }
        },
        scoped: true,
    },
    Rule {
        name: "last_three_years",
        matches: |q| q.has(&["last 3 years", "last three years"]),
        build: |_| {
            Intent::new(IntentName::MultiYearComparison, Dimension::Year, ChartType::Bar).with_filter("year_count", 3)
        },
        scoped: true,
    },
    Rule {
        name: "yearly_average",
        matches: |q| q.has(&["average"]) && q.has(&["year"]),
        build: |_| {
            Intent::new(IntentName::MultiYearComparison, Dimension::Year, ChartType::Bar)
                .with_filter("year_count", 5)
                .with_filter("average", true)
        },
        scoped: true,
    },
    Rule {
        name: "period_total",
        matches: |q| {
            q.has(&["total sales", "total revenue", "how much did we sell", "how much revenue"]) && q.year.is_some()
        },
        build: |q| with_year(Intent::new(IntentName::TotalSalesForPeriod, Dimension::Year, ChartType::Bar), q),
        scoped: true,
    },
    Rule {
        name: "product_ranking",
        matches: |q| q.has(&["which products", "by product", "across all products", "rank products"]),
        build: |q| with_year(Intent::new(IntentName::SalesByProduct, Dimension::Product, ChartType::Bar), q),
        scoped: true,
    },
    Rule {
        name: "category_comparison",
        matches: |q| {
            q.has(&[
                "category generates",
                "between categories",
                "categories performing",
                "different categories",
            ])
        },
        build: |q| with_year(Intent::new(IntentName::SalesByCategory, Dimension::Category, ChartType::Bar), q),
        scoped: true,
    },
    Rule {
        name: "vague_overview",
        matches: |q| {
            q.has(&[
                "overall",
                "overview",
                "how are we doing",
                "sales performance",
                "business performing",
            ])
        },
        build: |_| Intent::new(IntentName::ClarificationRequired, Dimension::Year, ChartType::Line),
        scoped: false,
    },
];

/// Used when no rule matches.
fn default_intent(q: &Question) -> Intent {
    with_year(
        Intent::new(IntentName::SalesTrendOverTime, Dimension::Year, ChartType::Line),
        q,
    )
}

/// Name of the rule that would fire for `question`, if any.
pub fn matching_rule(question: &str) -> Option<&'static str> {
    let q = Question::new(question);
    RULES.iter().find(|r| (r.matches)(&q)).map(|r| r.name)
}

/// Deterministic, infallible extraction: unmatched text degrades to a
/// revenue trend.
pub fn extract_intent(question: &str) -> Intent {
    let q = Question::new(question);

    let (intent, scoped) = match RULES.iter().find(|r| (r.matches)(&q)) {
        Some(rule) => {
            tracing::debug!(rule = rule.name, "intent rule matched");
            ((rule.build)(&q), rule.scoped)
        }
        None => (default_intent(&q), true),
    };

    match (&q.category, scoped) {
        (Some(category), true) if !intent.filters.contains_key("category") => {
            intent.with_filter("category", category.as_str())
        }
        _ => intent,
    }
}

/// The rule cascade as an [`IntentSource`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedExtractor;

impl RuleBasedExtractor {
    pub fn classify(&self, question: &str) -> Intent {
        extract_intent(question)
    }
}

#[async_trait]
impl IntentSource for RuleBasedExtractor {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn extract(&self, question: &str) -> Intent {
        self.classify(question)
    }
}
