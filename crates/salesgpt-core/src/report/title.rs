use serde_json::Value;

use crate::dsl::intent::Intent;
use crate::schema::catalog::IntentName;

const MAX_LISTED_CATEGORIES: usize = 5;

fn int(v: Option<&Value>) -> Option<i64> {
    v.and_then(Value::as_i64)
}

fn text(v: Option<&Value>) -> Option<&str> {
    v.and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

fn year_phrase(intent: &Intent) -> Option<String> {
    if let Some(year) = int(intent.filter("year")) {
        return Some(format!("in {year}"));
    }

    if let Some(Value::Array(items)) = intent.filter("years") {
        let years: Vec<i64> = items.iter().filter_map(Value::as_i64).collect();
        match years.as_slice() {
            [] => {}
            [a, b] => return Some(format!("({a} vs {b})")),
            _ => {
                let joined: Vec<String> = years.iter().map(i64::to_string).collect();
                return Some(format!("({})", joined.join(", ")));
            }
        }
    }

    match (int(intent.filter("year_from")), int(intent.filter("year_to"))) {
        (Some(from), Some(to)) => return Some(format!("from {from} to {to}")),
        (Some(from), None) => return Some(format!("from {from}")),
        (None, Some(to)) => return Some(format!("up to {to}")),
        (None, None) => {}
    }

    int(intent.filter("year_count"))
        .filter(|n| *n > 0)
        .map(|n| format!("(last {n} years)"))
}

fn scope_phrase(intent: &Intent) -> Option<String> {
    let mut parts = Vec::new();

    if let Some(category) = text(intent.filter("category")) {
        parts.push(format!("category {category}"));
    } else if let Some(Value::Array(items)) = intent.filter("categories") {
        let names: Vec<String> = items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            })
            .filter(|s| !s.is_empty())
            .take(MAX_LISTED_CATEGORIES)
            .collect();
        if !names.is_empty() {
            parts.push(format!("categories {}", names.join(", ")));
        }
    }

    if let Some(name) = text(intent.filter("product_name")) {
        parts.push(format!("product {name}"));
    } else if let Some(id) = int(intent.filter("product_id")) {
        parts.push(format!("product #{id}"));
    }

    (!parts.is_empty()).then(|| format!("({})", parts.join(", ")))
}

/// Human-readable chart title for an extracted intent.
///
/// Works on the raw intent, so a value of the wrong type simply leaves its
/// phrase out.
pub fn derive_title(intent: &Intent) -> String {
    let year = year_phrase(intent);
    let scope = scope_phrase(intent);
    let join = |base: &str| {
        [Some(base.to_string()), year.clone(), scope.clone()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    };

    let limit = int(intent.filter("limit"));

    let Some(name) = IntentName::parse(&intent.name) else {
        return join("Revenue");
    };

    match name {
        IntentName::SalesTrend | IntentName::SalesTrendOverTime => join("Revenue trend"),
        IntentName::SalesComparison | IntentName::SalesComparisonByYear => join("Revenue comparison"),
        IntentName::TotalSalesForPeriod => join("Total revenue"),
        IntentName::TopProducts => join(&format!("Top {} products by revenue", limit.unwrap_or(10))),
        IntentName::SalesByProduct => join("Revenue by product"),
        IntentName::RevenueByCategory | IntentName::SalesByCategory => join("Revenue by category"),
        IntentName::ProductSalesTrend => join("Product revenue trend"),
        IntentName::SalesBreakdownForYear => {
            let dimension = intent.dimensions.first().map(String::as_str).unwrap_or("product");
            join(&format!("Sales breakdown by {dimension}"))
        }
        IntentName::SalesGrowthAnalysis => join("Year-over-year revenue change"),
        IntentName::MultiYearComparison => {
            let average = intent.filter("average").and_then(Value::as_bool).unwrap_or(false);
            if average {
                join("Average yearly revenue")
            } else {
                join("Revenue by year")
            }
        }
        IntentName::TopBottomPerformers => {
            let order = if text(intent.filter("order")) == Some("bottom") {
                "Bottom"
            } else {
                "Top"
            };
            let label = if text(intent.filter("entity")) == Some("category") {
                "categories"
            } else {
                "products"
            };
            join(&format!("{order} {} {label} by revenue", limit.unwrap_or(5)))
        }
        IntentName::ClarificationRequired => "Sales overview (needs clarification)".to_string(),
    }
}
