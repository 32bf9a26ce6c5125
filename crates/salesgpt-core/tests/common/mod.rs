#![allow(dead_code)]

use salesgpt_core::dsl::compile::{plan_intent, PlanningError};
use salesgpt_core::dsl::intent::Intent;
use salesgpt_core::dsl::plan::{ParamValue, PlannedQuery};
use salesgpt_core::dsl::validate::{validate_intent, ValidatedIntent};
use salesgpt_core::schema::catalog::{IntentCatalog, IntentName};

pub fn validated(intent: &Intent) -> ValidatedIntent {
    validate_intent(&IntentCatalog::standard(), intent).expect("intent should validate")
}

pub fn try_plan(intent: &Intent) -> Result<PlannedQuery, PlanningError> {
    plan_intent(&validated(intent))
}

pub fn plan(intent: &Intent) -> PlannedQuery {
    try_plan(intent).expect("intent should plan")
}

/// The catalog's own shape for `name`, with whatever filters that intent
/// cannot plan without.
pub fn minimal_intent(name: IntentName) -> Intent {
    let catalog = IntentCatalog::standard();
    let spec = catalog.get(name).expect("catalog entry");
    let intent = Intent::new(name, spec.primary_dimension(), spec.default_chart);

    match name {
        IntentName::ProductSalesTrend => intent.with_filter("product_name", "Corolla"),
        IntentName::SalesBreakdownForYear => intent.with_filter("year", 2022),
        _ => intent,
    }
}

pub fn int_param(plan: &PlannedQuery, name: &str) -> Option<i64> {
    match plan.params.get(name) {
        Some(ParamValue::Int(v)) => Some(*v),
        _ => None,
    }
}
