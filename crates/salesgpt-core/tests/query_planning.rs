mod common;

use common::{int_param, minimal_intent, plan, try_plan};
use salesgpt_core::dsl::compile::PlanningError;
use salesgpt_core::dsl::intent::Intent;
use salesgpt_core::dsl::plan::ParamValue;
use salesgpt_core::schema::catalog::{ChartType, Dimension, IntentName};
use salesgpt_core::sql::bind::{bind, placeholders};
use salesgpt_core::validate::static_check::parse_ok;
use serde_json::json;

fn performers(limit: i64) -> Intent {
    Intent::new(IntentName::TopBottomPerformers, Dimension::Product, ChartType::Bar)
        .with_filter("limit", limit)
        .with_filter("order", "top")
        .with_filter("entity", "product")
}

#[test]
fn every_intent_plans_with_matching_placeholders() {
    for name in IntentName::ALL {
        let planned = plan(&minimal_intent(name));

        let found: Vec<String> = placeholders(&planned.sql).into_iter().collect();
        let mut declared: Vec<String> = planned.params.keys().cloned().collect();
        let mut found_sorted = found.clone();
        found_sorted.sort();
        declared.sort();

        assert_eq!(found_sorted, declared, "{name}: placeholders vs params");
        assert_eq!(planned.label_field, "label");
        assert_eq!(planned.value_field, "value");
    }
}

#[test]
fn every_bound_plan_parses_as_postgres() {
    let filtered = |name: IntentName| {
        minimal_intent(name)
            .with_filter("category", "Toyota")
            .with_filter("year_from", 2020)
            .with_filter("year_to", 2024)
    };

    for name in IntentName::ALL {
        for intent in [minimal_intent(name), filtered(name)] {
            let planned = plan(&intent);
            let bound = bind(&planned).expect("bind");
            assert_eq!(bound.params.len(), planned.params.len());
            assert!(!bound.sql.contains(" :"), "{name}: unbound placeholder in {}", bound.sql);
            parse_ok(&bound.sql).unwrap_or_else(|e| panic!("{name}: {e}\n{}", bound.sql));
        }
    }
}

#[test]
fn sales_by_product_limit_is_clamped() {
    let with_limit = |limit: i64| {
        Intent::new(IntentName::SalesByProduct, Dimension::Product, ChartType::Bar).with_filter("limit", limit)
    };

    assert_eq!(int_param(&plan(&with_limit(0)), "limit"), Some(20));
    assert_eq!(int_param(&plan(&with_limit(-5)), "limit"), Some(20));
    assert_eq!(int_param(&plan(&with_limit(500)), "limit"), Some(100));
    assert_eq!(int_param(&plan(&with_limit(7)), "limit"), Some(7));

    let no_limit = Intent::new(IntentName::SalesByProduct, Dimension::Product, ChartType::Bar);
    assert_eq!(int_param(&plan(&no_limit), "limit"), Some(20));
}

#[test]
fn performer_and_top_product_limits_are_clamped() {
    assert_eq!(int_param(&plan(&performers(999)), "limit"), Some(50));
    assert_eq!(int_param(&plan(&performers(0)), "limit"), Some(5));
    assert_eq!(int_param(&plan(&performers(3)), "limit"), Some(3));

    let top = Intent::new(IntentName::TopProducts, Dimension::Product, ChartType::Bar);
    assert_eq!(int_param(&plan(&top), "limit"), Some(10));
    assert_eq!(int_param(&plan(&top.clone().with_filter("limit", 75)), "limit"), Some(50));
}

#[test]
fn year_count_is_clamped() {
    let multi = |count: i64| {
        Intent::new(IntentName::MultiYearComparison, Dimension::Year, ChartType::Bar).with_filter("year_count", count)
    };

    assert_eq!(int_param(&plan(&multi(0)), "year_count"), Some(3));
    assert_eq!(int_param(&plan(&multi(50)), "year_count"), Some(20));
    assert_eq!(int_param(&plan(&multi(5)), "year_count"), Some(5));
}

#[test]
fn product_trend_without_product_is_a_planning_error() {
    let intent = Intent::new(IntentName::ProductSalesTrend, Dimension::Year, ChartType::Line).with_filter("year_from", 2020);

    let err = try_plan(&intent).unwrap_err();
    assert!(matches!(
        err,
        PlanningError::MissingFilter {
            intent: IntentName::ProductSalesTrend,
            ..
        }
    ));
}

#[test]
fn breakdown_without_year_is_a_planning_error() {
    let intent = Intent::new(IntentName::SalesBreakdownForYear, Dimension::Category, ChartType::Bar);
    let err = try_plan(&intent).unwrap_err();
    assert_eq!(err.to_string(), "sales_breakdown_for_year requires filter year");
}

#[test]
fn products_join_is_elided_without_product_columns() {
    let bare = plan(&Intent::new(IntentName::SalesTrendOverTime, Dimension::Year, ChartType::Line));
    assert!(!bare.sql.contains("products"));

    let scoped = plan(
        &Intent::new(IntentName::SalesTrendOverTime, Dimension::Year, ChartType::Line).with_filter("category", "Toyota"),
    );
    assert!(scoped.sql.contains("JOIN products p ON p.id = s.product_id"));
    assert!(scoped.sql.contains("lower(p.category) = lower(:category)"));
}

#[test]
fn year_list_wins_over_range() {
    let planned = plan(
        &Intent::new(IntentName::SalesTrendOverTime, Dimension::Year, ChartType::Line)
            .with_filter("years", json!([2021, 2023]))
            .with_filter("year_from", 2019),
    );

    assert_eq!(planned.params.get("years"), Some(&ParamValue::IntList(vec![2021, 2023])));
    assert!(!planned.params.contains_key("year_from"));
}

#[test]
fn user_text_only_travels_as_parameters() {
    let planned = plan(
        &Intent::new(IntentName::ProductSalesTrend, Dimension::Year, ChartType::Line)
            .with_filter("product_name", "x'; DROP TABLE sales; --"),
    );

    assert!(!planned.sql.contains("DROP"));
    assert_eq!(
        planned.params.get("product_name"),
        Some(&ParamValue::Text("%x'; DROP TABLE sales; --%".to_string()))
    );
}

#[test]
fn product_name_wildcards_are_added_only_when_missing() {
    let trend = |name: &str| {
        Intent::new(IntentName::ProductSalesTrend, Dimension::Year, ChartType::Line).with_filter("product_name", name)
    };

    assert_eq!(
        plan(&trend("Corolla")).params.get("product_name"),
        Some(&ParamValue::Text("%Corolla%".to_string()))
    );
    assert_eq!(
        plan(&trend("Cor%")).params.get("product_name"),
        Some(&ParamValue::Text("Cor%".to_string()))
    );
}

#[test]
fn comparison_range_becomes_sorted_year_list() {
    let reversed = plan(
        &Intent::new(IntentName::SalesComparisonByYear, Dimension::Year, ChartType::Bar)
            .with_filter("year_from", 2023)
            .with_filter("year_to", 2020),
    );
    assert_eq!(reversed.params.get("years"), Some(&ParamValue::IntList(vec![2020, 2023])));
    assert!(!reversed.params.contains_key("year_from"));
    assert!(reversed.sql.contains("s.year = ANY(:years)"));

    let same = plan(
        &Intent::new(IntentName::SalesComparisonByYear, Dimension::Year, ChartType::Bar)
            .with_filter("year_from", 2022)
            .with_filter("year_to", 2022),
    );
    assert_eq!(same.params.get("years"), Some(&ParamValue::IntList(vec![2022])));
}

#[test]
fn categories_list_is_matched_case_insensitively() {
    let planned = plan(
        &Intent::new(IntentName::TopBottomPerformers, Dimension::Category, ChartType::Bar)
            .with_filter("categories", json!(["Toyota", "NISSAN"])),
    );

    // `categories` only applies to the trend family; performers take a single category.
    assert!(!planned.params.contains_key("categories"));

    let trend = plan(
        &Intent::new(IntentName::SalesTrendOverTime, Dimension::Year, ChartType::Line)
            .with_filter("categories", json!(["Toyota", "NISSAN"])),
    );
    assert_eq!(
        trend.params.get("categories"),
        Some(&ParamValue::TextList(vec!["toyota".to_string(), "nissan".to_string()]))
    );
}

#[test]
fn clarification_plans_an_empty_query() {
    let planned = plan(&minimal_intent(IntentName::ClarificationRequired));
    assert!(planned.params.is_empty());
    assert!(planned.sql.ends_with("WHERE FALSE"));
    assert_eq!(planned.chart_type, ChartType::Line);
}

#[test]
fn top_performers_sql_snapshot() {
    let planned = plan(&performers(5).with_filter("year", 2023));

    insta::assert_snapshot!(planned.sql, @r"
SELECT p.name AS label,
       SUM(s.revenue)::NUMERIC AS value
FROM sales s
JOIN products p ON p.id = s.product_id
WHERE s.year = :year
GROUP BY p.name
ORDER BY SUM(s.revenue) DESC
LIMIT :limit
");
}

#[test]
fn growth_analysis_sql_snapshot() {
    let planned = plan(
        &Intent::new(IntentName::SalesGrowthAnalysis, Dimension::Year, ChartType::Line)
            .with_filter("year_from", 2020)
            .with_filter("year_to", 2023),
    );

    insta::assert_snapshot!(planned.sql, @r"
WITH yearly AS (
  SELECT s.year,
         SUM(s.revenue)::NUMERIC AS revenue
  FROM sales s
  WHERE s.year >= :year_from
    AND s.year <= :year_to
  GROUP BY s.year
)
SELECT y.year::TEXT AS label,
       (y.revenue - LAG(y.revenue) OVER (ORDER BY y.year))::NUMERIC AS value
FROM yearly y
ORDER BY y.year ASC
");
}

#[test]
fn yearly_average_sql_snapshot() {
    let planned = plan(
        &Intent::new(IntentName::MultiYearComparison, Dimension::Year, ChartType::Bar)
            .with_filter("year_count", 5)
            .with_filter("average", true),
    );
    assert_eq!(int_param(&planned, "year_count"), Some(5));

    insta::assert_snapshot!(planned.sql, @r"
WITH max_year AS (
  SELECT MAX(s.year) AS y
  FROM sales s
),
yearly AS (
  SELECT s.year,
         SUM(s.revenue)::NUMERIC AS revenue
  FROM sales s
  WHERE s.year >= (SELECT y FROM max_year) - :year_count + 1
  GROUP BY s.year
)
SELECT 'avg'::TEXT AS label,
       AVG(y.revenue)::NUMERIC AS value
FROM yearly y
");

    let bound = bind(&planned).expect("bind");
    parse_ok(&bound.sql).unwrap_or_else(|e| panic!("{e}\n{}", bound.sql));
}

#[test]
fn binding_numbers_placeholders_in_order_of_use() {
    let planned = plan(&performers(5).with_filter("year", 2023));
    let bound = bind(&planned).unwrap();

    assert!(bound.sql.contains("WHERE s.year = $1::BIGINT"));
    assert!(bound.sql.ends_with("LIMIT $2::BIGINT"));
    assert_eq!(bound.params, vec![ParamValue::Int(2023), ParamValue::Int(5)]);
}
