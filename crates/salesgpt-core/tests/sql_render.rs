use salesgpt_core::compiler::join_elision::{elide_joins, references_alias};
use salesgpt_core::dsl::plan::*;
use salesgpt_core::sql::render::render_sql;

fn sales_and_products() -> IntermediatePlan {
    IntermediatePlan {
        tables: vec![
            PlanTable { name: "sales".into(), alias: "s".into() },
            PlanTable { name: "products".into(), alias: "p".into() },
            PlanTable { name: "product_features".into(), alias: "pf".into() },
        ],
        joins: vec![
            PlanJoin {
                left_alias: "s".into(),
                right_alias: "pf".into(),
                join_type: JoinType::Left,
                conditions: vec![JoinCondition { left_field: "pf.product_id".into(), right_field: "s.product_id".into() }],
            },
            PlanJoin {
                left_alias: "s".into(),
                right_alias: "p".into(),
                join_type: JoinType::Inner,
                conditions: vec![JoinCondition { left_field: "p.id".into(), right_field: "s.product_id".into() }],
            },
        ],
        projections: vec![PlanProjection::new("p.category", "label"), PlanProjection::new("SUM(s.revenue)", "value")],
        group_by: vec!["p.category".into()],
        ..IntermediatePlan::default()
    }
}

#[test]
fn joins_render_in_alias_order_regardless_of_plan_order() {
    let plan_a = sales_and_products();
    let mut plan_b = plan_a.clone();
    plan_b.joins.reverse();

    let sql_a = render_sql(&plan_a).expect("render A");
    let sql_b = render_sql(&plan_b).expect("render B");

    assert_eq!(sql_a, sql_b, "SQL should be identical for semantically identical plans");
    assert!(sql_a.contains("JOIN products p ON p.id = s.product_id\nLEFT JOIN product_features pf"));
}

#[test]
fn order_by_renders_in_plan_order() {
    let plan = IntermediatePlan {
        order_by: vec![
            PlanOrder { expression: "p.category".into(), direction: SortDirection::Asc },
            PlanOrder { expression: "SUM(s.revenue)".into(), direction: SortDirection::Desc },
        ],
        joins: vec![],
        tables: vec![
            PlanTable { name: "sales".into(), alias: "s".into() },
            PlanTable { name: "products".into(), alias: "p".into() },
        ],
        ..sales_and_products()
    };

    let sql = render_sql(&plan).unwrap();
    insta::assert_snapshot!(sql, @r"
SELECT p.category AS label,
       SUM(s.revenue) AS value
FROM sales s
GROUP BY p.category
ORDER BY p.category ASC, SUM(s.revenue) DESC
");
}

#[test]
fn join_to_unknown_alias_is_an_error() {
    let mut plan = sales_and_products();
    plan.tables.truncate(1);

    let err = render_sql(&plan).unwrap_err();
    assert!(err.to_string().contains("unknown alias"));
}

#[test]
fn select_without_tables_has_no_from() {
    let plan = IntermediatePlan {
        projections: vec![PlanProjection::new("1::TEXT", "label")],
        filters: vec![PlanFilter { expression: "FALSE".into() }],
        ..IntermediatePlan::default()
    };

    assert_eq!(render_sql(&plan).unwrap(), "SELECT 1::TEXT AS label\nWHERE FALSE");
}

#[test]
fn elision_adds_and_removes_the_products_join() {
    let mut plan = IntermediatePlan {
        tables: vec![PlanTable { name: "sales".into(), alias: "s".into() }],
        projections: vec![PlanProjection::new("p.name", "label")],
        ..IntermediatePlan::default()
    };
    elide_joins(&mut plan).unwrap();
    assert_eq!(plan.tables.len(), 2);
    assert_eq!(plan.joins.len(), 1);

    plan.projections = vec![PlanProjection::new("s.year::TEXT", "label")];
    elide_joins(&mut plan).unwrap();
    assert_eq!(plan.tables.len(), 1);
    assert!(plan.joins.is_empty());
}

#[test]
fn alias_references_ignore_params_and_longer_names() {
    assert!(references_alias("lower(p.category) = lower(:category)", "p"));
    assert!(!references_alias("s.product_id = :product_id", "p"));
    assert!(!references_alias("sp.name", "p"));
    assert!(!references_alias(":p.x", "p"));
}
