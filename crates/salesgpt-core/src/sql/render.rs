use crate::dsl::plan::{IntermediatePlan, JoinType, SortDirection};
use anyhow::{anyhow, Result};

fn render_sql_inner(plan: &IntermediatePlan) -> Result<String> {
    let mut sections: Vec<String> = Vec::new();

    // WITH
    if !plan.ctes.is_empty() {
        let ctes = plan
            .ctes
            .iter()
            .map(|cte| {
                let body = render_sql_inner(&cte.query)?;
                let indented = body
                    .lines()
                    .map(|l| format!("  {l}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(format!("{} AS (\n{}\n)", cte.name, indented))
            })
            .collect::<Result<Vec<_>>>()?;

        sections.push(format!("WITH {}", ctes.join(",\n")));
    }

    // SELECT
    let select_clause = if plan.projections.is_empty() {
        "SELECT 1".to_string()
    } else {
        let cols = plan
            .projections
            .iter()
            .map(|p| {
                if let Some(alias) = &p.alias {
                    format!("{} AS {}", p.expression, alias)
                } else {
                    p.expression.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(",\n       ");

        format!("SELECT {}", cols)
    };
    sections.push(select_clause);

    // FROM: the first table is the base relation, the rest arrive through joins
    if let Some(base) = plan.tables.first() {
        sections.push(format!("FROM {} {}", base.name, base.alias));
    }

    // JOINs (deterministic)
    let mut joins = plan.joins.clone();
    joins.sort_by(|a, b| {
        (a.left_alias.as_str(), a.right_alias.as_str())
            .cmp(&(b.left_alias.as_str(), b.right_alias.as_str()))
    });

    for j in &joins {
        let join_type = match j.join_type {
            JoinType::Inner => "JOIN",
            JoinType::Left => "LEFT JOIN",
        };

        let on_clause = j
            .conditions
            .iter()
            .map(|c| format!("{} = {}", c.left_field, c.right_field))
            .collect::<Vec<_>>()
            .join(" AND ");

        // lookup table name by alias
        let table = plan
            .tables
            .iter()
            .find(|t| t.alias == j.right_alias)
            .ok_or_else(|| anyhow!("join references unknown alias '{}'", j.right_alias))?;

        sections.push(format!(
            "{} {} {} ON {}",
            join_type, table.name, j.right_alias, on_clause
        ));
    }

    // WHERE
    if !plan.filters.is_empty() {
        let predicates = plan
            .filters
            .iter()
            .map(|f| f.expression.clone())
            .collect::<Vec<_>>()
            .join("\n  AND ");

        sections.push(format!("WHERE {}", predicates));
    }

    if !plan.group_by.is_empty() {
        sections.push(format!("GROUP BY {}", plan.group_by.join(", ")));
    }

    if !plan.order_by.is_empty() {
        let order = plan
            .order_by
            .iter()
            .map(|o| {
                let dir = match o.direction {
                    SortDirection::Asc => "ASC",
                    SortDirection::Desc => "DESC",
                };
                format!("{} {}", o.expression, dir)
            })
            .collect::<Vec<_>>()
            .join(", ");

        sections.push(format!("ORDER BY {}", order));
    }

    if let Some(limit) = &plan.limit_param {
        sections.push(format!("LIMIT :{}", limit));
    }

    Ok(sections.join("\n"))
}

/// Render an intermediate plan into a SQL template with `:name` placeholders.
pub fn render_sql(plan: &IntermediatePlan) -> Result<String> {
    render_sql_inner(plan)
}
