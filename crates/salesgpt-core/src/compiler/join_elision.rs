use anyhow::{anyhow, Result};

use crate::dsl::plan::IntermediatePlan;
use crate::schema::join_graph::{find_edge, PRODUCTS};

/// True when `expr` mentions `alias.` as a qualified column, not as the tail
/// of a longer identifier or inside a `:param` name.
pub fn references_alias(expr: &str, alias: &str) -> bool {
    let needle = format!("{alias}.");
    expr.match_indices(&needle).any(|(idx, _)| {
        match expr[..idx].chars().next_back() {
            None => true,
            Some(c) => !(c.is_ascii_alphanumeric() || c == '_' || c == ':'),
        }
    })
}

fn plan_references_alias(plan: &IntermediatePlan, alias: &str) -> bool {
    plan.projections.iter().any(|p| references_alias(&p.expression, alias))
        || plan.filters.iter().any(|f| references_alias(&f.expression, alias))
        || plan.group_by.iter().any(|g| references_alias(g, alias))
        || plan.order_by.iter().any(|o| references_alias(&o.expression, alias))
}

/// Add the `sales -> products` join only when some expression needs a
/// products column; plans that touch sales alone scan one table. Applied to
/// every CTE as well.
pub fn elide_joins(plan: &mut IntermediatePlan) -> Result<()> {
    for cte in &mut plan.ctes {
        elide_joins(&mut cte.query)?;
    }

    let Some(base) = plan.tables.first() else {
        return Ok(());
    };

    let needs_products = plan_references_alias(plan, PRODUCTS.alias);
    let has_products = plan.tables.iter().any(|t| t.alias == PRODUCTS.alias);

    if needs_products && !has_products {
        let edge = find_edge(&base.alias, PRODUCTS.alias)
            .ok_or_else(|| anyhow!("no join edge {} -> {}", base.alias, PRODUCTS.alias))?;
        plan.tables.push(PRODUCTS.plan_table());
        plan.joins.push(edge.plan_join());
    } else if !needs_products && has_products {
        plan.tables.retain(|t| t.alias != PRODUCTS.alias);
        plan.joins.retain(|j| j.right_alias != PRODUCTS.alias);
    }

    Ok(())
}
