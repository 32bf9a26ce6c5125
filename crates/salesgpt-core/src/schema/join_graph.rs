use crate::dsl::plan::{JoinCondition, JoinType, PlanJoin, PlanTable};

/// One of the two relations the planner is allowed to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef {
    pub name: &'static str,
    pub alias: &'static str,
}

pub const SALES: TableRef = TableRef { name: "sales", alias: "s" };
pub const PRODUCTS: TableRef = TableRef { name: "products", alias: "p" };

impl TableRef {
    pub fn plan_table(self) -> PlanTable {
        PlanTable {
            name: self.name.to_string(),
            alias: self.alias.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct JoinEdge {
    pub from: TableRef,
    pub to: TableRef,
    pub join_type: JoinType,
    /// `(to side, from side)` equality pairs.
    pub on: &'static [(&'static str, &'static str)],
}

pub const EDGES: &[JoinEdge] = &[JoinEdge {
    from: SALES,
    to: PRODUCTS,
    join_type: JoinType::Inner,
    on: &[("p.id", "s.product_id")],
}];

pub fn find_edge(from_alias: &str, to_alias: &str) -> Option<&'static JoinEdge> {
    EDGES
        .iter()
        .find(|e| e.from.alias == from_alias && e.to.alias == to_alias)
}

impl JoinEdge {
    pub fn plan_join(&self) -> PlanJoin {
        PlanJoin {
            left_alias: self.from.alias.to_string(),
            right_alias: self.to.alias.to_string(),
            join_type: self.join_type,
            conditions: self
                .on
                .iter()
                .map(|(left, right)| JoinCondition {
                    left_field: left.to_string(),
                    right_field: right.to_string(),
                })
                .collect(),
        }
    }
}
