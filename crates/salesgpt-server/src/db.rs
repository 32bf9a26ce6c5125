use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, NoTls};

use salesgpt_core::dsl::plan::{ParamValue, PlannedQuery};
use salesgpt_core::pipeline::QueryExecutor;
use salesgpt_core::report::chart::{Cell, Row};
use salesgpt_core::sql::bind::bind;
use salesgpt_core::validate::static_check::parse_ok;

/// Open a client and drive its connection on a background task.
pub async fn connect(database_url: &str) -> anyhow::Result<Arc<Client>> {
    let (client, connection) = tokio_postgres::connect(database_url, NoTls)
        .await
        .context("connecting to Postgres")?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(error = %e, "db connection error");
        }
    });

    Ok(Arc::new(client))
}

/// Runs planned queries as one bound statement each.
#[derive(Clone)]
pub struct PgExecutor {
    client: Arc<Client>,
}

impl PgExecutor {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

fn param_ref(value: &ParamValue) -> &(dyn ToSql + Sync) {
    match value {
        ParamValue::Int(v) => v,
        ParamValue::IntList(v) => v,
        ParamValue::Text(v) => v,
        ParamValue::TextList(v) => v,
    }
}

fn read_cell(row: &tokio_postgres::Row, idx: usize, ty: &Type) -> anyhow::Result<Cell> {
    let cell = if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR || *ty == Type::NAME {
        row.try_get::<_, Option<String>>(idx)?.map(Cell::Text)
    } else if *ty == Type::NUMERIC {
        row.try_get::<_, Option<Decimal>>(idx)?.map(Cell::Decimal)
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)?.map(Cell::Int)
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)?.map(|v| Cell::Int(v.into()))
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)?.map(|v| Cell::Int(v.into()))
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx)?.map(Cell::Float)
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)?.map(|v| Cell::Float(v.into()))
    } else if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)?.map(Cell::Bool)
    } else {
        tracing::debug!(column = idx, ty = %ty, "unsupported result column type");
        None
    };

    Ok(cell.unwrap_or(Cell::Null))
}

fn to_row(row: &tokio_postgres::Row) -> anyhow::Result<Row> {
    let mut out = Row::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        out.insert(column.name().to_string(), read_cell(row, idx, column.type_())?);
    }
    Ok(out)
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn fetch(&self, plan: &PlannedQuery) -> anyhow::Result<Vec<Row>> {
        let bound = bind(plan)?;
        parse_ok(&bound.sql).context("generated statement failed the static parse check")?;

        let params: Vec<&(dyn ToSql + Sync)> = bound.params.iter().map(param_ref).collect();

        tracing::debug!(sql = %bound.sql, params = bound.params.len(), "executing planned query");
        let rows = self.client.query(bound.sql.as_str(), &params).await?;

        rows.iter().map(to_row).collect()
    }
}
