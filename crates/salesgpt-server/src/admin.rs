//! Maintenance endpoints for the `products` and `sales` tables.

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::routes::AppState;

const NAME_MAX_CHARS: usize = 200;
const DEFAULT_SALES_PAGE: i64 = 200;
const MAX_SALES_PAGE: i64 = 1000;

#[derive(Debug, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Sale {
    pub id: i64,
    pub product_id: i64,
    pub year: i64,
    pub revenue: f64,
    pub product_name: Option<String>,
    pub product_category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaleCreate {
    pub product_id: i64,
    pub year: i64,
    pub revenue: f64,
}

#[derive(Debug, Deserialize)]
pub struct SaleUpdate {
    pub product_id: Option<i64>,
    pub year: Option<i64>,
    pub revenue: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Page {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

fn check_text(field: &str, value: &str) -> Result<(), ApiError> {
    let chars = value.chars().count();
    if chars == 0 || chars > NAME_MAX_CHARS {
        return Err(ApiError::validation(format!(
            "{field} must be 1..{NAME_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

fn decimal(revenue: f64) -> Result<Decimal, ApiError> {
    Decimal::from_f64(revenue).ok_or_else(|| ApiError::validation("revenue must be a finite number"))
}

fn product(row: &tokio_postgres::Row) -> Product {
    Product {
        id: row.get("id"),
        name: row.get("name"),
        category: row.get("category"),
    }
}

fn sale(row: &tokio_postgres::Row) -> Sale {
    let revenue: Option<Decimal> = row.get("revenue");
    Sale {
        id: row.get("id"),
        product_id: row.get("product_id"),
        year: row.get("year"),
        revenue: revenue.and_then(|r| r.to_f64()).unwrap_or(0.0),
        product_name: row.get("product_name"),
        product_category: row.get("product_category"),
    }
}

// --- products ---

async fn list_products(State(state): State<AppState>) -> Result<Json<Items<Product>>, ApiError> {
    let rows = state
        .db
        .query("SELECT id::BIGINT AS id, name, category FROM products ORDER BY id ASC", &[])
        .await?;
    Ok(Json(Items {
        items: rows.iter().map(product).collect(),
    }))
}

async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductCreate>,
) -> Result<Json<Product>, ApiError> {
    check_text("name", &payload.name)?;
    check_text("category", &payload.category)?;

    let row = state
        .db
        .query_one(
            "INSERT INTO products (name, category) VALUES ($1::TEXT, $2::TEXT) \
             RETURNING id::BIGINT AS id, name, category",
            &[&payload.name, &payload.category],
        )
        .await?;
    Ok(Json(product(&row)))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> Result<Json<Product>, ApiError> {
    if payload.name.is_none() && payload.category.is_none() {
        return Err(ApiError::validation("No fields to update"));
    }
    if let Some(name) = &payload.name {
        check_text("name", name)?;
    }
    if let Some(category) = &payload.category {
        check_text("category", category)?;
    }

    let row = state
        .db
        .query_opt(
            "UPDATE products \
             SET name = COALESCE($2::TEXT, name), category = COALESCE($3::TEXT, category) \
             WHERE id = $1::BIGINT \
             RETURNING id::BIGINT AS id, name, category",
            &[&id, &payload.name, &payload.category],
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    Ok(Json(product(&row)))
}

async fn delete_product(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>, ApiError> {
    state
        .db
        .query_opt("DELETE FROM products WHERE id = $1::BIGINT RETURNING id", &[&id])
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    Ok(Json(json!({ "ok": true })))
}

// --- sales ---

const SALE_COLUMNS: &str = "s.id::BIGINT AS id, s.product_id::BIGINT AS product_id, s.year::BIGINT AS year, \
                            s.revenue::NUMERIC AS revenue, p.name AS product_name, p.category AS product_category";

async fn list_sales(State(state): State<AppState>, Query(page): Query<Page>) -> Result<Json<Items<Sale>>, ApiError> {
    let limit = page.limit.unwrap_or(DEFAULT_SALES_PAGE).clamp(1, MAX_SALES_PAGE);
    let offset = page.offset.unwrap_or(0).max(0);

    let sql = format!(
        "SELECT {SALE_COLUMNS} FROM sales s JOIN products p ON p.id = s.product_id \
         ORDER BY s.year DESC, s.id DESC LIMIT $1::BIGINT OFFSET $2::BIGINT"
    );
    let rows = state.db.query(sql.as_str(), &[&limit, &offset]).await?;
    Ok(Json(Items {
        items: rows.iter().map(sale).collect(),
    }))
}

async fn create_sale(State(state): State<AppState>, Json(payload): Json<SaleCreate>) -> Result<Json<Sale>, ApiError> {
    let revenue = decimal(payload.revenue)?;

    let sql = format!(
        "WITH s AS (\
           INSERT INTO sales (product_id, year, revenue) VALUES ($1::BIGINT, $2::BIGINT, $3::NUMERIC) \
           RETURNING id, product_id, year, revenue\
         ) SELECT {SALE_COLUMNS} FROM s LEFT JOIN products p ON p.id = s.product_id"
    );
    let row = state
        .db
        .query_one(sql.as_str(), &[&payload.product_id, &payload.year, &revenue])
        .await?;
    Ok(Json(sale(&row)))
}

async fn update_sale(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<SaleUpdate>,
) -> Result<Json<Sale>, ApiError> {
    if payload.product_id.is_none() && payload.year.is_none() && payload.revenue.is_none() {
        return Err(ApiError::validation("No fields to update"));
    }
    let revenue = payload.revenue.map(decimal).transpose()?;

    let sql = format!(
        "WITH s AS (\
           UPDATE sales SET product_id = COALESCE($2::BIGINT, product_id), \
                            year = COALESCE($3::BIGINT, year), \
                            revenue = COALESCE($4::NUMERIC, revenue) \
           WHERE id = $1::BIGINT \
           RETURNING id, product_id, year, revenue\
         ) SELECT {SALE_COLUMNS} FROM s LEFT JOIN products p ON p.id = s.product_id"
    );
    let row = state
        .db
        .query_opt(sql.as_str(), &[&id, &payload.product_id, &payload.year, &revenue])
        .await?
        .ok_or_else(|| ApiError::not_found("Sale not found"))?;
    Ok(Json(sale(&row)))
}

async fn delete_sale(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>, ApiError> {
    state
        .db
        .query_opt("DELETE FROM sales WHERE id = $1::BIGINT RETURNING id", &[&id])
        .await?
        .ok_or_else(|| ApiError::not_found("Sale not found"))?;
    Ok(Json(json!({ "ok": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/products", get(list_products).post(create_product))
        .route("/admin/products/:id", patch(update_product).delete(delete_product))
        .route("/admin/sales", get(list_sales).post(create_sale))
        .route("/admin/sales/:id", patch(update_sale).delete(delete_sale))
}
