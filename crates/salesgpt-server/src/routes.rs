use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_postgres::Client;

use salesgpt_core::pipeline::QueryPipeline;
use salesgpt_core::report::chart::ChartResponse;

use crate::admin;
use crate::db::PgExecutor;
use crate::error::ApiError;

const MAX_QUESTION_CHARS: usize = 1000;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: QueryPipeline,
    pub executor: PgExecutor,
    pub db: Arc<Client>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    question: String,
}

impl QueryRequest {
    fn checked_question(&self) -> Result<&str, ApiError> {
        let chars = self.question.chars().count();
        if chars == 0 || chars > MAX_QUESTION_CHARS {
            return Err(ApiError::bad_request(
                "invalid_request",
                format!("question must be 1..{MAX_QUESTION_CHARS} characters, got {chars}"),
            ));
        }
        Ok(&self.question)
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn query(State(state): State<AppState>, Json(req): Json<QueryRequest>) -> Result<Json<ChartResponse>, ApiError> {
    let question = req.checked_question()?;
    let chart = state.pipeline.answer(question, &state.executor).await?;
    Ok(Json(chart))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/query", post(query))
        .merge(admin::router())
        .with_state(state)
}
