mod admin;
mod db;
mod error;
mod routes;
mod settings;

use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salesgpt_core::agents::observe::TracingObserver;
use salesgpt_core::config::build_intent_source;
use salesgpt_core::pipeline::QueryPipeline;
use salesgpt_core::schema::catalog::IntentCatalog;

use crate::db::PgExecutor;
use crate::routes::AppState;
use crate::settings::Settings;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env()?;

    let catalog = Arc::new(IntentCatalog::standard());
    let source = build_intent_source(&catalog, &settings.extractor, Arc::new(TracingObserver));
    let pipeline = QueryPipeline::new(catalog, source);

    let client = db::connect(&settings.database_url).await?;
    let state = AppState {
        pipeline,
        executor: PgExecutor::new(client.clone()),
        db: client,
    };

    let app = routes::router(state)
        .layer(cors_layer(&settings.cors_origins))
        .layer(TraceLayer::new_for_http());

    let bind_addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "server running");
    axum::serve(listener, app).await?;
    Ok(())
}
