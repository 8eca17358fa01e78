//! Gluco API Server
//!
//! REST API server for diabetes risk prediction.

use anyhow::Context;
use gluco_api::{create_router, state::AppState, telemetry};
use gluco_core::{AppConfig, SqliteRecordStore};
use gluco_research::{create_llm_client, ResearchAssistant};
use std::sync::Arc;

fn load_config() -> anyhow::Result<AppConfig> {
    let config = match std::env::var("GLUCO_CONFIG") {
        Ok(path) => AppConfig::from_file(&path)?.with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let config = load_config().context("Failed to load configuration")?;
    telemetry::init_tracing(&config.logging);

    // Collaborators
    let predictor = gluco_model::load_predictor(&config.model.path)
        .context("Failed to load prediction model")?;

    let records = SqliteRecordStore::connect(&config.database.url, config.database.pool_size)
        .await
        .context("Failed to open record store")?;

    let assistant = match create_llm_client(&config.llm) {
        Ok(client) => {
            tracing::info!(provider = ?config.llm.provider, model = client.name(), "LLM client ready");
            ResearchAssistant::new(client)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Research chat disabled");
            ResearchAssistant::unconfigured()
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state
    let state = Arc::new(AppState::new(
        config,
        predictor,
        Arc::new(records),
        assistant,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Gluco API Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
