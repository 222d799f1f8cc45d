mod analyzer;
mod api;
mod config;
mod db;
mod key_points;
mod sentiment;
#[cfg(test)]
mod test_support;

use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::analyzer::ReviewAnalyzer;
use crate::config::Config;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::analyze_review,
        api::list_reviews
    ),
    components(
        schemas(
            api::AnalyzeRequest,
            api::AnalyzeResponse,
            api::ErrorResponse,
            db::ReviewRecord
        )
    ),
    tags(
        (name = "reviews", description = "Product review analysis API")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;

    {
        let mut conn = pool.acquire().await?;
        db::init_db(&mut *conn).await?;
    }

    let analyzer = ReviewAnalyzer::from_config(&config)?;
    tracing::info!(
        "Sentiment endpoint: {}, key-point models: {}",
        config.sentiment.endpoint,
        config.key_points.models.join(", ")
    );

    let state = Arc::new(api::AppState { pool, analyzer });

    let app = api::router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
