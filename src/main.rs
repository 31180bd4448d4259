use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use hairstyle_studio::app_state::AppState;
use hairstyle_studio::config::AppConfig;
use hairstyle_studio::routes;
use hairstyle_studio::services::studio::Studio;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing hairstyle-studio server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_histogram!(
        "variation_generation_seconds",
        "Time for one hairstyle variation call to settle"
    );
    metrics::describe_counter!(
        "hairstyle_variations_total",
        "Hairstyle variations finished, labelled by outcome"
    );
    metrics::describe_counter!(
        "generation_runs_total",
        "Scheduler runs that generated at least one item"
    );
    metrics::describe_counter!(
        "style_analysis_fallbacks_total",
        "Analyses replaced by the generic fallback style list"
    );

    let credential_configured = config
        .gemini_api_key
        .as_deref()
        .is_some_and(|key| !key.trim().is_empty());
    if !credential_configured {
        tracing::warn!("GEMINI_API_KEY is not set; every analysis request will fail");
    }

    // Initialize Gemini-backed studio
    tracing::info!(
        analysis_model = %config.analysis_model,
        image_model = %config.image_model,
        concurrency = config.generation_concurrency,
        timeout_secs = config.request_timeout_secs,
        "Initializing Gemini client"
    );
    let studio = Studio::from_config(&config).expect("Failed to initialize Gemini client");

    let state = AppState::new(studio, credential_configured);

    let app = routes::router(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(routes::MAX_BODY_BYTES));

    tracing::info!("Starting hairstyle-studio on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
