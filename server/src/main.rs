use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::Next,
    response::Response,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer,
};
use tracing::{info, warn};

use cloning_core::ProcessEngineLoader;
use server::{config::ServerConfig, router, AppState, START_TIME};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = dotenv::dotenv();

    async_main().await
}

async fn async_main() -> anyhow::Result<()> {
    info!("Starting voice cloning server...");

    let _ = START_TIME.get_or_init(std::time::Instant::now);

    let config = ServerConfig::from_env();
    info!(
        "Server configuration loaded: port={}, rate_limit={}/min, synth_command={}",
        config.port, config.rate_limit_per_minute, config.synth_command
    );

    let loader = Arc::new(ProcessEngineLoader::new(
        config.synth_command.clone(),
        config.synth_args.clone(),
    ));
    let state = AppState::new(loader, config.clone());

    // Kick off the model load without blocking request acceptance; the
    // first job waits on the same single-flight load if it is still going.
    {
        let coordinator = state.coordinator.clone();
        tokio::spawn(async move {
            if let Err(e) = coordinator.ensure_ready().await {
                warn!("Background model load failed (will retry on first job): {e}");
            }
        });
    }

    // CORS configuration - environment-aware
    let cors = if let Some(ref allowed_origins) = config.cors_allowed_origins {
        let origins: Vec<axum::http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin: &String| origin.parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            warn!("CORS_ALLOWED_ORIGINS is empty, falling back to permissive CORS");
            permissive_cors()
        } else {
            info!("CORS configured for {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(tower_http::cors::AllowOrigin::list(origins))
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(tower_http::cors::Any)
                .allow_credentials(false)
        }
    } else {
        warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (development mode)");
        permissive_cors()
    };

    // Global rate limit; per-IP extraction is unreliable behind proxies.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second((config.rate_limit_per_minute / 60).max(1) as u64)
            .burst_size(config.rate_limit_per_minute)
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .expect("invalid rate limit configuration"),
    );
    info!(
        "Rate limiting: {} requests per minute",
        config.rate_limit_per_minute
    );

    // Request ID middleware for tracing
    async fn add_request_id(mut request: Request, next: Next) -> Response {
        let request_id = uuid::Uuid::new_v4().to_string();
        if let Ok(value) = axum::http::HeaderValue::from_str(&request_id) {
            request.headers_mut().insert("x-request-id", value.clone());
            let mut response = next.run(request).await;
            response.headers_mut().insert("x-request-id", value);
            return response;
        }
        next.run(request).await
    }

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer::new(governor_conf))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(cors)
        .into_inner();

    let app = router(state)
        .layer(axum::middleware::from_fn(add_request_id))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(middleware_stack);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}. Try a different PORT."))?;

    info!("Server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(tower_http::cors::Any)
        .allow_credentials(false)
}
