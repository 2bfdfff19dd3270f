//! Gatehouse API 서버 진입점.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, StatusCode};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use gatehouse_api::{
    create_app, setup_metrics_recorder, start_maintenance_service, AppState,
    InMemoryUserDirectory, RateLimitConfig, RateLimiter, TokenService,
};
use gatehouse_core::{init_logging, AppConfig, CipherKeyMaterial, FieldCipher, LogConfig};

/// CORS 레이어.
///
/// `CORS_ORIGINS`(쉼표 구분)가 있으면 해당 origin만 허용하고, 없으면 모두 허용합니다.
fn cors_layer() -> CorsLayer {
    let configured: Option<Vec<HeaderValue>> = std::env::var("CORS_ORIGINS")
        .ok()
        .filter(|v| !v.is_empty())
        .map(|origins| {
            origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect()
        });

    let (allow_origin, credentials) = match configured {
        Some(origins) if !origins.is_empty() => {
            info!("CORS configured with {} allowed origins", origins.len());
            (AllowOrigin::list(origins), true)
        }
        _ => {
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            (AllowOrigin::any(), false)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(credentials)
        .max_age(Duration::from_secs(3600))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default()?;
    init_logging(LogConfig::from(&config.logging))?;

    info!("Starting Gatehouse API server...");

    // 키 소스가 해석되지 않으면 시작하지 않음
    let key_material = CipherKeyMaterial::from_config(&config.cipher).map_err(|e| {
        error!(error = %e, "Field cipher key unavailable, set GATEHOUSE__CIPHER__KEY and GATEHOUSE__CIPHER__IV");
        e
    })?;
    let cipher = Arc::new(FieldCipher::new(&key_material)?);

    let tokens = Arc::new(TokenService::from_config(&config.auth));

    let users = InMemoryUserDirectory::new();
    let seeded = users.seed(&config.auth.bootstrap_users, &cipher).await?;
    if seeded == 0 {
        warn!("No bootstrap users configured, login will always fail");
    }
    info!(users = seeded, "User directory initialized");

    let metrics_handle = setup_metrics_recorder()?;
    info!("Prometheus metrics recorder initialized");

    let state = Arc::new(
        AppState::new(tokens.clone(), cipher, Arc::new(users)).with_metrics(metrics_handle),
    );
    info!(version = %state.version, "Application state initialized");

    let limiter = if config.rate_limit.enabled {
        info!(
            requests_per_minute = config.rate_limit.requests_per_minute,
            burst_size = config.rate_limit.burst_size,
            trust_forwarded_headers = config.rate_limit.trust_forwarded_headers,
            "Rate limiting configured"
        );
        Some(RateLimiter::new(RateLimitConfig::from(&config.rate_limit)))
    } else {
        info!("Rate limiting DISABLED");
        None
    };

    let shutdown_token = CancellationToken::new();
    let maintenance = start_maintenance_service(
        tokens,
        limiter.clone(),
        Duration::from_secs(config.auth.registry_purge_interval_secs),
        shutdown_token.clone(),
    );

    let app = create_app(state, limiter)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(cors_layer());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "API server listening");
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    info!("Server shutdown initiated, cleaning up...");
    shutdown_token.cancel();

    if tokio::time::timeout(Duration::from_secs(10), maintenance)
        .await
        .is_err()
    {
        warn!("Cleanup timeout, forcing shutdown");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM 대기 후 백그라운드 태스크에 종료를 전파합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}
