use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::{AppConfig, ServerConfig};
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, AppState};
use service::{runtime, ServiceRegistry};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(server: &ServerConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address {}:{}: {e}", server.host, server.port)))
}

/// Build the router over services opened from `cfg`.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let services = Arc::new(ServiceRegistry::from_config(cfg).await?);
    Ok(routes::build_router(AppState { services }, build_cors()))
}

/// Public entry: load config, open stores once, and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    if cfg.store.persist {
        let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        runtime::ensure_env(&config_path, &cfg.store.data_dir)
            .await
            .map_err(|e| StartupError::Runtime(e.to_string()))?;
    }

    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg.server)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr: addr.to_string(), source })?;
    info!(%addr, page_limit = cfg.query.page_limit, "starting chatter server");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_rejects_bad_host() {
        let server = ServerConfig { host: "not a host".into(), port: 8080, worker_threads: None };
        assert!(matches!(bind_addr(&server), Err(StartupError::InvalidConfig(_))));
        let server = ServerConfig { host: "127.0.0.1".into(), port: 9000, worker_threads: None };
        assert_eq!(bind_addr(&server).unwrap().port(), 9000);
    }
}
