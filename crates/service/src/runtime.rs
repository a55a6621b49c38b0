//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so the binary can check its config file
//! and data directory through `service::runtime::ensure_env`.

/// Ensure the data directory exists; warn when the config file is missing.
pub async fn ensure_env(config_path: &str, data_dir: &str) -> anyhow::Result<()> {
    common::env::ensure_env(config_path, data_dir).await
}
