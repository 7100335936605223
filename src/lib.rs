pub mod backend;
pub mod chain;
pub mod config;
pub mod error;
pub mod html;
pub mod logging;
pub mod model;
pub mod page;
pub mod prompt;
pub mod providers;
pub mod server;
pub mod startup;

use anyhow::{Context, Result};
use tracing::info;

use config::Config;
use page::PageState;
use server::AppState;

/// Serves the Q&A page. Expects [`startup::prepare_environment`] to have run.
pub async fn run() -> Result<()> {
    let _log_guard = logging::init();

    let cfg = Config::from_env();
    info!(
        model_provider = %cfg.model_provider,
        model = %cfg.model,
        model_base_url = %cfg.model_base_url,
        model_timeout_secs = cfg.model_timeout_secs,
        bind_addr = %cfg.bind_addr,
        tls_accept_invalid_certs = cfg.tls_accept_invalid_certs,
        remote_tracing = cfg.tracing_api_key.is_some(),
        "loaded runtime configuration"
    );

    let page = PageState::new(cfg).context("Failed to build prompt template")?;
    let state = AppState::new(page)?;
    server::serve(state).await
}
