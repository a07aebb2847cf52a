//! Quizzet translator: translation with part-of-speech alternatives, long-text
//! chunking and a bounded FIFO cache.
//! Main library: service wiring, logging setup, and the stdin/stdout host.

pub mod config;
pub mod host;
pub mod metrics;
pub mod translate;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{ConfigError, LogFormat, TranslatorConfig};
use metrics::PipelineMetrics;
use translate::{GoogleBackend, TranslateError, TranslationCache, TranslationService};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to build translation backend: {0}")]
    Backend(#[from] TranslateError),
    #[error("host I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize tracing. Logs go to stderr; stdout belongs to the host.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("quizzet_translator=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.with_thread_ids(true).try_init(),
    };
}

/// Wire the production service: HTTP backend, shared cache and metrics.
pub fn build_service(config: &TranslatorConfig) -> Result<TranslationService, AppError> {
    let backend = Arc::new(GoogleBackend::new(config)?);
    let cache = Arc::new(TranslationCache::new(config.cache_capacity));
    let metrics = Arc::new(PipelineMetrics::new());
    Ok(TranslationService::new(config, backend, cache, metrics))
}

/// Run the host until stdin closes.
pub async fn run() -> Result<(), AppError> {
    let config = TranslatorConfig::from_env()?;
    init_tracing(config.log_format);

    info!(
        endpoint = %config.endpoint,
        detector = ?config.detector,
        cache_capacity = config.cache_capacity,
        "quizzet-translator starting"
    );

    let service = Arc::new(build_service(&config)?);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    host::serve(service, stdin, tokio::io::stdout()).await?;
    Ok(())
}
