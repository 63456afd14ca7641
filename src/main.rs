//! HealthAI Guardian - Main Entry Point
//!
//! Loads the risk classifier once, then serves `GET /` and `POST /predict`.

use anyhow::{Context, Result};
use healthai_guardian::{
    api::{build_router, AppState},
    config::{AppConfig, LogFormat},
    metrics::{MetricsReporter, ServiceMetrics},
    models::{inference::InferenceEngine, onnx::OnnxClassifier},
    types::patient::PATIENT_FIELD_COUNT,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    init_logging(&config)?;

    info!("Starting HealthAI Guardian");
    info!(
        host = %config.server.host,
        port = config.server.port,
        model = %config.model.path,
        "Configuration loaded successfully"
    );

    // Without the model no request can be served: fail startup, never degrade.
    let classifier = OnnxClassifier::load(
        &config.model.path,
        config.model.onnx_threads,
        PATIENT_FIELD_COUNT,
    )
    .with_context(|| format!("Cannot start without a model at {}", config.model.path))?;

    let engine = InferenceEngine::new(Arc::new(classifier));
    info!(
        model = %engine.scorer_name(),
        features = engine.feature_count(),
        feature_order = ?engine.feature_names(),
        "Inference engine initialized"
    );

    let metrics = Arc::new(ServiceMetrics::new());
    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let app = build_router(AppState::new(engine, metrics.clone()), &config.cors);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!(address = %address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info")
            .add_directive(format!("healthai_guardian={}", config.logging.level).parse()?)
            .add_directive(format!("tower_http={}", config.logging.level).parse()?),
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
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
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
