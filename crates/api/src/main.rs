use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use irisserve_ai::ModelArtifact;
use irisserve_api::app::{self, AppServices};
use irisserve_api::config::ServiceConfig;

fn main() -> anyhow::Result<()> {
    irisserve_observability::init();

    let config = ServiceConfig::from_env().context("invalid configuration")?;

    let mut runtime = tokio::runtime::Builder::new_multi_thread();
    runtime.enable_all();
    if let Some(workers) = config.worker_threads {
        runtime.worker_threads(workers);
    }
    let runtime = runtime.build().context("failed to build tokio runtime")?;

    runtime.block_on(run(config))
}

async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    tracing::info!(
        model_path = %config.model_path.display(),
        bind_addr = %config.bind_addr,
        max_batch_size = config.max_batch_size,
        max_body_bytes = config.max_body_bytes,
        request_timeout_secs = config.request_timeout.as_secs(),
        "starting iris classification service"
    );

    let services = Arc::new(AppServices::from_config(&config));
    let router = app::build_app(&config, services.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    // Probes are answered while the artifact loads; readiness stays false.
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    let model_path = config.model_path.clone();
    let started = Instant::now();
    let loaded = tokio::task::spawn_blocking(move || ModelArtifact::load(&model_path))
        .await
        .context("model loader task failed")?;

    let artifact = match loaded {
        Ok(artifact) => artifact,
        Err(e) => {
            tracing::error!(error = %e, "failed to load model artifact; exiting");
            server.abort();
            return Err(e).context("startup failed");
        }
    };

    tracing::info!(
        load_ms = started.elapsed().as_millis() as u64,
        "model artifact loaded"
    );
    services.install(artifact)?;

    server
        .await
        .context("server task failed")?
        .context("server error")?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
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

    tracing::info!("shutdown signal received; draining connections");
}
