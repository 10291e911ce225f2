//! Registration server.
//!
//! ```bash
//! DATABASE_URL=postgres://... STRIPE_SECRET_KEY=sk_test_... cargo run --bin registrar-server
//! ```

use registrar_runtime::metrics::MetricsExporter;
use registrar_web::bootstrap::connect_database;
use registrar_web::{Application, Config, build_router};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(gateways = ?config.gateways, cms = %config.region.cms_endpoint, "Configuration loaded");

    let metrics = MetricsExporter::install()?;

    info!("Connecting to database...");
    let pool = connect_database(&config.postgres).await?;
    info!("Database connected, migrations applied");

    let Application { state, worker, worker_shutdown } = Application::build(&config, pool)?;
    let worker_handle = tokio::spawn(worker.run());

    let app = build_router(state.with_metrics(metrics));
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, stopping disposition worker");
    let _ = worker_shutdown.send(true);
    if let Err(e) = worker_handle.await {
        error!(error = %e, "Disposition worker panicked");
    }

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C"),
        () = terminate => info!("Received SIGTERM"),
    }
}
