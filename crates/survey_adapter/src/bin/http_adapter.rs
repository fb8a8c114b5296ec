#![forbid(unsafe_code)]

use std::net::SocketAddr;

use survey_adapter::config::AdapterConfig;
use survey_adapter::{build_router, AppState, HEALTH_ROUTE};
use survey_storage::repo::SurveyRepo;
use survey_storage::sqlite::SqliteSurveyStore;
use survey_storage::survey_db::InMemorySurveyStore;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AdapterConfig::from_env();
    let repo: Box<dyn SurveyRepo + Send> = match &config.db_path {
        Some(path) => Box::new(SqliteSurveyStore::open(path)?),
        None => {
            info!("SURVEY_DB_PATH not set, keeping survey data in memory");
            Box::new(InMemorySurveyStore::new_in_memory())
        }
    };
    let state = AppState::new(repo, config.rate_limit);
    let app = build_router(state, &config);

    let listener = TcpListener::bind(config.bind).await?;
    info!(
        "survey_adapter_http listening on http://{} (health: {HEALTH_ROUTE})",
        config.bind
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    info!("survey_adapter_http stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
