use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tracing::level_filters::LevelFilter;
use waitroom::metrics::{JsonlMetricsSink, MetricsSink, NullMetricsSink};
use waitroom::notify::TracingNotifier;
use waitroom::queue::{ControllerSettings, QueueController};
use waitroom::state::AppState;
use waitroom::store::file::FileSessionStore;
use waitroom::{api, config};

fn init_tracing(level: &str) {
    let max_level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(max_level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_default()?;
    init_tracing(&config.logging.level);
    tracing::info!(
        app = %config.app.name,
        config_path = config::DEFAULT_CONFIG_PATH,
        "waitroom starting"
    );

    let state = Arc::new(RwLock::new(AppState::new()));
    let store = Arc::new(FileSessionStore::new(config.session_path()));
    let metrics: Arc<dyn MetricsSink> = match config.metrics_path() {
        Some(path) => {
            tracing::info!(path = %path.display(), "Load metrics enabled");
            Arc::new(JsonlMetricsSink::new(path))
        }
        None => {
            tracing::info!("No metrics path configured, load metrics disabled");
            Arc::new(NullMetricsSink)
        }
    };

    let controller = Arc::new(QueueController::new(
        state,
        store,
        Arc::new(TracingNotifier),
        metrics,
        ControllerSettings::from_config(&config),
    ));

    match controller.resume() {
        Ok(Some(membership)) => {
            tracing::info!(position = membership.position, "Resumed in-progress wait");
        }
        Ok(None) => {
            tracing::info!("No persisted session, starting idle");
        }
        Err(err) => {
            tracing::warn!(error = %err, "Resume failed, starting idle");
        }
    }

    let app = api::router(Arc::clone(&controller));
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    if let Err(err) = controller.dispose() {
        tracing::warn!(error = %err, "Failed to dispose controller cleanly");
    }

    Ok(())
}
