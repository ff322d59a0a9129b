use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use travelviz::config::AppConfig;
use travelviz::error::AppError;
use travelviz::routes::create_router;
use travelviz::services::media::MediaService;
use travelviz::state::AppState;
use travelviz::store::{FileBackend, JsonStore};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;

    let backend = FileBackend::new(config.data_root.clone());
    backend.ensure_structure().await?;
    let store = JsonStore::new(Arc::new(backend));

    let media = MediaService::new(config.media_root.clone());
    media.ensure_structure().await?;

    let state = AppState::new(config.clone(), store, media);
    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,travelviz=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
