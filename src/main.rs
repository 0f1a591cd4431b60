use dam_tools::clock::Clock;
use dam_tools::feeds::FeedClient;
use dam_tools::injector::DevToolsHost;
use dam_tools::preferences::JsonFileStore;
use dam_tools::{router, AppState, Config, PopupView};
use std::{net::SocketAddr, sync::Arc};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let store = JsonFileStore::open(&config.data_path).await;
    info!(path = %store.path().display(), "loaded preferences");

    let feeds = FeedClient::new(&config.feed_base_url, config.feed_timeout)?;
    let tabs = DevToolsHost::new(reqwest::Client::new(), &config.devtools_url, config.devtools_timeout);
    let view = PopupView::new(feeds, Arc::new(store), Arc::new(tabs), Clock::start()).await;
    let state = AppState::new(view);

    let view = Arc::clone(&state.view);
    tokio::spawn(async move {
        view.open().await;
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.view.shutdown().await;
    info!("stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
