use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use summary_feed::config::Config;
use summary_feed::fetcher::Fetcher;
use summary_feed::routes::{self, AppState};
use summary_feed::session::{start_polling, FeedSession};
use summary_feed::store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "summary_feed=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "summary_feed.toml".to_string());
    let config = Config::load_or_default(&config_path)?;
    info!(
        "Using backend {} (poll every {}s)",
        config.api.url, config.poll_interval
    );

    // Initialize storage
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| config.database_url.clone());
    let store = Store::new(&database_url).await?;
    store.initialize().await?;
    info!("Storage initialized");

    let fetcher = Fetcher::new(&config.api)?;
    let session = Arc::new(FeedSession::new(fetcher, store, config.api.keyword.clone()));
    session.hydrate().await?;

    // Start polling; the first cycle runs right away
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let poller = tokio::spawn(start_polling(
        session.clone(),
        config.poll_interval(),
        cancel_rx,
    ));

    let state = Arc::new(AppState {
        session: session.clone(),
        highlight: config.highlight,
    });
    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Server starting on http://{}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                error!("Failed to listen for ctrl-c");
            }
            info!("Shutting down");
        })
        .await?;

    let _ = cancel_tx.send(true);
    poller.await?;

    Ok(())
}
