// region:    --- Imports
use auction_house::bidding::commands::BidValidator;
use auction_house::config::{Config, NotifierKind};
use auction_house::database::{DatabaseManager, PostgresAuctionStore};
use auction_house::handlers::{self, AppState};
use auction_house::message_broker::KafkaManager;
use auction_house::notifier::{KafkaSaleNotifier, LogNotifier, Notifier, WebhookNotifier};
use auction_house::{AuctionStore, Clock, ClosingSweeper, InMemoryStore, LifecycleManager, SystemClock};
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    // store
    let store: Arc<dyn AuctionStore> = match &config.database_url {
        Some(url) => {
            let db_manager = Arc::new(DatabaseManager::new(url, config.db_max_connections).await?);
            if let Err(e) = db_manager.initialize_database().await {
                error!("{:<12} --> database initialization failed: {:?}", "Main", e);
                return Err(e.into());
            }
            info!("{:<12} --> database initialized", "Main");
            Arc::new(PostgresAuctionStore::new(db_manager))
        }
        None => {
            warn!(
                "{:<12} --> DATABASE_URL not set, using the in-memory store",
                "Main"
            );
            Arc::new(InMemoryStore::new())
        }
    };

    // notifier
    let notifier: Arc<dyn Notifier> = match config.notifier {
        NotifierKind::Log => Arc::new(LogNotifier),
        NotifierKind::Kafka => {
            let kafka_manager = KafkaManager::new(&config.kafka_brokers)?;
            kafka_manager.create_topic(&config.sales_topic, 5, 1).await?;
            info!("{:<12} --> Kafka ready", "Main");
            Arc::new(KafkaSaleNotifier::new(
                kafka_manager.get_producer(),
                config.sales_topic.clone(),
            ))
        }
        NotifierKind::Webhook => {
            let url = config.notify_webhook_url.clone().unwrap_or_default();
            Arc::new(WebhookNotifier::new(url))
        }
    };

    // services
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let lifecycle = Arc::new(LifecycleManager::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        config.max_append_retries,
    ));
    let bids = Arc::new(BidValidator::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        chrono::Duration::seconds(config.bid_cooldown_secs),
        config.max_append_retries,
    ));
    let sweeper = Arc::new(ClosingSweeper::new(
        Arc::clone(&store),
        Arc::clone(&lifecycle),
        notifier,
        clock,
        config.sweep,
    ));
    Arc::clone(&sweeper).start();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes_all = handlers::routes(AppState {
        store,
        lifecycle,
        bids,
        sweeper,
    })
    .layer(cors)
    .layer(DefaultBodyLimit::max(1024 * 1024));

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
