use anyhow::Context;
use berth_api::{
    app,
    metrics::BookingMetrics,
    state::{AppState, AuthConfig},
};
use berth_booking::{BookingOrchestrator, PnrMinter, SearchProjector};
use berth_core::clock::{Clock, SystemClock};
use berth_core::events::{EventPublisher, TracingEventPublisher};
use berth_core::repository::{BookingLedger, TrainRepository};
use berth_store::{
    app_config::Config, DbClient, MemoryBookingLedger, MemoryTrainRepository, PgBookingLedger, PgTrainRepository,
    RedisClient,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "berth_api=debug,berth_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Berth API on port {}", config.server.port);

    let (trains, ledger) = build_stores(&config).await?;

    let redis = match &config.redis.url {
        Some(url) => Some(Arc::new(RedisClient::new(url).await.context("Failed to connect to Redis")?)),
        None => {
            tracing::info!("No Redis configured, rate limiting disabled");
            None
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::with_offset_minutes(config.business_rules.utc_offset_minutes));
    let events = build_publisher(&config)?;

    let orchestrator = BookingOrchestrator::new(
        trains.clone(),
        ledger,
        clock.clone(),
        events,
        PnrMinter::from_entropy(config.business_rules.max_pnr_attempts),
    );
    let search = SearchProjector::new(trains.clone(), orchestrator.calculator().clone(), clock);

    let state = AppState {
        bookings: Arc::new(orchestrator),
        search: Arc::new(search),
        trains,
        redis,
        metrics: Arc::new(BookingMetrics::new().context("Failed to register metrics")?),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        rate_limit_per_minute: config.business_rules.rate_limit_per_minute,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

async fn build_stores(config: &Config) -> anyhow::Result<(Arc<dyn TrainRepository>, Arc<dyn BookingLedger>)> {
    let Some(url) = &config.database.url else {
        tracing::warn!("No database configured, using in-memory stores");
        let trains = match &config.catalog.seed_path {
            Some(path) => MemoryTrainRepository::from_json_file(path)
                .with_context(|| format!("Failed to load train catalog from {}", path))?,
            None => MemoryTrainRepository::new(),
        };
        return Ok((Arc::new(trains), Arc::new(MemoryBookingLedger::new())));
    };

    let db = DbClient::new(url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let trains = PgTrainRepository::new(db.pool.clone());
    if let Some(path) = &config.catalog.seed_path {
        if trains.list_trains().await?.is_empty() {
            let seed = MemoryTrainRepository::from_json_file(path)?;
            for train in seed.list_trains().await? {
                trains.insert_train(&train).await?;
            }
            tracing::info!(path = %path, "Seeded train catalog");
        }
    }

    Ok((Arc::new(trains), Arc::new(PgBookingLedger::new(db.pool))))
}

#[cfg(feature = "kafka")]
fn build_publisher(config: &Config) -> anyhow::Result<Arc<dyn EventPublisher>> {
    match &config.kafka.brokers {
        Some(brokers) => Ok(Arc::new(
            berth_store::KafkaEventProducer::new(brokers).context("Failed to create Kafka producer")?,
        )),
        None => Ok(Arc::new(TracingEventPublisher)),
    }
}

#[cfg(not(feature = "kafka"))]
fn build_publisher(_config: &Config) -> anyhow::Result<Arc<dyn EventPublisher>> {
    Ok(Arc::new(TracingEventPublisher))
}
