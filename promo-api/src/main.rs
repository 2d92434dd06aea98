use promo_api::{app, scheduler::start_run_scheduler, AdminAuth, AppState};
use promo_core::{OfferFeed, OfferStore};
use promo_offer::{ChannelRecommender, CopyGenerator, OfferQualifier};
use promo_pipeline::{BatchScheduler, DraftPublisher, PipelineOrchestrator, PipelineRunner, RunnerSettings};
use promo_store::{HttpOfferStore, LomadeeFeed, MemoryOfferStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "promo_api=debug,promo_pipeline=debug,promo_offer=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = promo_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting promo pipeline on port {}", config.server.port);

    let timeout = Duration::from_secs(config.store.timeout_secs);

    let store: Arc<dyn OfferStore> = match &config.store.api_url {
        Some(url) => Arc::new(HttpOfferStore::new(url, timeout).expect("Failed to build store client")),
        None => {
            tracing::warn!("store.api_url not set, drafts are kept in memory");
            Arc::new(MemoryOfferStore::new())
        }
    };

    let feed = LomadeeFeed::new(&config.feed, timeout).expect("Failed to build feed client");
    if !feed.is_configured() {
        tracing::warn!("feed.app_token not set, feed runs will be empty");
    }
    let feed: Arc<dyn OfferFeed> = Arc::new(feed);

    let copy = CopyGenerator::from_credentials(
        config.copy.api_key.as_ref().map(|k| k.expose().as_str()),
        &config.copy.model,
        &config.copy.base_url,
    );
    tracing::info!("Copy generation: {}", if copy.is_ai() { "AI" } else { "templates" });

    let runner = PipelineRunner::new(
        feed,
        store.clone(),
        PipelineOrchestrator::new(
            OfferQualifier::new(config.qualification.clone().into()),
            ChannelRecommender::default(),
        ),
        BatchScheduler::new(config.schedule.batch_template()),
        DraftPublisher::new(store, copy),
        RunnerSettings {
            recent_window: config.store.recent_window,
            max_offers: config.feed.max_offers_per_run,
        },
    );

    let state = AppState::new(Arc::new(runner), AdminAuth::new(config.auth.admin_token.clone()));

    tokio::spawn(start_run_scheduler(state.clone(), config.schedule.run_schedule()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.expect("Failed to bind");
    axum::serve(listener, app(state)).await.expect("Server error");
}
