use promo_core::{FeedFilters, OfferFeed, OfferStore};
use promo_offer::{CandidateOffer, RecentOfferSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::batch::{BatchScheduler, SlotBoard};
use crate::orchestrator::PipelineOrchestrator;
use crate::publisher::{DraftPublisher, PublishSummary};
use crate::report::{RunClock, RunReport};

#[derive(Debug, Clone)]
pub struct RunnerSettings {
    /// Size of the recent-offer window the duplicate check sees.
    pub recent_window: usize,
    pub max_offers: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            recent_window: 100,
            max_offers: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub report: RunReport,
    pub publish: PublishSummary,
}

/// Fetch, snapshot, orchestrate, publish. Collaborator failures shrink the
/// run to nothing instead of failing it.
pub struct PipelineRunner {
    feed: Arc<dyn OfferFeed>,
    store: Arc<dyn OfferStore>,
    orchestrator: PipelineOrchestrator,
    scheduler: BatchScheduler,
    publisher: DraftPublisher,
    settings: RunnerSettings,
    // one run at a time, so each run sees the previous run's offers
    running: Mutex<()>,
}

impl PipelineRunner {
    pub fn new(
        feed: Arc<dyn OfferFeed>,
        store: Arc<dyn OfferStore>,
        orchestrator: PipelineOrchestrator,
        scheduler: BatchScheduler,
        publisher: DraftPublisher,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            feed,
            store,
            orchestrator,
            scheduler,
            publisher,
            settings,
            running: Mutex::new(()),
        }
    }

    pub fn feed(&self) -> &Arc<dyn OfferFeed> {
        &self.feed
    }

    /// Run over whatever the feed returns right now.
    pub async fn run(&self, clock: RunClock) -> RunOutcome {
        let filters = FeedFilters {
            size: self.settings.max_offers,
            ..Default::default()
        };
        let candidates = match self.feed.search(&filters).await {
            Ok(offers) => offers,
            Err(e) => {
                error!("Feed fetch failed: {}", e);
                Vec::new()
            }
        };
        info!("Fetched {} candidate offers", candidates.len());
        self.run_with(candidates, clock).await
    }

    /// Run over an explicit batch of candidates.
    pub async fn run_with(&self, candidates: Vec<CandidateOffer>, clock: RunClock) -> RunOutcome {
        let _guard = self.running.lock().await;

        let snapshot = match self.store.list_active_offers(self.settings.recent_window).await {
            Ok(existing) => RecentOfferSnapshot::new(existing),
            Err(e) => {
                warn!("Recent offers unavailable, duplicate check runs without history: {}", e);
                RecentOfferSnapshot::default()
            }
        };

        let mut board = if candidates.is_empty() {
            SlotBoard::empty()
        } else {
            match self.scheduler.load_board(self.store.as_ref()).await {
                Ok(board) => board,
                Err(e) => {
                    warn!("{}", e);
                    SlotBoard::empty()
                }
            }
        };

        let report = self.orchestrator.run(candidates, snapshot, &mut board, &clock);
        let publish = self.publisher.publish(&report.decisions).await;

        RunOutcome { report, publish }
    }
}
