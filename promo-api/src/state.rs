use promo_offer::CandidateOffer;
use promo_pipeline::{PipelineRunner, RunClock, RunOutcome};
use promo_shared::models::events::RunCompletedEvent;
use promo_shared::Masked;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::{broadcast, RwLock};

#[derive(Clone, Default)]
pub struct AdminAuth {
    pub token: Option<Masked<String>>,
}

impl AdminAuth {
    pub fn new(token: Option<Masked<String>>) -> Self {
        Self {
            token: token.filter(|t| !t.is_blank()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Exact, constant-time match against the configured token. Always true when none is set.
    pub fn accepts(&self, presented: &str) -> bool {
        match &self.token {
            Some(expected) => expected.expose().as_bytes().ct_eq(presented.as_bytes()).into(),
            None => true,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<PipelineRunner>,
    pub latest: Arc<RwLock<Option<RunOutcome>>>,
    pub events_tx: broadcast::Sender<RunCompletedEvent>,
    pub auth: AdminAuth,
}

impl AppState {
    pub fn new(runner: Arc<PipelineRunner>, auth: AdminAuth) -> Self {
        let (events_tx, _) = broadcast::channel(100);
        Self {
            runner,
            latest: Arc::new(RwLock::new(None)),
            events_tx,
            auth,
        }
    }

    /// Runs the pipeline (over the feed, or over `candidates` when given),
    /// keeps the outcome as the latest one and announces it.
    pub async fn execute(&self, candidates: Option<Vec<CandidateOffer>>, clock: RunClock) -> RunOutcome {
        let outcome = match candidates {
            Some(candidates) => self.runner.run_with(candidates, clock).await,
            None => self.runner.run(clock).await,
        };

        // no subscribers is fine
        let _ = self.events_tx.send(outcome.report.to_event(&outcome.publish));
        *self.latest.write().await = Some(outcome.clone());
        outcome
    }
}
