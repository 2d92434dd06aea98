use axum::{
    body::Bytes,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures_util::stream::{Stream, StreamExt};
use promo_core::Coupon;
use promo_offer::CandidateOffer;
use promo_pipeline::{RunClock, RunOutcome};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

/// Optional body of a triggered run: candidates to use instead of the feed.
#[derive(Debug, Deserialize)]
pub struct TriggerRunRequest {
    pub candidates: Vec<CandidateOffer>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/pipeline/runs", post(trigger_run))
        .route("/v1/pipeline/runs/latest", get(latest_run))
        .route("/v1/pipeline/events", get(run_events))
        .route("/v1/feed/coupons", get(list_coupons))
}

async fn trigger_run(State(state): State<AppState>, body: Bytes) -> Result<Json<RunOutcome>, AppError> {
    let candidates = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        let request: TriggerRunRequest = serde_json::from_slice(&body)?;
        Some(request.candidates)
    };

    info!(
        "Pipeline run triggered ({})",
        match &candidates {
            Some(c) => format!("{} inline candidates", c.len()),
            None => "feed".to_string(),
        }
    );
    Ok(Json(state.execute(candidates, RunClock::system()).await))
}

async fn latest_run(State(state): State<AppState>) -> Result<Json<RunOutcome>, AppError> {
    state
        .latest
        .read()
        .await
        .clone()
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError("No pipeline run yet".to_string()))
}

async fn run_events(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.events_tx.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => Some(Event::default().event("run_completed").json_data(&event)),
            // lagged receivers just skip what they missed
            Err(_) => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn list_coupons(State(state): State<AppState>) -> Result<Json<Vec<Coupon>>, AppError> {
    Ok(Json(state.runner.feed().list_coupons().await?))
}
