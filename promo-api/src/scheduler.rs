use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use promo_pipeline::RunClock;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::state::AppState;

/// Next run strictly after `now`: the first of today's remaining times, or
/// the first time tomorrow.
pub fn next_run_after(now: NaiveDateTime, times: &[NaiveTime]) -> Option<NaiveDateTime> {
    let today = now.date();
    let earliest = times.iter().min()?;

    match times.iter().filter(|t| **t > now.time()).min() {
        Some(time) => Some(today.and_time(*time)),
        None => Some((today + Duration::days(1)).and_time(*earliest)),
    }
}

pub async fn start_run_scheduler(state: AppState, times: Vec<NaiveTime>) {
    if times.is_empty() {
        warn!("No schedule.run_times configured, pipeline runs only on demand");
        return;
    }

    info!(
        "Pipeline scheduler started: {}",
        times.iter().map(|t| t.format("%H:%M").to_string()).collect::<Vec<_>>().join(", ")
    );

    loop {
        let now = Local::now().naive_local();
        let Some(next) = next_run_after(now, &times) else {
            return;
        };

        let wait = (next - now).to_std().unwrap_or_default();
        info!("Next pipeline run at {}", next.format("%Y-%m-%d %H:%M"));
        sleep(wait).await;

        let outcome = state.execute(None, RunClock::system()).await;
        info!(
            "Scheduled run {} done: {} scheduled, {} drafts",
            outcome.report.run_id, outcome.report.scheduled, outcome.publish.drafts_created
        );
    }
}
