use chrono::{DateTime, Local, NaiveTime, Utc};
use promo_offer::{RejectionReason, RejectionRecord};
use promo_shared::models::events::RunCompletedEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::orchestrator::SchedulingDecision;
use crate::publisher::PublishSummary;

/// The instant a run treats as "now": UTC for expiry math, local wall-clock time for slots.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    pub now: DateTime<Utc>,
    pub local_time: NaiveTime,
}

impl RunClock {
    pub fn system() -> Self {
        let local = Local::now();
        Self {
            now: local.with_timezone(&Utc),
            local_time: local.time(),
        }
    }

    pub fn at(now: DateTime<Utc>, local_time: NaiveTime) -> Self {
        Self { now, local_time }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub received: usize,
    pub qualified: usize,
    pub scheduled: usize,
    pub rejected: BTreeMap<RejectionReason, usize>,
    pub rejections: Vec<RejectionRecord>,
    pub decisions: Vec<SchedulingDecision>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: started_at,
            received: 0,
            qualified: 0,
            scheduled: 0,
            rejected: BTreeMap::new(),
            rejections: Vec::new(),
            decisions: Vec::new(),
        }
    }

    pub fn reject(&mut self, record: RejectionRecord) {
        *self.rejected.entry(record.reason).or_insert(0) += 1;
        self.rejections.push(record);
    }

    pub fn schedule(&mut self, decision: SchedulingDecision) {
        self.scheduled += 1;
        self.decisions.push(decision);
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    pub fn rejected_for(&self, reason: RejectionReason) -> usize {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }

    pub fn to_event(&self, publish: &PublishSummary) -> RunCompletedEvent {
        RunCompletedEvent {
            run_id: self.run_id,
            received: self.received,
            qualified: self.qualified,
            scheduled: self.scheduled,
            rejected: self
                .rejected
                .iter()
                .map(|(reason, count)| (reason.code().to_string(), *count))
                .collect(),
            drafts_created: publish.drafts_created,
            draft_failures: publish.failures,
            timestamp: self.finished_at.timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_counts_by_reason() {
        let mut report = RunReport::new(Utc::now());
        for reason in [RejectionReason::Duplicate, RejectionReason::Duplicate, RejectionReason::InvalidPrice] {
            report.reject(RejectionRecord {
                external_id: "x".into(),
                title: "t".into(),
                reason,
                discount: None,
            });
        }
        assert_eq!(report.rejected_total(), 3);
        assert_eq!(report.rejected_for(RejectionReason::Duplicate), 2);
        assert_eq!(report.rejected_for(RejectionReason::BelowThreshold), 0);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rejected"]["DUPLICATE"], 2);

        let event = report.to_event(&PublishSummary::default());
        assert_eq!(event.rejected["INVALID_PRICE"], 1);
        assert_eq!(event.rejected_total(), 3);
    }
}
