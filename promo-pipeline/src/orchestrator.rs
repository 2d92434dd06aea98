use chrono::NaiveTime;
use promo_core::store::hhmm;
use promo_offer::qualifier::Outcome;
use promo_offer::{
    CandidateOffer, ChannelRecommender, ChannelSet, OfferQualifier, Priority, QualifiedOffer, RecentOfferSnapshot,
    RejectionReason, RejectionRecord,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::batch::SlotBoard;
use crate::report::{RunClock, RunReport};

/// What the draft collaborator receives for one qualified offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingDecision {
    pub offer: QualifiedOffer,
    pub channels: ChannelSet,
    pub batch_id: String,
    #[serde(with = "hhmm")]
    pub scheduled_time: NaiveTime,
    pub priority: Priority,
}

pub struct PipelineOrchestrator {
    qualifier: OfferQualifier,
    recommender: ChannelRecommender,
}

impl Default for PipelineOrchestrator {
    fn default() -> Self {
        Self::new(OfferQualifier::default(), ChannelRecommender::default())
    }
}

impl PipelineOrchestrator {
    pub fn new(qualifier: OfferQualifier, recommender: ChannelRecommender) -> Self {
        Self { qualifier, recommender }
    }

    /// One run over a fixed batch of candidates. Never fails: every offer ends
    /// up either as a decision or as a rejection record.
    pub fn run(
        &self,
        candidates: Vec<CandidateOffer>,
        snapshot: RecentOfferSnapshot,
        board: &mut SlotBoard,
        clock: &RunClock,
    ) -> RunReport {
        let mut report = RunReport::new(clock.now);
        report.received = candidates.len();

        let qualification = self.qualifier.qualify_all(candidates, snapshot, clock.now);

        for outcome in qualification.outcomes {
            match outcome {
                Outcome::Rejected { candidate, error } => report.reject(RejectionRecord {
                    external_id: candidate.external_id,
                    title: candidate.title,
                    reason: error.reason(),
                    discount: error.discount(),
                }),
                Outcome::Qualified(offer) => {
                    report.qualified += 1;
                    let channels = self.recommender.recommend(&offer);

                    match board.assign(clock.local_time) {
                        Ok(slot) => {
                            let priority = offer.priority;
                            report.schedule(SchedulingDecision {
                                offer,
                                channels,
                                batch_id: slot.id,
                                scheduled_time: slot.scheduled_time,
                                priority,
                            });
                        }
                        Err(e) => {
                            warn!("{}: {}", offer.candidate.short_title(), e);
                            report.reject(RejectionRecord {
                                external_id: offer.candidate.external_id,
                                title: offer.candidate.title,
                                reason: RejectionReason::NoBatchAvailable,
                                discount: Some(offer.discount_percent),
                            });
                        }
                    }
                }
            }
        }

        report.finished_at = clock.now;
        info!(
            "Run {} finished: {} received, {} qualified, {} scheduled, {} rejected",
            report.run_id,
            report.received,
            report.qualified,
            report.scheduled,
            report.rejected_total()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use promo_core::BatchSlot;
    use promo_offer::{Channel, ExistingOffer, Niche, Urgency};
    use rust_decimal::Decimal;

    fn clock() -> RunClock {
        RunClock::at(
            Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        )
    }

    fn board() -> SlotBoard {
        SlotBoard::new(vec![
            BatchSlot {
                id: "b-11".into(),
                scheduled_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
                pending_count: 0,
            },
            BatchSlot {
                id: "b-14".into(),
                scheduled_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                pending_count: 0,
            },
        ])
    }

    fn candidate(id: &str, title: &str, list: i64, sale: i64, url: &str) -> CandidateOffer {
        CandidateOffer::new(id, title, Decimal::from(list), Decimal::from(sale), url)
    }

    #[test]
    fn test_smartphone_scenario() {
        let orchestrator = PipelineOrchestrator::default();
        let mut board = board();
        let offer = candidate("1", "Smartphone XYZ 128GB", 2000, 1000, "https://loja/xyz").with_description("celular");

        let report = orchestrator.run(vec![offer], RecentOfferSnapshot::default(), &mut board, &clock());

        assert_eq!(report.received, 1);
        assert_eq!(report.scheduled, 1);
        let decision = &report.decisions[0];
        assert_eq!(decision.offer.discount_percent, 50);
        assert_eq!(decision.offer.niche, Niche::Electronics);
        assert_eq!(decision.offer.urgency, Urgency::Today);
        assert_eq!(decision.priority, Priority::High);
        assert_eq!(
            decision.channels.as_slice(),
            &[Channel::Site, Channel::Telegram, Channel::Whatsapp, Channel::Facebook]
        );
        assert_eq!(decision.batch_id, "b-11");
        assert_eq!(report.started_at, clock().now);
        assert_eq!(report.finished_at, clock().now);
    }

    #[test]
    fn test_mixed_run_counts() {
        let orchestrator = PipelineOrchestrator::default();
        let mut board = board();
        let snapshot = RecentOfferSnapshot::new(vec![ExistingOffer {
            id: Some("old".into()),
            title: "Fone bluetooth antigo".into(),
            affiliate_url: "https://loja/already".into(),
        }]);

        let candidates = vec![
            candidate("1", "Cafeteira elétrica 110v", 400, 280, "https://loja/cafe"),
            candidate("2", "Cafeteira elétrica 220v", 400, 280, "https://loja/cafe"),
            candidate("3", "Tênis corrida masculino", 300, 290, "https://loja/tenis"),
            candidate("4", "Curto", 300, 100, "https://loja/curto"),
            candidate("5", "Fone com outro nome", 300, 150, "https://loja/already"),
            candidate("6", "Panela de pressão inox", 100, 5, "https://loja/panela"),
            candidate("7", "Secador de cabelo 2000W", 200, 120, "https://loja/secador"),
        ];

        let report = orchestrator.run(candidates, snapshot, &mut board, &clock());

        assert_eq!(report.received, 7);
        assert_eq!(report.qualified, 2);
        assert_eq!(report.scheduled, 2);
        assert_eq!(report.rejected_for(RejectionReason::Duplicate), 2);
        assert_eq!(report.rejected_for(RejectionReason::BelowThreshold), 1);
        assert_eq!(report.rejected_for(RejectionReason::InvalidTitle), 1);
        assert_eq!(report.rejected_for(RejectionReason::SuspiciousDiscount), 1);
        assert_eq!(report.received, report.scheduled + report.rejected_total());

        // two decisions spread over the two slots
        let batches: Vec<&str> = report.decisions.iter().map(|d| d.batch_id.as_str()).collect();
        assert_eq!(batches, vec!["b-11", "b-14"]);
    }

    #[test]
    fn test_no_batch_rejects_qualified() {
        let orchestrator = PipelineOrchestrator::default();
        let mut board = SlotBoard::empty();
        let report = orchestrator.run(
            vec![candidate("1", "Smartphone XYZ 128GB", 2000, 1000, "https://loja/xyz")],
            RecentOfferSnapshot::default(),
            &mut board,
            &clock(),
        );

        assert_eq!(report.qualified, 1);
        assert_eq!(report.scheduled, 0);
        assert_eq!(report.rejections[0].reason, RejectionReason::NoBatchAvailable);
        assert_eq!(report.rejections[0].discount, Some(50));
    }
}
