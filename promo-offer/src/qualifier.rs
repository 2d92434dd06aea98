use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::discount::DiscountRule;
use crate::duplicate::{DuplicateDetector, RecentOfferSnapshot};
use crate::error::QualificationError;
use crate::models::{CandidateOffer, QualifiedOffer};
use crate::{niche, priority, urgency};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualificationConfig {
    pub min_title_len: usize,
    pub spam_markers: Vec<String>,
    pub min_discount: u8,
    pub max_discount: u8,
}

impl Default for QualificationConfig {
    fn default() -> Self {
        Self {
            min_title_len: 10,
            spam_markers: vec![
                "clique aqui".to_string(),
                "compre já".to_string(),
                "oferta imperdível".to_string(),
                "xxx".to_string(),
            ],
            min_discount: 20,
            max_discount: 90,
        }
    }
}

/// Result of qualifying one candidate.
#[derive(Debug, Clone)]
pub enum Outcome {
    Qualified(QualifiedOffer),
    Rejected {
        candidate: CandidateOffer,
        error: QualificationError,
    },
}

/// Everything a sequential qualification pass produced, including the
/// snapshot with every accepted candidate folded in.
#[derive(Debug)]
pub struct QualificationRun {
    pub outcomes: Vec<Outcome>,
    pub snapshot: RecentOfferSnapshot,
}

impl QualificationRun {
    pub fn qualified(&self) -> impl Iterator<Item = &QualifiedOffer> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Qualified(q) => Some(q),
            Outcome::Rejected { .. } => None,
        })
    }
}

/// Candidate -> Qualified | Rejected(reason). Both states are terminal.
pub struct OfferQualifier {
    config: QualificationConfig,
    discount_rule: DiscountRule,
    spam_markers: Vec<String>,
}

impl Default for OfferQualifier {
    fn default() -> Self {
        Self::new(QualificationConfig::default())
    }
}

impl OfferQualifier {
    pub fn new(config: QualificationConfig) -> Self {
        let discount_rule = DiscountRule::new(config.min_discount, config.max_discount);
        let spam_markers = config.spam_markers.iter().map(|m| m.to_lowercase()).collect();
        Self {
            config,
            discount_rule,
            spam_markers,
        }
    }

    pub fn config(&self) -> &QualificationConfig {
        &self.config
    }

    pub fn check_title(&self, title: &str) -> Result<(), QualificationError> {
        if title.chars().count() < self.config.min_title_len {
            return Err(QualificationError::InvalidTitle);
        }

        let lowered = title.to_lowercase();
        if self.spam_markers.iter().any(|marker| lowered.contains(marker.as_str())) {
            return Err(QualificationError::InvalidTitle);
        }

        Ok(())
    }

    /// Qualify a single candidate against `snapshot`. Does not touch the snapshot.
    pub fn qualify(
        &self,
        candidate: &CandidateOffer,
        snapshot: &RecentOfferSnapshot,
        now: DateTime<Utc>,
    ) -> Result<QualifiedOffer, QualificationError> {
        self.check_title(&candidate.title)?;

        let discount = self.discount_rule.evaluate(candidate.list_price, candidate.sale_price)?;

        if DuplicateDetector::is_duplicate(&candidate.title, &candidate.affiliate_url, snapshot) {
            return Err(QualificationError::Duplicate);
        }

        let niche = niche::from_hint(candidate.niche_hint.as_deref())
            .unwrap_or_else(|| niche::classify(&candidate.title, candidate.description.as_deref()));

        let urgency = urgency::classify(discount, candidate.expires_at, now);

        Ok(QualifiedOffer {
            candidate: candidate.clone(),
            discount_percent: discount,
            niche,
            urgency,
            priority: priority::assign(discount),
        })
    }

    /// Qualify candidates in order. Each accepted candidate is folded into the
    /// snapshot before the next one is checked, which is what catches
    /// duplicates inside a single run.
    pub fn qualify_all(
        &self,
        candidates: Vec<CandidateOffer>,
        snapshot: RecentOfferSnapshot,
        now: DateTime<Utc>,
    ) -> QualificationRun {
        let (snapshot, outcomes) = candidates.into_iter().fold(
            (snapshot, Vec::new()),
            |(snapshot, mut outcomes), candidate| match self.qualify(&candidate, &snapshot, now) {
                Ok(qualified) => {
                    info!(
                        "Offer qualified: {}... ({}% off, {}, {:?})",
                        candidate.short_title(),
                        qualified.discount_percent,
                        qualified.niche,
                        qualified.urgency
                    );
                    let snapshot = snapshot.absorb(&candidate);
                    outcomes.push(Outcome::Qualified(qualified));
                    (snapshot, outcomes)
                }
                Err(error) => {
                    debug!("Offer rejected: {} ({})", candidate.short_title(), error);
                    outcomes.push(Outcome::Rejected { candidate, error });
                    (snapshot, outcomes)
                }
            },
        );

        QualificationRun { outcomes, snapshot }
    }
}
