use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::CandidateOffer;

/// An already published/active offer as reported by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExistingOffer {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub affiliate_url: String,
}

/// Read-only view of recent offers used for duplicate detection.
///
/// Built fresh for every run. During a run the qualifier folds each accepted
/// candidate back in with [`RecentOfferSnapshot::absorb`], so later candidates
/// of the same run see it.
#[derive(Debug, Clone, Default)]
pub struct RecentOfferSnapshot {
    entries: Vec<ExistingOffer>,
    urls: HashSet<String>,
    titles: HashSet<String>,
}

impl RecentOfferSnapshot {
    pub fn new(offers: impl IntoIterator<Item = ExistingOffer>) -> Self {
        let mut snapshot = Self::default();
        for offer in offers {
            snapshot.push(offer);
        }
        snapshot
    }

    fn push(&mut self, offer: ExistingOffer) {
        self.urls.insert(offer.affiliate_url.clone());
        self.titles.insert(offer.title.to_lowercase());
        self.entries.push(offer);
    }

    /// Fold a freshly qualified candidate into the snapshot.
    pub fn absorb(mut self, candidate: &CandidateOffer) -> Self {
        self.push(ExistingOffer {
            id: None,
            title: candidate.title.clone(),
            affiliate_url: candidate.affiliate_url.clone(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ExistingOffer] {
        &self.entries
    }
}

/// Exact-match duplicate check: same affiliate URL, or same title ignoring case.
pub struct DuplicateDetector;

impl DuplicateDetector {
    pub fn is_duplicate(title: &str, affiliate_url: &str, snapshot: &RecentOfferSnapshot) -> bool {
        snapshot.urls.contains(affiliate_url) || snapshot.titles.contains(&title.to_lowercase())
    }
}
