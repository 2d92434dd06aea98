use async_trait::async_trait;
use chrono::NaiveTime;
use promo_core::{BatchSlot, Coupon, CoreError, CoreResult, DraftRequest, FeedFilters, NewOffer, OfferFeed, OfferStore};
use promo_offer::{CandidateOffer, ExistingOffer};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StoredOffer {
    pub id: String,
    pub offer: NewOffer,
    pub patches: Vec<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct StoredDraft {
    pub id: String,
    pub request: DraftRequest,
}

#[derive(Default)]
struct MemoryState {
    active: Vec<ExistingOffer>,
    offers: Vec<StoredOffer>,
    niches: HashMap<String, String>,
    stores: HashMap<String, String>,
    batches: Vec<BatchSlot>,
    drafts: Vec<StoredDraft>,
}

/// In-process store used for dry runs and tests.
#[derive(Default)]
pub struct MemoryOfferStore {
    state: RwLock<MemoryState>,
    batches_unavailable: bool,
}

fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

impl MemoryOfferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds these active offers.
    pub fn with_active(active: Vec<ExistingOffer>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                active,
                ..Default::default()
            }),
            batches_unavailable: false,
        }
    }

    /// Batch endpoints fail, as if the store were unreachable for them.
    pub fn without_batches(mut self) -> Self {
        self.batches_unavailable = true;
        self
    }

    pub async fn seed_batches(&self, slots: Vec<BatchSlot>) {
        self.state.write().await.batches = slots;
    }

    pub async fn batches(&self) -> Vec<BatchSlot> {
        self.state.read().await.batches.clone()
    }

    pub async fn drafts(&self) -> Vec<StoredDraft> {
        self.state.read().await.drafts.clone()
    }

    pub async fn offers(&self) -> Vec<StoredOffer> {
        self.state.read().await.offers.clone()
    }

    fn check_batches(&self) -> CoreResult<()> {
        if self.batches_unavailable {
            return Err(CoreError::Unavailable("batch endpoint unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OfferStore for MemoryOfferStore {
    async fn list_active_offers(&self, limit: usize) -> CoreResult<Vec<ExistingOffer>> {
        let state = self.state.read().await;
        Ok(state.active.iter().rev().take(limit).cloned().collect())
    }

    async fn get_or_create_niche(&self, slug: &str, _name: &str) -> CoreResult<String> {
        let mut state = self.state.write().await;
        Ok(state.niches.entry(slug.to_string()).or_insert_with(|| new_id("niche")).clone())
    }

    async fn get_or_create_store(&self, slug: &str, _name: &str) -> CoreResult<String> {
        let mut state = self.state.write().await;
        Ok(state.stores.entry(slug.to_string()).or_insert_with(|| new_id("store")).clone())
    }

    async fn list_batches_today(&self) -> CoreResult<Vec<BatchSlot>> {
        self.check_batches()?;
        let mut slots = self.state.read().await.batches.clone();
        slots.sort_by_key(|s| s.scheduled_time);
        Ok(slots)
    }

    async fn create_batch(&self, time: NaiveTime) -> CoreResult<BatchSlot> {
        self.check_batches()?;
        let slot = BatchSlot {
            id: new_id("batch"),
            scheduled_time: time,
            pending_count: 0,
        };
        self.state.write().await.batches.push(slot.clone());
        Ok(slot)
    }

    async fn create_offer(&self, offer: &NewOffer) -> CoreResult<String> {
        let id = new_id("offer");
        let mut state = self.state.write().await;
        state.active.push(ExistingOffer {
            id: Some(id.clone()),
            title: offer.title.clone(),
            affiliate_url: offer.affiliate_url.clone(),
        });
        state.offers.push(StoredOffer {
            id: id.clone(),
            offer: offer.clone(),
            patches: Vec::new(),
        });
        Ok(id)
    }

    async fn create_draft(&self, draft: &DraftRequest) -> CoreResult<String> {
        let mut state = self.state.write().await;
        if !state.offers.iter().any(|o| o.id == draft.offer_id) {
            return Err(CoreError::Rejected {
                status: 404,
                body: format!("offer {} not found", draft.offer_id),
            });
        }
        let slot = state
            .batches
            .iter_mut()
            .find(|b| b.id == draft.batch_id)
            .ok_or_else(|| CoreError::Rejected {
                status: 404,
                body: format!("batch {} not found", draft.batch_id),
            })?;
        slot.pending_count += 1;

        let id = new_id("draft");
        state.drafts.push(StoredDraft {
            id: id.clone(),
            request: draft.clone(),
        });
        Ok(id)
    }

    async fn patch_offer(&self, offer_id: &str, fields: serde_json::Value) -> CoreResult<()> {
        let mut state = self.state.write().await;
        let deactivate = fields.get("active") == Some(&serde_json::Value::Bool(false));

        let offer = state
            .offers
            .iter_mut()
            .find(|o| o.id == offer_id)
            .ok_or_else(|| CoreError::Rejected {
                status: 404,
                body: format!("offer {} not found", offer_id),
            })?;
        offer.patches.push(fields);

        if deactivate {
            state.active.retain(|o| o.id.as_deref() != Some(offer_id));
        }
        Ok(())
    }
}

/// Feed over a fixed list of candidates (inline runs, tests).
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    offers: Vec<CandidateOffer>,
    coupons: Vec<Coupon>,
}

impl StaticFeed {
    pub fn new(offers: Vec<CandidateOffer>) -> Self {
        Self {
            offers,
            coupons: Vec::new(),
        }
    }

    pub fn with_coupons(mut self, coupons: Vec<Coupon>) -> Self {
        self.coupons = coupons;
        self
    }
}

#[async_trait]
impl OfferFeed for StaticFeed {
    async fn search(&self, filters: &FeedFilters) -> CoreResult<Vec<CandidateOffer>> {
        let keyword = filters.keyword.as_ref().map(|k| k.to_lowercase());
        let size = if filters.size == 0 { usize::MAX } else { filters.size };
        Ok(self
            .offers
            .iter()
            .filter(|o| keyword.as_ref().map_or(true, |k| o.title.to_lowercase().contains(k.as_str())))
            .take(size)
            .cloned()
            .collect())
    }

    async fn list_coupons(&self) -> CoreResult<Vec<Coupon>> {
        Ok(self.coupons.clone())
    }
}
