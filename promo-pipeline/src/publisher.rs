use promo_core::{CoreResult, DraftRequest, NewOffer, OfferStore};
use promo_offer::{CopyGenerator, Urgency};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::orchestrator::SchedulingDecision;

const FALLBACK_STORE: &str = "Loja";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishSummary {
    pub drafts_created: usize,
    pub failures: usize,
    pub draft_ids: Vec<String>,
}

/// Turns scheduling decisions into offer records and drafts in the store.
pub struct DraftPublisher {
    store: Arc<dyn OfferStore>,
    copy: CopyGenerator,
}

impl DraftPublisher {
    pub fn new(store: Arc<dyn OfferStore>, copy: CopyGenerator) -> Self {
        Self { store, copy }
    }

    pub async fn publish(&self, decisions: &[SchedulingDecision]) -> PublishSummary {
        let mut summary = PublishSummary::default();

        for decision in decisions {
            match self.publish_one(decision).await {
                Ok(draft_id) => {
                    summary.drafts_created += 1;
                    summary.draft_ids.push(draft_id);
                }
                Err(e) => {
                    error!("Draft failed for {}: {}", decision.offer.candidate.short_title(), e);
                    summary.failures += 1;
                }
            }
        }

        if !decisions.is_empty() {
            info!("Drafts created: {}, failed: {}", summary.drafts_created, summary.failures);
        }
        summary
    }

    async fn publish_one(&self, decision: &SchedulingDecision) -> CoreResult<String> {
        let offer = &decision.offer;
        let candidate = &offer.candidate;

        let niche_id = self
            .store
            .get_or_create_niche(offer.niche.slug(), offer.niche.display_name())
            .await?;

        let store_name = candidate
            .store_name
            .clone()
            .unwrap_or_else(|| FALLBACK_STORE.to_string());
        let store_slug = candidate
            .store_slug
            .clone()
            .unwrap_or_else(|| store_name.to_lowercase().replace(' ', ""));
        let store_id = self.store.get_or_create_store(&store_slug, &store_name).await?;

        let offer_id = self
            .store
            .create_offer(&NewOffer {
                title: candidate.title.clone(),
                description: candidate.description.clone().unwrap_or_default(),
                original_price: candidate.list_price,
                final_price: candidate.sale_price,
                affiliate_url: candidate.affiliate_url.clone(),
                image_url: candidate.image_url.clone().unwrap_or_default(),
                niche_id,
                store_id,
                urgency: Urgency::Normal,
            })
            .await?;

        match self.attach_draft(&offer_id, decision).await {
            Ok(draft_id) => Ok(draft_id),
            Err(e) => {
                self.withdraw(&offer_id).await;
                Err(e)
            }
        }
    }

    async fn attach_draft(&self, offer_id: &str, decision: &SchedulingDecision) -> CoreResult<String> {
        let offer = &decision.offer;

        // offers are created as NORMAL; the classified urgency is applied afterwards
        if offer.urgency != Urgency::Normal {
            let fields = json!({ "urgency": offer.urgency, "discount": offer.discount_percent });
            if let Err(e) = self.store.patch_offer(offer_id, fields).await {
                warn!("Could not update urgency of offer {}: {}", offer_id, e);
            }
        }

        let copy_text = self.copy.generate(offer).await;

        self.store
            .create_draft(&DraftRequest {
                offer_id: offer_id.to_string(),
                copy_text,
                batch_id: decision.batch_id.clone(),
                channels: decision.channels.as_slice().to_vec(),
                priority: decision.priority,
            })
            .await
    }

    /// Deactivates an offer left without a draft so the next run's duplicate
    /// window does not see it and the deal gets another chance.
    async fn withdraw(&self, offer_id: &str) {
        match self.store.patch_offer(offer_id, json!({ "active": false })).await {
            Ok(()) => info!("Offer {} deactivated after draft failure", offer_id),
            Err(e) => error!("Offer {} has no draft and could not be deactivated: {}", offer_id, e),
        }
    }
}
