use async_trait::async_trait;
use chrono::{DateTime, Utc};
use promo_offer::CandidateOffer;
use serde::{Deserialize, Serialize};

use crate::CoreResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedFilters {
    pub keyword: Option<String>,
    pub category_id: Option<String>,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub code: String,
    pub description: Option<String>,
    pub store_name: Option<String>,
    pub discount: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Source of raw candidate offers (the affiliate programme).
#[async_trait]
pub trait OfferFeed: Send + Sync {
    async fn search(&self, filters: &FeedFilters) -> CoreResult<Vec<CandidateOffer>>;

    async fn list_coupons(&self) -> CoreResult<Vec<Coupon>>;
}
