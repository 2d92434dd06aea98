use async_trait::async_trait;
use chrono::NaiveTime;
use promo_offer::{Channel, ExistingOffer, Priority, Urgency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CoreResult;

/// A scheduled publication time of day and how many posts are already queued on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchSlot {
    pub id: String,
    #[serde(with = "hhmm")]
    pub scheduled_time: NaiveTime,
    #[serde(default)]
    pub pending_count: u32,
}

/// Offer record as created in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOffer {
    pub title: String,
    pub description: String,
    pub original_price: Decimal,
    pub final_price: Decimal,
    pub affiliate_url: String,
    pub image_url: String,
    pub niche_id: String,
    pub store_id: String,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    #[serde(skip)]
    pub offer_id: String,
    pub copy_text: String,
    pub batch_id: String,
    pub channels: Vec<Channel>,
    pub priority: Priority,
}

/// Persistent offer/niche/store/batch/draft store.
#[async_trait]
pub trait OfferStore: Send + Sync {
    /// Most recent `limit` active offers, newest first.
    async fn list_active_offers(&self, limit: usize) -> CoreResult<Vec<ExistingOffer>>;

    async fn get_or_create_niche(&self, slug: &str, name: &str) -> CoreResult<String>;

    async fn get_or_create_store(&self, slug: &str, name: &str) -> CoreResult<String>;

    async fn list_batches_today(&self) -> CoreResult<Vec<BatchSlot>>;

    async fn create_batch(&self, time: NaiveTime) -> CoreResult<BatchSlot>;

    async fn create_offer(&self, offer: &NewOffer) -> CoreResult<String>;

    async fn create_draft(&self, draft: &DraftRequest) -> CoreResult<String>;

    async fn patch_offer(&self, offer_id: &str, fields: serde_json::Value) -> CoreResult<()>;
}

/// `"HH:MM"` on the wire; `"HH:MM:SS"` is accepted too.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn parse(s: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(s.trim(), FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M:%S"))
            .ok()
    }

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time of day: {}", raw)))
    }
}
