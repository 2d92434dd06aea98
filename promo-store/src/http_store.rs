use async_trait::async_trait;
use chrono::NaiveTime;
use promo_core::{BatchSlot, CoreError, CoreResult, DraftRequest, NewOffer, OfferStore};
use promo_offer::ExistingOffer;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// REST client for the platform API that owns offers, niches, stores, batches and drafts.
pub struct HttpOfferStore {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SlugEntry {
    id: String,
    slug: String,
}

impl HttpOfferStore {
    pub fn new(base_url: &str, timeout: Duration) -> CoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::NotConfigured(format!("http client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> CoreResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::Rejected { status: status.as_u16(), body });
        }
        response.json::<T>().await.map_err(|e| CoreError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> CoreResult<T> {
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(unavailable)?;
        Self::read(response).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize + ?Sized>(&self, path: &str, body: &B) -> CoreResult<T> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(unavailable)?;
        Self::read(response).await
    }

    /// Look a slug up in a listing endpoint, creating it when missing.
    async fn get_or_create(&self, path: &str, slug: &str, name: &str) -> CoreResult<String> {
        let existing: Vec<SlugEntry> = self.get(path, &[]).await?;
        if let Some(entry) = existing.into_iter().find(|e| e.slug == slug) {
            return Ok(entry.id);
        }

        debug!("Creating {} entry {}", path, slug);
        let created: IdResponse = self.post(path, &json!({ "name": name, "slug": slug })).await?;
        Ok(created.id)
    }
}

fn unavailable(e: reqwest::Error) -> CoreError {
    CoreError::Unavailable(e.to_string())
}

#[async_trait]
impl OfferStore for HttpOfferStore {
    async fn list_active_offers(&self, limit: usize) -> CoreResult<Vec<ExistingOffer>> {
        self.get(
            "/api/offers",
            &[("limit", limit.to_string()), ("active", "true".to_string())],
        )
        .await
    }

    async fn get_or_create_niche(&self, slug: &str, name: &str) -> CoreResult<String> {
        self.get_or_create("/api/offers/niches", slug, name).await
    }

    async fn get_or_create_store(&self, slug: &str, name: &str) -> CoreResult<String> {
        self.get_or_create("/api/offers/stores", slug, name).await
    }

    async fn list_batches_today(&self) -> CoreResult<Vec<BatchSlot>> {
        self.get("/api/batches", &[]).await
    }

    async fn create_batch(&self, time: NaiveTime) -> CoreResult<BatchSlot> {
        let slot: BatchSlot = self
            .post("/api/batches", &json!({ "scheduledTime": time.format("%H:%M").to_string() }))
            .await?;
        info!("Created batch {} at {}", slot.id, slot.scheduled_time.format("%H:%M"));
        Ok(slot)
    }

    async fn create_offer(&self, offer: &NewOffer) -> CoreResult<String> {
        let created: IdResponse = self.post("/api/offers", offer).await?;
        Ok(created.id)
    }

    async fn create_draft(&self, draft: &DraftRequest) -> CoreResult<String> {
        let path = format!("/api/offers/{}/create-draft", draft.offer_id);
        let created: IdResponse = self.post(&path, draft).await?;
        Ok(created.id)
    }

    async fn patch_offer(&self, offer_id: &str, fields: serde_json::Value) -> CoreResult<()> {
        let response = self
            .http
            .patch(self.url(&format!("/api/offers/{}", offer_id)))
            .json(&fields)
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::Rejected { status: status.as_u16(), body });
        }
        Ok(())
    }
}
