use async_trait::async_trait;
use promo_core::{Coupon, CoreError, CoreResult, FeedFilters, OfferFeed};
use promo_offer::{CandidateOffer, Niche};
use promo_shared::Masked;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::app_config::FeedConfig;

/// Affiliate category names and the niche they hint at.
pub const CATEGORY_TO_NICHE: &[(&str, Niche)] = &[
    ("Celulares e Smartphones", Niche::Electronics),
    ("Informática", Niche::Electronics),
    ("TV e Vídeo", Niche::Electronics),
    ("Eletrônicos", Niche::Electronics),
    ("Eletrodomésticos", Niche::Home),
    ("Móveis", Niche::Home),
    ("Cama, Mesa e Banho", Niche::Home),
    ("Moda Feminina", Niche::Fashion),
    ("Moda Masculina", Niche::Fashion),
    ("Calçados", Niche::Fashion),
    ("Beleza e Perfumaria", Niche::Beauty),
    ("Saúde", Niche::Beauty),
];

pub fn niche_for_category(category: &str) -> Option<Niche> {
    CATEGORY_TO_NICHE
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, niche)| *niche)
}

#[derive(Debug, Default, Deserialize)]
struct Named {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOffer {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: Value,
    #[serde(default)]
    price_from: Value,
    #[serde(default)]
    link: String,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    category: Option<Named>,
    #[serde(default)]
    store: Option<Named>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    offers: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct CouponResponse {
    #[serde(default)]
    coupons: Vec<RawCoupon>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCoupon {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    store: Option<Named>,
    #[serde(default)]
    discount: Value,
    #[serde(default)]
    vigency: Option<String>,
}

fn parse_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Store slug as the platform expects it: lowercase, no spaces.
pub fn store_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "")
}

fn map_offer(raw: RawOffer) -> Option<CandidateOffer> {
    let sale = parse_price(&raw.price)?;
    let list = match raw.price_from {
        Value::Null => sale,
        ref other => parse_price(other)?,
    };

    let store_name = raw
        .store
        .and_then(|s| s.name)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "Loja".to_string());

    let mut offer = CandidateOffer::new(id_string(&raw.id), raw.name, list, sale, raw.link)
        .with_store(store_slug(&store_name), store_name);
    offer.description = raw.description.filter(|d| !d.is_empty());
    offer.image_url = raw.thumbnail.filter(|t| !t.is_empty());
    offer.niche_hint = raw
        .category
        .and_then(|c| c.name)
        .and_then(|name| niche_for_category(&name))
        .map(|niche| niche.slug().to_string());
    Some(offer)
}

/// Maps a raw `offer/_search` payload into candidates, skipping offers whose
/// prices cannot be read and keeping at most `max` of them.
pub fn map_search_payload(payload: Value, max: usize) -> Vec<CandidateOffer> {
    let response: SearchResponse = serde_json::from_value(payload).unwrap_or_default();
    response
        .offers
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<RawOffer>(value) {
            Ok(raw) => {
                let title = raw.name.clone();
                let mapped = map_offer(raw);
                if mapped.is_none() {
                    debug!("Skipping feed offer with unreadable prices: {}", title);
                }
                mapped
            }
            Err(e) => {
                debug!("Skipping malformed feed offer: {}", e);
                None
            }
        })
        .take(max)
        .collect()
}

/// Client for the Lomadee affiliate API.
pub struct LomadeeFeed {
    base_url: String,
    app_token: Option<Masked<String>>,
    source_id: String,
    max_offers: usize,
    http: reqwest::Client,
}

impl LomadeeFeed {
    pub fn new(config: &FeedConfig, timeout: Duration) -> CoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::NotConfigured(format!("http client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_token: config.app_token.clone().filter(|t| !t.is_blank()),
            source_id: config.source_id.clone(),
            max_offers: config.max_offers_per_run,
            http,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.app_token.is_some()
    }

    async fn request(&self, endpoint: &str, query: &[(&str, String)]) -> CoreResult<Value> {
        let token = self.app_token.as_ref().ok_or_else(|| {
            warn!("Feed app token is not configured");
            CoreError::NotConfigured("feed.app_token".to_string())
        })?;

        let url = format!("{}/{}/{}", self.base_url, token.expose(), endpoint);
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| CoreError::Unavailable(format!("feed request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::Rejected { status: status.as_u16(), body });
        }
        response.json::<Value>().await.map_err(|e| CoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl OfferFeed for LomadeeFeed {
    async fn search(&self, filters: &FeedFilters) -> CoreResult<Vec<CandidateOffer>> {
        let size = if filters.size == 0 { self.max_offers } else { filters.size.min(self.max_offers) };

        let mut query = vec![("sourceId", self.source_id.clone()), ("size", size.to_string())];
        if let Some(category) = &filters.category_id {
            query.push(("categoryId", category.clone()));
        }
        if let Some(keyword) = &filters.keyword {
            query.push(("keyword", keyword.clone()));
        }

        let payload = self.request("offer/_search", &query).await?;
        let offers = map_search_payload(payload, size);
        debug!("Feed returned {} usable offers", offers.len());
        Ok(offers)
    }

    async fn list_coupons(&self) -> CoreResult<Vec<Coupon>> {
        let payload = self.request("coupon/_all", &[]).await?;
        let response: CouponResponse = serde_json::from_value(payload).unwrap_or_default();
        Ok(response
            .coupons
            .into_iter()
            .filter(|c| !c.code.is_empty())
            .map(|c| Coupon {
                code: c.code,
                description: c.description,
                store_name: c.store.and_then(|s| s.name),
                discount: match c.discount {
                    Value::Null => None,
                    Value::String(s) => Some(s),
                    other => Some(other.to_string()),
                },
                expires_at: c
                    .vigency
                    .and_then(|v| chrono::DateTime::parse_from_rfc3339(&v).ok())
                    .map(|d| d.with_timezone(&chrono::Utc)),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feed_config(token: Option<&str>) -> FeedConfig {
        FeedConfig {
            base_url: "http://127.0.0.1:9/v3/".to_string(),
            app_token: token.map(|t| Masked::new(t.to_string())),
            source_id: "src".to_string(),
            max_offers_per_run: 50,
        }
    }

    #[test]
    fn test_maps_feed_offer() {
        let payload = json!({
            "offers": [{
                "id": 991,
                "name": "Smartphone Galaxy 128GB",
                "description": "Tela AMOLED",
                "price": 1000.0,
                "priceFrom": "2000",
                "link": "https://loja.example/galaxy",
                "thumbnail": "https://img.example/galaxy.png",
                "category": { "name": "Celulares e Smartphones" },
                "store": { "name": "Magazine Luiza" }
            }]
        });

        let offers = map_search_payload(payload, 50);
        assert_eq!(offers.len(), 1);
        let offer = &offers[0];
        assert_eq!(offer.external_id, "991");
        assert_eq!(offer.list_price, Decimal::from(2000));
        assert_eq!(offer.sale_price, Decimal::from(1000));
        assert_eq!(offer.niche_hint.as_deref(), Some("electronics"));
        assert_eq!(offer.store_slug.as_deref(), Some("magazineluiza"));
        assert_eq!(offer.store_name.as_deref(), Some("Magazine Luiza"));
        assert_eq!(offer.image_url.as_deref(), Some("https://img.example/galaxy.png"));
    }

    #[test]
    fn test_unknown_category_gives_no_hint() {
        let payload = json!({
            "offers": [{ "id": "a", "name": "Kit ferramentas", "price": 50, "priceFrom": 100,
                         "link": "https://x/a", "category": { "name": "Ferramentas" } }]
        });
        let offers = map_search_payload(payload, 50);
        assert_eq!(offers[0].niche_hint, None);
        assert_eq!(offers[0].store_slug.as_deref(), Some("loja"));
    }

    #[test]
    fn test_skips_unreadable_prices_and_caps() {
        let payload = json!({
            "offers": [
                { "id": "1", "name": "Offer one here", "price": "abc", "priceFrom": 100, "link": "https://x/1" },
                { "id": "2", "name": "Offer two here", "price": 10, "priceFrom": 100, "link": "https://x/2" },
                { "id": "3", "name": "Offer three here", "price": 20, "link": "https://x/3" },
                { "id": "4", "name": "Offer four here", "price": 30, "priceFrom": 100, "link": "https://x/4" }
            ]
        });
        let offers = map_search_payload(payload, 2);
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].external_id, "2");
        // missing priceFrom falls back to the sale price
        assert_eq!(offers[1].list_price, offers[1].sale_price);
    }

    #[test]
    fn test_empty_payload() {
        assert!(map_search_payload(json!({}), 10).is_empty());
        assert!(map_search_payload(json!({"offers": "nope"}), 10).is_empty());
    }

    #[tokio::test]
    async fn test_search_without_token() {
        let feed = LomadeeFeed::new(&feed_config(None), Duration::from_secs(1)).unwrap();
        assert!(!feed.is_configured());
        let err = feed.search(&FeedFilters::default()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_search_unreachable() {
        let feed = LomadeeFeed::new(&feed_config(Some("tok")), Duration::from_secs(1)).unwrap();
        let err = feed.search(&FeedFilters::default()).await.unwrap_err();
        assert!(matches!(err, CoreError::Unavailable(_)));
    }
}
