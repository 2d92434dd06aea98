use rand::Rng;
use serde_json::json;
use tracing::{debug, error};

use crate::models::QualifiedOffer;

const TEMPLATES: &[&str] = &[
    "🔥 OFERTA DO DIA!\n\n{title}\n\nDe R$ {list} por apenas R$ {sale}!\n\n⚡ {discount}% de desconto, corre que acaba!",
    "💰 BAIXOU O PREÇO!\n\n{title}\n\nAntes: R$ {list}\nAgora: R$ {sale}\n\n🏷️ Economize {discount}%!",
    "⚡ PROMOÇÃO RELÂMPAGO!\n\n{title}\n\nR$ {sale} ({discount}% OFF)\n\n🛒 Aproveite enquanto dura!",
    "🎯 ACHADO DO DIA!\n\n{title}\n\nPreço especial: R$ {sale}\nDesconto de {discount}%\n\n✅ Oferta verificada!",
    "🛍️ OPORTUNIDADE!\n\n{title}\n\nDe R$ {list} → R$ {sale}\n\n💸 Você economiza {discount}%!",
];

#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("Copy provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Copy provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Copy provider returned no text")]
    Empty,
}

/// Fills one of the fixed templates with title, prices and discount.
#[derive(Debug, Clone, Default)]
pub struct TemplateCopyWriter;

impl TemplateCopyWriter {
    pub fn template_count(&self) -> usize {
        TEMPLATES.len()
    }

    pub fn render(&self, offer: &QualifiedOffer) -> String {
        let index = rand::thread_rng().gen_range(0..TEMPLATES.len());
        self.render_with(index, offer)
    }

    pub fn render_with(&self, index: usize, offer: &QualifiedOffer) -> String {
        let template = TEMPLATES[index % TEMPLATES.len()];
        template
            .replace("{title}", &offer.candidate.title)
            .replace("{list}", &format!("{:.2}", offer.candidate.list_price))
            .replace("{sale}", &format!("{:.2}", offer.candidate.sale_price))
            .replace("{discount}", &offer.discount_percent.to_string())
    }
}

/// Chat-completions backed copywriter. Any failure falls back to the templates.
#[derive(Debug, Clone)]
pub struct AiCopyWriter {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    fallback: TemplateCopyWriter,
}

impl AiCopyWriter {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            fallback: TemplateCopyWriter,
        }
    }

    fn prompt(offer: &QualifiedOffer) -> String {
        format!(
            "Write a short, persuasive social media post (in Brazilian Portuguese) for this deal.\n\n\
             Product: {}\nList price: R$ {:.2}\nSale price: R$ {:.2}\nDiscount: {}%\nStore: {}\n\n\
             Rules: at most 3 lines, few emojis, create urgency, no links, no hashtags.",
            offer.candidate.title,
            offer.candidate.list_price,
            offer.candidate.sale_price,
            offer.discount_percent,
            offer.candidate.store_name.as_deref().unwrap_or("Loja"),
        )
    }

    pub async fn complete(&self, offer: &QualifiedOffer) -> Result<String, CopyError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": "You are a copywriter for Brazilian e-commerce deals. Keep it short."},
                {"role": "user", "content": Self::prompt(offer)},
            ],
            "max_tokens": 150,
            "temperature": 0.7,
        });

        debug!("Copy request to {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(CopyError::Api { status, body });
        }

        let resp: serde_json::Value = response.json().await?;
        let text = resp["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(CopyError::Empty);
        }
        Ok(text.to_string())
    }

    pub async fn generate(&self, offer: &QualifiedOffer) -> String {
        match self.complete(offer).await {
            Ok(text) => text,
            Err(e) => {
                error!("AI copy failed for {}: {}", offer.candidate.short_title(), e);
                self.fallback.render(offer)
            }
        }
    }
}

/// Copy generation capability, picked once at construction from the configured credentials.
#[derive(Debug, Clone)]
pub enum CopyGenerator {
    Ai(AiCopyWriter),
    Template(TemplateCopyWriter),
}

impl CopyGenerator {
    pub fn from_credentials(api_key: Option<&str>, model: &str, base_url: &str) -> Self {
        match api_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => CopyGenerator::Ai(AiCopyWriter::new(key.to_string(), model.to_string(), base_url.to_string())),
            None => CopyGenerator::Template(TemplateCopyWriter),
        }
    }

    pub fn is_ai(&self) -> bool {
        matches!(self, CopyGenerator::Ai(_))
    }

    /// Always returns non-empty text.
    pub async fn generate(&self, offer: &QualifiedOffer) -> String {
        match self {
            CopyGenerator::Ai(writer) => writer.generate(offer).await,
            CopyGenerator::Template(writer) => writer.render(offer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateOffer, Niche, Priority, Urgency};
    use rust_decimal::Decimal;

    fn offer() -> QualifiedOffer {
        QualifiedOffer {
            candidate: CandidateOffer::new(
                "ml-1",
                "Smartphone XYZ 128GB",
                Decimal::from(2000),
                Decimal::new(99990, 2),
                "https://aff.example/1",
            ),
            discount_percent: 50,
            niche: Niche::Electronics,
            urgency: Urgency::Today,
            priority: Priority::High,
        }
    }

    #[test]
    fn test_template_rendering() {
        let writer = TemplateCopyWriter;
        let text = writer.render_with(1, &offer());
        assert!(text.contains("Smartphone XYZ 128GB"));
        assert!(text.contains("R$ 2000.00"));
        assert!(text.contains("R$ 999.90"));
        assert!(text.contains("50%"));
        assert!(!text.contains('{'));
    }

    #[test]
    fn test_every_template_fills_all_fields() {
        let writer = TemplateCopyWriter;
        for i in 0..writer.template_count() {
            let text = writer.render_with(i, &offer());
            assert!(!text.contains('{'), "template {} left a placeholder", i);
            assert!(text.contains("50%"));
        }
    }

    #[test]
    fn test_capability_selection() {
        assert!(!CopyGenerator::from_credentials(None, "gpt-4o-mini", "https://api.openai.com").is_ai());
        assert!(!CopyGenerator::from_credentials(Some("  "), "gpt-4o-mini", "https://api.openai.com").is_ai());
        assert!(CopyGenerator::from_credentials(Some("sk-test"), "gpt-4o-mini", "https://api.openai.com").is_ai());
    }

    #[tokio::test]
    async fn test_ai_falls_back_when_provider_unreachable() {
        let generator = CopyGenerator::from_credentials(Some("sk-test"), "gpt-4o-mini", "http://127.0.0.1:9");
        let text = generator.generate(&offer()).await;
        assert!(!text.is_empty());
        assert!(text.contains("Smartphone XYZ 128GB"));
    }
}
