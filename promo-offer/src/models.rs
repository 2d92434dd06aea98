use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A raw deal as handed over by the affiliate feed. Never mutated by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateOffer {
    pub external_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub list_price: Decimal,
    #[serde(default)]
    pub sale_price: Decimal,
    pub affiliate_url: String,
    #[serde(default)]
    pub niche_hint: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub store_slug: Option<String>,
}

impl CandidateOffer {
    pub fn new(
        external_id: impl Into<String>,
        title: impl Into<String>,
        list_price: Decimal,
        sale_price: Decimal,
        affiliate_url: impl Into<String>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            title: title.into(),
            description: None,
            list_price,
            sale_price,
            affiliate_url: affiliate_url.into(),
            niche_hint: None,
            expires_at: None,
            image_url: None,
            store_name: None,
            store_slug: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_niche_hint(mut self, hint: impl Into<String>) -> Self {
        self.niche_hint = Some(hint.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_store(mut self, slug: impl Into<String>, name: impl Into<String>) -> Self {
        self.store_slug = Some(slug.into());
        self.store_name = Some(name.into());
        self
    }

    /// Title prefix used in log lines.
    pub fn short_title(&self) -> String {
        self.title.chars().take(50).collect()
    }
}

/// Internal niche labels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Niche {
    Electronics,
    Fashion,
    Home,
    Beauty,
    Uncategorized,
}

impl Niche {
    pub fn slug(&self) -> &'static str {
        match self {
            Niche::Electronics => "electronics",
            Niche::Fashion => "fashion",
            Niche::Home => "home",
            Niche::Beauty => "beauty",
            Niche::Uncategorized => "uncategorized",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Niche::Electronics => "Electronics",
            Niche::Fashion => "Fashion",
            Niche::Home => "Home",
            Niche::Beauty => "Beauty",
            Niche::Uncategorized => "Uncategorized",
        }
    }
}

impl fmt::Display for Niche {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Niche {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "electronics" => Ok(Niche::Electronics),
            "fashion" => Ok(Niche::Fashion),
            "home" => Ok(Niche::Home),
            "beauty" => Ok(Niche::Beauty),
            "uncategorized" => Ok(Niche::Uncategorized),
            other => Err(format!("unknown niche: {}", other)),
        }
    }
}

/// How time-sensitive a deal is
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Today,
    LastUnits,
    Limited,
    Normal,
}

/// Publishing priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Normal,
    Low,
}

/// Distribution channels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    Site,
    Telegram,
    Whatsapp,
    Facebook,
}

/// Insertion-ordered set of channels.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ChannelSet(Vec<Channel>);

impl ChannelSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns false when the channel was already present.
    pub fn insert(&mut self, channel: Channel) -> bool {
        if self.0.contains(&channel) {
            return false;
        }
        self.0.push(channel);
        true
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.0.contains(&channel)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Channel] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.0.iter()
    }
}

/// A candidate that passed qualification, with its classification attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualifiedOffer {
    pub candidate: CandidateOffer,
    pub discount_percent: u8,
    pub niche: Niche,
    pub urgency: Urgency,
    pub priority: Priority,
}

/// Reason codes for offers that leave a run without a scheduling decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    InvalidTitle,
    InvalidPrice,
    SuspiciousDiscount,
    BelowThreshold,
    Duplicate,
    NoBatchAvailable,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::InvalidTitle => "INVALID_TITLE",
            RejectionReason::InvalidPrice => "INVALID_PRICE",
            RejectionReason::SuspiciousDiscount => "SUSPICIOUS_DISCOUNT",
            RejectionReason::BelowThreshold => "BELOW_THRESHOLD",
            RejectionReason::Duplicate => "DUPLICATE",
            RejectionReason::NoBatchAvailable => "NO_BATCH_AVAILABLE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionRecord {
    pub external_id: String,
    pub title: String,
    pub reason: RejectionReason,
    pub discount: Option<u8>,
}
