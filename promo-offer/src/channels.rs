use serde::{Deserialize, Serialize};

use crate::models::{Channel, ChannelSet, Niche, QualifiedOffer};

/// One row of the channel table: when every condition holds, its channels are added.
/// A terminal rule stops evaluation once it fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRule {
    pub name: String,
    pub conditions: Vec<RuleCondition>,
    pub channels: Vec<Channel>,
    pub terminal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RuleCondition {
    MinDiscount(u8),
    NicheIn(Vec<Niche>),
}

/// Evaluates the channel table top to bottom. Channels only accumulate.
pub struct ChannelRecommender {
    rules: Vec<ChannelRule>,
}

impl Default for ChannelRecommender {
    fn default() -> Self {
        Self::new(get_default_rules())
    }
}

impl ChannelRecommender {
    pub fn new(rules: Vec<ChannelRule>) -> Self {
        Self { rules }
    }

    pub fn recommend(&self, offer: &QualifiedOffer) -> ChannelSet {
        self.recommend_for(offer.discount_percent, offer.niche)
    }

    pub fn recommend_for(&self, discount: u8, niche: Niche) -> ChannelSet {
        let mut channels = ChannelSet::new();
        channels.insert(Channel::Site);

        for rule in &self.rules {
            if !Self::matches(rule, discount, niche) {
                continue;
            }
            for channel in &rule.channels {
                channels.insert(*channel);
            }
            if rule.terminal {
                break;
            }
        }

        channels
    }

    fn matches(rule: &ChannelRule, discount: u8, niche: Niche) -> bool {
        rule.conditions.iter().all(|condition| match condition {
            RuleCondition::MinDiscount(min) => discount >= *min,
            RuleCondition::NicheIn(niches) => niches.contains(&niche),
        })
    }
}

pub fn get_default_rules() -> Vec<ChannelRule> {
    vec![
        ChannelRule {
            name: "Deep discount goes everywhere".to_string(),
            conditions: vec![RuleCondition::MinDiscount(40)],
            channels: vec![Channel::Telegram, Channel::Whatsapp, Channel::Facebook],
            terminal: true,
        },
        ChannelRule {
            name: "Electronics on Telegram".to_string(),
            conditions: vec![RuleCondition::NicheIn(vec![Niche::Electronics])],
            channels: vec![Channel::Telegram],
            terminal: false,
        },
        ChannelRule {
            name: "Fashion and beauty on Facebook".to_string(),
            conditions: vec![RuleCondition::NicheIn(vec![Niche::Fashion, Niche::Beauty])],
            channels: vec![Channel::Facebook],
            terminal: false,
        },
        ChannelRule {
            name: "Mid discount on Telegram".to_string(),
            conditions: vec![RuleCondition::MinDiscount(30)],
            channels: vec![Channel::Telegram],
            terminal: false,
        },
    ]
}
