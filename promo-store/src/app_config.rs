use chrono::NaiveTime;
use promo_core::store::hhmm;
use promo_offer::QualificationConfig;
use promo_shared::Masked;
use serde::Deserialize;
use std::env;
use tracing::warn;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub feed: FeedConfig,
    #[serde(default)]
    pub qualification: QualificationRules,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    pub copy: CopyConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Base URL of the store API. Without it the worker runs against an in-memory store.
    pub api_url: Option<String>,
    /// How many recent active offers the duplicate check looks at.
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            recent_window: default_recent_window(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_recent_window() -> usize { 100 }
fn default_timeout_secs() -> u64 { 30 }

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    pub app_token: Option<Masked<String>>,
    #[serde(default)]
    pub source_id: String,
    #[serde(default = "default_max_offers")]
    pub max_offers_per_run: usize,
}

fn default_max_offers() -> usize { 50 }

#[derive(Debug, Deserialize, Clone)]
pub struct QualificationRules {
    pub min_title_len: usize,
    pub spam_markers: Vec<String>,
    pub min_discount: u8,
    pub max_discount: u8,
}

impl Default for QualificationRules {
    fn default() -> Self {
        let defaults = QualificationConfig::default();
        Self {
            min_title_len: defaults.min_title_len,
            spam_markers: defaults.spam_markers,
            min_discount: defaults.min_discount,
            max_discount: defaults.max_discount,
        }
    }
}

impl From<QualificationRules> for QualificationConfig {
    fn from(rules: QualificationRules) -> Self {
        QualificationConfig {
            min_title_len: rules.min_title_len,
            spam_markers: rules.spam_markers,
            min_discount: rules.min_discount,
            max_discount: rules.max_discount,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    /// Daily publication slots, "HH:MM".
    pub batch_times: Vec<String>,
    /// When the pipeline itself runs, "HH:MM" local time.
    pub run_times: Vec<String>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            batch_times: ["08:00", "11:00", "14:00", "18:00", "22:00"].iter().map(|s| s.to_string()).collect(),
            run_times: ["07:00", "10:00", "13:00", "17:00"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScheduleConfig {
    pub fn batch_template(&self) -> Vec<NaiveTime> {
        parse_times("schedule.batch_times", &self.batch_times)
    }

    pub fn run_schedule(&self) -> Vec<NaiveTime> {
        parse_times("schedule.run_times", &self.run_times)
    }
}

fn parse_times(key: &str, raw: &[String]) -> Vec<NaiveTime> {
    let mut times: Vec<NaiveTime> = raw
        .iter()
        .filter_map(|s| {
            let parsed = hhmm::parse(s);
            if parsed.is_none() {
                warn!("Ignoring invalid time {:?} in {}", s, key);
            }
            parsed
        })
        .collect();
    times.sort();
    times.dedup();
    times
}

#[derive(Debug, Deserialize, Clone)]
pub struct CopyConfig {
    pub api_key: Option<Masked<String>>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    pub admin_token: Option<Masked<String>>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. PROMO__QUALIFICATION__MIN_DISCOUNT=25
            .add_source(config::Environment::with_prefix("PROMO").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml(toml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_TOML: &str = include_str!("../../config/default.toml");

    #[test]
    fn test_default_file_parses() {
        let config = Config::from_toml(DEFAULT_TOML).unwrap();
        assert_eq!(config.store.recent_window, 100);
        assert_eq!(config.feed.max_offers_per_run, 50);
        assert_eq!(config.qualification.min_discount, 20);
        assert_eq!(config.qualification.max_discount, 90);
        assert_eq!(config.schedule.batch_template().len(), 5);
        assert!(config.copy.api_key.is_none());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 3100
            [feed]
            base_url = "https://feed.example"
            [copy]
            model = "gpt-4o-mini"
            base_url = "https://api.openai.com"
            "#,
        )
        .unwrap();

        assert!(config.store.api_url.is_none());
        assert_eq!(config.store.timeout_secs, 30);
        assert_eq!(config.qualification.min_title_len, 10);
        assert_eq!(config.schedule.run_schedule().len(), 4);
        assert!(config.auth.admin_token.is_none());
    }

    #[test]
    fn test_invalid_times_are_skipped_and_sorted() {
        let schedule = ScheduleConfig {
            batch_times: vec!["18:00".into(), "nope".into(), "08:00".into(), "08:00".into()],
            run_times: vec![],
        };
        assert_eq!(
            schedule.batch_template(),
            vec![NaiveTime::from_hms_opt(8, 0, 0).unwrap(), NaiveTime::from_hms_opt(18, 0, 0).unwrap()]
        );
    }

    #[test]
    fn test_rules_convert_to_qualifier_config() {
        let rules = QualificationRules {
            min_title_len: 12,
            spam_markers: vec!["grátis".into()],
            min_discount: 25,
            max_discount: 80,
        };
        let config: QualificationConfig = rules.into();
        assert_eq!(config.min_title_len, 12);
        assert_eq!(config.max_discount, 80);
    }
}
