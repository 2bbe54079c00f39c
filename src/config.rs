use crate::types::{Result, SummarizerError};
use serde::Deserialize;
use std::path::Path;
use url::Url;

/// Static settings for the whole process, loaded once at startup and passed
/// by reference into each component's constructor.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub rss_urls: Vec<String>,
    pub openai_key: String,
    pub assistant_id: String,
    pub slack_token: String,
    #[serde(default = "default_slack_channel")]
    pub slack_channel: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

fn default_slack_channel() -> String {
    "#news".to_string()
}

fn default_database_url() -> String {
    "sqlite://articles.db?mode=rwc".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "RSS-Summarizer/1.0".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssistantConfig {
    pub api_base: String,
    pub poll_interval_secs: u64,
    /// Upper bound on run status checks before giving up on a run.
    pub max_status_checks: u32,
    /// Prompt size budget in characters; article text past it is dropped.
    pub prompt_budget_chars: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            poll_interval_secs: 2,
            max_status_checks: 150,
            prompt_budget_chars: 32_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollConfig {
    /// Idle time between full passes over all sources.
    pub idle_interval_secs: u64,
    /// Pause after each processed entry to throttle downstream calls.
    pub entry_throttle_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            idle_interval_secs: 900,
            entry_throttle_secs: 20,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SummarizerError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| SummarizerError::Config(format!("malformed config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rss_urls.is_empty() {
            return Err(SummarizerError::Config(
                "rss_urls must list at least one feed".to_string(),
            ));
        }
        for url in &self.rss_urls {
            Url::parse(url).map_err(|e| {
                SummarizerError::Config(format!("invalid feed URL {}: {}", url, e))
            })?;
        }
        for (name, value) in [
            ("openai_key", &self.openai_key),
            ("assistant_id", &self.assistant_id),
            ("slack_token", &self.slack_token),
            ("slack_channel", &self.slack_channel),
        ] {
            if value.trim().is_empty() {
                return Err(SummarizerError::Config(format!(
                    "{} must not be empty",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config_json() -> &'static str {
        r##"{
            "rss_urls": ["https://feeds.bbci.co.uk/news/rss.xml"],
            "openai_key": "sk-test",
            "assistant_id": "asst_123",
            "slack_token": "xoxb-test",
            "slack_channel": "#briefings",
            "database_url": "sqlite::memory:",
            "poll": { "idle_interval_secs": 60, "entry_throttle_secs": 1 }
        }"##
    }

    #[test]
    fn parses_full_config() {
        let config: Config = serde_json::from_str(full_config_json()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.slack_channel, "#briefings");
        assert_eq!(config.poll.idle_interval_secs, 60);
        // Sections left out of the file keep their defaults.
        assert_eq!(config.fetch.max_retries, 3);
        assert_eq!(config.assistant.poll_interval_secs, 2);
    }

    #[test]
    fn applies_defaults_for_optional_keys() {
        let config: Config = serde_json::from_str(
            r#"{
                "rss_urls": ["https://example.com/feed.xml"],
                "openai_key": "sk-test",
                "assistant_id": "asst_123",
                "slack_token": "xoxb-test"
            }"#,
        )
        .unwrap();
        assert_eq!(config.slack_channel, "#news");
        assert_eq!(config.database_url, "sqlite://articles.db?mode=rwc");
        assert_eq!(config.poll.idle_interval_secs, 900);
        assert_eq!(config.poll.entry_throttle_secs, 20);
        assert_eq!(config.assistant.max_status_checks, 150);
    }

    #[test]
    fn rejects_missing_required_key() {
        let result: std::result::Result<Config, _> = serde_json::from_str(
            r#"{ "rss_urls": ["https://example.com/feed.xml"] }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        let result: std::result::Result<Config, _> = serde_json::from_str(
            r##"{
                "rss_urls": ["https://example.com/feed.xml"],
                "openai_key": "sk-test",
                "assistant_id": "asst_123",
                "slack_token": "xoxb-test",
                "slck_channel": "#typo"
            }"##,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_feed_list() {
        let mut config: Config = serde_json::from_str(full_config_json()).unwrap();
        config.rss_urls.clear();
        assert!(matches!(
            config.validate(),
            Err(SummarizerError::Config(_))
        ));
    }

    #[test]
    fn rejects_invalid_feed_url() {
        let mut config: Config = serde_json::from_str(full_config_json()).unwrap();
        config.rss_urls.push("not a url".to_string());
        assert!(matches!(
            config.validate(),
            Err(SummarizerError::Config(_))
        ));
    }

    #[test]
    fn rejects_blank_credentials() {
        let mut config: Config = serde_json::from_str(full_config_json()).unwrap();
        config.openai_key = "   ".to_string();
        assert!(matches!(
            config.validate(),
            Err(SummarizerError::Config(_))
        ));
    }
}
