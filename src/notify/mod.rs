//! Notification dispatch
//!
//! Best-effort delivery to a user-configured webhook channel. Every failure
//! path logs and returns `false`; nothing here ever propagates an error
//! into alert processing.

use crate::db::Db;
use crate::error::Result;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const SEND_TIMEOUT_SECS: u64 = 10;

const NOTIFICATION_TYPE_KEY: &str = "notification_type";
const NOTIFICATION_CONFIG_KEY: &str = "notification_config";

/// Supported notification channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Bark,
    Feishu,
    DingTalk,
    Custom,
}

impl ChannelKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bark" => Some(ChannelKind::Bark),
            "feishu" => Some(ChannelKind::Feishu),
            "dingtalk" => Some(ChannelKind::DingTalk),
            "custom" => Some(ChannelKind::Custom),
            _ => None,
        }
    }
}

/// Channel endpoint configuration, stored as JSON in settings
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
}

/// Render minor currency units for notification bodies. Integer div/mod
/// only; prices never pass through floating point.
pub fn format_price(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Best-effort notification sender reading channel config from settings
pub struct Notifier {
    http: Client,
    db: Arc<Db>,
}

impl Notifier {
    pub fn new(db: Arc<Db>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, db })
    }

    /// Send one notification. Returns whether a channel accepted it;
    /// unconfigured channels and delivery failures both read as `false`.
    pub async fn send(&self, title: &str, body: &str, data: serde_json::Value) -> bool {
        info!("[notification] {}: {} {}", title, body, data);

        let kind = match self.db.get_setting(NOTIFICATION_TYPE_KEY) {
            Ok(Some(value)) => match ChannelKind::parse(&value) {
                Some(kind) => kind,
                None => {
                    warn!("Unsupported notification type: {}", value);
                    return false;
                }
            },
            Ok(None) => {
                debug!("No notification channel configured");
                return false;
            }
            Err(e) => {
                warn!("Failed to read notification settings: {}", e);
                return false;
            }
        };

        let config: ChannelConfig = match self.db.get_setting(NOTIFICATION_CONFIG_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse notification config: {}", e);
                    return false;
                }
            },
            Ok(None) => {
                debug!("No notification config set");
                return false;
            }
            Err(e) => {
                warn!("Failed to read notification settings: {}", e);
                return false;
            }
        };

        if config.url.is_empty() {
            warn!("Notification config missing URL");
            return false;
        }

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let content = format!("{}\n\n[{}]", body, timestamp);

        let result = match kind {
            ChannelKind::Bark => {
                // GET {url}/{title}/{content}?isArchive=1
                let base = config.url.trim_end_matches('/');
                let url = format!(
                    "{}/{}/{}?isArchive=1",
                    base,
                    urlencoding::encode(title),
                    urlencoding::encode(&content)
                );
                self.http.get(&url).send().await
            }
            ChannelKind::Feishu => {
                self.http
                    .post(&config.url)
                    .json(&json!({
                        "msg_type": "text",
                        "content": { "text": format!("{}\n\n{}", title, content) }
                    }))
                    .send()
                    .await
            }
            ChannelKind::DingTalk => {
                self.http
                    .post(&config.url)
                    .json(&json!({
                        "msgtype": "text",
                        "text": { "content": format!("{}\n\n{}", title, content) }
                    }))
                    .send()
                    .await
            }
            ChannelKind::Custom => {
                self.http
                    .post(&config.url)
                    .json(&json!({
                        "title": title,
                        "content": content,
                        "timestamp": timestamp
                    }))
                    .send()
                    .await
            }
        };

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("Notification endpoint returned {}", response.status());
                false
            }
            Err(e) => {
                warn!("Failed to send {:?} notification: {}", kind, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price_integer_only() {
        assert_eq!(format_price(30000), "300.00");
        assert_eq!(format_price(35001), "350.01");
        assert_eq!(format_price(5), "0.05");
        assert_eq!(format_price(0), "0.00");
    }

    #[test]
    fn test_channel_kind_parse() {
        assert_eq!(ChannelKind::parse("bark"), Some(ChannelKind::Bark));
        assert_eq!(ChannelKind::parse("feishu"), Some(ChannelKind::Feishu));
        assert_eq!(ChannelKind::parse("dingtalk"), Some(ChannelKind::DingTalk));
        assert_eq!(ChannelKind::parse("custom"), Some(ChannelKind::Custom));
        assert_eq!(ChannelKind::parse("sms"), None);
    }

    #[tokio::test]
    async fn test_send_without_channel_is_noop() {
        let db = Arc::new(Db::open_in_memory().unwrap());
        let notifier = Notifier::new(db).unwrap();
        assert!(!notifier.send("title", "body", json!({})).await);
    }

    #[tokio::test]
    async fn test_send_with_bad_config_is_noop() {
        let db = Arc::new(Db::open_in_memory().unwrap());
        db.set_settings(&[
            ("notification_type", "feishu"),
            ("notification_config", "not json"),
        ])
        .unwrap();
        let notifier = Notifier::new(db).unwrap();
        assert!(!notifier.send("title", "body", json!({})).await);
    }
}
