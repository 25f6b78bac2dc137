// ============================================================================
// notifications.rs - Webhook Alert on Target Match
// ============================================================================

use reqwest::Client;
use tracing::{info, warn};

use crate::config::NotificationConfig;

/// Fires a webhook when a target address is hit.
///
/// Delivery is best-effort; the success record on disk is the source of
/// truth, so every failure here is logged and swallowed.
pub struct Notifier {
    config: NotificationConfig,
    client: Client,
}

impl Notifier {
    pub fn new(config: NotificationConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Send the target-match alert, if a webhook is configured.
    pub async fn notify_match(&self, address: &str, private_wif: &str) {
        if !self.config.alert_on_find {
            return;
        }

        let Some(url) = self
            .config
            .webhook_url
            .as_deref()
            .filter(|u| !u.is_empty())
        else {
            return;
        };

        let payload = serde_json::json!({
            "content": format!("Target address hit: {}", address),
            "address": address,
            "private_key": private_wif,
            "found_at": chrono::Utc::now().to_rfc3339(),
        });

        match self.client.post(url).json(&payload).send().await {
            Ok(response) => {
                if response.status().is_success() {
                    info!("Webhook alert delivered");
                } else {
                    warn!("Webhook alert rejected: {}", response.status());
                }
            }
            Err(e) => {
                warn!("Failed to send webhook alert: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notify_without_webhook_is_silent() {
        let notifier = Notifier::new(NotificationConfig {
            webhook_url: None,
            alert_on_find: true,
        });

        // No webhook configured: must return without attempting a request.
        notifier.notify_match("1ABCxyz", "5Jabc").await;
    }

    #[tokio::test]
    async fn test_notify_swallows_delivery_failure() {
        let notifier = Notifier::new(NotificationConfig {
            webhook_url: Some("http://127.0.0.1:9/hook".to_string()),
            alert_on_find: true,
        });

        // Connection refused is logged, not propagated.
        notifier.notify_match("1ABCxyz", "5Jabc").await;
    }

    #[tokio::test]
    async fn test_notify_respects_alert_flag() {
        let notifier = Notifier::new(NotificationConfig {
            webhook_url: Some("http://127.0.0.1:9/hook".to_string()),
            alert_on_find: false,
        });

        notifier.notify_match("1ABCxyz", "5Jabc").await;
    }
}
