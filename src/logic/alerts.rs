//! Alert sink - one-line drift alerts
//!
//! Emits through the logging collaborator keyed by (monitor name,
//! sub-feature) and optionally relays to an external webhook. Webhook
//! failures are caught and logged, never propagated into the ingestion
//! path.

use std::time::Duration;

/// Delivery target for rising-edge drift alerts
#[derive(Debug, Clone, Default)]
pub struct AlertSink {
    webhook_url: Option<String>,
}

impl AlertSink {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self { webhook_url }
    }

    /// Emit one alert line. Never fails.
    pub fn emit(&self, monitor: &str, sub_feature: &str, message: &str) {
        log::warn!("[{}/{}] {}", monitor, sub_feature, message);

        if let Some(url) = &self.webhook_url {
            let payload = serde_json::json!({
                "text": format!(
                    "Monitor: {}, Sub-feature: {}, Alert: {}",
                    monitor, sub_feature, message
                ),
            });
            let result = ureq::post(url)
                .timeout(Duration::from_secs(5))
                .send_json(payload);
            if let Err(e) = result {
                log::warn!("Webhook delivery failed for {}: {}", monitor, e);
            }
        }
    }
}
