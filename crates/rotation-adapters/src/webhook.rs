//! Chat webhook notifier

use reqwest::Url;

use rotation_core::{FailureReport, Notifier, WebhookMessage};

/// Posts failure reports to a webhook; logs locally when none is configured
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: Option<Url>,
}

impl WebhookNotifier {
    /// Create notifier
    pub fn new(http: reqwest::Client, url: Option<Url>) -> Self {
        Self { http, url }
    }

    /// Whether reports leave the process
    #[inline]
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, report: &FailureReport) {
        let Some(url) = &self.url else {
            tracing::warn!(
                title = %report.title,
                "no webhook configured, failure report not delivered"
            );
            return;
        };

        let message = WebhookMessage::from(report);
        match self.http.post(url.clone()).json(&message).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(title = %report.title, "failure report delivered");
            }
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                tracing::error!(status, body = %body, "webhook rejected failure report");
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to deliver failure report");
            }
        }
    }
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}
