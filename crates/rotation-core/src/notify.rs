//! Failure notification
//!
//! A [`FailureReport`] renders into a chat message whose error body sits in a
//! fenced literal block. Delivery is best effort: [`Notifier::notify`] has no
//! error channel, implementations log and swallow their own failures.

use serde::Serialize;
use std::error::Error as StdError;

/// Maximum length of a webhook message's `content`, in characters
pub const MAX_CONTENT_CHARS: usize = 2000;

const FENCE: &str = "```";
const ZERO_WIDTH_SPACE: char = '\u{200B}';
const TRUNCATION_MARKER: &str = "\n… (truncated)";

/// Sink for failure reports
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the report once; never fails
    async fn notify(&self, report: &FailureReport);
}

/// Failure details sent to the notification sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    /// Short headline
    pub title: String,
    /// One-line context
    pub description: String,
    /// Full error text, rendered verbatim in a literal block
    pub error_body: String,
}

impl FailureReport {
    /// Create report
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        error_body: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            error_body: error_body.into(),
        }
    }

    /// Report for an error, with its whole source chain as the body
    pub fn from_error(
        title: impl Into<String>,
        description: impl Into<String>,
        error: &(dyn StdError + 'static),
    ) -> Self {
        Self::new(title, description, error_chain(error))
    }

    /// Chat message text: bold title, description, fenced error body
    #[must_use]
    pub fn to_message(&self) -> String {
        let head = format!("**{}**\n{}\n{FENCE}\n", self.title, self.description);
        let tail = format!("\n{FENCE}");

        let body = escape_fences(&self.error_body);
        let budget = MAX_CONTENT_CHARS
            .saturating_sub(head.chars().count() + tail.chars().count());
        let body = truncate_chars(&body, budget);

        format!("{head}{body}{tail}")
    }
}

/// JSON body of a webhook POST
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookMessage {
    /// Message text
    pub content: String,
    /// Always `null`
    pub embeds: Option<Vec<serde_json::Value>>,
    /// Always empty
    pub attachments: Vec<serde_json::Value>,
}

impl From<&FailureReport> for WebhookMessage {
    fn from(report: &FailureReport) -> Self {
        Self {
            content: report.to_message(),
            embeds: None,
            attachments: Vec::new(),
        }
    }
}

/// Display of an error followed by each `caused by:` source
#[must_use]
pub fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        // transparent wrappers repeat their source's message
        if !text.ends_with(&cause_text) {
            text.push_str("\ncaused by: ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

/// Separates every pair of adjacent backticks so no run can form a fence
fn escape_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut after_tick = false;
    for c in text.chars() {
        if c == '`' && after_tick {
            out.push(ZERO_WIDTH_SPACE);
        }
        out.push(c);
        after_tick = c == '`';
    }
    out
}

fn truncate_chars(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let keep = budget.saturating_sub(TRUNCATION_MARKER.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    // never leave a partial fence at the cut
    while out.ends_with('`') {
        out.pop();
    }
    out.push_str(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, RotationError};
    use crate::types::RotationStep;

    #[test]
    fn message_layout() {
        let report = FailureReport::new("Rotation failed", "at step clear", "boom");
        assert_eq!(
            report.to_message(),
            "**Rotation failed**\nat step clear\n```\nboom\n```"
        );
    }

    #[test]
    fn embedded_fences_are_escaped() {
        let report = FailureReport::new("t", "d", "before ``` inside ```` after");
        let message = report.to_message();
        assert_eq!(message.matches(FENCE).count(), 2);
        assert!(message.starts_with("**t**\nd\n```\n"));
        assert!(message.ends_with("\n```"));
        assert!(message.contains("before `\u{200B}`\u{200B}` inside"));
    }

    #[test]
    fn long_backtick_runs_are_escaped() {
        let report = FailureReport::new("t", "d", "`````");
        assert_eq!(report.to_message().matches(FENCE).count(), 2);
    }

    #[test]
    fn long_bodies_fit_content_limit() {
        let report = FailureReport::new("t", "d", "x".repeat(5000));
        let message = report.to_message();
        assert!(message.chars().count() <= MAX_CONTENT_CHARS);
        assert!(message.contains("(truncated)"));
        assert!(message.ends_with("\n```"));
    }

    #[test]
    fn truncation_respects_multibyte_chars() {
        let report = FailureReport::new("t", "d", "é".repeat(3000));
        let message = report.to_message();
        assert!(message.chars().count() <= MAX_CONTENT_CHARS);
    }

    #[test]
    fn webhook_body_shape() {
        let report = FailureReport::new("t", "d", "e");
        let json = serde_json::to_value(WebhookMessage::from(&report)).unwrap();
        assert!(json["embeds"].is_null());
        assert_eq!(json["attachments"], serde_json::json!([]));
        assert_eq!(json["content"], report.to_message());
    }

    #[test]
    fn error_chain_includes_sources() {
        let err = RotationError::at(RotationStep::Duplicate, ProviderError::MissingId);
        let text = error_chain(&err);
        assert!(text.starts_with("rotation failed at step 'duplicate spreadsheet'"));
        assert!(text.contains("copied file does not have an id"));
    }
}
