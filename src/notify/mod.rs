//! Chat-webhook notification assembly: run statistics, message payload
//! construction from a detection analysis, and the Slack delivery sink.

use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::NotifySettings;
use crate::detect::{SuiteAnalysis, SuiteRegistry};
use crate::errors::{Result, SentinelError};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

// ============================== Run stats ====================================

/// Pass/fail counts for one run, read from the runner's results artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub total: u64,
}

impl RunStats {
    pub fn new(passed: u64, failed: u64, skipped: u64) -> Self {
        Self {
            passed,
            failed,
            skipped,
            total: passed + failed + skipped,
        }
    }

    /// Read stats out of a results JSON file. Unreadable or unrecognized
    /// files yield `None` with a warning; callers fall back to zero stats.
    pub fn from_results_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "results file not readable, stats unavailable"
                );
                return None;
            }
        };
        let results: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "results file is not valid JSON"
                );
                return None;
            }
        };

        let stats = Self::from_results_value(&results);
        if stats.is_none() {
            warn!(
                path = %path.display(),
                "results file has no recognizable stats block"
            );
        }
        stats
    }

    /// Recognize either the runner's native shape
    /// (`stats: { expected, unexpected, skipped }`) or a flat
    /// `{ passed, failed, skipped }` document.
    pub fn from_results_value(results: &Value) -> Option<Self> {
        if let Some(stats) = results.get("stats") {
            let expected = stats.get("expected").and_then(Value::as_u64);
            let unexpected = stats.get("unexpected").and_then(Value::as_u64);
            let skipped = stats.get("skipped").and_then(Value::as_u64).unwrap_or(0);
            if let (Some(passed), Some(failed)) = (expected, unexpected) {
                return Some(Self::new(passed, failed, skipped));
            }
        }

        let passed = results.get("passed").and_then(Value::as_u64)?;
        let failed = results.get("failed").and_then(Value::as_u64).unwrap_or(0);
        let skipped = results.get("skipped").and_then(Value::as_u64).unwrap_or(0);
        Some(Self::new(passed, failed, skipped))
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.total > 0
    }

    /// Percentage of passed tests; 0 when nothing ran.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64 * 100.0
        }
    }
}

// ============================ Payload assembly ================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub color: String,
    pub text: String,
    pub mrkdwn_in: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookPayload {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

/// Assemble the chat message for one run. The headline and color follow the
/// outcome (nothing ran / all passed / some failed); the suite and endpoint
/// lines come from the detection analysis and the registry entry behind it.
pub fn build_payload(
    stats: &RunStats,
    analysis: &SuiteAnalysis,
    registry: &SuiteRegistry,
    settings: &NotifySettings,
) -> WebhookPayload {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

    let (status_emoji, status_text) = if stats.total == 0 {
        ("⚠️", "NO TESTS WERE EXECUTED".to_string())
    } else if stats.is_success() {
        ("✅", "ALL TESTS PASSED".to_string())
    } else {
        let plural = if stats.failed > 1 { "S" } else { "" };
        ("❌", format!("{} TEST{} FAILED", stats.failed, plural))
    };

    let color = if stats.total == 0 {
        "warning"
    } else if stats.is_success() {
        "good"
    } else {
        "danger"
    };

    let suite_name = analysis
        .primary
        .as_ref()
        .map(|s| s.name.as_str())
        .unwrap_or("API Tests");

    let endpoint_line = analysis
        .primary
        .as_ref()
        .and_then(|s| registry.get(&s.key))
        .map(|def| format!("*Endpoint:* `{}` - suite run complete", def.endpoint))
        .unwrap_or_else(|| "*API Testing:* run complete".to_string());

    let actor = settings.actor.as_deref().unwrap_or("automated");
    let run_id = settings.run_id.as_deref().unwrap_or("");
    let message = format!(
        "🛡️ *API Sentinel QA*\n\
         ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n\
         {status_emoji} *{status_text}*\n\
         {timestamp} | 👤 {actor} | {branch}\n\n\
         📊 *Results:*\n\
         ✅ Passed: {passed}     ❌ Failed: {failed}\n\
         Success rate: {rate:.1}%\n\n\
         *Suite:* {suite_name}\n\
         {endpoint_line}\n\n\
         <{pages}|View report> | <https://github.com/{repo}/actions/runs/{run_id}|View run>",
        branch = settings.branch(),
        passed = stats.passed,
        failed = stats.failed,
        rate = stats.success_rate(),
        pages = settings.pages_url(),
        repo = settings.repo,
    );

    WebhookPayload {
        text: format!("{status_emoji} Tests executed: {suite_name}"),
        attachments: vec![Attachment {
            color: color.to_string(),
            text: message,
            mrkdwn_in: vec!["text".to_string()],
        }],
    }
}

// ============================== Delivery sink =================================

/// Delivery seam so the command path can be exercised without a live
/// webhook endpoint.
#[async_trait]
pub trait WebhookSink: Send + Sync {
    async fn post(&self, payload: &WebhookPayload) -> Result<()>;
}

pub struct SlackWebhook {
    url: String,
    client: Client,
}

impl SlackWebhook {
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl WebhookSink for SlackWebhook {
    async fn post(&self, payload: &WebhookPayload) -> Result<()> {
        let body = serde_json::to_string(payload)?;
        debug!(bytes = body.len(), "posting webhook payload");

        let resp = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(SentinelError::NotifyError(format!(
                "webhook returned {status}: {detail}"
            )));
        }

        info!("webhook notification delivered");
        Ok(())
    }
}
