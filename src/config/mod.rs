use std::env;

use crate::errors::{Result, SentinelError};

/// Centralized harness configuration, read from the process environment
/// after a `.env` pass. Every field has a default so loading never fails;
/// `validate` reports the required keys that are still missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiSettings,
    pub media: MediaSettings,
    pub auth: AuthSettings,
    pub notify: NotifySettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub token: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct MediaSettings {
    pub endpoint: String,
    pub default_limit: u64,
    pub default_skip: u64,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub token_header: String,
}

/// Settings for the notifier binary only: webhook, report paths and CI
/// identifiers belong to the delivery wrapper, not the analytical core.
#[derive(Debug, Clone)]
pub struct NotifySettings {
    pub webhook_url: Option<String>,
    pub repo: String,
    pub run_id: Option<String>,
    pub actor: Option<String>,
    pub git_ref: Option<String>,
    pub report_path: String,
    pub results_path: String,
    pub spec_dir: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    /// Load configuration from the environment, reading a `.env` file first
    /// if one is present. Missing values fall back to defaults; call
    /// `validate` before doing anything that needs credentials.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Config {
            api: ApiSettings {
                base_url: env_or("API_BASE_URL", "https://api.example.com"),
                token: env_or("API_TOKEN", ""),
                timeout_ms: env_parse("TEST_TIMEOUT", 30_000),
            },
            media: MediaSettings {
                endpoint: env_or("MEDIA_ENDPOINT", "/api/media"),
                default_limit: env_parse("DEFAULT_LIMIT", 100),
                default_skip: env_parse("DEFAULT_SKIP", 0),
            },
            auth: AuthSettings {
                token_header: env_or("X_API_TOKEN_HEADER", "X-API-Token"),
            },
            notify: NotifySettings {
                webhook_url: env_opt("SLACK_WEBHOOK_URL"),
                repo: env_or("GITHUB_REPOSITORY", "faradayy7/endpoint-sentinel"),
                run_id: env_opt("GITHUB_RUN_ID"),
                actor: env_opt("GITHUB_ACTOR"),
                git_ref: env_opt("GITHUB_REF"),
                report_path: env_or("REPORT_PATH", "playwright-report/index.html"),
                results_path: env_or("RESULTS_PATH", "test-results/test-results.json"),
                spec_dir: env_or("SPEC_DIR", "tests/api"),
            },
        }
    }

    /// Ensure the required keys are present. Collects every missing key into
    /// a single error so CI logs show the full list at once.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.api.base_url.is_empty() {
            missing.push("API_BASE_URL");
        }
        if self.api.token.is_empty() {
            missing.push("API_TOKEN");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SentinelError::ConfigError(format!(
                "missing required configuration: {}. Copy .env.example to .env and fill in the values.",
                missing.join(", ")
            )))
        }
    }
}

impl NotifySettings {
    /// GitHub Pages URL where the published HTML report lives, derived from
    /// `owner/repo`.
    pub fn pages_url(&self) -> String {
        match self.repo.split_once('/') {
            Some((owner, name)) => format!("https://{}.github.io/{}", owner.to_lowercase(), name),
            None => format!("https://{}.github.io", self.repo.to_lowercase()),
        }
    }

    /// Branch name extracted from a `refs/heads/...` ref, defaulting to `main`.
    pub fn branch(&self) -> String {
        self.git_ref
            .as_deref()
            .map(|r| r.trim_start_matches("refs/heads/").to_string())
            .unwrap_or_else(|| "main".to_string())
    }
}
