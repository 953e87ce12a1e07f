use std::env;

use endpoint_sentinel::config::{
    ApiSettings, AuthSettings, Config, MediaSettings, NotifySettings,
};

fn valid_config() -> Config {
    Config {
        api: ApiSettings {
            base_url: "https://api.example.com".to_string(),
            token: "secret-token".to_string(),
            timeout_ms: 30_000,
        },
        media: MediaSettings {
            endpoint: "/api/media".to_string(),
            default_limit: 100,
            default_skip: 0,
        },
        auth: AuthSettings {
            token_header: "X-API-Token".to_string(),
        },
        notify: NotifySettings {
            webhook_url: None,
            repo: "faradayy7/endpoint-sentinel".to_string(),
            run_id: None,
            actor: None,
            git_ref: None,
            report_path: "playwright-report/index.html".to_string(),
            results_path: "test-results/test-results.json".to_string(),
            spec_dir: "tests/api".to_string(),
        },
    }
}

#[test]
fn test_validate_accepts_complete_config() {
    assert!(valid_config().validate().is_ok());
}

#[test]
fn test_validate_lists_missing_token() {
    let mut config = valid_config();
    config.api.token = String::new();

    let err = config.validate().expect_err("missing token must fail");
    let message = err.to_string();
    assert!(message.contains("API_TOKEN"));
    assert!(!message.contains("API_BASE_URL"));
}

#[test]
fn test_validate_lists_every_missing_key_at_once() {
    let mut config = valid_config();
    config.api.base_url = String::new();
    config.api.token = String::new();

    let err = config.validate().expect_err("both keys missing");
    let message = err.to_string();
    assert!(message.contains("API_BASE_URL"));
    assert!(message.contains("API_TOKEN"));
}

#[test]
fn test_pages_url_lowercases_the_owner() {
    let mut settings = valid_config().notify;
    settings.repo = "Faradayy7/endpoint-sentinel".to_string();

    assert_eq!(
        settings.pages_url(),
        "https://faradayy7.github.io/endpoint-sentinel"
    );
}

#[test]
fn test_pages_url_without_owner_separator() {
    let mut settings = valid_config().notify;
    settings.repo = "SoloRepo".to_string();

    assert_eq!(settings.pages_url(), "https://solorepo.github.io");
}

#[test]
fn test_branch_strips_refs_heads_prefix() {
    let mut settings = valid_config().notify;

    settings.git_ref = Some("refs/heads/feature/coupons".to_string());
    assert_eq!(settings.branch(), "feature/coupons");

    settings.git_ref = Some("refs/tags/v1.0.0".to_string());
    assert_eq!(settings.branch(), "refs/tags/v1.0.0");

    settings.git_ref = None;
    assert_eq!(settings.branch(), "main");
}

// The one test that touches the process environment; it sets everything it
// asserts and cleans up after itself.
#[test]
fn test_from_env_round_trip() {
    env::set_var("API_BASE_URL", "https://qa.example.org");
    env::set_var("API_TOKEN", "qa-token");
    env::set_var("TEST_TIMEOUT", "5000");
    env::set_var("X_API_TOKEN_HEADER", "X-Custom-Token");
    env::set_var("SLACK_WEBHOOK_URL", "https://hooks.slack.example/T000/B000");
    env::set_var("GITHUB_REPOSITORY", "acme/qa-harness");
    env::set_var("GITHUB_REF", "refs/heads/main");
    env::remove_var("MEDIA_ENDPOINT");
    env::remove_var("DEFAULT_LIMIT");
    env::remove_var("GITHUB_ACTOR");

    let config = Config::from_env();

    assert_eq!(config.api.base_url, "https://qa.example.org");
    assert_eq!(config.api.token, "qa-token");
    assert_eq!(config.api.timeout_ms, 5000);
    assert_eq!(config.auth.token_header, "X-Custom-Token");
    assert_eq!(
        config.notify.webhook_url.as_deref(),
        Some("https://hooks.slack.example/T000/B000")
    );
    assert_eq!(config.notify.repo, "acme/qa-harness");
    assert_eq!(config.notify.branch(), "main");
    // Unset keys fall back to their defaults.
    assert_eq!(config.media.endpoint, "/api/media");
    assert_eq!(config.media.default_limit, 100);
    assert!(config.notify.actor.is_none());
    assert!(config.validate().is_ok());

    // A timeout that does not parse falls back to the default.
    env::set_var("TEST_TIMEOUT", "not-a-number");
    let config = Config::from_env();
    assert_eq!(config.api.timeout_ms, 30_000);

    for key in [
        "API_BASE_URL",
        "API_TOKEN",
        "TEST_TIMEOUT",
        "X_API_TOKEN_HEADER",
        "SLACK_WEBHOOK_URL",
        "GITHUB_REPOSITORY",
        "GITHUB_REF",
    ] {
        env::remove_var(key);
    }
}
