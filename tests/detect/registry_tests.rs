use std::io::Write;

use endpoint_sentinel::detect::{SuiteDef, SuiteRegistry};

fn suite(key: &str, name: &str) -> SuiteDef {
    SuiteDef {
        key: key.to_string(),
        name: name.to_string(),
        endpoint: format!("/api/{key}"),
        keywords: vec![key.to_string()],
        operations: vec![],
        features: vec![],
    }
}

fn write_temp_yaml(contents: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("create temp file");
    write!(f, "{contents}").expect("write temp yaml");
    f
}

#[test]
fn test_default_registry_ships_four_suites() {
    let registry = SuiteRegistry::defaults();

    assert_eq!(registry.len(), 4);
    let keys: Vec<&str> = registry.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, ["cupones", "media", "auth", "user"]);

    let media = registry.get("media").expect("media suite registered");
    assert_eq!(media.name, "Media API");
    assert_eq!(media.endpoint, "/api/media");
    assert!(media.keywords.iter().any(|k| k == "media"));
}

#[test]
fn test_register_preserves_insertion_order() {
    let mut registry = SuiteRegistry::new();
    registry.register(suite("b", "B Suite")).unwrap();
    registry.register(suite("a", "A Suite")).unwrap();
    registry.register(suite("c", "C Suite")).unwrap();

    let keys: Vec<&str> = registry.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, ["b", "a", "c"]);
    assert_eq!(registry.get("a").unwrap().name, "A Suite");
    assert!(registry.get("missing").is_none());
}

#[test]
fn test_register_rejects_duplicate_keys() {
    let mut registry = SuiteRegistry::new();
    registry.register(suite("media", "Media API")).unwrap();

    let err = registry
        .register(suite("media", "Media Again"))
        .expect_err("duplicate key must be rejected");
    assert!(err.to_string().contains("duplicate suite key: media"));

    // The first registration stays untouched.
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("media").unwrap().name, "Media API");
}

#[test]
fn test_empty_registry() {
    let registry = SuiteRegistry::new();

    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
    assert!(registry.get("anything").is_none());
}

#[test]
fn test_load_registry_from_yaml() {
    let yaml = r#"
suites:
  - key: billing
    name: Billing API
    endpoint: /api/billing
    keywords:
      - billing
      - invoice
    operations:
      - GET
      - POST
  - key: search
    name: Search API
    endpoint: /api/search
    keywords:
      - search
"#;

    let file = write_temp_yaml(yaml);
    let registry = SuiteRegistry::load_from_path(file.path()).expect("yaml should parse");

    assert_eq!(registry.len(), 2);
    let billing = registry.get("billing").unwrap();
    assert_eq!(billing.name, "Billing API");
    assert_eq!(billing.keywords, ["billing", "invoice"]);
    assert_eq!(billing.operations, ["GET", "POST"]);
    // `operations` and `features` are optional in the file.
    assert!(registry.get("search").unwrap().operations.is_empty());

    let keys: Vec<&str> = registry.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, ["billing", "search"]);
}

#[test]
fn test_load_rejects_duplicate_keys_in_yaml() {
    let yaml = r#"
suites:
  - key: media
    name: Media API
    endpoint: /api/media
    keywords: [media]
  - key: media
    name: Shadow Media
    endpoint: /api/media2
    keywords: [shadow]
"#;

    let file = write_temp_yaml(yaml);
    let res = SuiteRegistry::load_from_path(file.path());

    assert!(res.is_err(), "duplicate keys in yaml must fail the load");
}

#[test]
fn test_load_missing_file_is_an_error() {
    let res = SuiteRegistry::load_from_path("definitely/not/here.yaml");
    assert!(res.is_err());
}
