use chrono::{DateTime, Utc};
use endpoint_sentinel::fixtures::FixturePool;
use serde_json::json;

fn utc(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
}

#[test]
fn test_duration_window_around_sample() {
    let mut pool = FixturePool::new();

    pool.ingest(&json!({ "data": [ { "id": "m1", "duration": 5000.0 } ] }));

    let window = pool.duration_info().expect("sample has a duration");
    assert_eq!(window.sample, 5000.0);
    assert_eq!(window.min, 4000.0);
    assert_eq!(window.max, 6000.0);
}

#[test]
fn test_duration_window_clamped_at_zero() {
    let mut pool = FixturePool::new();

    pool.ingest(&json!({ "data": [ { "id": "m1", "duration": 300 } ] }));

    let window = pool.duration_info().expect("sample has a duration");
    assert_eq!(window.min, 0.0);
    assert_eq!(window.max, 1300.0);
}

#[test]
fn test_views_window_uses_views_field() {
    let mut pool = FixturePool::new();

    pool.ingest(&json!({ "data": [ { "id": "m1", "views": 1200 } ] }));

    let window = pool.views_info().expect("sample has views");
    assert_eq!(window.sample, 1200.0);
    assert_eq!(window.min, 200.0);
    assert_eq!(window.max, 2200.0);
}

#[test]
fn test_views_window_accepts_view_count_alias() {
    let mut pool = FixturePool::new();

    pool.ingest(&json!({ "data": [ { "id": "m1", "view_count": 50 } ] }));

    let window = pool.views_info().expect("alias field recognized");
    assert_eq!(window.sample, 50.0);
    assert_eq!(window.min, 0.0);
}

#[test]
fn test_windows_absent_on_empty_pool() {
    let pool = FixturePool::new();

    assert!(pool.duration_info().is_none());
    assert!(pool.views_info().is_none());
    assert!(pool.date_info().is_none());
}

#[test]
fn test_windows_absent_when_sample_lacks_fields() {
    let mut pool = FixturePool::new();

    pool.ingest(&json!({ "data": [ { "id": "m1", "title": "No Numbers Here" } ] }));

    assert!(pool.duration_info().is_none());
    assert!(pool.views_info().is_none());
    assert!(pool.date_info().is_none());
}

#[test]
fn test_date_window_spans_one_day_each_way() {
    let mut pool = FixturePool::new();

    pool.ingest(&json!({
        "data": [ { "id": "m1", "created_at": "2024-03-10T12:00:00Z" } ]
    }));

    let window = pool.date_info().expect("sample has a creation date");
    assert_eq!(window.sample, utc("2024-03-10T12:00:00Z"));
    assert_eq!(window.created_after, utc("2024-03-09T12:00:00Z"));
    assert_eq!(window.created_before, utc("2024-03-11T12:00:00Z"));
}

#[test]
fn test_date_window_accepts_alias_keys() {
    let mut first = FixturePool::new();
    first.ingest(&json!({ "data": [ { "id": "m1", "date_created": "2024-01-01T00:00:00Z" } ] }));
    assert!(first.date_info().is_some());

    let mut second = FixturePool::new();
    second.ingest(&json!({ "data": [ { "id": "m2", "createdAt": "2024-01-01T00:00:00+02:00" } ] }));
    assert!(second.date_info().is_some());
}

#[test]
fn test_date_window_rejects_unparseable_dates() {
    let mut pool = FixturePool::new();

    pool.ingest(&json!({ "data": [ { "id": "m1", "created_at": "yesterday-ish" } ] }));

    assert!(pool.date_info().is_none());
}

#[test]
fn test_windows_follow_the_first_sample_only() {
    let mut pool = FixturePool::new();

    pool.ingest(&json!({ "data": [ { "id": "plain" } ] }));
    pool.ingest(&json!({ "data": [ { "id": "rich", "duration": 9000 } ] }));

    // The sample was fixed by the first ingest, so no duration is available
    // even though a later entity carried one.
    assert!(pool.duration_info().is_none());
}
