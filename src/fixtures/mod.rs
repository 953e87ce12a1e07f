//! Shared test-data pool: harvests reusable values from live API responses
//! so later, independent test cases can draw valid inputs without
//! re-querying or hardcoding fixture ids.

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexSet;
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, trace};

pub mod classify;

use classify::{classify, PayloadShape};

/// `ids`/`titles` keep the first distinct values encountered, up to this cap;
/// later values are dropped, never swapped in.
const FIRST_SEEN_CAP: usize = 5;
/// Bound on the stored working copy of the last ingested list.
const WORKING_SET_CAP: usize = 50;
/// Padding applied around sampled duration/view counts for range filters.
const RANGE_PAD: f64 = 1000.0;
/// Type returned when no type value has been observed yet.
const FALLBACK_TYPE: &str = "video";

// ============================= Fixture pool ==================================

/// In-memory store of values observed in API responses during one test run.
///
/// Owned by a single test-run context and mutated by sequential `ingest`
/// calls; accessors are plain reads and are total over the empty pool (no
/// data is always representable as `None` or an empty slice). Sharing one
/// pool across parallel workers would need external locking around
/// ingest/accessor pairs; per-worker pools avoid that entirely.
#[derive(Debug, Clone, Default)]
pub struct FixturePool {
    sample_entity: Option<Value>,
    entity_list: Vec<Value>,
    ids: Vec<String>,
    titles: Vec<String>,
    types: IndexSet<String>,
    categories: IndexSet<String>,
    tags: IndexSet<String>,
    // Coupon family
    coupon_list: Vec<Value>,
    group_ids: IndexSet<String>,
    codes: IndexSet<String>,
    sample_coupon: Option<Value>,
}

impl FixturePool {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------- Ingestion -------------------------------------

    /// Feed one response payload (the decoded `data` value) into the pool.
    ///
    /// The payload is classified by structural inspection; unrecognized
    /// shapes are ignored and leave the pool unchanged, since upstream
    /// response shapes vary test-to-test.
    pub fn ingest(&mut self, payload: &Value) {
        match classify(payload) {
            PayloadShape::List(items) => self.ingest_entity_list(items),
            PayloadShape::Single(entity) => self.ingest_single_entity(entity),
            PayloadShape::Unrecognized => {
                trace!("ignoring payload with unrecognized shape");
            }
        }
    }

    /// Feed a coupon-endpoint payload into the coupon side of the pool.
    pub fn ingest_coupons(&mut self, payload: &Value) {
        match classify(payload) {
            PayloadShape::List(items) => self.ingest_coupon_list(items),
            PayloadShape::Single(coupon) => self.ingest_single_coupon(coupon),
            PayloadShape::Unrecognized => {
                trace!("ignoring coupon payload with unrecognized shape");
            }
        }
    }

    fn ingest_entity_list(&mut self, items: &[Value]) {
        if items.is_empty() {
            return;
        }

        self.entity_list = items.iter().take(WORKING_SET_CAP).cloned().collect();
        // First observation wins; a later list never replaces the sample, so
        // windows derived from it stay stable across dependent test cases.
        if self.sample_entity.is_none() {
            self.sample_entity = Some(items[0].clone());
        }

        for item in items {
            if let Some(id) = id_of(item) {
                push_capped(&mut self.ids, id);
            }
            if let Some(title) = title_of(item) {
                push_capped(&mut self.titles, title);
            }
            if let Some(kind) = type_of(item) {
                self.types.insert(kind);
            }
            self.collect_categories(item);
            self.collect_tags(item);
        }

        debug!(
            items = items.len(),
            ids = self.ids.len(),
            titles = self.titles.len(),
            types = self.types.len(),
            "ingested entity list"
        );
    }

    fn ingest_single_entity(&mut self, entity: &Value) {
        if let Some(id) = id_of(entity) {
            push_capped(&mut self.ids, id);
        }
        if let Some(title) = title_of(entity) {
            push_capped(&mut self.titles, title);
        }
        if let Some(kind) = type_of(entity) {
            self.types.insert(kind);
        }
        if self.sample_entity.is_none() {
            self.sample_entity = Some(entity.clone());
        }
    }

    fn ingest_coupon_list(&mut self, items: &[Value]) {
        if items.is_empty() {
            return;
        }

        self.coupon_list = items.iter().take(WORKING_SET_CAP).cloned().collect();
        for item in items {
            if let Some(group) = key_field(item, "group") {
                self.group_ids.insert(group);
            }
            if let Some(code) = key_field(item, "code") {
                self.codes.insert(code);
            }
        }
        if self.sample_coupon.is_none() {
            self.sample_coupon = Some(items[0].clone());
        }

        debug!(
            items = items.len(),
            group_ids = self.group_ids.len(),
            codes = self.codes.len(),
            "ingested coupon list"
        );
    }

    fn ingest_single_coupon(&mut self, coupon: &Value) {
        if let Some(group) = key_field(coupon, "group") {
            self.group_ids.insert(group);
        }
        if let Some(code) = key_field(coupon, "code") {
            self.codes.insert(code);
        }
        if self.sample_coupon.is_none() {
            self.sample_coupon = Some(coupon.clone());
        }
    }

    fn collect_categories(&mut self, entity: &Value) {
        let Some(categories) = entity.get("categories").and_then(Value::as_array) else {
            return;
        };
        for category in categories {
            if let Some(id) = category.get("id").and_then(value_to_key) {
                self.categories.insert(id);
            }
        }
    }

    fn collect_tags(&mut self, entity: &Value) {
        let Some(tags) = entity.get("tags").and_then(Value::as_array) else {
            return;
        };
        for tag in tags {
            // Tags arrive either as `{name: "..."}` objects or bare strings.
            let name = tag
                .get("name")
                .and_then(Value::as_str)
                .or_else(|| tag.as_str());
            if let Some(name) = name.filter(|n| !n.is_empty()) {
                self.tags.insert(name.to_string());
            }
        }
    }

    // ------------------------- Accessors --------------------------------------

    /// Uniform-random id from the captured set, or `None` on an empty pool.
    pub fn random_id(&self) -> Option<&str> {
        pick_slice(&self.ids)
    }

    /// Uniform-random title from the captured set, or `None` on an empty pool.
    pub fn random_title(&self) -> Option<&str> {
        pick_slice(&self.titles)
    }

    /// A search token drawn from a random title: the first whitespace-
    /// delimited word longer than 3 characters, falling back to the title's
    /// first 5 characters when no word qualifies.
    pub fn search_word_from_title(&self) -> Option<String> {
        let title = self.random_title()?;
        match title.split_whitespace().find(|word| word.chars().count() > 3) {
            Some(word) => Some(word.to_string()),
            None => Some(title.chars().take(5).collect()),
        }
    }

    /// First type observed, falling back to a fixed value so callers always
    /// receive a usable type string.
    pub fn available_type(&self) -> &str {
        self.types.first().map(String::as_str).unwrap_or(FALLBACK_TYPE)
    }

    pub fn available_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    pub fn available_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    pub fn random_group_id(&self) -> Option<&str> {
        pick_set(&self.group_ids)
    }

    pub fn random_coupon_code(&self) -> Option<&str> {
        pick_set(&self.codes)
    }

    /// Minimal precondition gate for dependent scenarios: at least one id was
    /// captured or a sample entity exists.
    pub fn has_valid_data(&self) -> bool {
        !self.ids.is_empty() || self.sample_entity.is_some()
    }

    /// Duration window around the sample entity, sized so a range filter
    /// built from it is guaranteed to include at least the sampled record.
    pub fn duration_info(&self) -> Option<DurationWindow> {
        let duration = self
            .sample_entity
            .as_ref()?
            .get("duration")
            .and_then(Value::as_f64)?;
        Some(DurationWindow {
            sample: duration,
            min: (duration - RANGE_PAD).max(0.0),
            max: duration + RANGE_PAD,
        })
    }

    /// View-count window around the sample entity (`views` or `view_count`).
    pub fn views_info(&self) -> Option<ViewsWindow> {
        let entity = self.sample_entity.as_ref()?;
        let views = entity
            .get("views")
            .and_then(Value::as_f64)
            .or_else(|| entity.get("view_count").and_then(Value::as_f64))?;
        Some(ViewsWindow {
            sample: views,
            min: (views - RANGE_PAD).max(0.0),
            max: views + RANGE_PAD,
        })
    }

    /// ±24h window around the sample entity's creation date
    /// (`created_at`, `date_created` or `createdAt`, RFC 3339).
    pub fn date_info(&self) -> Option<DateWindow> {
        let entity = self.sample_entity.as_ref()?;
        let raw = ["created_at", "date_created", "createdAt"]
            .iter()
            .find_map(|key| entity.get(key).and_then(Value::as_str))?;
        let sample = DateTime::parse_from_rfc3339(raw).ok()?.with_timezone(&Utc);
        let pad = Duration::hours(24);
        Some(DateWindow {
            sample,
            created_after: sample - pad,
            created_before: sample + pad,
        })
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn types(&self) -> &IndexSet<String> {
        &self.types
    }

    pub fn categories(&self) -> &IndexSet<String> {
        &self.categories
    }

    pub fn tags(&self) -> &IndexSet<String> {
        &self.tags
    }

    pub fn group_ids(&self) -> &IndexSet<String> {
        &self.group_ids
    }

    pub fn coupon_codes(&self) -> &IndexSet<String> {
        &self.codes
    }

    pub fn sample_entity(&self) -> Option<&Value> {
        self.sample_entity.as_ref()
    }

    pub fn sample_coupon(&self) -> Option<&Value> {
        self.sample_coupon.as_ref()
    }

    pub fn entity_list(&self) -> &[Value] {
        &self.entity_list
    }

    pub fn coupon_list(&self) -> &[Value] {
        &self.coupon_list
    }

    /// Log what the pool currently holds, for run debugging.
    pub fn log_summary(&self) {
        let types = self
            .types
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        info!(
            ids = self.ids.len(),
            titles = self.titles.len(),
            types = %types,
            categories = self.categories.len(),
            tags = self.tags.len(),
            group_ids = self.group_ids.len(),
            codes = self.codes.len(),
            "fixture pool summary"
        );
        if let Some(sample) = &self.sample_entity {
            let title = sample.get("title").and_then(Value::as_str).unwrap_or("untitled");
            info!(sample_title = %title, "sample entity captured");
        }
    }
}

// ============================= Filter windows =================================

/// Window around a sampled duration, for `min_duration`/`max_duration` filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DurationWindow {
    pub sample: f64,
    pub min: f64,
    pub max: f64,
}

/// Window around a sampled view count, for `min_views`/`max_views` filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewsWindow {
    pub sample: f64,
    pub min: f64,
    pub max: f64,
}

/// Window around a sampled creation date, for `created_after`/`created_before`
/// filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DateWindow {
    pub sample: DateTime<Utc>,
    pub created_after: DateTime<Utc>,
    pub created_before: DateTime<Utc>,
}

// ============================= Field extraction ===============================

fn value_to_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn id_of(entity: &Value) -> Option<String> {
    entity
        .get("id")
        .and_then(value_to_key)
        .or_else(|| entity.get("_id").and_then(value_to_key))
}

fn title_of(entity: &Value) -> Option<String> {
    entity
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
}

fn type_of(entity: &Value) -> Option<String> {
    entity
        .get("type")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn key_field(entity: &Value, key: &str) -> Option<String> {
    entity.get(key).and_then(value_to_key)
}

fn push_capped(values: &mut Vec<String>, value: String) {
    if values.len() >= FIRST_SEEN_CAP || values.iter().any(|v| v == &value) {
        return;
    }
    values.push(value);
}

fn pick_slice(values: &[String]) -> Option<&str> {
    if values.is_empty() {
        return None;
    }
    let i = rand::thread_rng().gen_range(0..values.len());
    Some(values[i].as_str())
}

fn pick_set(values: &IndexSet<String>) -> Option<&str> {
    if values.is_empty() {
        return None;
    }
    let i = rand::thread_rng().gen_range(0..values.len());
    values.get_index(i).map(String::as_str)
}
