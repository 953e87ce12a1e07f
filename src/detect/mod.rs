//! Suite detection: turns ambiguous signals about which test suite ran into
//! a ranked, confidence-scored guess for downstream reporting.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::Path;

use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::errors::{Result, SentinelError};

pub mod collector;

// ============================== Evidence ======================================

/// Where a piece of evidence came from, ordered by reliability: a structured
/// execution-result listing beats an explicit CLI argument, which beats a
/// filename-on-disk heuristic, which beats free-text report scraping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    ExecutedFiles,
    CliArg,
    Filename,
    HtmlContent,
}

impl EvidenceSource {
    pub const ALL: [EvidenceSource; 4] = [
        Self::ExecutedFiles,
        Self::CliArg,
        Self::Filename,
        Self::HtmlContent,
    ];

    /// Default detection priority for this source. Callers may override per
    /// evidence item; values are always kept within [0, 1].
    pub fn default_priority(&self) -> f64 {
        match self {
            Self::ExecutedFiles => 1.0,
            Self::CliArg => 0.8,
            Self::Filename => 0.5,
            Self::HtmlContent => 0.3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ExecutedFiles => "executed_files",
            Self::CliArg => "cli_argument",
            Self::Filename => "filename",
            Self::HtmlContent => "html_content",
        }
    }
}

/// Payload carried by one evidence item: a single text (an argument, an HTML
/// head) or a list of texts (file listings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvidencePayload {
    Text(String),
    List(Vec<String>),
}

/// One observed signal about what ran. Immutable once captured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evidence {
    pub source: EvidenceSource,
    pub payload: EvidencePayload,
    pub priority: f64,
}

impl Evidence {
    pub fn text(source: EvidenceSource, text: impl Into<String>) -> Self {
        Self {
            source,
            payload: EvidencePayload::Text(text.into()),
            priority: source.default_priority(),
        }
    }

    pub fn list(source: EvidenceSource, items: Vec<String>) -> Self {
        Self {
            source,
            payload: EvidencePayload::List(items),
            priority: source.default_priority(),
        }
    }

    /// Override the detection priority, clamped into [0, 1].
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority.clamp(0.0, 1.0);
        self
    }

    /// Iterate the payload texts regardless of payload form.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        let (one, many) = match &self.payload {
            EvidencePayload::Text(text) => (Some(text.as_str()), None),
            EvidencePayload::List(items) => (None, Some(items)),
        };
        one.into_iter()
            .chain(many.into_iter().flatten().map(String::as_str))
    }
}

// ============================ Suite registry ==================================

/// Static description of one test suite: a matching keyword set plus the
/// display fields the notifier puts in front of humans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteDef {
    pub key: String,
    pub name: String,
    pub endpoint: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub operations: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Ordered collection of suite definitions. Registration order matters: it
/// is the tie-break order when two suites score the same confidence.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteRegistry {
    suites: Vec<SuiteDef>,

    // key -> index (built on registration)
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl SuiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a suite definition, rejecting duplicate keys.
    pub fn register(&mut self, suite: SuiteDef) -> Result<()> {
        if self.index.contains_key(&suite.key) {
            return Err(SentinelError::RegistryError(format!(
                "duplicate suite key: {}",
                suite.key
            )));
        }
        self.index.insert(suite.key.clone(), self.suites.len());
        self.suites.push(suite);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&SuiteDef> {
        self.index.get(key).and_then(|&i| self.suites.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SuiteDef> {
        self.suites.iter()
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// Load a registry from a YAML file (`suites:` list).
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path)?;
        Ok(serde_yaml::from_reader(f)?)
    }

    /// The suites this harness ships with.
    pub fn defaults() -> Self {
        let suites = vec![
            suite(
                "cupones",
                "Cupones API",
                "/api/coupon",
                &["cupones", "coupon", "cupon", "🎫"],
                &["GET", "POST", "PUT", "DELETE"],
                &[
                    "full CRUD",
                    "reusable and single-use coupons",
                    "validations",
                    "custom codes",
                ],
            ),
            suite(
                "media",
                "Media API",
                "/api/media",
                &["media", "📺", "🎬"],
                &["GET", "POST", "DELETE"],
                &["file upload", "media management", "format validations"],
            ),
            suite(
                "auth",
                "Auth API",
                "/api/auth",
                &["auth", "authentication", "login", "🔐"],
                &["POST", "GET"],
                &["authentication", "tokens", "user validations"],
            ),
            suite(
                "user",
                "User API",
                "/api/user",
                &["user", "usuario", "profile", "👤"],
                &["GET", "POST", "PUT"],
                &["user management", "profiles", "settings"],
            ),
        ];

        // Keys above are distinct literals, so the index can be built directly.
        let index = suites
            .iter()
            .enumerate()
            .map(|(i, s)| (s.key.clone(), i))
            .collect();
        Self { suites, index }
    }
}

fn suite(
    key: &str,
    name: &str,
    endpoint: &str,
    keywords: &[&str],
    operations: &[&str],
    features: &[&str],
) -> SuiteDef {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
    SuiteDef {
        key: key.to_string(),
        name: name.to_string(),
        endpoint: endpoint.to_string(),
        keywords: owned(keywords),
        operations: owned(operations),
        features: owned(features),
    }
}

// ================== Deserialize with registration checks =====================

#[derive(Debug, Clone, Deserialize)]
struct RegistryWire {
    suites: Vec<SuiteDef>,
}

impl<'de> Deserialize<'de> for SuiteRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = RegistryWire::deserialize(deserializer)?;
        let mut registry = SuiteRegistry::new();
        for suite in wire.suites {
            registry.register(suite).map_err(de::Error::custom)?;
        }
        Ok(registry)
    }
}

// ========================= Detection & scoring ================================

/// One keyword hit: a (evidence text × suite) match, carrying the evidence
/// priority as confidence. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub suite_key: String,
    pub confidence: f64,
    pub origin: EvidenceSource,
    pub detail: String,
}

/// Aggregated score for one suite across all of its detections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteScore {
    pub key: String,
    pub name: String,
    pub confidence: f64,
    pub detection_count: usize,
    pub origin_sources: BTreeSet<EvidenceSource>,
}

/// Outcome of one detection pass. `primary: None` with zero confidence is
/// the valid "could not determine" terminal state, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuiteAnalysis {
    pub primary: Option<SuiteScore>,
    pub suites: Vec<SuiteScore>,
    pub overall_confidence: f64,
}

impl SuiteAnalysis {
    /// Display names of all detected suites, highest confidence first.
    pub fn suite_names(&self) -> Vec<&str> {
        self.suites.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Match every evidence text against every suite's keyword set,
/// case-insensitively. Each (text × suite) pair with at least one keyword
/// hit yields one detection at the evidence's priority.
pub fn match_evidence(evidence: &[Evidence], registry: &SuiteRegistry) -> Vec<Detection> {
    let mut detections = Vec::new();

    for item in evidence {
        for text in item.texts() {
            let haystack = text.to_lowercase();
            for suite in registry.iter() {
                let hit = suite
                    .keywords
                    .iter()
                    .any(|keyword| haystack.contains(&keyword.to_lowercase()));
                if !hit {
                    continue;
                }
                let detail = match item.source {
                    // The HTML head is a couple of KB; keep the detail short.
                    EvidenceSource::HtmlContent => "found in report content".to_string(),
                    _ => text.to_string(),
                };
                detections.push(Detection {
                    suite_key: suite.key.clone(),
                    confidence: item.priority,
                    origin: item.source,
                    detail,
                });
            }
        }
    }

    detections
}

/// Consolidate detections into per-suite scores and pick the primary suite.
///
/// Per suite, confidence is `max(mean, max)` over its detections: a single
/// strong hit is never diluted by averaging with weaker ones (the expression
/// degenerates to `max` for one detection). Suites are ranked by confidence
/// descending; ties keep registry registration order (the sort is stable and
/// grouping follows registry iteration order).
pub fn aggregate(detections: &[Detection], registry: &SuiteRegistry) -> SuiteAnalysis {
    let unknown = detections
        .iter()
        .filter(|d| registry.get(&d.suite_key).is_none())
        .count();
    if unknown > 0 {
        debug!(count = unknown, "ignoring detections for suites not in the registry");
    }

    let mut suites = Vec::new();
    for suite in registry.iter() {
        let confidences: Vec<f64> = detections
            .iter()
            .filter(|d| d.suite_key == suite.key)
            .map(|d| d.confidence)
            .collect();
        if confidences.is_empty() {
            continue;
        }

        let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
        let max = confidences.iter().fold(0.0_f64, |acc, &c| acc.max(c));
        let origin_sources = detections
            .iter()
            .filter(|d| d.suite_key == suite.key)
            .map(|d| d.origin)
            .collect();

        suites.push(SuiteScore {
            key: suite.key.clone(),
            name: suite.name.clone(),
            confidence: mean.max(max),
            detection_count: confidences.len(),
            origin_sources,
        });
    }

    // Confidences live in [0, 1], never NaN; stable sort keeps ties in
    // registration order.
    suites.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let primary = suites.first().cloned();
    let overall_confidence = primary.as_ref().map(|s| s.confidence).unwrap_or(0.0);

    SuiteAnalysis {
        primary,
        suites,
        overall_confidence,
    }
}

/// One-call convenience: match evidence and aggregate the detections.
pub fn analyze(evidence: &[Evidence], registry: &SuiteRegistry) -> SuiteAnalysis {
    let detections = match_evidence(evidence, registry);
    debug!(
        evidence = evidence.len(),
        detections = detections.len(),
        "matched evidence against registry"
    );
    aggregate(&detections, registry)
}
