//! Gathers detection evidence from the artifacts a test run leaves behind:
//! the machine-readable results file, CLI arguments, spec filenames on disk,
//! and the head of the HTML report.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{Evidence, EvidenceSource};

/// How much of the HTML report to scan, in characters. Reports embed large
/// base64 payloads further down; the keywords of interest sit in the head.
pub const HTML_SCAN_LIMIT: usize = 2000;

/// Best-effort evidence collection over run artifacts. Unreadable or
/// malformed sources are logged and skipped; `collect` never fails.
#[derive(Debug, Clone)]
pub struct EvidenceCollector {
    spec_dir: PathBuf,
    report_path: PathBuf,
    results_path: PathBuf,
    cli_args: Vec<String>,
}

impl EvidenceCollector {
    pub fn new(
        spec_dir: impl Into<PathBuf>,
        report_path: impl Into<PathBuf>,
        results_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            spec_dir: spec_dir.into(),
            report_path: report_path.into(),
            results_path: results_path.into(),
            cli_args: Vec::new(),
        }
    }

    pub fn with_cli_args(mut self, args: Vec<String>) -> Self {
        self.cli_args = args;
        self
    }

    /// Collect whatever evidence the artifacts yield, strongest source first.
    pub fn collect(&self) -> Vec<Evidence> {
        let mut evidence = Vec::new();

        match fs::read_to_string(&self.results_path) {
            Ok(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(results) => {
                    let files = executed_files(&results);
                    if files.is_empty() {
                        debug!(
                            path = %self.results_path.display(),
                            "results file lists no suites"
                        );
                    } else {
                        evidence.push(Evidence::list(EvidenceSource::ExecutedFiles, files));
                    }
                }
                Err(err) => {
                    warn!(
                        path = %self.results_path.display(),
                        error = %err,
                        "could not parse results file"
                    );
                }
            },
            Err(err) => {
                debug!(
                    path = %self.results_path.display(),
                    error = %err,
                    "results file not readable"
                );
            }
        }

        if !self.cli_args.is_empty() {
            evidence.push(Evidence::list(
                EvidenceSource::CliArg,
                self.cli_args.clone(),
            ));
        }

        let spec_files = list_spec_files(&self.spec_dir);
        if !spec_files.is_empty() {
            evidence.push(Evidence::list(EvidenceSource::Filename, spec_files));
        }

        match fs::read_to_string(&self.report_path) {
            Ok(html) => {
                let head: String = html.chars().take(HTML_SCAN_LIMIT).collect();
                evidence.push(Evidence::text(EvidenceSource::HtmlContent, head));
            }
            Err(err) => {
                debug!(
                    path = %self.report_path.display(),
                    error = %err,
                    "report file not readable"
                );
            }
        }

        debug!(items = evidence.len(), "collected evidence");
        evidence
    }
}

/// Pull the executed file list out of a results document: one entry per
/// suite, preferring `file` over `title`, empty entries dropped.
fn executed_files(results: &Value) -> Vec<String> {
    results
        .get("suites")
        .and_then(Value::as_array)
        .map(|suites| {
            suites
                .iter()
                .filter_map(|suite| {
                    suite
                        .get("file")
                        .and_then(Value::as_str)
                        .or_else(|| suite.get("title").and_then(Value::as_str))
                })
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// List spec filenames (`*.spec.*`) under a directory, sorted for stable
/// output. Walk errors skip the entry rather than aborting the listing.
fn list_spec_files(root: &Path) -> Vec<String> {
    let mut out = Vec::new();

    for entry_res in WalkDir::new(root) {
        let entry = match entry_res {
            Ok(e) => e,
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name.contains(".spec.") {
            continue;
        }
        out.push(name.into_owned());
    }

    out.sort();
    out
}
