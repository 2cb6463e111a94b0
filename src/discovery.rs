//! Discovery Module for the tachui compiler
//!
//! Glob matching shared with the plugin's include/exclude filters, and the
//! project scan that feeds the pattern report: walk a directory, analyze every
//! matching file in parallel, aggregate.

#[cfg(feature = "napi")]
use napi_derive::napi;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::analyze::{try_analyze_patterns, ConcatenationPattern};
use crate::cache::AnalysisCache;
use crate::error::ReportError;
use crate::report::{summarize, write_report, PatternReport};

pub const DEFAULT_SCAN_PATTERN: &str = "**/*.{ts,tsx,js,jsx}";

const SKIPPED_DIRS: [&str; 2] = ["node_modules", ".git"];

// ═══════════════════════════════════════════════════════════════════════════════
// GLOB MATCHING
// ═══════════════════════════════════════════════════════════════════════════════

/// Translate a file glob into an anchored regex over `/`-separated paths.
///
/// `**/` spans any number of directories (including none), `*` and `?` stay
/// within one path segment, `{a,b}` is alternation. Relative patterns may
/// match at any directory boundary so they apply to absolute ids too.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, ReportError> {
    let invalid = |message: &str| ReportError::Pattern {
        pattern: pattern.to_string(),
        message: message.to_string(),
    };

    let mut re = String::from("^");
    if !pattern.starts_with('/') {
        re.push_str("(?:.*/)?");
    }

    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    let mut brace_depth = 0usize;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    re.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    re.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            '{' => {
                brace_depth += 1;
                re.push_str("(?:");
            }
            '}' if brace_depth > 0 => {
                brace_depth -= 1;
                re.push(')');
            }
            ',' if brace_depth > 0 => re.push('|'),
            '}' => return Err(invalid("unmatched '}'")),
            _ => re.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }
    if brace_depth > 0 {
        return Err(invalid("unclosed '{'"));
    }
    re.push('$');

    Regex::new(&re).map_err(|e| invalid(&e.to_string()))
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Recursively find files under `root` whose root-relative path matches
/// `matcher`, sorted by path.
pub fn find_source_files(root: &Path, matcher: &Regex) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| matcher.is_match(&relative_path(root, path)))
        .collect();
    files.sort();
    files
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROJECT SCAN
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanOptions {
    pub pattern: String,
    pub output: Option<PathBuf>,
    pub detailed: bool,
    pub performance: bool,
    pub concatenation_only: bool,
    pub cache_dir: Option<PathBuf>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_SCAN_PATTERN.to_string(),
            output: None,
            detailed: false,
            performance: false,
            concatenation_only: false,
            cache_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: String,
    pub pattern_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<ConcatenationPattern>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReport {
    pub summary: PatternReport,
    pub files: Vec<FileReport>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<f64>,
}

enum FileOutcome {
    Analyzed {
        path: String,
        patterns: Vec<ConcatenationPattern>,
        duration_ms: f64,
    },
    Failed(String),
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn analyze_file(root: &Path, path: &Path, cache: Option<&AnalysisCache>) -> FileOutcome {
    let start = Instant::now();
    let rel_path = relative_path(root, path);

    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => return FileOutcome::Failed(format!("{}: {}", rel_path, e)),
    };

    if let Some(patterns) = cache.and_then(|c| c.get(&rel_path, &source)) {
        debug!(file = %rel_path, "Analysis cache hit");
        return FileOutcome::Analyzed {
            path: rel_path,
            patterns,
            duration_ms: elapsed_ms(start),
        };
    }

    match try_analyze_patterns(&source, &rel_path) {
        Ok(patterns) => {
            if let Some(cache) = cache {
                cache.set(&rel_path, &source, &patterns);
            }
            FileOutcome::Analyzed {
                path: rel_path,
                patterns,
                duration_ms: elapsed_ms(start),
            }
        }
        Err(e) => FileOutcome::Failed(e.to_string()),
    }
}

/// Analyze every matching file under `root` and aggregate the results.
///
/// Per-file failures become warnings; only an unusable root, an invalid
/// pattern or a failed report write abort the scan.
pub fn scan_project(root: &Path, options: &ScanOptions) -> Result<ProjectReport, ReportError> {
    let start = Instant::now();
    if !root.is_dir() {
        return Err(ReportError::Read {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let matcher = glob_to_regex(&options.pattern)?;
    let files = find_source_files(root, &matcher);
    let cache = options.cache_dir.as_ref().map(AnalysisCache::new);

    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|path| analyze_file(root, path, cache.as_ref()))
        .collect();

    let mut all_patterns = Vec::new();
    let mut file_reports = Vec::new();
    let mut warnings = Vec::new();

    for outcome in outcomes {
        match outcome {
            FileOutcome::Analyzed {
                path,
                patterns,
                duration_ms,
            } => {
                all_patterns.extend(patterns.iter().cloned());
                if options.concatenation_only && patterns.is_empty() {
                    continue;
                }
                file_reports.push(FileReport {
                    path,
                    pattern_count: patterns.len(),
                    patterns: options.detailed.then_some(patterns),
                    duration_ms: options.performance.then_some(duration_ms),
                });
            }
            FileOutcome::Failed(message) => {
                warn!(error = %message, "Skipping file");
                warnings.push(message);
            }
        }
    }

    let report = ProjectReport {
        summary: summarize(&all_patterns),
        files: file_reports,
        warnings,
        total_duration_ms: options.performance.then(|| elapsed_ms(start)),
    };

    debug!(
        root = %root.display(),
        files = files.len(),
        count = report.summary.total_patterns,
        "Project scan complete"
    );

    if let Some(output) = &options.output {
        write_report(&report, output)?;
    }
    Ok(report)
}

#[cfg(feature = "napi")]
#[napi]
pub fn scan_project_native(
    root: String,
    options_json: Option<String>,
) -> napi::Result<serde_json::Value> {
    let options: ScanOptions = match options_json {
        Some(json) => {
            serde_json::from_str(&json).map_err(|e| napi::Error::from_reason(e.to_string()))?
        }
        None => ScanOptions::default(),
    };
    let report =
        scan_project(Path::new(&root), &options).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    serde_json::to_value(report).map_err(|e| napi::Error::from_reason(e.to_string()))
}
