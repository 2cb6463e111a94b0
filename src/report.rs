//! Aggregate reporting over analyzed concatenation patterns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::analyze::{AccessibilityNeeds, ConcatenationPattern, PatternType};
use crate::error::ReportError;

/// Size of the full concatenation runtime, in KB.
pub const BASELINE_RUNTIME_KB: f64 = 13.1;
/// Runtime cost of each accessibility tier that must stay in the bundle, in KB.
pub const PER_TIER_KB: f64 = 2.4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibilityBreakdown {
    pub minimal: usize,
    pub aria: usize,
    pub full: usize,
}

impl AccessibilityBreakdown {
    fn record(&mut self, needs: AccessibilityNeeds) {
        match needs {
            AccessibilityNeeds::Minimal => self.minimal += 1,
            AccessibilityNeeds::Aria => self.aria += 1,
            AccessibilityNeeds::Full => self.full += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternReport {
    pub total_patterns: usize,
    pub optimized_patterns: usize,
    pub static_patterns: usize,
    pub dynamic_patterns: usize,
    #[serde(rename = "bundleSavingsKB")]
    pub bundle_savings_kb: f64,
    pub accessibility_breakdown: AccessibilityBreakdown,
    pub recommendations: Vec<String>,
}

pub fn estimate_savings_kb(distinct_tiers: usize) -> f64 {
    let raw = BASELINE_RUNTIME_KB - PER_TIER_KB * distinct_tiers as f64;
    (raw.max(0.0) * 10.0).round() / 10.0
}

pub fn summarize(patterns: &[ConcatenationPattern]) -> PatternReport {
    let mut breakdown = AccessibilityBreakdown::default();
    let mut tiers = BTreeSet::new();
    let mut static_patterns = 0;
    let mut optimized_patterns = 0;

    for p in patterns {
        if p.pattern_type == PatternType::Static {
            static_patterns += 1;
        }
        if p.optimizable {
            optimized_patterns += 1;
        }
        breakdown.record(p.accessibility_needs);
        tiers.insert(p.accessibility_needs);
    }
    let dynamic_patterns = patterns.len() - static_patterns;

    let recommendations = recommend(patterns.len(), static_patterns, dynamic_patterns, &tiers);

    PatternReport {
        total_patterns: patterns.len(),
        optimized_patterns,
        static_patterns,
        dynamic_patterns,
        bundle_savings_kb: estimate_savings_kb(tiers.len()),
        accessibility_breakdown: breakdown,
        recommendations,
    }
}

fn recommend(
    total: usize,
    static_count: usize,
    dynamic_count: usize,
    tiers: &BTreeSet<AccessibilityNeeds>,
) -> Vec<String> {
    let mut out = Vec::new();
    if total == 0 {
        out.push("No concatenation patterns found: the concatenation runtime can be excluded from the bundle".to_string());
        return out;
    }
    if dynamic_count > static_count {
        out.push("Dynamic patterns outnumber static ones: consider extracting literals".to_string());
    }
    if static_count > 0 {
        out.push(format!(
            "{} static pattern{} can be precompiled at build time",
            static_count,
            if static_count == 1 { "" } else { "s" }
        ));
    }
    if tiers.contains(&AccessibilityNeeds::Full) {
        out.push("Layout containers are concatenated: keep the full accessibility runtime".to_string());
    } else if tiers.len() == 1 && tiers.contains(&AccessibilityNeeds::Minimal) {
        out.push("Only minimal accessibility is needed: use the minimal runtime variant".to_string());
    }
    out
}

/// Serialize any report as pretty JSON to `path`.
pub fn write_report<T: Serialize>(report: &T, path: &Path) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(report)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, json).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::PatternLocation;

    fn pattern(pattern_type: PatternType, needs: AccessibilityNeeds) -> ConcatenationPattern {
        ConcatenationPattern {
            pattern_type,
            location: PatternLocation { start: 0, end: 1 },
            left_component: "a".to_string(),
            right_component: "b".to_string(),
            optimizable: pattern_type == PatternType::Static,
            accessibility_needs: needs,
        }
    }

    #[test]
    fn test_empty_report() {
        let report = summarize(&[]);
        assert_eq!(report.total_patterns, 0);
        assert_eq!(report.bundle_savings_kb, 13.1);
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].contains("can be excluded"));
    }

    #[test]
    fn test_counts_and_savings() {
        let report = summarize(&[
            pattern(PatternType::Static, AccessibilityNeeds::Minimal),
            pattern(PatternType::Dynamic, AccessibilityNeeds::Aria),
            pattern(PatternType::Dynamic, AccessibilityNeeds::Aria),
        ]);
        assert_eq!(report.total_patterns, 3);
        assert_eq!(report.static_patterns, 1);
        assert_eq!(report.optimized_patterns, 1);
        assert_eq!(report.dynamic_patterns, 2);
        assert_eq!(report.accessibility_breakdown.aria, 2);
        assert_eq!(report.bundle_savings_kb, 8.3);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("outnumber static")));
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.starts_with("1 static pattern can be precompiled")));
    }

    #[test]
    fn test_savings_never_negative() {
        assert_eq!(estimate_savings_kb(3), 5.9);
        assert_eq!(estimate_savings_kb(10), 0.0);
    }

    #[test]
    fn test_tier_recommendations() {
        let full = summarize(&[pattern(PatternType::Static, AccessibilityNeeds::Full)]);
        assert!(full.recommendations.iter().any(|r| r.contains("full accessibility")));

        let minimal = summarize(&[pattern(PatternType::Static, AccessibilityNeeds::Minimal)]);
        assert!(minimal.recommendations.iter().any(|r| r.contains("minimal runtime")));
    }

    #[test]
    fn test_report_json_shape() {
        let json = serde_json::to_value(summarize(&[])).unwrap();
        assert_eq!(json["bundleSavingsKB"], 13.1);
        assert_eq!(json["accessibilityBreakdown"]["full"], 0);
        assert!(json["recommendations"].is_array());
    }

    #[test]
    fn test_write_report() {
        let dir = std::env::temp_dir().join(format!("tachui_report_{}", std::process::id()));
        let path = dir.join("nested").join("report.json");
        write_report(&summarize(&[]), &path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"totalPatterns\": 0"));
        fs::remove_dir_all(&dir).ok();
    }
}
