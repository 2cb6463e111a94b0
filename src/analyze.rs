//! Pattern Analyzer
//!
//! Scans host-language (JS/TS) source for `x.build().concat(y)` chains and
//! classifies each one so a bundler can decide whether the concatenation
//! runtime is needed. Works on the oxc AST, never on the tachui AST.

#[cfg(feature = "napi")]
use napi_derive::napi;
use oxc_allocator::Allocator;
use oxc_ast::ast::{CallExpression, Expression};
use oxc_ast_visit::Visit;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

use crate::error::AnalysisError;

lazy_static::lazy_static! {
    static ref INTERPOLATION_RE: Regex = Regex::new(r"\$\{").unwrap();
    static ref BRACKET_INDEX_RE: Regex = Regex::new(r"[\w\)\]]\s*\[[^\]]*\]").unwrap();
    static ref LOOP_VARIABLE_RE: Regex = Regex::new(r"\b(item|index|idx|i|j|k)\b").unwrap();
    static ref STRING_CONTENT_RE: Regex = Regex::new(
        r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|`(?:[^`\\$]|\\.|\$[^{`])*\$?`"#
    )
    .unwrap();
    static ref LAYOUT_CONTAINER_RE: Regex =
        Regex::new(r"\b(VStack|HStack|ZStack|Grid|List|ScrollView|Form)\b").unwrap();
    static ref INTERACTIVE_RE: Regex =
        Regex::new(r"\b(Button|Link|Toggle|TextField|Picker)\b").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// PATTERN TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessibilityNeeds {
    Minimal,
    Aria,
    Full,
}

/// Byte offsets of the whole `.concat(...)` call in the analyzed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternLocation {
    pub start: u32,
    pub end: u32,
}

impl From<Span> for PatternLocation {
    fn from(span: Span) -> Self {
        PatternLocation {
            start: span.start,
            end: span.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcatenationPattern {
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub location: PatternLocation,
    pub left_component: String,
    pub right_component: String,
    pub optimizable: bool,
    pub accessibility_needs: AccessibilityNeeds,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASSIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

fn is_dynamic_text(text: &str) -> bool {
    if INTERPOLATION_RE.is_match(text) {
        return true;
    }
    // Quoted text like "i am" or `item` must not look like a loop variable.
    // Template literals with `${` were already classified above.
    let code_only = STRING_CONTENT_RE.replace_all(text, "\"\"");
    BRACKET_INDEX_RE.is_match(&code_only) || LOOP_VARIABLE_RE.is_match(&code_only)
}

pub fn classify_pattern(left: &str, right: &str) -> PatternType {
    if is_dynamic_text(left) || is_dynamic_text(right) {
        PatternType::Dynamic
    } else {
        PatternType::Static
    }
}

pub fn accessibility_tier(file_has_layout: bool, left: &str, right: &str) -> AccessibilityNeeds {
    if file_has_layout {
        AccessibilityNeeds::Full
    } else if INTERACTIVE_RE.is_match(left) || INTERACTIVE_RE.is_match(right) {
        AccessibilityNeeds::Aria
    } else {
        AccessibilityNeeds::Minimal
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// AST WALK
// ═══════════════════════════════════════════════════════════════════════════════

struct ConcatFinder<'s> {
    source: &'s str,
    file_has_layout: bool,
    patterns: Vec<ConcatenationPattern>,
}

impl<'s> ConcatFinder<'s> {
    fn text(&self, span: Span) -> &'s str {
        self.source
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }

    /// `<left>.build().concat(<right>)` → (left span, right span)
    fn match_concat(call: &CallExpression<'_>) -> Option<(Span, Option<Span>)> {
        let Expression::StaticMemberExpression(concat) = &call.callee else {
            return None;
        };
        if concat.property.name.as_str() != "concat" {
            return None;
        }
        let Expression::CallExpression(build_call) = &concat.object else {
            return None;
        };
        let Expression::StaticMemberExpression(build) = &build_call.callee else {
            return None;
        };
        if build.property.name.as_str() != "build" {
            return None;
        }
        let right = call.arguments.first().map(|arg| arg.span());
        Some((build.object.span(), right))
    }
}

impl<'a, 's> Visit<'a> for ConcatFinder<'s> {
    fn visit_call_expression(&mut self, expr: &CallExpression<'a>) {
        if let Some((left_span, right_span)) = Self::match_concat(expr) {
            let left = self.text(left_span);
            let right = right_span.map(|s| self.text(s)).unwrap_or("");
            let pattern_type = classify_pattern(left, right);
            self.patterns.push(ConcatenationPattern {
                pattern_type,
                location: expr.span.into(),
                left_component: left.to_string(),
                right_component: right.to_string(),
                optimizable: pattern_type == PatternType::Static,
                accessibility_needs: accessibility_tier(self.file_has_layout, left, right),
            });
        }
        oxc_ast_visit::walk::walk_call_expression(self, expr);
    }
}

fn source_type_for(filename: &str) -> SourceType {
    let path = filename.split('?').next().unwrap_or(filename);
    SourceType::from_path(path).unwrap_or_else(|_| {
        SourceType::default()
            .with_typescript(true)
            .with_jsx(true)
            .with_module(true)
    })
}

fn find_patterns(source: &str, filename: &str) -> Result<Vec<ConcatenationPattern>, AnalysisError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type_for(filename)).parse();

    if ret.panicked || !ret.errors.is_empty() {
        let message = ret
            .errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "parser aborted".to_string());
        return Err(AnalysisError::Syntax {
            file: filename.to_string(),
            message,
        });
    }

    let mut finder = ConcatFinder {
        source,
        file_has_layout: LAYOUT_CONTAINER_RE.is_match(source),
        patterns: Vec::new(),
    };
    finder.visit_program(&ret.program);

    let mut patterns = finder.patterns;
    patterns.sort_by_key(|p| (p.location.start, p.location.end));
    Ok(patterns)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLIC API
// ═══════════════════════════════════════════════════════════════════════════════

/// Analyze `source` and report why analysis failed, if it did.
pub fn try_analyze_patterns(
    source: &str,
    filename: &str,
) -> Result<Vec<ConcatenationPattern>, AnalysisError> {
    catch_unwind(AssertUnwindSafe(|| find_patterns(source, filename))).unwrap_or_else(|_| {
        Err(AnalysisError::Panicked {
            file: filename.to_string(),
        })
    })
}

/// Fail-soft analysis: any failure yields no patterns and a warning.
pub fn analyze_patterns(source: &str, filename: &str) -> Vec<ConcatenationPattern> {
    match try_analyze_patterns(source, filename) {
        Ok(patterns) => {
            debug!(file = filename, count = patterns.len(), "Analyzed concatenation patterns");
            patterns
        }
        Err(e) => {
            warn!(file = filename, error = %e, "Pattern analysis failed");
            Vec::new()
        }
    }
}

#[cfg(feature = "napi")]
#[napi]
pub fn analyze_patterns_native(source: String, filename: String) -> napi::Result<serde_json::Value> {
    serde_json::to_value(analyze_patterns(&source, &filename))
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_pattern() {
        let src = r#"const a = Text("Hello").build().concat(Text("World"));"#;
        let patterns = analyze_patterns(src, "a.ts");
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.pattern_type, PatternType::Static);
        assert!(p.optimizable);
        assert_eq!(p.left_component, r#"Text("Hello")"#);
        assert_eq!(p.right_component, r#"Text("World")"#);
        assert_eq!(p.accessibility_needs, AccessibilityNeeds::Minimal);
        assert_eq!(
            &src[p.location.start as usize..p.location.end as usize],
            r#"Text("Hello").build().concat(Text("World"))"#
        );
    }

    #[test]
    fn test_dynamic_interpolation() {
        let src = "const a = Text(`Count: ${count}`).build().concat(Text(\"!\"));";
        let patterns = analyze_patterns(src, "a.ts");
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].pattern_type, PatternType::Dynamic);
        assert!(!patterns[0].optimizable);
    }

    #[test]
    fn test_dynamic_index_and_loop_variable() {
        assert_eq!(classify_pattern("Text(labels[0])", "Text(\"x\")"), PatternType::Dynamic);
        assert_eq!(classify_pattern("Text(\"x\")", "Text(item.name)"), PatternType::Dynamic);
        assert_eq!(classify_pattern("Text(\"i am here\")", "Text(\"ok\")"), PatternType::Static);
    }

    #[test]
    fn test_plain_template_literal_is_static() {
        let src = "const a = Text(`Hello`).build().concat(Text(`item`));";
        let patterns = analyze_patterns(src, "t.ts");
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].pattern_type, PatternType::Static);
        assert_eq!(classify_pattern("Text(`cost $5`)", "Text(`i`)"), PatternType::Static);
        assert_eq!(classify_pattern("Text(`${item}`)", "Text(`i`)"), PatternType::Dynamic);
    }

    #[test]
    fn test_accessibility_tiers() {
        let aria = analyze_patterns(r#"Button("Save").build().concat(Text("now"))"#, "b.js");
        assert_eq!(aria[0].accessibility_needs, AccessibilityNeeds::Aria);

        let full = analyze_patterns(
            r#"const s = VStack; Text("a").build().concat(Text("b"))"#,
            "c.js",
        );
        assert_eq!(full[0].accessibility_needs, AccessibilityNeeds::Full);
    }

    #[test]
    fn test_non_matching_calls_ignored() {
        let src = r#"a.concat(b); x.build(); y.build().join(z); [1].concat([2]);"#;
        assert!(analyze_patterns(src, "d.js").is_empty());
    }

    #[test]
    fn test_missing_concat_argument() {
        let patterns = analyze_patterns("Text('a').build().concat()", "e.js");
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].right_component, "");
    }

    #[test]
    fn test_patterns_in_source_order() {
        let src = "f(A('1').build().concat(B('2')));\ng(C('3').build().concat(D('4')));";
        let lefts: Vec<_> = analyze_patterns(src, "f.js")
            .into_iter()
            .map(|p| p.left_component)
            .collect();
        assert_eq!(lefts, vec!["A('1')", "C('3')"]);
    }

    #[test]
    fn test_malformed_input_yields_empty() {
        assert!(analyze_patterns("const = = (;", "bad.ts").is_empty());
        assert!(matches!(
            try_analyze_patterns("const = = (;", "bad.ts"),
            Err(AnalysisError::Syntax { .. })
        ));
    }

    #[test]
    fn test_json_shape() {
        let patterns = analyze_patterns(r#"Text("a").build().concat(Text("b"))"#, "g.tsx");
        let json = serde_json::to_value(&patterns[0]).unwrap();
        assert_eq!(json["type"], "static");
        assert_eq!(json["accessibilityNeeds"], "minimal");
        assert_eq!(json["leftComponent"], "Text(\"a\")");
        assert!(json["location"]["start"].is_number());
    }
}
