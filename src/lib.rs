//! # tachui Compiler Ground Truth
//!
//! ## Pipeline
//!
//! `source → tokenize → parse → ComponentNode[] → generate → { code, map? }`
//!
//! ## Compilation Invariants
//!
//! 1. **Purity**: `parse` and `generate` perform no I/O and keep no state between
//!    calls. Identical input yields byte-identical output.
//!
//! 2. **Per-call Context**: the element identifier counter lives in a
//!    `GenerationContext` created by each `generate` call. Concurrent compiles
//!    of different files never observe each other.
//!
//! 3. **Pre-order Naming**: element variables are numbered in document
//!    pre-order (`container1`, `textElement2`, `textElement3`, ...).
//!
//! 4. **No `undefined`**: generated code never contains the token `undefined`.
//!    Strings are JSON-escaped; handler references naming it are refused.
//!
//! 5. **Fail-soft Surface**: `parse`, `analyze_patterns` and
//!    `Plugin::transform` never panic or return errors. The `try_*` variants
//!    return the diagnostics instead.
//!
//! 6. **Table-driven Dispatch**: component tags/classes and modifier effects
//!    come from lookup tables. Unknown components render as a generic `div`;
//!    unknown modifiers are skipped.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod analyze;
mod ast;
mod cache;
mod codegen;
mod discovery;
mod error;
mod lexer;
mod parse;
mod plugin;
mod report;
mod sourcemap;
mod visitor;

#[cfg(test)]
mod scan_tests;

pub use analyze::{
    accessibility_tier, analyze_patterns, classify_pattern, try_analyze_patterns,
    AccessibilityNeeds, ConcatenationPattern, PatternLocation, PatternType,
};
pub use ast::{
    format_number, ChildNode, ComponentNode, LiteralNode, LiteralTag, LiteralValue, ModifierCall,
    ReferenceValue, SourceLocation,
};
pub use cache::{AnalysisCache, CacheEntry, DEFAULT_CACHE_DIR};
pub use codegen::{
    describe_component, generate, generate_with_options, handler_reference, is_known_component,
    js_string, unmapped_modifiers, CodegenOptions, ComponentDescriptor, GeneratedCodeResult,
    GenerationContext, ModifierEffect, ModifierRegistry, FALLBACK_COMPONENT, REACTIVE_MODULE_ID,
    REACTIVE_PRIMITIVES, RUNTIME_MODULE_ID,
};
pub use discovery::{
    find_source_files, glob_to_regex, scan_project, FileReport, ProjectReport, ScanOptions,
    DEFAULT_SCAN_PATTERN,
};
pub use error::{
    AnalysisError, ParseDiagnostic, ReportError, LEX_UNKNOWN_CHARACTER, LEX_UNTERMINATED_STRING,
    PARSE_NESTING_TOO_DEEP, PARSE_NUMBER_OUT_OF_RANGE, PARSE_REFERENCE_NOT_ALLOWED,
    PARSE_UNEXPECTED_EOF, PARSE_UNEXPECTED_TOKEN,
};
pub use lexer::{tokenize, Token, TokenKind, TokenPosition};
pub use parse::{
    parse, try_parse, SyntaxVariant, CORE_EXTENSION, EXTENDED_EXTENSION, MAX_NESTING_DEPTH,
};
pub use plugin::{
    create_plugin, Plugin, PluginOptions, TransformOptions, VirtualModuleRegistry, PLUGIN_NAME,
};
pub use report::{
    estimate_savings_kb, summarize, write_report, AccessibilityBreakdown, PatternReport,
    BASELINE_RUNTIME_KB, PER_TIER_KB,
};
pub use sourcemap::{encode_vlq, SourceMap, SourceMapBuilder, SourceMapSource};
pub use visitor::{component_names, walk_component, walk_forest, ComponentVisitor};

#[cfg(feature = "napi")]
pub use analyze::analyze_patterns_native;
#[cfg(feature = "napi")]
pub use discovery::scan_project_native;
#[cfg(feature = "napi")]
pub use parse::parse_native;
#[cfg(feature = "napi")]
pub use plugin::{load_native, resolve_id_native, transform_native};

#[cfg(feature = "napi")]
#[napi]
pub fn compile_bridge() -> String {
    "tachui Native Bridge Connected".to_string()
}
