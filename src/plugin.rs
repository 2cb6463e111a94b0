//! Build-tool integration for the tachui compiler.
//!
//! `create_plugin` returns a self-contained `Plugin` value. The host receives
//! it directly and wires the hooks into its own pipeline; nothing is registered
//! globally. The plugin holds no mutable state, so every hook may be called
//! concurrently from many build workers.

#[cfg(feature = "napi")]
use napi_derive::napi;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::codegen::{
    generate_with_options, is_known_component, unmapped_modifiers, CodegenOptions,
    GeneratedCodeResult, ModifierRegistry, REACTIVE_MODULE_ID, RUNTIME_MODULE_ID,
};
use crate::discovery::glob_to_regex;
use crate::parse::{try_parse, CORE_EXTENSION, EXTENDED_EXTENSION};
use crate::sourcemap::SourceMapSource;
use crate::visitor::component_names;

pub const PLUGIN_NAME: &str = "tachui";

// ═══════════════════════════════════════════════════════════════════════════════
// VIRTUAL MODULES
// ═══════════════════════════════════════════════════════════════════════════════

const RUNTIME_SHIM: &str = r#"export function createElement(tag, className) {
  const el = document.createElement(tag);
  if (className) el.className = className;
  return el;
}

export function mount(roots, target) {
  const host = typeof target === 'string' ? document.querySelector(target) : target;
  if (!host) throw new Error('tachui: mount target not found');
  const list = Array.isArray(roots) ? roots : [roots];
  for (const node of list) host.appendChild(node);
  return () => {
    for (const node of list) {
      if (node.parentNode === host) host.removeChild(node);
    }
  };
}
"#;

const REACTIVE_SHIM: &str = r#"let currentObserver = null;

export function createSignal(initial) {
  let value = initial;
  const observers = new Set();
  const read = () => {
    if (currentObserver) observers.add(currentObserver);
    return value;
  };
  const write = (next) => {
    value = typeof next === 'function' ? next(value) : next;
    for (const run of Array.from(observers)) run();
  };
  return [read, write];
}

export function createEffect(fn) {
  const run = () => {
    const previous = currentObserver;
    currentObserver = run;
    try {
      fn();
    } finally {
      currentObserver = previous;
    }
  };
  run();
}

export function createComputed(fn) {
  const [read, write] = createSignal(null);
  createEffect(() => write(fn()));
  return read;
}
"#;

/// Read-only map of virtual module ids to their source.
#[derive(Debug, Clone)]
pub struct VirtualModuleRegistry {
    modules: BTreeMap<&'static str, &'static str>,
}

impl Default for VirtualModuleRegistry {
    fn default() -> Self {
        let mut modules = BTreeMap::new();
        modules.insert(RUNTIME_MODULE_ID, RUNTIME_SHIM);
        modules.insert(REACTIVE_MODULE_ID, REACTIVE_SHIM);
        Self { modules }
    }
}

impl VirtualModuleRegistry {
    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    pub fn source(&self, id: &str) -> Option<&'static str> {
        self.modules.get(id).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.modules.keys().copied()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformOptions {
    pub tree_shaking: bool,
    pub source_maps: bool,
    pub target: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            tree_shaking: true,
            source_maps: true,
            target: "es2020".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PluginOptions {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub dev: bool,
    pub transform: TransformOptions,
    /// Extra style modifiers: `modifier name -> camelCase CSS property`.
    pub modifiers: BTreeMap<String, String>,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            include: vec![
                format!("**/*.{}", CORE_EXTENSION),
                format!("**/*.{}", EXTENDED_EXTENSION),
            ],
            exclude: vec!["**/node_modules/**".to_string()],
            dev: false,
            transform: TransformOptions::default(),
            modifiers: BTreeMap::new(),
        }
    }
}

impl PluginOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct Plugin {
    options: PluginOptions,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    codegen: CodegenOptions,
    virtual_modules: VirtualModuleRegistry,
}

fn compile_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match glob_to_regex(p) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(pattern = %p, error = %e, "Ignoring invalid file pattern");
                None
            }
        })
        .collect()
}

pub fn create_plugin(options: PluginOptions) -> Plugin {
    let codegen = CodegenOptions {
        target: options.transform.target.clone(),
        tree_shaking: options.transform.tree_shaking,
        dev: options.dev,
        source_map: None,
        modifiers: ModifierRegistry::with_custom(&options.modifiers),
    };
    Plugin {
        include: compile_patterns(&options.include),
        exclude: compile_patterns(&options.exclude),
        codegen,
        virtual_modules: VirtualModuleRegistry::default(),
        options,
    }
}

/// Strip the query string a host may append (`App.tachui?v=123`) and
/// normalize path separators.
fn clean_id(id: &str) -> String {
    id.split('?').next().unwrap_or(id).replace('\\', "/")
}

fn has_supported_extension(path: &str) -> bool {
    matches!(
        Path::new(path).extension().and_then(|e| e.to_str()),
        Some(CORE_EXTENSION) | Some(EXTENDED_EXTENSION)
    )
}

impl Plugin {
    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn enforce(&self) -> &'static str {
        "pre"
    }

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    pub fn virtual_modules(&self) -> &VirtualModuleRegistry {
        &self.virtual_modules
    }

    /// Whether `id` is a file this plugin compiles.
    pub fn should_transform(&self, id: &str) -> bool {
        if id.starts_with('\0') {
            return false;
        }
        let path = clean_id(id);
        if self.virtual_modules.contains(&path) || !has_supported_extension(&path) {
            return false;
        }
        self.include.iter().any(|re| re.is_match(&path))
            && !self.exclude.iter().any(|re| re.is_match(&path))
    }

    /// Compile a matching file. Returns `None` for files the plugin does not
    /// handle and for files that fail to parse, leaving them to the host.
    pub fn transform(&self, code: &str, id: &str) -> Option<GeneratedCodeResult> {
        if !self.should_transform(id) {
            return None;
        }
        let path = clean_id(id);

        let ast = match try_parse(code, &path) {
            Ok(ast) => ast,
            Err(diagnostics) => {
                for d in &diagnostics {
                    warn!(file = %path, code = %d.code, line = d.line, column = d.column, "{}", d.message);
                }
                return None;
            }
        };

        if self.options.dev {
            for name in unmapped_modifiers(&ast, &self.codegen.modifiers) {
                warn!(file = %path, modifier = %name, "Modifier has no effect mapping and is skipped");
            }
            for name in component_names(&ast) {
                if !is_known_component(name) {
                    warn!(file = %path, component = %name, "Unknown component rendered as a generic container");
                }
            }
        }

        let mut options = self.codegen.clone();
        if self.options.transform.source_maps {
            options.source_map = Some(SourceMapSource {
                file: path.clone(),
                content: code.to_string(),
            });
        }

        let result = generate_with_options(&ast, &options);
        debug!(file = %path, nodes = ast.len(), "Transformed tachui module");
        Some(result)
    }

    pub fn resolve_id(&self, id: &str) -> Option<String> {
        if self.virtual_modules.contains(id) {
            Some(id.to_string())
        } else {
            None
        }
    }

    pub fn load(&self, id: &str) -> Option<&'static str> {
        self.virtual_modules.source(id)
    }

    pub fn build_start(&self) {
        debug!(plugin = PLUGIN_NAME, "build start");
    }

    pub fn config_resolved(&self, config: &serde_json::Value) {
        debug!(plugin = PLUGIN_NAME, config = %config, "config resolved");
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
fn plugin_from_json(options_json: Option<String>) -> napi::Result<Plugin> {
    let options = match options_json {
        Some(json) => {
            PluginOptions::from_json(&json).map_err(|e| napi::Error::from_reason(e.to_string()))?
        }
        None => PluginOptions::default(),
    };
    Ok(create_plugin(options))
}

#[cfg(feature = "napi")]
#[napi]
pub fn transform_native(
    code: String,
    id: String,
    options_json: Option<String>,
) -> napi::Result<Option<serde_json::Value>> {
    let plugin = plugin_from_json(options_json)?;
    match plugin.transform(&code, &id) {
        Some(result) => serde_json::to_value(result)
            .map(Some)
            .map_err(|e| napi::Error::from_reason(e.to_string())),
        None => Ok(None),
    }
}

#[cfg(feature = "napi")]
#[napi]
pub fn resolve_id_native(id: String) -> Option<String> {
    create_plugin(PluginOptions::default()).resolve_id(&id)
}

#[cfg(feature = "napi")]
#[napi]
pub fn load_native(id: String) -> Option<String> {
    create_plugin(PluginOptions::default())
        .load(&id)
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_identity() {
        let plugin = create_plugin(PluginOptions::default());
        assert_eq!(plugin.name(), "tachui");
        assert_eq!(plugin.enforce(), "pre");
        plugin.build_start();
        plugin.config_resolved(&serde_json::json!({ "root": "/app" }));
    }

    #[test]
    fn test_transform_matching_file() {
        let plugin = create_plugin(PluginOptions::default());
        let result = plugin
            .transform(r#"Text("Hello")"#, "/src/App.tachui")
            .expect("should transform");
        assert!(result.code.contains("document.createElement('span')"));
        assert!(result.code.contains("/* @__PURE__ */"));
        let map = result.map.expect("source maps enabled by default");
        assert_eq!(map.sources, vec!["/src/App.tachui"]);
    }

    #[test]
    fn test_transform_skips_other_files() {
        let plugin = create_plugin(PluginOptions::default());
        assert!(plugin.transform("Text(\"a\")", "/src/main.ts").is_none());
        assert!(plugin.transform("Text(\"a\")", "/node_modules/x/App.tachui").is_none());
        assert!(plugin.transform("Text(\"a\")", "\0virtual:thing.tachui").is_none());
        assert!(plugin.transform("", REACTIVE_MODULE_ID).is_none());
    }

    #[test]
    fn test_transform_strips_query_and_backslashes() {
        let plugin = create_plugin(PluginOptions::default());
        assert!(plugin.should_transform("/src/App.tachui?v=3"));
        assert!(plugin.should_transform("C:\\proj\\src\\App.tachuix"));
    }

    #[test]
    fn test_transform_malformed_file_is_noop() {
        let plugin = create_plugin(PluginOptions::default());
        assert!(plugin.transform("Text(\"unterminated", "/src/Bad.tachui").is_none());
    }

    #[test]
    fn test_include_exclude_options() {
        let plugin = create_plugin(PluginOptions {
            include: vec!["src/**/*.tachui".to_string()],
            exclude: vec!["src/legacy/**".to_string()],
            ..PluginOptions::default()
        });
        assert!(plugin.should_transform("src/views/Home.tachui"));
        assert!(!plugin.should_transform("other/Home.tachui"));
        assert!(!plugin.should_transform("src/legacy/Old.tachui"));
    }

    #[test]
    fn test_options_from_json() {
        let options = PluginOptions::from_json(
            r#"{ "dev": true, "transform": { "sourceMaps": false, "target": "es5" },
                 "modifiers": { "letterSpacing": "letterSpacing" } }"#,
        )
        .unwrap();
        assert!(options.dev);
        assert!(!options.transform.source_maps);
        assert!(options.transform.tree_shaking);
        assert_eq!(options.include.len(), 2);

        let plugin = create_plugin(options);
        let result = plugin
            .transform(r#"Text("a").letterSpacing("1px")"#, "App.tachui")
            .unwrap();
        assert!(result.map.is_none());
        assert!(result.code.contains("var textElement1"));
        assert!(result.code.contains("letterSpacing: \"1px\""));
        assert!(result.code.contains("dataset.tachuiLoc = \"1:1\""));
    }

    #[test]
    fn test_resolve_and_load_virtual_modules() {
        let plugin = create_plugin(PluginOptions::default());
        assert_eq!(
            plugin.resolve_id(RUNTIME_MODULE_ID).as_deref(),
            Some(RUNTIME_MODULE_ID)
        );
        assert_eq!(
            plugin.resolve_id(REACTIVE_MODULE_ID).as_deref(),
            Some(REACTIVE_MODULE_ID)
        );
        assert_eq!(plugin.resolve_id("./App.tachui"), None);

        let reactive = plugin.load(REACTIVE_MODULE_ID).unwrap();
        for name in ["createSignal", "createEffect", "createComputed"] {
            assert!(reactive.contains(&format!("export function {}", name)));
        }
        assert!(plugin.load(RUNTIME_MODULE_ID).unwrap().contains("export function mount"));
        assert_eq!(plugin.load("react"), None);
        assert_eq!(plugin.virtual_modules().ids().count(), 2);
    }
}
