//! Codegen module for the tachui compiler
//!
//! Turns a parsed component forest into imperative DOM construction code.
//! Dispatch over component and modifier names is table driven; there is no
//! module-level mutable state, so concurrent `generate` calls are independent.

use lazy_static::lazy_static;
use oxc_syntax::keyword::is_reserved_keyword_or_global_object;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

use crate::ast::{format_number, ComponentNode, LiteralNode, LiteralValue, SourceLocation};
use crate::sourcemap::{SourceMap, SourceMapBuilder, SourceMapSource};
use crate::visitor::{walk_component, ComponentVisitor};

pub const REACTIVE_MODULE_ID: &str = "virtual:tachui-reactive";
pub const RUNTIME_MODULE_ID: &str = "virtual:tachui-runtime";

/// Primitives every generated module imports, in emission order.
pub const REACTIVE_PRIMITIVES: [&str; 3] = ["createSignal", "createEffect", "createComputed"];

const DEFAULT_SPACING: &str = "8px";

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENT TABLE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentDescriptor {
    pub tag: &'static str,
    pub classes: &'static str,
    pub id_prefix: &'static str,
}

/// Used for any component name missing from the table.
pub const FALLBACK_COMPONENT: ComponentDescriptor = ComponentDescriptor {
    tag: "div",
    classes: "tachui-view",
    id_prefix: "element",
};

lazy_static! {
    static ref COMPONENT_TABLE: HashMap<&'static str, ComponentDescriptor> = {
        let mut m = HashMap::new();
        m.insert("Text", ComponentDescriptor { tag: "span", classes: "tachui-text", id_prefix: "textElement" });
        m.insert("Button", ComponentDescriptor { tag: "button", classes: "tachui-button", id_prefix: "buttonElement" });
        m.insert("VStack", ComponentDescriptor { tag: "div", classes: "tachui-v flex flex-col", id_prefix: "container" });
        m.insert("HStack", ComponentDescriptor { tag: "div", classes: "tachui-h flex flex-row", id_prefix: "container" });
        m.insert("ZStack", ComponentDescriptor { tag: "div", classes: "tachui-z relative", id_prefix: "container" });
        m.insert("Spacer", ComponentDescriptor { tag: "div", classes: "tachui-spacer flex-1", id_prefix: "spacer" });
        m.insert("Image", ComponentDescriptor { tag: "img", classes: "tachui-image", id_prefix: "imageElement" });
        m
    };

    static ref HANDLER_PATH_RE: Regex =
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(?:\.[A-Za-z_$][A-Za-z0-9_$]*)*$").unwrap();

    static ref STYLE_PROPERTY_RE: Regex = Regex::new(r"^[a-zA-Z][a-zA-Z0-9]*$").unwrap();
}

pub fn describe_component(name: &str) -> ComponentDescriptor {
    COMPONENT_TABLE
        .get(name)
        .copied()
        .unwrap_or(FALLBACK_COMPONENT)
}

pub fn is_known_component(name: &str) -> bool {
    COMPONENT_TABLE.contains_key(name)
}

// ═══════════════════════════════════════════════════════════════════════════════
// MODIFIER TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// What a single modifier call does to its element.
#[derive(Debug, Clone, PartialEq)]
pub enum ModifierEffect {
    /// Style properties (camelCase key, raw value) in application order.
    Style(Vec<(String, String)>),
    /// `element.addEventListener(event, handler)`.
    Event { event: &'static str, handler: String },
}

pub type ModifierFn = fn(&[LiteralNode]) -> Option<ModifierEffect>;

fn style(key: &str, value: String) -> Option<ModifierEffect> {
    Some(ModifierEffect::Style(vec![(key.to_string(), value)]))
}

/// Numbers become pixel lengths, strings pass through untouched.
fn length_value(arg: &LiteralNode) -> Option<String> {
    match &arg.value {
        LiteralValue::Number(n) => Some(format!("{}px", format_number(*n))),
        LiteralValue::String(s) => Some(s.clone()),
        LiteralValue::Reference(_) => None,
    }
}

fn plain_value(arg: &LiteralNode) -> Option<String> {
    match &arg.value {
        LiteralValue::Number(n) => Some(format_number(*n)),
        LiteralValue::String(s) => Some(s.clone()),
        LiteralValue::Reference(_) => None,
    }
}

fn spacing(key: &str, args: &[LiteralNode]) -> Option<ModifierEffect> {
    match args.first() {
        None => style(key, DEFAULT_SPACING.to_string()),
        Some(arg) => style(key, length_value(arg)?),
    }
}

/// A handler must be a plain identifier path so it can be emitted as a bare
/// reference.
pub fn handler_reference(arg: &LiteralNode) -> Option<String> {
    let path = match &arg.value {
        LiteralValue::Reference(r) => r.reference.as_str(),
        LiteralValue::String(s) => s.as_str(),
        LiteralValue::Number(_) => return None,
    };
    if !HANDLER_PATH_RE.is_match(path) || path.contains("undefined") {
        return None;
    }
    // Member names after a dot may be keywords (`actions.new`); the head may not,
    // except `this`.
    let head = path.split('.').next().unwrap_or(path);
    if head != "this" && is_reserved_keyword_or_global_object(head) {
        return None;
    }
    if head == "this" && !path.contains('.') {
        return None;
    }
    Some(path.to_string())
}

fn event(name: &'static str, args: &[LiteralNode]) -> Option<ModifierEffect> {
    let handler = handler_reference(args.first()?)?;
    Some(ModifierEffect::Event {
        event: name,
        handler,
    })
}

fn padding(args: &[LiteralNode]) -> Option<ModifierEffect> {
    spacing("padding", args)
}

fn margin(args: &[LiteralNode]) -> Option<ModifierEffect> {
    spacing("margin", args)
}

fn background(args: &[LiteralNode]) -> Option<ModifierEffect> {
    style("backgroundColor", args.first()?.value.as_str()?.to_string())
}

fn foreground_color(args: &[LiteralNode]) -> Option<ModifierEffect> {
    style("color", args.first()?.value.as_str()?.to_string())
}

fn corner_radius(args: &[LiteralNode]) -> Option<ModifierEffect> {
    style("borderRadius", length_value(args.first()?)?)
}

fn opacity(args: &[LiteralNode]) -> Option<ModifierEffect> {
    style("opacity", plain_value(args.first()?)?)
}

fn font_size(args: &[LiteralNode]) -> Option<ModifierEffect> {
    style("fontSize", length_value(args.first()?)?)
}

fn font_weight(args: &[LiteralNode]) -> Option<ModifierEffect> {
    style("fontWeight", plain_value(args.first()?)?)
}

fn frame(args: &[LiteralNode]) -> Option<ModifierEffect> {
    let mut props = Vec::new();
    if let Some(width) = args.first().and_then(length_value) {
        props.push(("width".to_string(), width));
    }
    if let Some(height) = args.get(1).and_then(length_value) {
        props.push(("height".to_string(), height));
    }
    if props.is_empty() {
        return None;
    }
    Some(ModifierEffect::Style(props))
}

fn border(args: &[LiteralNode]) -> Option<ModifierEffect> {
    let color = args.first()?.value.as_str()?;
    let width = args
        .get(1)
        .and_then(|a| a.value.as_number())
        .unwrap_or(1.0);
    style("border", format!("{}px solid {}", format_number(width), color))
}

fn on_tap_gesture(args: &[LiteralNode]) -> Option<ModifierEffect> {
    event("click", args)
}

fn on_hover(args: &[LiteralNode]) -> Option<ModifierEffect> {
    event("mouseenter", args)
}

fn on_double_tap(args: &[LiteralNode]) -> Option<ModifierEffect> {
    event("dblclick", args)
}

lazy_static! {
    static ref BUILTIN_MODIFIERS: HashMap<&'static str, ModifierFn> = {
        let mut m: HashMap<&'static str, ModifierFn> = HashMap::new();
        m.insert("padding", padding);
        m.insert("margin", margin);
        m.insert("background", background);
        m.insert("foregroundColor", foreground_color);
        m.insert("cornerRadius", corner_radius);
        m.insert("opacity", opacity);
        m.insert("fontSize", font_size);
        m.insert("fontWeight", font_weight);
        m.insert("frame", frame);
        m.insert("border", border);
        m.insert("onTapGesture", on_tap_gesture);
        m.insert("onHover", on_hover);
        m.insert("onDoubleTap", on_double_tap);
        m
    };
}

/// Modifier lookup: the built-in table plus style modifiers supplied through
/// configuration. Built-ins always win over custom entries of the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierRegistry {
    custom: BTreeMap<String, String>,
}

impl ModifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `modifier name -> camelCase CSS property` pairs.
    /// Entries with an invalid name or property are dropped with a warning.
    pub fn with_custom(entries: &BTreeMap<String, String>) -> Self {
        let mut custom = BTreeMap::new();
        for (name, property) in entries {
            let valid = HANDLER_PATH_RE.is_match(name)
                && !name.contains('.')
                && STYLE_PROPERTY_RE.is_match(property)
                && !property.contains("undefined");
            if !valid {
                warn!(modifier = %name, property = %property, "Ignoring invalid custom modifier");
                continue;
            }
            if BUILTIN_MODIFIERS.contains_key(name.as_str()) {
                warn!(modifier = %name, "Custom modifier shadows a built-in and is ignored");
                continue;
            }
            custom.insert(name.clone(), property.clone());
        }
        Self { custom }
    }

    pub fn is_known(&self, name: &str) -> bool {
        BUILTIN_MODIFIERS.contains_key(name) || self.custom.contains_key(name)
    }

    /// Resolve the effect of one modifier call; `None` means the call has no
    /// effect (unknown name or unusable arguments).
    pub fn effect(&self, name: &str, args: &[LiteralNode]) -> Option<ModifierEffect> {
        if let Some(apply) = BUILTIN_MODIFIERS.get(name) {
            return apply(args);
        }
        let property = self.custom.get(name)?;
        style(property, plain_value(args.first()?)?)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS & RESULT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct CodegenOptions {
    /// `es5` switches declarations to `var`; every other target uses `const`.
    pub target: String,
    /// Annotate element construction with `/* @__PURE__ */`.
    pub tree_shaking: bool,
    /// Tag every element with its source location.
    pub dev: bool,
    pub source_map: Option<SourceMapSource>,
    pub modifiers: ModifierRegistry,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            target: "es2020".to_string(),
            tree_shaking: false,
            dev: false,
            source_map: None,
            modifiers: ModifierRegistry::default(),
        }
    }
}

impl CodegenOptions {
    fn declaration_keyword(&self) -> &'static str {
        if self.target.eq_ignore_ascii_case("es5") {
            "var"
        } else {
            "const"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCodeResult {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<SourceMap>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATION CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-call identifier counter. Created fresh by every `generate` call and
/// threaded through the recursion, so numbering depends only on the AST.
#[derive(Debug, Default)]
pub struct GenerationContext {
    counter: usize,
}

impl GenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> usize {
        self.counter += 1;
        self.counter
    }
}

struct Emitter<'o> {
    options: &'o CodegenOptions,
    lines: Vec<String>,
    origins: Vec<Option<SourceLocation>>,
}

impl<'o> Emitter<'o> {
    fn new(options: &'o CodegenOptions) -> Self {
        Self {
            options,
            lines: Vec::new(),
            origins: Vec::new(),
        }
    }

    fn emit(&mut self, line: String, origin: Option<SourceLocation>) {
        self.lines.push(line);
        self.origins.push(origin);
    }

    fn emit_imports(&mut self) {
        for primitive in REACTIVE_PRIMITIVES {
            self.emit(
                format!("import {{ {} }} from '{}';", primitive, REACTIVE_MODULE_ID),
                None,
            );
        }
    }

    fn emit_node(&mut self, node: &ComponentNode, ctx: &mut GenerationContext) -> String {
        let desc = describe_component(&node.name);
        let id = format!("{}{}", desc.id_prefix, ctx.next_id());
        let origin = Some(node.location);
        let pure = if self.options.tree_shaking {
            "/* @__PURE__ */ "
        } else {
            ""
        };

        self.emit(
            format!(
                "{} {} = {}document.createElement('{}');",
                self.options.declaration_keyword(),
                id,
                pure,
                desc.tag
            ),
            origin,
        );
        self.emit(format!("{}.className = '{}';", id, desc.classes), origin);

        if self.options.dev {
            self.emit(
                format!(
                    "{}.dataset.tachuiLoc = \"{}:{}\";",
                    id, node.location.line, node.location.column
                ),
                origin,
            );
        }

        let text: Vec<String> = node
            .literal_children()
            .map(|l| l.value.display_text())
            .collect();
        if !text.is_empty() {
            self.emit(
                format!("{}.textContent = {};", id, js_string(&text.join(" "))),
                origin,
            );
        }

        let mut styles: Vec<(String, String)> = Vec::new();
        let mut events: Vec<(&'static str, String)> = Vec::new();
        for modifier in &node.modifiers {
            match self.options.modifiers.effect(&modifier.name, &modifier.arguments) {
                Some(ModifierEffect::Style(props)) => {
                    for (key, value) in props {
                        // Later modifiers override earlier ones in place.
                        match styles.iter_mut().find(|(k, _)| *k == key) {
                            Some(existing) => existing.1 = value,
                            None => styles.push((key, value)),
                        }
                    }
                }
                Some(ModifierEffect::Event { event, handler }) => events.push((event, handler)),
                None => debug!(
                    component = %node.name,
                    modifier = %modifier.name,
                    "Skipping modifier without effect"
                ),
            }
        }

        if !styles.is_empty() {
            let body = styles
                .iter()
                .map(|(k, v)| format!("{}: {}", k, js_string(v)))
                .collect::<Vec<_>>()
                .join(", ");
            self.emit(format!("Object.assign({}.style, {{ {} }});", id, body), origin);
        }

        for (event, handler) in events {
            self.emit(
                format!("{}.addEventListener('{}', {});", id, event, handler),
                origin,
            );
        }

        for child in node.component_children() {
            let child_id = self.emit_node(child, ctx);
            self.emit(format!("{}.appendChild({});", id, child_id), origin);
        }

        id
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAIN CODEGEN FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn generate(ast: &[ComponentNode]) -> GeneratedCodeResult {
    generate_with_options(ast, &CodegenOptions::default())
}

pub fn generate_with_options(ast: &[ComponentNode], options: &CodegenOptions) -> GeneratedCodeResult {
    let mut ctx = GenerationContext::new();
    let mut emitter = Emitter::new(options);

    emitter.emit_imports();

    let roots: Vec<String> = ast
        .iter()
        .map(|node| emitter.emit_node(node, &mut ctx))
        .collect();

    emitter.emit(format!("export default [{}];", roots.join(", ")), None);

    let map = options.source_map.clone().map(|source| {
        let mut builder = SourceMapBuilder::new(source);
        for origin in &emitter.origins {
            builder.push_line(*origin);
        }
        builder.build()
    });

    let mut code = emitter.lines.join("\n");
    code.push('\n');

    GeneratedCodeResult { code, map }
}

/// Modifier names in `ast` that resolve to nothing in `registry`, deduplicated
/// in first-seen order.
pub fn unmapped_modifiers(ast: &[ComponentNode], registry: &ModifierRegistry) -> Vec<String> {
    struct Unmapped<'r> {
        registry: &'r ModifierRegistry,
        seen: HashSet<String>,
        names: Vec<String>,
    }

    impl<'a, 'r> ComponentVisitor<'a> for Unmapped<'r> {
        fn visit_component(&mut self, node: &'a ComponentNode) {
            walk_component(self, node);
        }

        fn visit_modifier(&mut self, _owner: &'a ComponentNode, modifier: &'a crate::ast::ModifierCall) {
            if !self.registry.is_known(&modifier.name) && self.seen.insert(modifier.name.clone()) {
                self.names.push(modifier.name.clone());
            }
        }
    }

    let mut collector = Unmapped {
        registry,
        seen: HashSet::new(),
        names: Vec::new(),
    };
    collector.visit_forest(ast);
    collector.names
}

/// Quote `s` as a JS string literal. The word `undefined` is written with a
/// unicode escape so generated code never contains it verbatim.
pub fn js_string(s: &str) -> String {
    let quoted = serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string());
    quoted.replace("undefined", "\\u0075ndefined")
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
