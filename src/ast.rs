//! AST types for the tachui mini-language.
//!
//! Nodes are produced fresh by every parse and are never mutated after code
//! generation. Every field is always populated so the JSON form handed to a JS
//! host never carries `undefined`.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// LOCATIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LITERALS
// ═══════════════════════════════════════════════════════════════════════════════

/// The value carried by a literal argument. The variant always matches the
/// lexical form of the argument: quoted text is a `String`, numerals are a
/// `Number`, and bare identifier paths (extended syntax only) are a
/// `Reference`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    String(String),
    Number(f64),
    Reference(ReferenceValue),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceValue {
    pub reference: String,
}

impl LiteralValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            LiteralValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text form used when the literal ends up as DOM text content.
    pub fn display_text(&self) -> String {
        match self {
            LiteralValue::String(s) => s.clone(),
            LiteralValue::Number(n) => format_number(*n),
            LiteralValue::Reference(r) => r.reference.clone(),
        }
    }
}

/// Formats a number the way JS would print it for integral values
/// (`8` instead of `8.0`).
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiteralNode {
    #[serde(rename = "type")]
    pub node_type: LiteralTag,
    pub value: LiteralValue,
}

/// Serialized as the constant `"Literal"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LiteralTag {
    #[default]
    Literal,
}

impl LiteralNode {
    pub fn new(value: LiteralValue) -> Self {
        Self {
            node_type: LiteralTag::Literal,
            value,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(LiteralValue::String(value.into()))
    }

    pub fn number(value: f64) -> Self {
        Self::new(LiteralValue::Number(value))
    }

    pub fn reference(path: impl Into<String>) -> Self {
        Self::new(LiteralValue::Reference(ReferenceValue {
            reference: path.into(),
        }))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENT TREE
// ═══════════════════════════════════════════════════════════════════════════════

/// One `.name(args)` suffix of a modifier chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierCall {
    pub name: String,
    pub arguments: Vec<LiteralNode>,
}

/// A child of a component: either a nested component call or one of the
/// call's literal arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildNode {
    Component(ComponentNode),
    Literal(LiteralNode),
}

impl ChildNode {
    pub fn as_component(&self) -> Option<&ComponentNode> {
        match self {
            ChildNode::Component(c) => Some(c),
            ChildNode::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&LiteralNode> {
        match self {
            ChildNode::Literal(l) => Some(l),
            ChildNode::Component(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    pub name: String,
    /// Call arguments first (as literals), then block children, in source order.
    pub children: Vec<ChildNode>,
    /// Modifier chain in left-to-right order.
    pub modifiers: Vec<ModifierCall>,
    #[serde(default)]
    pub location: SourceLocation,
}

impl ComponentNode {
    pub fn new(name: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            modifiers: Vec::new(),
            location,
        }
    }

    pub fn component_children(&self) -> impl Iterator<Item = &ComponentNode> {
        self.children.iter().filter_map(ChildNode::as_component)
    }

    pub fn literal_children(&self) -> impl Iterator<Item = &LiteralNode> {
        self.children.iter().filter_map(ChildNode::as_literal)
    }

    /// Number of component nodes in this subtree, including `self`.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .component_children()
            .map(ComponentNode::subtree_size)
            .sum::<usize>()
    }
}
