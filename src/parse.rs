//! Parse Module for the tachui compiler
//!
//! Recursive-descent parser for `Component(args) { children }.modifier(args)`
//! call chains. Parsing is pure: identical input always yields an identical
//! forest.

#[cfg(feature = "napi")]
use napi_derive::napi;
use std::path::Path;
use tracing::warn;

use crate::ast::{ChildNode, ComponentNode, LiteralNode, ModifierCall, SourceLocation};
use crate::error::{
    ParseDiagnostic, LEX_UNKNOWN_CHARACTER, LEX_UNTERMINATED_STRING, PARSE_NESTING_TOO_DEEP,
    PARSE_NUMBER_OUT_OF_RANGE, PARSE_REFERENCE_NOT_ALLOWED, PARSE_UNEXPECTED_EOF,
    PARSE_UNEXPECTED_TOKEN,
};
use crate::lexer::{tokenize, Token, TokenKind};

// ═══════════════════════════════════════════════════════════════════════════════
// SYNTAX VARIANTS
// ═══════════════════════════════════════════════════════════════════════════════

pub const CORE_EXTENSION: &str = "tachui";
pub const EXTENDED_EXTENSION: &str = "tachuix";

/// Component calls nested deeper than this are rejected instead of recursing
/// further.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Grammar extensions selected by the file extension. The core grammar is the
/// same for both; the extended variant also accepts bare reference arguments
/// such as `onTapGesture(handlers.save)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxVariant {
    Core,
    Extended,
}

impl SyntaxVariant {
    pub fn from_filename(filename: &str) -> Self {
        let path = filename.split('?').next().unwrap_or(filename);
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(EXTENDED_EXTENSION) => SyntaxVariant::Extended,
            _ => SyntaxVariant::Core,
        }
    }

    fn allows_references(self) -> bool {
        self == SyntaxVariant::Extended
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSER
// ═══════════════════════════════════════════════════════════════════════════════

struct Parser<'f> {
    tokens: Vec<Token>,
    pos: usize,
    file: &'f str,
    variant: SyntaxVariant,
    end: SourceLocation,
    depth: usize,
}

type ParseResult<T> = Result<T, ParseDiagnostic>;

impl<'f> Parser<'f> {
    fn new(source: &str, file: &'f str) -> Self {
        let tokens = tokenize(source);
        let end = end_location(source);
        Self {
            tokens,
            pos: 0,
            file,
            variant: SyntaxVariant::from_filename(file),
            end,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead)
    }

    fn peek_is_punct(&self, c: char) -> bool {
        self.peek().is_some_and(|t| t.is_punct(c))
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error_at(&self, token: Option<&Token>, expected: &str) -> ParseDiagnostic {
        match token {
            None => ParseDiagnostic::new(
                PARSE_UNEXPECTED_EOF,
                &format!("Unexpected end of input, expected {}", expected),
                self.file,
                self.end.line,
                self.end.column,
            ),
            Some(t) if t.kind == TokenKind::Unknown => {
                let code = if t.text.starts_with('"') || t.text.starts_with('\'') {
                    LEX_UNTERMINATED_STRING
                } else {
                    LEX_UNKNOWN_CHARACTER
                };
                let snippet: String = t.text.chars().take(16).collect();
                ParseDiagnostic::new(
                    code,
                    &format!("Unrecognized input '{}', expected {}", snippet, expected),
                    self.file,
                    t.position.line,
                    t.position.column,
                )
            }
            Some(t) => ParseDiagnostic::new(
                PARSE_UNEXPECTED_TOKEN,
                &format!("Unexpected '{}', expected {}", t.text, expected),
                self.file,
                t.position.line,
                t.position.column,
            ),
        }
    }

    fn expect_punct(&mut self, c: char) -> ParseResult<Token> {
        if self.peek_is_punct(c) {
            // peek succeeded, advance cannot return None
            return self
                .advance()
                .ok_or_else(|| self.error_at(None, &format!("'{}'", c)));
        }
        Err(self.error_at(self.peek(), &format!("'{}'", c)))
    }

    fn expect_identifier(&mut self, what: &str) -> ParseResult<Token> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Identifier => self
                .advance()
                .ok_or_else(|| self.error_at(None, what)),
            other => Err(self.error_at(other, what)),
        }
    }

    fn parse_program(&mut self) -> ParseResult<Vec<ComponentNode>> {
        let mut nodes = Vec::new();
        while self.peek().is_some() {
            nodes.push(self.parse_component_call()?);
        }
        Ok(nodes)
    }

    fn parse_component_call(&mut self) -> ParseResult<ComponentNode> {
        if self.depth >= MAX_NESTING_DEPTH {
            let (line, column) = match self.peek() {
                Some(t) => (t.position.line, t.position.column),
                None => (self.end.line, self.end.column),
            };
            return Err(ParseDiagnostic::new(
                PARSE_NESTING_TOO_DEEP,
                &format!("Component nesting exceeds {} levels", MAX_NESTING_DEPTH),
                self.file,
                line,
                column,
            ));
        }
        self.depth += 1;
        let node = self.parse_component_body();
        self.depth -= 1;
        node
    }

    /// `Identifier [ '(' args ')' ] [ '{' calls '}' ] modifier*`
    fn parse_component_body(&mut self) -> ParseResult<ComponentNode> {
        let name_token = self.expect_identifier("a component name")?;
        let mut node = ComponentNode::new(name_token.text, name_token.position.location());

        let has_args = self.peek_is_punct('(');
        if has_args {
            for literal in self.parse_argument_list()? {
                node.children.push(ChildNode::Literal(literal));
            }
        }

        let has_block = self.peek_is_punct('{');
        if has_block {
            for child in self.parse_block()? {
                node.children.push(ChildNode::Component(child));
            }
        }

        if !has_args && !has_block {
            return Err(self.error_at(self.peek(), "'(' or '{' after component name"));
        }

        node.modifiers = self.parse_modifiers()?;
        Ok(node)
    }

    fn parse_block(&mut self) -> ParseResult<Vec<ComponentNode>> {
        self.expect_punct('{')?;
        let mut children = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error_at(None, "'}'")),
                Some(t) if t.is_punct('}') => {
                    self.advance();
                    return Ok(children);
                }
                Some(t) if t.is_punct(',') => {
                    self.advance();
                }
                Some(_) => children.push(self.parse_component_call()?),
            }
        }
    }

    fn parse_modifiers(&mut self) -> ParseResult<Vec<ModifierCall>> {
        let mut modifiers = Vec::new();
        while self.peek_is_punct('.')
            && self
                .peek_at(1)
                .is_some_and(|t| t.kind == TokenKind::Identifier)
        {
            self.advance();
            let name = self.expect_identifier("a modifier name")?.text;
            if !self.peek_is_punct('(') {
                return Err(self.error_at(self.peek(), &format!("'(' after .{}", name)));
            }
            let arguments = self.parse_argument_list()?;
            modifiers.push(ModifierCall { name, arguments });
        }
        if self.peek_is_punct('.') {
            self.advance();
            return Err(self.error_at(self.peek(), "a modifier name after '.'"));
        }
        Ok(modifiers)
    }

    fn parse_argument_list(&mut self) -> ParseResult<Vec<LiteralNode>> {
        self.expect_punct('(')?;
        let mut args = Vec::new();
        loop {
            if self.peek_is_punct(')') {
                self.advance();
                return Ok(args);
            }
            args.push(self.parse_argument()?);
            match self.peek() {
                Some(t) if t.is_punct(',') => {
                    self.advance();
                }
                Some(t) if t.is_punct(')') => {}
                other => return Err(self.error_at(other, "',' or ')'")),
            }
        }
    }

    fn parse_argument(&mut self) -> ParseResult<LiteralNode> {
        let token = match self.peek() {
            Some(t) => t.clone(),
            None => return Err(self.error_at(None, "an argument")),
        };

        match token.kind {
            TokenKind::StringLiteral => {
                self.advance();
                Ok(LiteralNode::string(token.text))
            }
            TokenKind::NumberLiteral => {
                self.advance();
                let value = token
                    .text
                    .parse::<f64>()
                    .map_err(|_| self.error_at(Some(&token), "a number"))?;
                if !value.is_finite() {
                    return Err(ParseDiagnostic::new(
                        PARSE_NUMBER_OUT_OF_RANGE,
                        "Numeric literal is too large",
                        self.file,
                        token.position.line,
                        token.position.column,
                    ));
                }
                Ok(LiteralNode::number(value))
            }
            TokenKind::Identifier if self.variant.allows_references() => {
                self.advance();
                let mut path = token.text;
                while self.peek_is_punct('.')
                    && self
                        .peek_at(1)
                        .is_some_and(|t| t.kind == TokenKind::Identifier)
                {
                    self.advance();
                    if let Some(segment) = self.advance() {
                        path.push('.');
                        path.push_str(&segment.text);
                    }
                }
                Ok(LiteralNode::reference(path))
            }
            TokenKind::Identifier => Err(ParseDiagnostic::new(
                PARSE_REFERENCE_NOT_ALLOWED,
                &format!("Bare reference '{}' is not a literal", token.text),
                self.file,
                token.position.line,
                token.position.column,
            )),
            _ => Err(self.error_at(Some(&token), "a string or number literal")),
        }
    }
}

fn end_location(source: &str) -> SourceLocation {
    let mut line = 1;
    let mut column = 1;
    for c in source.chars() {
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    SourceLocation::new(line, column)
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAIN PARSING FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse `source` and report why it failed, if it did. `Ok(vec![])` means the
/// input held no component calls; `Err` means it was malformed.
pub fn try_parse(source: &str, filename: &str) -> Result<Vec<ComponentNode>, Vec<ParseDiagnostic>> {
    let mut parser = Parser::new(source, filename);
    parser.parse_program().map_err(|d| vec![d])
}

/// Fail-soft parse: malformed input yields an empty forest and a warning.
pub fn parse(source: &str, filename: &str) -> Vec<ComponentNode> {
    match try_parse(source, filename) {
        Ok(nodes) => nodes,
        Err(diagnostics) => {
            for d in &diagnostics {
                warn!(file = filename, code = %d.code, line = d.line, column = d.column, "{}", d.message);
            }
            Vec::new()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn parse_native(source: String, filename: String) -> napi::Result<serde_json::Value> {
    let nodes = parse(&source, &filename);
    serde_json::to_value(nodes).map_err(|e| napi::Error::from_reason(e.to_string()))
}
