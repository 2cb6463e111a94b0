//! Tokenizer for the tachui mini-language.
//!
//! The lexer never fails. Characters it does not understand are surfaced as
//! `Unknown` tokens so the parser can report them with a location.

use serde::{Deserialize, Serialize};

use crate::ast::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    Identifier,
    StringLiteral,
    NumberLiteral,
    Punctuation,
    /// Unrecognized character, or an unterminated string running to end of input.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub kind: TokenKind,
    /// Identifier name, punctuation char, numeral text, or the *unescaped*
    /// contents of a string literal.
    pub text: String,
    pub position: TokenPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPosition {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl TokenPosition {
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

impl Token {
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punctuation && self.text.len() == c.len_utf8() && self.text.starts_with(c)
    }
}

const PUNCTUATION: [char; 6] = ['(', ')', '{', '}', '.', ','];

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

struct Scanner<'s> {
    chars: Vec<(usize, char)>,
    source: &'s str,
    index: usize,
    line: u32,
    column: u32,
}

impl<'s> Scanner<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            chars: source.char_indices().collect(),
            source,
            index: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).map(|(_, c)| *c)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.index + ahead).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.index)
            .map(|(o, _)| *o)
            .unwrap_or(self.source.len())
    }

    fn position(&self) -> TokenPosition {
        TokenPosition {
            offset: self.offset(),
            line: self.line,
            column: self.column,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    self.bump();
                    self.bump();
                    while let Some(c) = self.bump() {
                        if c == '*' && self.peek() == Some('/') {
                            self.bump();
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_string(&mut self, quote: char, start: TokenPosition) -> Token {
        self.bump();
        let mut value = String::new();
        while let Some(c) = self.bump() {
            if c == quote {
                return Token {
                    kind: TokenKind::StringLiteral,
                    text: value,
                    position: start,
                };
            }
            if c == '\\' {
                match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(other) => value.push(other),
                    None => break,
                }
            } else {
                value.push(c);
            }
        }
        Token {
            kind: TokenKind::Unknown,
            text: self.source[start.offset..].to_string(),
            position: start,
        }
    }

    fn scan_number(&mut self, start: TokenPosition) -> Token {
        let mut text = String::new();
        if self.peek() == Some('-') {
            text.push('-');
            self.bump();
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        // A fraction needs a digit after the dot so `1.foo` is not swallowed.
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        Token {
            kind: TokenKind::NumberLiteral,
            text,
            position: start,
        }
    }

    fn scan_identifier(&mut self, start: TokenPosition) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Token {
            kind: TokenKind::Identifier,
            text,
            position: start,
        }
    }
}

/// Split `source` into tokens. Pure; never panics on malformed input.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();

    loop {
        scanner.skip_trivia();
        let start = scanner.position();
        let Some(c) = scanner.peek() else {
            break;
        };

        let token = if c == '"' || c == '\'' {
            scanner.scan_string(c, start)
        } else if c.is_ascii_digit()
            || (c == '-' && scanner.peek_at(1).is_some_and(|n| n.is_ascii_digit()))
        {
            scanner.scan_number(start)
        } else if is_ident_start(c) {
            scanner.scan_identifier(start)
        } else if PUNCTUATION.contains(&c) {
            scanner.bump();
            Token {
                kind: TokenKind::Punctuation,
                text: c.to_string(),
                position: start,
            }
        } else {
            scanner.bump();
            Token {
                kind: TokenKind::Unknown,
                text: c.to_string(),
                position: start,
            }
        };

        tokens.push(token);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_component_call() {
        let tokens = tokenize(r#"Text("Hello").padding(8)"#);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Text", "(", "Hello", ")", ".", "padding", "(", "8", ")"]);
        assert_eq!(tokens[2].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[7].kind, TokenKind::NumberLiteral);
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  \n\t // only a comment\n /* block */ ").is_empty());
    }

    #[test]
    fn test_positions_track_lines() {
        let tokens = tokenize("VStack {\n  Text(\"a\")\n}");
        let text = tokens.iter().find(|t| t.text == "Text").unwrap();
        assert_eq!(text.position.line, 2);
        assert_eq!(text.position.column, 3);
        assert_eq!(text.position.offset, 11);
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("-4 1.5 2.x");
        assert_eq!(tokens[0].text, "-4");
        assert_eq!(tokens[1].text, "1.5");
        assert_eq!(tokens[2].text, "2");
        assert!(tokens[3].is_punct('.'));
        assert_eq!(tokens[4].text, "x");
    }

    #[test]
    fn test_string_escapes_and_quotes() {
        let tokens = tokenize(r#"'it\'s' "a\"b\n""#);
        assert_eq!(tokens[0].text, "it's");
        assert_eq!(tokens[1].text, "a\"b\n");
    }

    #[test]
    fn test_unknown_characters_do_not_abort() {
        assert_eq!(
            kinds("Text(#)"),
            vec![
                TokenKind::Identifier,
                TokenKind::Punctuation,
                TokenKind::Unknown,
                TokenKind::Punctuation
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_unknown() {
        let tokens = tokenize("Text(\"open");
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::Unknown);
        assert_eq!(last.text, "\"open");
    }

    #[test]
    fn test_non_ascii_input() {
        let tokens = tokenize("Text(\"héllo ✓\") ✓");
        assert_eq!(tokens[2].text, "héllo ✓");
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Unknown);
    }
}
