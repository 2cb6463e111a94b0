//! Source Map v3 output for generated code.
//!
//! Generated code is emitted line by line, so mappings are line-granular: each
//! generated line that belongs to a component points at the start of that
//! component's call in the source.

use serde::{Deserialize, Serialize};

use crate::ast::SourceLocation;

const BASE64_CHARS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    pub file: String,
    pub sources: Vec<String>,
    pub sources_content: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Input file a map points back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapSource {
    pub file: String,
    pub content: String,
}

/// Base64 VLQ encoding of a single signed value.
pub fn encode_vlq(value: i64, out: &mut String) {
    let signed: i64 = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    let mut vlq = signed as u64;

    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64_CHARS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

pub struct SourceMapBuilder {
    source: SourceMapSource,
    lines: Vec<Option<SourceLocation>>,
}

impl SourceMapBuilder {
    pub fn new(source: SourceMapSource) -> Self {
        Self {
            source,
            lines: Vec::new(),
        }
    }

    /// Record the origin of the next generated line; `None` leaves it unmapped.
    pub fn push_line(&mut self, origin: Option<SourceLocation>) {
        self.lines.push(origin);
    }

    pub fn build(self) -> SourceMap {
        let mut mappings = String::new();
        let mut prev_line: i64 = 0;
        let mut prev_column: i64 = 0;

        for (i, origin) in self.lines.iter().enumerate() {
            if i > 0 {
                mappings.push(';');
            }
            let Some(loc) = origin else {
                continue;
            };
            let line = i64::from(loc.line.saturating_sub(1));
            let column = i64::from(loc.column.saturating_sub(1));

            // [generated column, source index, original line, original column]
            encode_vlq(0, &mut mappings);
            encode_vlq(0, &mut mappings);
            encode_vlq(line - prev_line, &mut mappings);
            encode_vlq(column - prev_column, &mut mappings);

            prev_line = line;
            prev_column = column;
        }

        let output_file = format!("{}.js", self.source.file);
        SourceMap {
            version: 3,
            file: output_file,
            sources: vec![self.source.file],
            sources_content: vec![self.source.content],
            names: Vec::new(),
            mappings,
        }
    }
}
