//! Flat front-matter codec.
//!
//! A front-matter block is a `---` fenced run of `key: value` lines at the top
//! of a file. Only a flat subset of YAML is understood: scalars, flow lists
//! (`[a, b]`) and block lists (indented `- item` lines). Comments and blank
//! lines inside the block are ignored when decoding and kept verbatim by
//! [`update_text`].

use crate::parser::value::{FrontMatter, FrontMatterPatch, Scalar, Value, validate_key};
use serde_json::Number;
use std::collections::HashSet;

/// Block delimiter line.
pub const DELIMITER: &str = "---";

/// Raw split of a file into front-matter block and body.
#[derive(Debug, Clone)]
pub struct FrontMatterSplit<'a> {
    /// Lines between the delimiters, without the final newline.
    pub block: Option<&'a str>,
    /// Text after the closing delimiter and its separator blank line.
    pub body: &'a str,
    block_span: Option<(usize, usize)>,
    body_start: usize,
}

impl FrontMatterSplit<'_> {
    /// Byte offset of the body in the original text.
    pub fn body_start(&self) -> usize {
        self.body_start
    }
}

/// Result of [`decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<'a> {
    /// Parsed data, `None` when the text has no complete block.
    pub data: Option<FrontMatter>,
    pub body: &'a str,
    pub raw_block: Option<&'a str>,
}

/// Iterate lines as `(start, line, next_start)` byte offsets.
///
/// `line` excludes the `\n`; a trailing `\r` is kept.
fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str, usize)> {
    let mut pos = 0;
    text.split_inclusive('\n').map(move |raw| {
        let start = pos;
        pos += raw.len();
        (start, raw.strip_suffix('\n').unwrap_or(raw), pos)
    })
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// Split text into front-matter block and body.
pub fn split_front_matter(text: &str) -> FrontMatterSplit<'_> {
    let none = FrontMatterSplit {
        block: None,
        body: text,
        block_span: None,
        body_start: 0,
    };

    let bom = if text.starts_with('\u{feff}') { '\u{feff}'.len_utf8() } else { 0 };
    let mut lines = lines_with_offsets(&text[bom..]).map(|(s, l, n)| (s + bom, l, n + bom));

    let block_start = match lines.next() {
        Some((_, first, next)) if is_delimiter(first) => next,
        _ => return none,
    };

    for (start, line, next) in lines {
        if !is_delimiter(line) {
            continue;
        }

        let block = &text[block_start..start];
        let block = block.strip_suffix('\n').unwrap_or(block);
        let block = block.strip_suffix('\r').unwrap_or(block);

        let rest = &text[next..];
        let separator = if rest.starts_with("\r\n") {
            2
        } else if rest.starts_with('\n') {
            1
        } else {
            0
        };
        let body_start = next + separator;

        return FrontMatterSplit {
            block: Some(block),
            body: &text[body_start..],
            block_span: Some((block_start, start)),
            body_start,
        };
    }

    none
}

/// Decode text into front matter and body.
///
/// Text without a complete block decodes to `data: None` with the whole text
/// as body.
pub fn decode(text: &str) -> Decoded<'_> {
    let split = split_front_matter(text);
    Decoded {
        data: split.block.map(parse_block),
        body: split.body,
        raw_block: split.block,
    }
}

/// Encode front matter and body into text.
pub fn encode(data: &FrontMatter, body: &str) -> String {
    let mut out = String::new();
    out.push_str(DELIMITER);
    out.push('\n');
    for (key, value) in data.iter() {
        for line in encode_entry(key, value) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out.push_str(DELIMITER);
    out.push_str("\n\n");
    out.push_str(body);
    out
}

/// Shallow-merge a patch over decoded data.
pub fn update(existing: &FrontMatter, patch: &FrontMatterPatch) -> FrontMatter {
    existing.merged(patch)
}

/// Apply a patch to the block of `text`, leaving everything else untouched.
///
/// Lines belonging to keys that are not patched, comments and blank lines
/// are kept byte-for-byte, as is the body. Returns `None` when `text` has no
/// front-matter block.
pub fn update_text(text: &str, patch: &FrontMatterPatch) -> Option<String> {
    let split = split_front_matter(text);
    let (block, (span_start, span_end)) = (split.block?, split.block_span?);

    let mut lines: Vec<String> = Vec::new();
    let mut written: HashSet<&str> = HashSet::new();

    for segment in segments(block) {
        let patched = segment.key.and_then(|key| patch.get(key).map(|value| (key, value)));
        match patched {
            Some((key, value)) => {
                if written.insert(key) {
                    if let Some(value) = value {
                        lines.extend(encode_entry(key, value));
                    }
                }
            }
            None => lines.extend(segment.lines.iter().map(|l| l.to_string())),
        }
    }

    let present: HashSet<&str> = segments(block).into_iter().filter_map(|s| s.key).collect();
    for (key, value) in patch.iter() {
        if let Some(value) = value {
            if !present.contains(key) {
                lines.extend(encode_entry(key, value));
            }
        }
    }

    let eol = if text[..span_start].ends_with("\r\n") { "\r\n" } else { "\n" };
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..span_start]);
    for line in &lines {
        out.push_str(line.strip_suffix('\r').unwrap_or(line));
        out.push_str(eol);
    }
    out.push_str(&text[span_end..]);
    Some(out)
}

/// Replace the body of `text`, keeping any front-matter block verbatim.
pub fn replace_body(text: &str, body: &str) -> String {
    let split = split_front_matter(text);
    if split.block.is_none() {
        return body.to_string();
    }
    format!("{}{}", &text[..split.body_start], body)
}

/// A key line with its continuation lines, or a standalone line.
struct Segment<'a> {
    key: Option<&'a str>,
    lines: Vec<&'a str>,
}

enum Line<'a> {
    Blank,
    Comment,
    Item(&'a str),
    Entry(&'a str, &'a str),
    Other,
}

fn classify(line: &str) -> Line<'_> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return Line::Blank;
    }
    if trimmed.starts_with('#') {
        return Line::Comment;
    }
    if line.starts_with(char::is_whitespace) || line.starts_with('-') {
        if trimmed == "-" {
            return Line::Item("");
        }
        if let Some(item) = trimmed.strip_prefix("- ") {
            return Line::Item(item.trim());
        }
        return Line::Other;
    }
    if let Some((key, value)) = line.split_once(':') {
        let key = key.trim_end();
        if validate_key(key).is_ok() {
            return Line::Entry(key, value.trim());
        }
    }
    Line::Other
}

fn segments(block: &str) -> Vec<Segment<'_>> {
    let mut out: Vec<Segment<'_>> = Vec::new();
    if block.is_empty() {
        return out;
    }

    // Index of the last key segment; list items after it belong to it even
    // across blank and comment lines.
    let mut open: Option<usize> = None;

    for line in block.split('\n') {
        let continuation = line.starts_with(char::is_whitespace) || line.starts_with('-');
        let kind = classify(line);
        if let (Line::Item(_), Some(index)) = (&kind, open) {
            let between: Vec<&str> = out.drain(index + 1..).flat_map(|s| s.lines).collect();
            out[index].lines.extend(between);
            out[index].lines.push(line);
            continue;
        }

        match kind {
            Line::Entry(key, _) => {
                open = Some(out.len());
                out.push(Segment {
                    key: Some(key),
                    lines: vec![line],
                });
            }
            Line::Blank => out.push(Segment { key: None, lines: vec![line] }),
            _ if continuation => match out.last_mut() {
                Some(segment) if segment.key.is_some() => segment.lines.push(line),
                _ => out.push(Segment { key: None, lines: vec![line] }),
            },
            _ => out.push(Segment { key: None, lines: vec![line] }),
        }
    }
    out
}

fn parse_block(block: &str) -> FrontMatter {
    let mut fm = FrontMatter::new();
    let mut list_key: Option<String> = None;

    for line in block.split('\n') {
        match classify(line) {
            Line::Entry(key, raw) => {
                if raw.is_empty() {
                    fm.insert(key.to_string(), Value::Null);
                    list_key = Some(key.to_string());
                } else {
                    fm.insert(key.to_string(), parse_value(raw));
                    list_key = None;
                }
            }
            Line::Item(raw) => {
                let Some(ref key) = list_key else { continue };
                let item = parse_scalar(raw);
                let value = match fm.get(key) {
                    Some(Value::List(items)) => {
                        let mut items = items.clone();
                        items.push(item);
                        Value::List(items)
                    }
                    _ => Value::List(vec![item]),
                };
                fm.insert(key.clone(), value);
            }
            Line::Blank | Line::Comment | Line::Other => {}
        }
    }
    fm
}

/// Parse a top-level value.
fn parse_value(raw: &str) -> Value {
    if raw == "null" || raw == "~" {
        return Value::Null;
    }
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        return Value::List(
            split_flow_items(inner)
                .into_iter()
                .map(parse_scalar)
                .collect(),
        );
    }
    parse_scalar(raw).into()
}

fn parse_scalar(raw: &str) -> Scalar {
    match raw {
        "true" => return Scalar::Bool(true),
        "false" => return Scalar::Bool(false),
        _ => {}
    }

    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        if let Ok(text) = serde_json::from_str::<String>(raw) {
            return Scalar::Text(text);
        }
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Scalar::Text(raw[1..raw.len() - 1].replace("''", "'"));
    }
    if raw.starts_with(|c: char| c == '-' || c.is_ascii_digit()) {
        if let Ok(number) = serde_json::from_str::<Number>(raw) {
            return Scalar::Number(number);
        }
    }
    Scalar::Text(raw.to_string())
}

/// Split the inside of a flow list on commas outside quotes.
fn split_flow_items(inner: &str) -> Vec<&str> {
    if inner.trim().is_empty() {
        return Vec::new();
    }

    let mut items = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in inner.char_indices() {
        match quote {
            Some('"') if escaped => escaped = false,
            Some('"') if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == ',' => {
                items.push(inner[start..i].trim());
                start = i + 1;
            }
            None => {}
        }
    }
    items.push(inner[start..].trim());
    items
}

fn encode_entry(key: &str, value: &Value) -> Vec<String> {
    match value {
        Value::Null => vec![format!("{}:", key)],
        Value::List(items) if items.is_empty() => vec![format!("{}: []", key)],
        Value::List(items) => {
            let mut lines = vec![format!("{}:", key)];
            lines.extend(items.iter().map(|item| format!("  - {}", encode_scalar(item))));
            lines
        }
        Value::Bool(b) => vec![format!("{}: {}", key, b)],
        Value::Number(n) => vec![format!("{}: {}", key, n)],
        Value::Text(s) => vec![format!("{}: {}", key, encode_text(s))],
    }
}

fn encode_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Bool(b) => b.to_string(),
        Scalar::Number(n) => n.to_string(),
        Scalar::Text(s) => encode_text(s),
    }
}

/// Emit text bare unless it would read back as something else.
fn encode_text(s: &str) -> String {
    let needs_quotes = s.is_empty()
        || s != s.trim()
        || s.chars().any(char::is_control)
        || s.starts_with(['"', '\'', '[', '{', '#', '-', '~'])
        || parse_value(s) != Value::Text(s.to_string());

    if needs_quotes {
        serde_json::Value::from(s).to_string()
    } else {
        s.to_string()
    }
}
