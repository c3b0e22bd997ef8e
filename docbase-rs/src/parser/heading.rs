//! Heading detection for title derivation.

use regex::Regex;
use std::sync::LazyLock;

// ATX level-1 heading, optional closing hashes: # Title #
static H1: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").unwrap()
});

// Opening or closing fence of a code block.
static FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})").unwrap());

/// Text of the first level-1 heading outside fenced code blocks.
pub fn first_h1(body: &str) -> Option<String> {
    let mut fence: Option<(char, usize)> = None;

    for line in body.lines() {
        if let Some(cap) = FENCE.captures(line) {
            let marker = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            let ch = marker.chars().next().unwrap_or('`');
            match fence {
                None => fence = Some((ch, marker.len())),
                Some((open, len)) if open == ch && marker.len() >= len => fence = None,
                Some(_) => {}
            }
            continue;
        }
        if fence.is_some() {
            continue;
        }

        if let Some(cap) = H1.captures(line) {
            let text = cap.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}
