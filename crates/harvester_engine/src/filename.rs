use harvester_core::{DateWindow, ListingId};
use sha2::{Digest, Sha256};

const MAX_STEM_LEN: usize = 80;

/// Deterministic, filesystem-safe result name:
/// `{listing}-{start}-to-{end}--{short_hash(listing)}.json`.
///
/// The hash keeps listings apart whose ids sanitize to the same stem.
pub fn output_filename(listing: &ListingId, window: &DateWindow) -> String {
    let stem = sanitize(listing.as_str());
    let hash = short_hash(listing.as_str());
    format!(
        "{stem}-{}-to-{}--{hash}.json",
        window.start().format("%Y-%m-%d"),
        window.end().format("%Y-%m-%d")
    )
}

fn sanitize(input: &str) -> String {
    let mut compacted = String::with_capacity(input.len());
    let mut prev_underscore = false;
    for c in input.chars() {
        let c = if is_forbidden(c) || c.is_whitespace() { '_' } else { c };
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    let mut stem: String = compacted
        .trim_matches(&['_', '.', '-'][..])
        .chars()
        .take(MAX_STEM_LEN)
        .collect();
    if stem.is_empty() {
        stem = "listing".to_string();
    }
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    stem
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .take(4)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
