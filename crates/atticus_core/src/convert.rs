//! crates/atticus_core/src/convert.rs
//!
//! Conversion between the HTML fragments stored by the backend and the plain
//! text that is edited locally.
//!
//! `text_to_html` produces `<p>` paragraphs with `<br>` line breaks.
//! `html_to_text` understands that output plus the block tags the web editor
//! emits (`div`, `h1`-`h6`), decodes entities in a single pass and normalises
//! whitespace, so that normalised text survives a round trip unchanged.

use regex::{Captures, Regex};
use std::sync::OnceLock;

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static CELL: OnceLock<Regex> = OnceLock::new();
            CELL.get_or_init(|| Regex::new($pattern).expect("static pattern is valid"))
        }
    };
}

static_regex!(br_tag, r"(?i)</?br\s*/?>");
static_regex!(p_close, r"(?i)</p\s*>");
static_regex!(p_open, r"(?i)<p(?:\s[^>]*)?/?>");
static_regex!(div_open, r"(?i)<div(?:\s[^>]*)?>");
static_regex!(div_close, r"(?i)</div\s*>");
static_regex!(heading_open, r"(?i)<h[1-6](?:\s[^>]*)?>");
static_regex!(heading_close, r"(?i)</h[1-6]\s*>");
static_regex!(any_tag, r"<[^>]*>");
static_regex!(entity, r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);");
static_regex!(odd_spaces, r"[\t\u{00A0}\u{1680}\u{2000}-\u{200A}\u{202F}\u{205F}\u{3000}]");
static_regex!(space_run, r" {2,}");
static_regex!(spaced_newline, r" *\n *");
static_regex!(newline_run, r"\n{3,}");
static_regex!(paragraph_break, r"\n{2,}");

/// Converts a plain-text draft into the HTML fragment the backend stores.
pub fn text_to_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let escaped = escape(text);
    let paragraphs = paragraph_break().replace_all(&escaped, "</p><p>");
    let lines = paragraphs.replace('\n', "<br>");
    format!("<p>{}</p>", lines)
}

/// Converts a stored HTML fragment into editable plain text.
pub fn html_to_text(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let text = br_tag().replace_all(html, "\n");
    let text = p_close().replace_all(&text, "\n\n");
    let text = p_open().replace_all(&text, "");
    let text = div_open().replace_all(&text, "\n");
    let text = div_close().replace_all(&text, "");
    let text = heading_open().replace_all(&text, "\n");
    let text = heading_close().replace_all(&text, "\n\n");
    let text = any_tag().replace_all(&text, "");
    // Tags are gone before decoding, so an escaped `&lt;p&gt;` stays text.
    let text = decode_entities(&text);
    normalize_text(&text)
}

/// Collapses whitespace the way `html_to_text` does: unicode and tab spaces
/// become plain spaces, runs collapse, lines lose edge spaces, at most one
/// blank line separates paragraphs and the whole text is trimmed.
pub fn normalize_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = odd_spaces().replace_all(&text, " ");
    let text = space_run().replace_all(&text, " ");
    let text = spaced_newline().replace_all(&text, "\n");
    let text = newline_run().replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Counts whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    entity()
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(body)
            };
            // Control characters other than line breaks and tabs stay encoded.
            let decoded = decoded.filter(|c| !c.is_control() || matches!(*c, '\n' | '\t' | '\r'));
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    match name {
        "nbsp" => Some(' '),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}
