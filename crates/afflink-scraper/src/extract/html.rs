//! Small HTML text helpers shared by the extraction strategies.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[a-zA-Z]{2,8});").expect("valid entity regex")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static JSON_LD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#,
    )
    .expect("valid json-ld script regex")
});
static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>(.*?)</script>").expect("valid script regex")
});

/// Decodes numeric and the common named HTML entities. Unknown names are
/// left untouched.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    ENTITY_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            decode_entity(entity).map_or_else(|| caps[0].to_owned(), String::from)
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    let c = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "euro" => '€',
        "pound" => '£',
        "aacute" => 'á',
        "eacute" => 'é',
        "iacute" => 'í',
        "oacute" => 'ó',
        "uacute" => 'ú',
        "ntilde" => 'ñ',
        "Ntilde" => 'Ñ',
        "uuml" => 'ü',
        "ndash" => '–',
        "mdash" => '—',
        _ => return None,
    };
    Some(c)
}

/// Removes markup tags, keeping the text between them.
pub(crate) fn strip_tags(fragment: &str) -> String {
    TAG_RE.replace_all(fragment, " ").into_owned()
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Markup-free, entity-decoded, whitespace-collapsed text of a fragment.
pub(crate) fn clean_text(fragment: &str) -> String {
    collapse_whitespace(&decode_entities(&strip_tags(fragment)))
}

/// Truncates to at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].trim_end().to_owned(),
        None => text.to_owned(),
    }
}

/// Largest char boundary `<= idx`.
pub(crate) fn floor_char_boundary(text: &str, idx: usize) -> usize {
    let mut idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Parsed JSON-LD blocks, in page order. Unparseable blocks are skipped.
pub(crate) fn json_ld_blocks(html: &str) -> Vec<Value> {
    JSON_LD_RE
        .captures_iter(html)
        .filter_map(|cap| {
            let raw = cap.get(1).map_or("", |m| m.as_str()).trim();
            if raw.is_empty() {
                return None;
            }
            serde_json::from_str::<Value>(raw).ok()
        })
        .collect()
}

/// Bodies of all inline `<script>` elements.
pub(crate) fn inline_scripts(html: &str) -> impl Iterator<Item = &str> {
    SCRIPT_RE
        .captures_iter(html)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
}

/// Product nodes of the JSON-LD blocks: objects typed `Product`, or untyped
/// top-level objects. `@graph` arrays and nested arrays are searched too.
pub(crate) fn product_nodes(blocks: &[Value]) -> Vec<&serde_json::Map<String, Value>> {
    let mut out = Vec::new();
    for block in blocks {
        collect_product_nodes(block, true, &mut out);
    }
    out
}

fn collect_product_nodes<'a>(
    value: &'a Value,
    top_level: bool,
    out: &mut Vec<&'a serde_json::Map<String, Value>>,
) {
    match value {
        Value::Object(map) => {
            let is_product = match map.get("@type") {
                Some(Value::String(t)) => is_product_type(t),
                Some(Value::Array(types)) => types
                    .iter()
                    .filter_map(Value::as_str)
                    .any(is_product_type),
                None => top_level,
                Some(_) => false,
            };
            if is_product {
                out.push(map);
            }
            if let Some(graph) = map.get("@graph") {
                collect_product_nodes(graph, false, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_product_nodes(item, top_level, out);
            }
        }
        _ => {}
    }
}

fn is_product_type(t: &str) -> bool {
    t.eq_ignore_ascii_case("product") || t.eq_ignore_ascii_case("productgroup")
}
