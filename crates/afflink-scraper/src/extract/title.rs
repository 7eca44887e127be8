//! Product title strategies, in precedence order.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::html::{clean_text, collapse_whitespace, decode_entities, json_ld_blocks, product_nodes};
use super::{first_match, Strategy};

/// A title candidate must be longer than this many characters.
pub const MIN_TITLE_LEN: usize = 5;

static MARKETING_PAREN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*\([^()]*(?:descuento|discount|oferta|offer|env[ií]o|shipping|gratis|free|promo|rebaja|ahorra|save)[^()]*\)",
    )
    .expect("valid marketing parenthetical regex")
});
static BRACKET_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[[^\[\]]*\]").expect("valid bracket regex"));
static PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^()]*\)").expect("valid parenthetical regex"));
static TITLE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("valid title regex"));
static BRAND_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*[:|\-–—]\s*amazon\b.*$").expect("valid brand suffix regex")
});
static BRAND_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*amazon(?:\.[a-z]{2,3}){1,2}\s*[:|\-–—]\s*").expect("valid brand prefix regex")
});
static BRAND_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^amazon(?:\.[a-z]{2,3}){0,2}$").expect("valid brand-only regex")
});
static PRODUCT_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<(span|h1)\b[^>]*\bid\s*=\s*["']productTitle["'][^>]*>(.*?)</(?:span|h1)>"#,
    )
    .expect("valid productTitle regex")
});

const TITLE_STRATEGIES: [Strategy<String>; 3] = [
    Strategy {
        name: "structured_data_name",
        run: structured_data_name,
    },
    Strategy {
        name: "document_title",
        run: document_title,
    },
    Strategy {
        name: "product_title_element",
        run: product_title_element,
    },
];

/// Best title for the page, or a placeholder built from `asin`.
#[must_use]
pub fn extract_title(html: &str, asin: Option<&str>) -> Option<String> {
    if let Some((strategy, title)) = first_match(html, &TITLE_STRATEGIES) {
        tracing::debug!(strategy, "title extracted");
        return Some(title);
    }
    asin.map(placeholder_title)
}

#[must_use]
pub fn placeholder_title(asin: &str) -> String {
    format!("Amazon product {asin}")
}

fn accept(candidate: String) -> Option<String> {
    (candidate.chars().count() > MIN_TITLE_LEN).then_some(candidate)
}

/// `name` of the first JSON-LD product node, marketing suffixes and
/// bracketed tags removed.
pub(crate) fn structured_data_name(html: &str) -> Option<String> {
    let blocks = json_ld_blocks(html);
    product_nodes(&blocks).into_iter().find_map(|node| {
        let name = node.get("name").and_then(Value::as_str)?;
        let name = decode_entities(name);
        let name = MARKETING_PAREN_RE.replace_all(&name, "");
        let name = BRACKET_TAG_RE.replace_all(&name, "");
        accept(collapse_whitespace(&name))
    })
}

/// `<title>` text cut before the site brand, parentheticals removed.
pub(crate) fn document_title(html: &str) -> Option<String> {
    let raw = TITLE_TAG_RE.captures(html)?.get(1)?.as_str();
    let text = clean_text(raw);
    let text = BRAND_PREFIX_RE.replace(&text, "");
    let text = BRAND_SUFFIX_RE.replace(&text, "");
    let text = PAREN_RE.replace_all(&text, "");
    let text = collapse_whitespace(&text);
    if BRAND_ONLY_RE.is_match(&text) {
        return None;
    }
    accept(text)
}

/// Text of the `productTitle` element.
pub(crate) fn product_title_element(html: &str) -> Option<String> {
    let raw = PRODUCT_TITLE_RE.captures(html)?.get(2)?.as_str();
    accept(clean_text(raw))
}
