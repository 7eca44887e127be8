//! Related-product recommendations.
//!
//! Three anchor patterns are tried as a cascade, from the most specific
//! (sponsored placements) to the broadest (any product identifier on the
//! page). Each anchor yields an identifier; its title is the first long
//! enough `alt`/`title`/`aria-label` attribute that follows it before the next
//! product card starts.

use std::collections::HashSet;
use std::sync::LazyLock;

use afflink_core::{is_valid_asin, Recommendation};
use regex::{Captures, Regex};

use super::html::{clean_text, floor_char_boundary, truncate_chars};

/// The cascade stops once this many recommendations are collected.
pub const MIN_RECOMMENDATIONS: usize = 4;
pub const MAX_RECOMMENDATIONS: usize = 12;
pub const MAX_TITLE_CHARS: usize = 120;
const MIN_TITLE_CHARS: usize = 10;

/// Bytes after an anchor searched for its title.
const TITLE_WINDOW_BYTES: usize = 2500;

static SPONSORED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<[a-zA-Z]+\b[^>]*?\bclass\s*=\s*["'][^"']*(?:sp_|AdHolder|sponsored)[^"']*["'][^>]*?\bdata-asin\s*=\s*["']([A-Za-z0-9]{10})["']|<[a-zA-Z]+\b[^>]*?\bdata-asin\s*=\s*["']([A-Za-z0-9]{10})["'][^>]*?\bclass\s*=\s*["'][^"']*(?:sp_|AdHolder|sponsored)[^"']*["']"#,
    )
    .expect("valid sponsored anchor regex")
});
static CAROUSEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)a-carousel-card\b[^>]*>\s*<div\b[^>]*?\bdata-asin\s*=\s*["']([A-Za-z0-9]{10})["']|&quot;asin&quot;\s*:\s*&quot;([A-Za-z0-9]{10})&quot;"#,
    )
    .expect("valid carousel anchor regex")
});
static BROAD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bdata-asin\s*=\s*["']([A-Za-z0-9]{10})["']|/dp/([A-Za-z0-9]{10})\b"#)
        .expect("valid broad anchor regex")
});
static NEXT_CARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdata-asin\s*=").expect("valid card boundary regex"));
static TITLE_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\b(?:alt|title|aria-label)\s*=\s*"([^"]{10,})"|&quot;title&quot;\s*:\s*&quot;(.{10,}?)&quot;"#,
    )
    .expect("valid title attribute regex")
});
static PROMO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)patrocinad|sponsored|anuncio|\bads?\b|cup[oó]n|coupon|descuento|discount|oferta del d[ií]a|deal of the day|ver m[aá]s|see more|env[ií]o gratis|free shipping|comprar ahora|buy now|a[ñn]adir al carrito|add to (?:cart|basket)|valoraci[oó]n|estrellas|out of 5 stars",
    )
    .expect("valid promo regex")
});

fn anchors() -> [(&'static str, &'static Regex); 3] {
    [
        ("sponsored_block", &*SPONSORED_RE),
        ("carousel_block", &*CAROUSEL_RE),
        ("broad_fallback", &*BROAD_RE),
    ]
}

/// Related products of the page, excluding `main_asin`.
#[must_use]
pub fn extract_recommendations(html: &str, main_asin: Option<&str>) -> Vec<Recommendation> {
    let main_asin = main_asin.map(str::to_ascii_uppercase);
    let mut seen: HashSet<String> = HashSet::new();
    let mut found: Vec<Recommendation> = Vec::new();

    for (strategy, anchor) in anchors() {
        let before = found.len();
        collect(html, anchor, main_asin.as_deref(), &mut seen, &mut found);
        tracing::debug!(
            strategy,
            added = found.len() - before,
            total = found.len(),
            "recommendation anchors scanned"
        );
        if found.len() >= MIN_RECOMMENDATIONS {
            break;
        }
    }

    found
}

fn collect(
    html: &str,
    anchor: &Regex,
    main_asin: Option<&str>,
    seen: &mut HashSet<String>,
    found: &mut Vec<Recommendation>,
) {
    for cap in anchor.captures_iter(html) {
        if found.len() >= MAX_RECOMMENDATIONS {
            return;
        }
        let Some(asin) = first_group(&cap).map(str::to_ascii_uppercase) else {
            continue;
        };
        if !is_valid_asin(&asin) || main_asin == Some(asin.as_str()) || seen.contains(&asin) {
            continue;
        }
        let Some(end) = cap.get(0).map(|m| m.end()) else {
            continue;
        };
        let Some(title) = title_after(html, end) else {
            continue;
        };
        seen.insert(asin.clone());
        found.push(Recommendation { asin, title });
    }
}

fn first_group<'h>(cap: &Captures<'h>) -> Option<&'h str> {
    cap.iter().skip(1).flatten().next().map(|m| m.as_str())
}

/// First acceptable title between `start` and the next product card.
fn title_after(html: &str, start: usize) -> Option<String> {
    let limit = floor_char_boundary(html, start.saturating_add(TITLE_WINDOW_BYTES));
    let window = &html[start..limit];
    let window = NEXT_CARD_RE
        .find(window)
        .map_or(window, |next| &window[..next.start()]);

    TITLE_ATTR_RE.captures_iter(window).find_map(|cap| {
        let title = clean_text(first_group(&cap)?);
        if title.chars().count() < MIN_TITLE_CHARS || PROMO_RE.is_match(&title) {
            return None;
        }
        Some(truncate_chars(&title, MAX_TITLE_CHARS))
    })
}
