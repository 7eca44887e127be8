//! Price strategies and euro price normalization.
//!
//! Candidates from structured data, inline scripts and the price triplet must
//! exceed [`PRICE_FLOOR`]; the offscreen-span fallback only needs
//! [`FALLBACK_PRICE_FLOOR`]. The floors keep shipping fees and coupon amounts
//! from being mistaken for the product price.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

use super::html::{
    clean_text, floor_char_boundary, inline_scripts, json_ld_blocks, product_nodes,
};
use super::{first_match, Strategy};

/// Primary strategies accept only values strictly above this.
pub const PRICE_FLOOR: Decimal = Decimal::TEN;
/// The offscreen fallback accepts values at or above this.
pub const FALLBACK_PRICE_FLOOR: Decimal = Decimal::ONE;

/// Bytes before an offscreen span searched for promotional wording.
const PROMO_CONTEXT_BYTES: usize = 80;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d.,]*").expect("valid number regex"));
static SCRIPT_PRICE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""priceAmount"\s*:\s*"?(\d[\d.,]*)"#,
        r#""displayPrice"\s*:\s*"([^"]{1,40})""#,
        r#""buyingPrice"\s*:\s*"?(\d[\d.,]*)"#,
        r#""price"\s*:\s*"?(\d[\d.,]*)"#,
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid script price regex"))
    .collect()
});
static TRIPLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<span[^>]*class\s*=\s*["'][^"']*\ba-price-whole\b[^"']*["'][^>]*>\s*(\d[\d.,]*)\s*(?:<span[^>]*a-price-decimal[^>]*>[.,]?</span>)?\s*</span>\s*<span[^>]*class\s*=\s*["'][^"']*\ba-price-fraction\b[^"']*["'][^>]*>\s*(\d{1,2})\s*</span>"#,
    )
    .expect("valid price triplet regex")
});
static OFFSCREEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<span[^>]*class\s*=\s*["'][^"']*\ba-offscreen\b[^"']*["'][^>]*>([^<]{1,80})</span>"#,
    )
    .expect("valid offscreen regex")
});
static PROMO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)cup[oó]n|coupon|env[ií]o|shipping|delivery|suscr[ií]b|subscribe|ahorra|save\s|prime|member|socio",
    )
    .expect("valid promo regex")
});

const PRICE_STRATEGIES: [Strategy<Decimal>; 4] = [
    Strategy {
        name: "structured_data_offer",
        run: structured_data_offer,
    },
    Strategy {
        name: "inline_script_price",
        run: inline_script_price,
    },
    Strategy {
        name: "price_triplet",
        run: price_triplet,
    },
    Strategy {
        name: "offscreen_spans",
        run: offscreen_spans,
    },
];

/// Product price, rounded to two decimals.
#[must_use]
pub fn extract_price(html: &str) -> Option<Decimal> {
    let (strategy, amount) = first_match(html, &PRICE_STRATEGIES)?;
    tracing::debug!(strategy, amount = %amount, "price extracted");
    Some(amount.round_dp(2))
}

/// Parses and formats a raw price string; values below 1 are dropped.
///
/// `"1234.56"` and `"1.234,56 €"` both become `"1.234,56 €"`.
#[must_use]
pub fn normalize_price(raw: &str) -> Option<String> {
    parse_price_amount(raw)
        .filter(|amount| *amount >= FALLBACK_PRICE_FLOOR)
        .map(format_eur)
}

/// Parses the first number in `raw`, accepting both `.` and `,` as either
/// thousands or decimal separator.
///
/// The last separator is the decimal one unless exactly three digits follow
/// it and no other separator kind appears before it, in which case it
/// groups thousands (`"1.234"` is 1234, `"1.234,5"` is 1234.5).
#[must_use]
pub fn parse_price_amount(raw: &str) -> Option<Decimal> {
    let compact: String = raw
        .chars()
        .filter(|c| !matches!(c, '\u{a0}' | '\u{202f}' | ' '))
        .collect();
    let number = NUMBER_RE
        .find(&compact)?
        .as_str()
        .trim_end_matches(['.', ',']);

    let digits_only = |s: &str| s.chars().filter(char::is_ascii_digit).collect::<String>();

    let (int_part, frac_part) = match number.rfind(['.', ',']) {
        Some(pos) => {
            let sep = number.as_bytes()[pos];
            let other = if sep == b'.' { ',' } else { '.' };
            let frac = &number[pos + 1..];
            let groups_thousands = frac.len() == 3 && !number[..pos].contains(other);
            if groups_thousands {
                (digits_only(number), String::new())
            } else {
                (digits_only(&number[..pos]), digits_only(frac))
            }
        }
        None => (number.to_owned(), String::new()),
    };

    let int_part = if int_part.is_empty() { "0".to_owned() } else { int_part };
    let text = if frac_part.is_empty() {
        int_part
    } else {
        format!("{int_part}.{frac_part}")
    };
    Decimal::from_str(&text).ok()
}

/// Formats as `1.234,56 €`.
#[must_use]
pub fn format_eur(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2).abs();
    rounded.rescale(2);
    let text = rounded.to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("{grouped},{frac_part} €")
}

fn above_floor(amount: Decimal) -> bool {
    amount > PRICE_FLOOR
}

/// Structured-data prices use `.` as the decimal point; only strings that
/// are not a plain decimal go through the separator heuristic.
fn json_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => plain_decimal(&n.to_string()),
        Value::String(s) => plain_decimal(s.trim()).or_else(|| parse_price_amount(s)),
        _ => None,
    }
}

fn plain_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
        .filter(|amount| !amount.is_sign_negative())
}

/// `offers.price` / `offers.lowPrice` of JSON-LD product nodes.
pub(crate) fn structured_data_offer(html: &str) -> Option<Decimal> {
    let blocks = json_ld_blocks(html);
    product_nodes(&blocks).into_iter().find_map(|node| {
        let offers: Vec<&Value> = match node.get("offers")? {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        offers.into_iter().find_map(|offer| {
            ["price", "lowPrice"]
                .iter()
                .filter_map(|field| offer.get(*field).and_then(json_price))
                .find(|amount| above_floor(*amount))
        })
    })
}

/// Known price fields inside inline script content.
pub(crate) fn inline_script_price(html: &str) -> Option<Decimal> {
    inline_scripts(html).find_map(|script| {
        SCRIPT_PRICE_RES.iter().find_map(|re| {
            re.captures_iter(script)
                .filter_map(|cap| parse_price_amount(&cap[1]))
                .find(|amount| above_floor(*amount))
        })
    })
}

/// `a-price-whole` + `a-price-fraction` element pairs.
pub(crate) fn price_triplet(html: &str) -> Option<Decimal> {
    TRIPLET_RE.captures_iter(html).find_map(|cap| {
        let whole: String = cap[1].chars().filter(char::is_ascii_digit).collect();
        let amount = Decimal::from_str(&format!("{whole}.{}", &cap[2])).ok()?;
        above_floor(amount).then_some(amount)
    })
}

/// Smallest plausible value among non-promotional offscreen price spans.
pub(crate) fn offscreen_spans(html: &str) -> Option<Decimal> {
    let mut amounts: Vec<Decimal> = OFFSCREEN_RE
        .captures_iter(html)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let text = clean_text(&cap[1]);
            let context_start =
                floor_char_boundary(html, whole.start().saturating_sub(PROMO_CONTEXT_BYTES));
            let context = &html[context_start..whole.start()];
            if PROMO_RE.is_match(&text) || PROMO_RE.is_match(context) {
                return None;
            }
            parse_price_amount(&text)
        })
        .filter(|amount| *amount >= FALLBACK_PRICE_FLOOR)
        .collect();
    amounts.sort();
    amounts.into_iter().next()
}
