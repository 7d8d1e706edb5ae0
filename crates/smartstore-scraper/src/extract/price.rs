//! Price recovery and original/discount disambiguation.
//!
//! A listing page routinely shows several currency-formatted numbers:
//! list price, sale price, per-unit price, coupon math. Strategy: collect
//! every plausible numeric match across all price regions, then decide —
//! the maximum is the original price; the smallest discount-*marked* value
//! is the sale price; absent any marker, a smallest value at or below 90%
//! of the maximum is assumed to be one.
//!
//! The 90% ratio rule is a heuristic and can misfire on pages whose price
//! regions carry unrelated clusters (bundle strips, accessory rails); the
//! marker scan always takes precedence, and the ratio rule only runs when
//! no marker matched anywhere.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use smartstore_core::PriceInfo;

use super::strategies::PRICE_REGION_SELECTORS;
use super::{collapse_whitespace, meta_content};

/// A currency-formatted number: optional `₩`/`$` prefix, digits with
/// optional thousands grouping and decimals, optional `원` suffix. A bare
/// ungrouped number with no currency signal is NOT a price candidate.
static PRICE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([₩$])?\s*((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?)\s*(원)?")
        .expect("valid price regex")
});

/// Words/glyphs that mark an adjacent number as a sale price.
const DISCOUNT_MARKERS: &[&str] = &["특가", "할인", "세일", "sale", "special price", "↓"];

/// Context window, in bytes, inspected on each side of a numeric match
/// for a discount marker.
const MARKER_WINDOW_BYTES: usize = 40;

/// Ratio threshold for the markerless discount inference.
const DISCOUNT_RATIO: f64 = 0.90;

/// Upper plausibility bound; anything above this is a stray identifier,
/// not a price.
const MAX_PLAUSIBLE_PRICE: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Currency {
    Krw,
    Usd,
}

impl Currency {
    fn code(self) -> &'static str {
        match self {
            Self::Krw => "KRW",
            Self::Usd => "USD",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PriceCandidate {
    amount: f64,
    marked: bool,
    currency: Currency,
}

/// Scans the price regions and produces a disambiguated [`PriceInfo`], or
/// falls back to structured metadata tags. `None` when the page carries
/// no recoverable price at all.
pub(super) fn extract_price(document: &Html) -> Option<PriceInfo> {
    let candidates = collect_candidates(document);
    if candidates.is_empty() {
        return price_from_meta(document);
    }

    let currency = candidates
        .iter()
        .find(|c| c.currency == Currency::Krw)
        .map_or_else(|| candidates[0].currency, |c| c.currency);

    let original = candidates
        .iter()
        .map(|c| c.amount)
        .fold(f64::MIN, f64::max);

    let marked_min = candidates
        .iter()
        .filter(|c| c.marked)
        .map(|c| c.amount)
        .fold(f64::MAX, f64::min);

    let discounted = if marked_min < original {
        Some(marked_min)
    } else {
        let overall_min = candidates
            .iter()
            .map(|c| c.amount)
            .fold(f64::MAX, f64::min);
        // Markerless inference: a clearly smaller co-displayed price is
        // almost always the sale price.
        if overall_min < original && overall_min <= original * DISCOUNT_RATIO {
            Some(overall_min)
        } else {
            None
        }
    };

    let display = format_amount(discounted.unwrap_or(original), currency);
    Some(PriceInfo {
        original: Some(original),
        discounted,
        currency: currency.code().to_owned(),
        display,
    })
}

/// Every plausible price token across every price region, with its
/// discount-marker context.
fn collect_candidates(document: &Html) -> Vec<PriceCandidate> {
    let mut candidates = Vec::new();
    for raw in PRICE_REGION_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in document.select(&selector) {
            let text = collapse_whitespace(&element.text().collect::<String>());
            scan_text(&text, &mut candidates);
        }
    }
    candidates
}

fn scan_text(text: &str, out: &mut Vec<PriceCandidate>) {
    // Scan the lowercased text so marker-window offsets line up exactly;
    // digits and currency symbols are unaffected by lowering.
    let lowered = text.to_lowercase();
    for caps in PRICE_TOKEN_RE.captures_iter(&lowered) {
        let symbol = caps.get(1).map(|m| m.as_str());
        let digits = caps.get(2).map_or("", |m| m.as_str());
        let won_suffix = caps.get(3).is_some();
        let grouped = digits.contains(',');

        // Demand at least one currency signal; bare numbers in a price
        // region are review counts, option ids, quantities.
        if symbol.is_none() && !won_suffix && !grouped {
            continue;
        }

        let Ok(amount) = digits.replace(',', "").parse::<f64>() else {
            continue;
        };
        if amount <= 0.0 || amount >= MAX_PLAUSIBLE_PRICE {
            continue;
        }

        let currency = if symbol == Some("$") {
            Currency::Usd
        } else {
            Currency::Krw
        };

        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push(PriceCandidate {
            amount,
            marked: context_has_marker(&lowered, whole.start(), whole.end()),
            currency,
        });
    }
}

/// Checks a bounded window around `[start, end)` for a discount marker.
fn context_has_marker(lowered: &str, start: usize, end: usize) -> bool {
    let from = floor_char_boundary(lowered, start.saturating_sub(MARKER_WINDOW_BYTES));
    let to = ceil_char_boundary(lowered, (end + MARKER_WINDOW_BYTES).min(lowered.len()));
    let window = &lowered[from..to];
    DISCOUNT_MARKERS.iter().any(|m| window.contains(m))
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Structured metadata fallback for pages that render prices with script.
fn price_from_meta(document: &Html) -> Option<PriceInfo> {
    let amount = ["og:price:amount", "product:price:amount"]
        .iter()
        .find_map(|key| meta_content(document, key))
        .and_then(|raw| raw.replace(',', "").parse::<f64>().ok())
        .filter(|a| *a > 0.0 && *a < MAX_PLAUSIBLE_PRICE)?;

    let currency = ["og:price:currency", "product:price:currency"]
        .iter()
        .find_map(|key| meta_content(document, key))
        .map_or(Currency::Krw, |code| {
            if code.eq_ignore_ascii_case("usd") {
                Currency::Usd
            } else {
                Currency::Krw
            }
        });

    Some(PriceInfo {
        original: Some(amount),
        discounted: None,
        currency: currency.code().to_owned(),
        display: format_amount(amount, currency),
    })
}

/// KRW display formatting for records built outside the HTML path.
pub(crate) fn format_krw(amount: f64) -> String {
    format_amount(amount, Currency::Krw)
}

/// Renders an amount the way the storefront displays it: grouped
/// `24,900원` for KRW, `$29.99` for USD.
fn format_amount(amount: f64, currency: Currency) -> String {
    match currency {
        Currency::Krw => format!("{}원", group_thousands(amount.round() as i64)),
        Currency::Usd => format!("${amount:.2}"),
    }
}

fn group_thousands(mut value: i64) -> String {
    let negative = value < 0;
    value = value.abs();
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}
