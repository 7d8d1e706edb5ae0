//! Per-field extraction procedures: title, description, brand, category,
//! seller, shipping, availability, specifications, rating, and reviews.
//!
//! Price and images live in their own modules; everything here is a
//! straightforward priority-ordered selector search with a field-specific
//! plausibility filter.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use smartstore_core::{RatingInfo, ReviewSummary, SellerInfo};

use super::strategies::{
    BRAND_SELECTORS, CATEGORY_SELECTORS, DESCRIPTION_SELECTORS, RATING_SELECTORS,
    REVIEW_COUNT_SELECTORS, SELLER_LINK_SELECTORS, SELLER_NAME_SELECTORS, SHIPPING_SELECTORS,
    SPEC_TABLE_SELECTORS, TITLE_SELECTORS,
};
use super::{collapse_whitespace, meta_content, select_first_text, truncate_chars};

/// Site-suffix patterns appended by the storefront to `og:title`.
const TITLE_SUFFIXES: &[&str] = &[" : 네이버쇼핑", " : 네이버 쇼핑", " - 네이버쇼핑"];

/// Out-of-stock phrases across the languages the storefront serves.
/// Matched case-insensitively against the whole visible page text.
const OUT_OF_STOCK_PHRASES: &[&str] = &[
    "품절",
    "일시품절",
    "재고없음",
    "재고가 없습니다",
    "판매종료",
    "판매 종료",
    "out of stock",
    "sold out",
    "currently unavailable",
    "在庫切れ",
    "売り切れ",
];

const SPEC_KEY_MAX_CHARS: usize = 60;
const SPEC_VALUE_MAX_CHARS: usize = 300;

static RATING_SCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d\.\d{1,2}|\d)").expect("valid rating regex"));

/// A review count: parenthesized `(1,234)`, suffixed `1,234개` / `1,234건`,
/// or labeled `리뷰 1,234`.
static REVIEW_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\((\d{1,3}(?:,\d{3})*|\d+)\)|(\d{1,3}(?:,\d{3})*|\d+)\s*(?:개|건)|(?:리뷰|[Rr]eviews?)\s*(\d{1,3}(?:,\d{3})*|\d+)",
    )
    .expect("valid review count regex")
});

/// Title: content-region selectors in priority order, then `og:title`
/// with the site suffix stripped. Plausibility bound `[4, 200)` chars.
pub(super) fn extract_title(document: &Html) -> Option<String> {
    if let Some(title) = select_first_text(document, TITLE_SELECTORS, 4, 200) {
        return Some(title);
    }
    let meta = meta_content(document, "og:title")?;
    let stripped = strip_title_suffix(&meta);
    let len = stripped.chars().count();
    ((4..200).contains(&len)).then(|| stripped.to_owned())
}

fn strip_title_suffix(title: &str) -> &str {
    for suffix in TITLE_SUFFIXES {
        if let Some(stripped) = title.strip_suffix(suffix) {
            return stripped.trim_end();
        }
    }
    title.trim()
}

pub(super) fn extract_description(document: &Html, max_chars: usize) -> Option<String> {
    select_first_text(document, DESCRIPTION_SELECTORS, 1, usize::MAX)
        .or_else(|| meta_content(document, "og:description"))
        .map(|d| truncate_chars(&collapse_whitespace(&d), max_chars))
        .filter(|d| !d.is_empty())
}

pub(super) fn extract_brand(document: &Html) -> Option<String> {
    select_first_text(document, BRAND_SELECTORS, 1, 100)
        .or_else(|| meta_content(document, "product:brand"))
}

/// Breadcrumb trail: the first selector yielding at least one plausible
/// item wins; consecutive duplicates collapse (breadcrumbs often repeat
/// the leaf as the active element).
pub(super) fn extract_category_path(document: &Html) -> Vec<String> {
    for raw in CATEGORY_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let mut path: Vec<String> = Vec::new();
        for element in document.select(&selector) {
            let text = collapse_whitespace(&element.text().collect::<String>());
            let len = text.chars().count();
            if len == 0 || len > 60 {
                continue;
            }
            if path.last() != Some(&text) {
                path.push(text);
            }
        }
        if !path.is_empty() {
            return path;
        }
    }
    Vec::new()
}

/// Seller name from the store header; profile URL from the first matching
/// link's `href`, resolved absolute. Falls back to the store root derived
/// from the page URL when the header carries no link.
pub(super) fn extract_seller(document: &Html, base: &Url) -> Option<SellerInfo> {
    let name = select_first_text(document, SELLER_NAME_SELECTORS, 1, 100)?;

    let profile_url = SELLER_LINK_SELECTORS
        .iter()
        .filter_map(|raw| Selector::parse(raw).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .find_map(|el| el.value().attr("href"))
                .and_then(|href| base.join(href).ok())
                .map(Into::into)
        })
        .or_else(|| store_root(base));

    Some(SellerInfo { name, profile_url })
}

/// Origin plus the first path segment — the seller's store page for every
/// URL shape this pipeline accepts.
fn store_root(base: &Url) -> Option<String> {
    let store_key = base.path_segments()?.find(|s| !s.is_empty())?;
    Some(format!(
        "{}/{store_key}",
        base.origin().ascii_serialization()
    ))
}

pub(super) fn extract_shipping(document: &Html) -> Option<String> {
    select_first_text(document, SHIPPING_SELECTORS, 1, 200)
}

/// Default true; any out-of-stock phrase anywhere in the visible page
/// text flips it. This is a whole-document scan, not a field lookup —
/// storefronts render the sold-out state in too many places to enumerate.
pub(super) fn extract_availability(document: &Html) -> bool {
    let text = document
        .root_element()
        .text()
        .collect::<String>()
        .to_lowercase();
    !OUT_OF_STOCK_PHRASES.iter().any(|p| text.contains(p))
}

/// Accumulates key/value rows from every matching two-column region.
/// Unlike the first-success fields, later regions merge into the same
/// map; the first writer wins on key collision.
pub(super) fn extract_specifications(document: &Html) -> BTreeMap<String, String> {
    let mut specs = BTreeMap::new();
    for raw in SPEC_TABLE_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for region in document.select(&selector) {
            collect_rows(&region, "tr", "th", "td", &mut specs);
            collect_rows(&region, "dl", "dt", "dd", &mut specs);
            // A <dl> region selected directly has no inner dl wrapper.
            if region.value().name() == "dl" {
                collect_pairs(&region, "dt", "dd", &mut specs);
            }
        }
    }
    specs
}

fn collect_rows(
    region: &scraper::ElementRef<'_>,
    row: &str,
    key_tag: &str,
    value_tag: &str,
    specs: &mut BTreeMap<String, String>,
) {
    let Ok(row_selector) = Selector::parse(row) else {
        return;
    };
    for row_el in region.select(&row_selector) {
        collect_pairs(&row_el, key_tag, value_tag, specs);
    }
}

fn collect_pairs(
    scope: &scraper::ElementRef<'_>,
    key_tag: &str,
    value_tag: &str,
    specs: &mut BTreeMap<String, String>,
) {
    let (Ok(key_selector), Ok(value_selector)) =
        (Selector::parse(key_tag), Selector::parse(value_tag))
    else {
        return;
    };
    let keys: Vec<String> = scope
        .select(&key_selector)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .collect();
    let values: Vec<String> = scope
        .select(&value_selector)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .collect();

    for (key, value) in keys.into_iter().zip(values) {
        if key.is_empty() || value.is_empty() {
            continue;
        }
        if key.chars().count() > SPEC_KEY_MAX_CHARS
            || value.chars().count() > SPEC_VALUE_MAX_CHARS
        {
            continue;
        }
        specs.entry(key).or_insert(value);
    }
}

/// First decimal in `[0, 5]` from the rating regions. Out-of-range
/// candidates are discarded silently, never clamped.
pub(super) fn extract_rating(document: &Html) -> Option<RatingInfo> {
    for raw in RATING_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in document.select(&selector) {
            let text = collapse_whitespace(&element.text().collect::<String>());
            for caps in RATING_SCORE_RE.captures_iter(&text) {
                let Ok(score) = caps[1].parse::<f64>() else {
                    continue;
                };
                if (0.0..=5.0).contains(&score) {
                    let count = extract_review_count(document).unwrap_or(0);
                    return Some(RatingInfo { score, count });
                }
            }
        }
    }
    None
}

pub(super) fn extract_reviews(document: &Html, rating: Option<&RatingInfo>) -> Option<ReviewSummary> {
    let count = extract_review_count(document)?;
    Some(ReviewSummary {
        count,
        average_rating: rating.map_or(0.0, |r| r.score),
    })
}

fn extract_review_count(document: &Html) -> Option<u32> {
    for raw in REVIEW_COUNT_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in document.select(&selector) {
            let text = collapse_whitespace(&element.text().collect::<String>());
            if let Some(caps) = REVIEW_COUNT_RE.captures(&text) {
                let digits = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str().replace(',', ""))?;
                if let Ok(count) = digits.parse::<u32>() {
                    return Some(count);
                }
            }
        }
    }
    None
}
