//! Field extraction from heterogeneous product-page HTML.
//!
//! Every field runs its own ordered list of selector strategies
//! ([`strategies`]); the first value passing that field's plausibility
//! filter wins. Only the title is mandatory — everything else degrades to
//! `None`/empty and is surfaced through [`StructuralWarning`]s rather than
//! errors. Extraction is deterministic: identical HTML and URL always
//! produce an identical record.

mod fields;
mod images;
mod price;
pub(crate) mod strategies;

pub(crate) use price::format_krw;

use scraper::{Html, Selector};
use url::Url;

use smartstore_core::ProductRecord;

use crate::error::ScraperError;

/// Extraction policy knobs.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Cap on extracted gallery images.
    pub max_images: usize,
    /// Cap on description length in characters.
    pub max_description_len: usize,
    /// Whether to walk specification tables at all.
    pub extract_specifications: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_images: 10,
            max_description_len: 2_000,
            extract_specifications: true,
        }
    }
}

/// A non-fatal gap in an extracted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralWarning {
    MissingPrice,
    NoImages,
}

impl std::fmt::Display for StructuralWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPrice => write!(f, "no price could be recovered"),
            Self::NoImages => write!(f, "no gallery images could be recovered"),
        }
    }
}

/// Extracts a [`ProductRecord`] from raw page markup.
///
/// # Errors
///
/// - [`ScraperError::InvalidInput`] — `source_url` is not an absolute URL
///   (needed to resolve relative image references).
/// - [`ScraperError::FieldMissing`] — no plausible title anywhere on the
///   page; the one condition that fails extraction outright.
pub fn extract_product(
    html: &str,
    source_url: &str,
    opts: &ExtractOptions,
) -> Result<ProductRecord, ScraperError> {
    let base = Url::parse(source_url).map_err(|e| ScraperError::InvalidInput {
        url: source_url.to_owned(),
        reason: format!("source URL is not absolute: {e}"),
    })?;
    let document = Html::parse_document(html);

    let title = fields::extract_title(&document).ok_or_else(|| ScraperError::FieldMissing {
        field: "title",
        url: source_url.to_owned(),
    })?;

    let price = price::extract_price(&document);
    if price.is_none() {
        tracing::warn!(url = source_url, "no price found on product page");
    }

    let images = images::extract_images(&document, &base, opts.max_images);
    if images.is_empty() {
        tracing::warn!(url = source_url, "no gallery images found on product page");
    }

    let specifications = if opts.extract_specifications {
        fields::extract_specifications(&document)
    } else {
        std::collections::BTreeMap::new()
    };

    let rating = fields::extract_rating(&document);
    let reviews = fields::extract_reviews(&document, rating.as_ref());

    Ok(ProductRecord {
        title,
        price,
        images,
        description: fields::extract_description(&document, opts.max_description_len),
        brand: fields::extract_brand(&document),
        category_path: fields::extract_category_path(&document),
        rating,
        shipping: fields::extract_shipping(&document),
        seller: fields::extract_seller(&document, &base),
        product_id: product_id_from_url(&base),
        source_url: source_url.to_owned(),
        availability: fields::extract_availability(&document),
        specifications,
        reviews,
    })
}

/// Structural validation of an extracted record.
///
/// The contract is "best effort with a mandatory minimum": only a
/// missing/implausible title is fatal. Gaps in price or images come back
/// as warnings for the caller to log.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidRecord`] when the title is shorter than
/// 3 or longer than 200 characters.
pub fn validate_record(record: &ProductRecord) -> Result<Vec<StructuralWarning>, ScraperError> {
    let title_len = record.title.chars().count();
    if !(3..=200).contains(&title_len) {
        return Err(ScraperError::InvalidRecord {
            reason: format!("title length {title_len} outside the 3–200 character bound"),
        });
    }

    let mut warnings = Vec::new();
    if !record.has_price() {
        warnings.push(StructuralWarning::MissingPrice);
    }
    if record.images.is_empty() {
        warnings.push(StructuralWarning::NoImages);
    }
    Ok(warnings)
}

/// Last all-digit path segment, which is the product identifier for every
/// URL shape this pipeline accepts.
fn product_id_from_url(url: &Url) -> String {
    url.path_segments()
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .next_back()
        .unwrap_or_default()
        .to_owned()
}

/// Runs a selector list in priority order, returning the first
/// whitespace-collapsed element text whose char length lies in
/// `[min_len, max_len)`.
pub(crate) fn select_first_text(
    document: &Html,
    selectors: &[&str],
    min_len: usize,
    max_len: usize,
) -> Option<String> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in document.select(&selector) {
            let text = collapse_whitespace(&element.text().collect::<String>());
            let len = text.chars().count();
            if len >= min_len && len < max_len {
                return Some(text);
            }
        }
    }
    None
}

/// Reads `<meta property=…>` / `<meta name=…>` content for the given key.
pub(crate) fn meta_content(document: &Html, key: &str) -> Option<String> {
    let raw = format!("meta[property=\"{key}\"], meta[name=\"{key}\"]");
    let selector = Selector::parse(&raw).ok()?;
    document
        .select(&selector)
        .find_map(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_owned)
}

/// Collapses runs of whitespace (including newlines from element
/// boundaries) into single spaces and trims the ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates on a character boundary, never mid-codepoint.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
#[path = "../extract_test.rs"]
mod tests;
