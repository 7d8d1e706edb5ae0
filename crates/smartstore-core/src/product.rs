//! Structured product record produced by the extraction pipeline.
//!
//! ## Field reliability
//!
//! Only `title` is guaranteed: extraction fails outright when no plausible
//! title can be recovered. Every other field is best-effort — storefront
//! pages vary wildly in markup, and an absent price or empty image list is
//! reported as a structural warning rather than an error. Consumers must
//! treat all optional fields as genuinely optional.
//!
//! ## Determinism
//!
//! The record is fully value-typed and `specifications` uses a `BTreeMap`
//! so serializing the same extraction twice yields byte-identical JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A product scraped from a storefront listing page, normalized for
/// downstream consumption and comparison across stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product display name. Mandatory; always 3–200 characters.
    pub title: String,
    /// Original/discounted price pair, when any price was recovered.
    #[serde(default)]
    pub price: Option<PriceInfo>,
    /// Gallery image URLs, deduplicated, in page order, capped by config.
    #[serde(default)]
    pub images: Vec<String>,
    /// Plain-text description, whitespace-collapsed and length-capped.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    /// Breadcrumb trail from the page, outermost category first.
    #[serde(default)]
    pub category_path: Vec<String>,
    #[serde(default)]
    pub rating: Option<RatingInfo>,
    /// Shipping summary line as displayed on the page (e.g. "무료배송").
    #[serde(default)]
    pub shipping: Option<String>,
    #[serde(default)]
    pub seller: Option<SellerInfo>,
    /// Numeric product identifier from the URL path.
    pub product_id: String,
    /// The URL this record was extracted from.
    pub source_url: String,
    /// `false` only when an out-of-stock phrase was found in the page text.
    pub availability: bool,
    /// Key/value rows accumulated from every spec-table region on the page.
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub reviews: Option<ReviewSummary>,
}

impl ProductRecord {
    /// Returns the first gallery image, if any were extracted.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Returns `true` if any price (original or discounted) was recovered.
    #[must_use]
    pub fn has_price(&self) -> bool {
        self.price
            .as_ref()
            .is_some_and(|p| p.original.is_some() || p.discounted.is_some())
    }
}

/// Original/discounted price pair with a display string.
///
/// When a page shows several prices, the maximum is taken as `original` and
/// a discount-marked (or sufficiently smaller) value as `discounted`; see
/// the extractor for the disambiguation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceInfo {
    /// Pre-discount price. The largest plausible price found on the page.
    #[serde(default)]
    pub original: Option<f64>,
    /// Sale price, when one was identified.
    #[serde(default)]
    pub discounted: Option<f64>,
    /// ISO 4217 currency code inferred from the matched tokens (e.g. `"KRW"`).
    pub currency: String,
    /// Human-readable rendering of the effective price (e.g. `"24,900원"`).
    pub display: String,
}

impl PriceInfo {
    /// The price a buyer would actually pay: discounted when present,
    /// original otherwise.
    #[must_use]
    pub fn effective(&self) -> Option<f64> {
        self.discounted.or(self.original)
    }

    /// Returns `true` when a distinct sale price was identified.
    #[must_use]
    pub fn has_discount(&self) -> bool {
        matches!((self.original, self.discounted), (Some(o), Some(d)) if d < o)
    }
}

/// Star rating summary from the listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingInfo {
    /// Average score in `[0, 5]`. Out-of-range candidates are discarded
    /// during extraction, never clamped.
    pub score: f64,
    /// Number of ratings behind the score.
    pub count: u32,
}

/// Seller identity block from the store header region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerInfo {
    pub name: String,
    /// Absolute URL of the seller's store page.
    #[serde(default)]
    pub profile_url: Option<String>,
}

/// Review section summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub count: u32,
    pub average_rating: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_price(original: Option<f64>, discounted: Option<f64>) -> ProductRecord {
        ProductRecord {
            title: "Test product".to_owned(),
            price: Some(PriceInfo {
                original,
                discounted,
                currency: "KRW".to_owned(),
                display: "1,000원".to_owned(),
            }),
            images: vec![],
            description: None,
            brand: None,
            category_path: vec![],
            rating: None,
            shipping: None,
            seller: None,
            product_id: "123".to_owned(),
            source_url: "https://smartstore.naver.com/shop/products/123".to_owned(),
            availability: true,
            specifications: BTreeMap::new(),
            reviews: None,
        }
    }

    #[test]
    fn effective_price_prefers_discounted() {
        let record = record_with_price(Some(35000.0), Some(24900.0));
        assert_eq!(record.price.unwrap().effective(), Some(24900.0));
    }

    #[test]
    fn effective_price_falls_back_to_original() {
        let record = record_with_price(Some(35000.0), None);
        assert_eq!(record.price.unwrap().effective(), Some(35000.0));
    }

    #[test]
    fn has_discount_requires_strictly_smaller_value() {
        assert!(record_with_price(Some(100.0), Some(90.0))
            .price
            .unwrap()
            .has_discount());
        assert!(!record_with_price(Some(100.0), Some(100.0))
            .price
            .unwrap()
            .has_discount());
        assert!(!record_with_price(Some(100.0), None)
            .price
            .unwrap()
            .has_discount());
    }

    #[test]
    fn has_price_is_false_without_any_value() {
        let record = record_with_price(None, None);
        assert!(!record.has_price());
    }

    #[test]
    fn record_serializes_deterministically() {
        let mut record = record_with_price(Some(100.0), None);
        record
            .specifications
            .insert("색상".to_owned(), "블랙".to_owned());
        record
            .specifications
            .insert("제조국".to_owned(), "한국".to_owned());
        let a = serde_json::to_string(&record).unwrap();
        let b = serde_json::to_string(&record.clone()).unwrap();
        assert_eq!(a, b);
    }
}
