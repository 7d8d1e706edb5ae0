//! Ordered selector strategies per field.
//!
//! Each list runs page-specific selectors first, then progressively more
//! generic ones; metadata-tag fallbacks are handled in code after the list
//! is exhausted. Evaluation is first-success with a per-field plausibility
//! filter — a deterministic priority search, not a vote. Selector strings
//! that fail to parse are skipped silently so one bad entry can never take
//! down the pipeline.

pub(crate) const TITLE_SELECTORS: &[&str] = &[
    "div.prod_buy_header h3",
    "div.product_info_area h3",
    "h3.product_title",
    "h1.product-title",
    "h2.product-name",
    "div#content h1",
];

/// Regions likely to contain the displayed price. Scanned exhaustively —
/// price disambiguation needs every numeric match, not the first.
pub(crate) const PRICE_REGION_SELECTORS: &[&str] = &[
    "div.prod_buy_header",
    "div.product_price",
    "span.price_area",
    "div.total_price",
    "div.price",
    "span.price",
];

pub(crate) const IMAGE_SELECTORS: &[&str] = &[
    "div.image_gallery img",
    "div.product_thumbs img",
    "div.product_image img",
    "div.thumbnail img",
    "img.product-image",
    "div#content img",
];

pub(crate) const DESCRIPTION_SELECTORS: &[&str] = &[
    "div.product_detail",
    "div.detail_content",
    "div#INTRODUCE",
    "div.product-description",
    "div.description",
];

pub(crate) const BRAND_SELECTORS: &[&str] = &[
    "span.product_brand",
    "a.brand_link",
    "div.product_info_area span.brand",
    "span.brand",
];

pub(crate) const CATEGORY_SELECTORS: &[&str] = &[
    "div.location a",
    "div.breadcrumb a",
    "ul.breadcrumb li",
    "nav.breadcrumb a",
];

pub(crate) const SELLER_NAME_SELECTORS: &[&str] = &[
    "div.store_info a.store_name",
    "a.seller_name",
    "span.shop_name",
    "div.seller-info span.name",
];

pub(crate) const SELLER_LINK_SELECTORS: &[&str] = &[
    "div.store_info a.store_name",
    "a.seller_name",
    "div.seller-info a",
];

pub(crate) const SHIPPING_SELECTORS: &[&str] = &[
    "div.delivery_info",
    "span.delivery_fee",
    "div.shipping_info",
    "span.shipping",
];

/// Two-column structures that may hold specification rows. Unlike the
/// other lists this one is NOT first-success: every matching region
/// contributes rows to the same accumulating map.
pub(crate) const SPEC_TABLE_SELECTORS: &[&str] = &[
    "table.product_spec",
    "div.product_info_table table",
    "table.se-table",
    "table.spec",
    "dl.spec_list",
];

pub(crate) const RATING_SELECTORS: &[&str] = &[
    "span.rating_score",
    "div.review_score",
    "span.score",
    "div.product-rating",
];

pub(crate) const REVIEW_COUNT_SELECTORS: &[&str] = &[
    "span.review_count",
    "a.review_count",
    "span.count_review",
    "div.review_summary",
];
