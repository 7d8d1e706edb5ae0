//! Validated storefront product-page locator.
//!
//! A scrape-able URL must decompose as
//! `https://<storefront-host>/<store_key>/products/<numeric_id>` — a seller
//! namespace plus a numeric product identifier. Anything else is rejected
//! before a single network call is made.

use thiserror::Error;
use url::Url;

/// Default production storefront host.
const DEFAULT_HOST_SUFFIX: &str = "smartstore.naver.com";
/// Path segment separating the store key from the product identifier.
const DEFAULT_PRODUCT_SEGMENT: &str = "products";

/// What counts as a valid storefront URL.
///
/// The defaults match the production storefront; tests inject a loopback
/// host so the pipeline can run against a local mock server.
#[derive(Debug, Clone)]
pub struct StorefrontRules {
    /// Accepted host, matched as an exact host or a dot-separated suffix
    /// (so `"naver.com"` accepts `smartstore.naver.com`).
    pub host_suffix: String,
    /// Required path segment between store key and product id.
    pub product_segment: String,
}

impl Default for StorefrontRules {
    fn default() -> Self {
        Self {
            host_suffix: DEFAULT_HOST_SUFFIX.to_owned(),
            product_segment: DEFAULT_PRODUCT_SEGMENT.to_owned(),
        }
    }
}

impl StorefrontRules {
    /// Rules accepting a specific host verbatim (loopback addresses in tests).
    #[must_use]
    pub fn for_host(host: &str) -> Self {
        Self {
            host_suffix: host.to_owned(),
            ..Self::default()
        }
    }

    fn host_matches(&self, host: &str) -> bool {
        host == self.host_suffix || host.ends_with(&format!(".{}", self.host_suffix))
    }
}

/// Why a URL was rejected as a product locator.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("not an absolute URL: {0}")]
    Parse(#[from] url::ParseError),

    #[error("unsupported scheme \"{scheme}\" (expected http or https)")]
    UnsupportedScheme { scheme: String },

    #[error("host \"{host}\" is not the expected storefront")]
    WrongHost { host: String },

    #[error("path \"{path}\" does not contain a product-listing segment")]
    NotAProductPage { path: String },

    #[error("product id \"{id}\" is not numeric")]
    NonNumericProductId { id: String },
}

/// A URL already validated against [`StorefrontRules`].
///
/// Invariant: `store_key` and `product_id` are non-empty and `product_id`
/// is all digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUrl {
    url: Url,
    store_key: String,
    product_id: String,
}

impl ProductUrl {
    /// Parses and validates `input` against `rules`.
    ///
    /// # Errors
    ///
    /// Returns a [`UrlError`] describing the first rule the URL violates:
    /// unparseable, wrong scheme, wrong host, missing product segment, or a
    /// non-numeric product id.
    pub fn parse(input: &str, rules: &StorefrontRules) -> Result<Self, UrlError> {
        let url = Url::parse(input)?;

        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(UrlError::UnsupportedScheme {
                scheme: scheme.to_owned(),
            });
        }

        let host = url.host_str().unwrap_or_default();
        if !rules.host_matches(host) {
            return Err(UrlError::WrongHost {
                host: host.to_owned(),
            });
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        // Expect exactly `<store_key>/<segment>/<id>`.
        let [store_key, segment, id] = segments.as_slice() else {
            return Err(UrlError::NotAProductPage {
                path: url.path().to_owned(),
            });
        };
        if *segment != rules.product_segment {
            return Err(UrlError::NotAProductPage {
                path: url.path().to_owned(),
            });
        }
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(UrlError::NonNumericProductId {
                id: (*id).to_owned(),
            });
        }

        Ok(Self {
            store_key: (*store_key).to_owned(),
            product_id: (*id).to_owned(),
            url,
        })
    }

    /// The seller namespace, e.g. `"acme-official"`.
    #[must_use]
    pub fn store_key(&self) -> &str {
        &self.store_key
    }

    /// The numeric product identifier as it appears in the path.
    #[must_use]
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// The full validated URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Underlying parsed URL, for joining relative references.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Origin of the storefront, e.g. `"https://smartstore.naver.com"`.
    /// Used as the `Referer` and for best-effort session pre-warming.
    #[must_use]
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// Root URL of the seller's store (origin + store key).
    #[must_use]
    pub fn store_root(&self) -> String {
        format!("{}/{}", self.origin(), self.store_key)
    }
}

impl std::fmt::Display for ProductUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}
