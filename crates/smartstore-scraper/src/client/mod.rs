//! HTTP page fetcher for storefront product pages.
//!
//! Retrieves one product listing page under the retry/backoff policy in
//! [`crate::retry`], rotating client identities per attempt and appending a
//! cache-busting query parameter so intermediaries cannot serve a stale or
//! fingerprinted response. HTTP 4xx/5xx are not transport failures here —
//! each status is classified into a typed [`ScraperError`] so the retry
//! loop can distinguish fail-fast conditions from transient ones.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, REFERER, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use smartstore_core::{ProductUrl, StorefrontRules};

use crate::error::ScraperError;
use crate::identity::{ClientIdentity, IdentityPool};
use crate::retry::run_with_retries;

/// Per-fetch policy knobs. The HTTP timeout lives on [`PageClient`]
/// because `reqwest` applies it at client construction.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Additional attempts after the first failure. `0` disables retries.
    pub max_retries: u32,
    /// Base delay for the retry schedule (attempt `n` waits `base × n`
    /// plus jitter; doubled after a 429).
    pub base_delay: Duration,
    /// Explicit identity override. `None` rotates the shared pool.
    pub identity: Option<&'static ClientIdentity>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            identity: None,
        }
    }
}

/// A successfully retrieved page, before any blocked-content judgment.
///
/// The fetcher never suppresses data: a suspiciously short or
/// challenge-looking body is still returned, and the caller decides what
/// to do with it.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub body: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// URL after redirects, which is what relative references resolve
    /// against during extraction.
    pub final_url: String,
}

/// HTTP client for storefront product pages.
///
/// Owns the `reqwest::Client` (cookie store enabled for session
/// pre-warming, redirects capped), the identity rotation cursor, and the
/// cache-buster counter. All three are safe to share across concurrent
/// scrape calls; the cursors are atomics.
pub struct PageClient {
    client: Client,
    rules: StorefrontRules,
    identities: IdentityPool,
    cache_buster: AtomicU64,
}

impl PageClient {
    /// Creates a `PageClient` with the given storefront rules and
    /// per-attempt timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(rules: StorefrontRules, timeout_secs: u64) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            rules,
            identities: IdentityPool::new(),
            cache_buster: AtomicU64::new(0),
        })
    }

    /// Validates `url` against the storefront rules and fetches it.
    ///
    /// Malformed URLs fail with [`ScraperError::InvalidInput`] before any
    /// network call is made.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidInput`] — URL shape rejected, HTTP 400, or
    ///   a non-HTML response (not retried).
    /// - [`ScraperError::NotFound`] — HTTP 404 or unresolvable host (404
    ///   is not retried).
    /// - [`ScraperError::RateLimited`] — HTTP 429 after all retries.
    /// - [`ScraperError::Forbidden`] — HTTP 403 after all retries.
    /// - [`ScraperError::ServiceUnavailable`] — 5xx or connection failure
    ///   after all retries.
    /// - [`ScraperError::Timeout`] — attempt timeout after all retries.
    pub async fn fetch(
        &self,
        url: &str,
        opts: &FetchOptions,
    ) -> Result<FetchOutcome, ScraperError> {
        let product_url =
            ProductUrl::parse(url, &self.rules).map_err(|e| ScraperError::InvalidInput {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        self.fetch_product(&product_url, opts).await
    }

    /// Fetches an already-validated product URL under the retry policy.
    ///
    /// # Errors
    ///
    /// Same classification as [`Self::fetch`], minus the URL-shape check.
    pub async fn fetch_product(
        &self,
        url: &ProductUrl,
        opts: &FetchOptions,
    ) -> Result<FetchOutcome, ScraperError> {
        let referer = url.origin();

        run_with_retries(opts.max_retries, opts.base_delay, || {
            // Identity and cache buster are re-selected per attempt so a
            // retried request does not replay the previous fingerprint.
            let identity = opts.identity.unwrap_or_else(|| self.identities.next_identity());
            let request_url = self.cache_busted(url);
            let referer = referer.clone();
            async move {
                tracing::debug!(
                    url = %request_url,
                    user_agent = identity.user_agent,
                    "fetching product page"
                );
                let response = self
                    .client
                    .get(request_url)
                    .header(USER_AGENT, identity.user_agent)
                    .header(ACCEPT, identity.accept)
                    .header(ACCEPT_LANGUAGE, identity.accept_language)
                    .header("Sec-Ch-Ua-Platform", identity.platform)
                    .header(REFERER, referer)
                    .header(CACHE_CONTROL, "no-cache")
                    .send()
                    .await
                    .map_err(|e| classify_transport(url.as_str(), &e))?;

                classify_response(url.as_str(), response).await
            }
        })
        .await
    }

    /// Storefront rules this client validates URLs against.
    #[must_use]
    pub fn rules(&self) -> &StorefrontRules {
        &self.rules
    }

    /// Best-effort GET of the store root to pick up session cookies before
    /// the product-page request. Callers are expected to swallow failures;
    /// a missing session only degrades camouflage.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] when the root request fails.
    pub async fn warm_session(&self, store_root: &str) -> Result<(), ScraperError> {
        let identity = self.identities.next_identity();
        self.client
            .get(store_root)
            .header(USER_AGENT, identity.user_agent)
            .header(ACCEPT, identity.accept)
            .header(ACCEPT_LANGUAGE, identity.accept_language)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Appends a `_ts` cache-busting parameter from a process-local
    /// monotonic counter (wall-clock values would make request URLs
    /// nondeterministic under test).
    fn cache_busted(&self, url: &ProductUrl) -> reqwest::Url {
        let counter = self.cache_buster.fetch_add(1, Ordering::Relaxed);
        let mut request_url = url.url().clone();
        request_url
            .query_pairs_mut()
            .append_pair("_ts", &counter.to_string());
        request_url
    }
}

/// Maps a network-level `reqwest` error to a typed classification:
/// timeouts retry as [`ScraperError::Timeout`], unresolvable hosts fail as
/// [`ScraperError::NotFound`], everything else is a transient
/// [`ScraperError::ServiceUnavailable`].
fn classify_transport(url: &str, err: &reqwest::Error) -> ScraperError {
    if err.is_timeout() {
        return ScraperError::Timeout {
            url: url.to_owned(),
            attempts: 0,
        };
    }
    if error_chain_mentions_dns(err) {
        return ScraperError::NotFound {
            url: url.to_owned(),
        };
    }
    let reason = if err.is_connect() {
        "connection refused or unreachable".to_owned()
    } else {
        format!("network error: {err}")
    };
    ScraperError::ServiceUnavailable {
        url: url.to_owned(),
        reason,
    }
}

/// Walks the error source chain looking for resolver failures. `reqwest`
/// does not expose DNS errors as a variant, so this matches the message
/// text of the hyper/getaddrinfo layers.
fn error_chain_mentions_dns(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = source {
        let text = current.to_string().to_ascii_lowercase();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return true;
        }
        source = current.source();
    }
    false
}

/// Classifies an HTTP response into a [`FetchOutcome`] or a typed error.
async fn classify_response(url: &str, response: Response) -> Result<FetchOutcome, ScraperError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(ScraperError::NotFound {
            url: url.to_owned(),
        });
    }
    if status == StatusCode::BAD_REQUEST {
        return Err(ScraperError::InvalidInput {
            url: url.to_owned(),
            reason: "storefront rejected the request (HTTP 400)".to_owned(),
        });
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return Err(ScraperError::RateLimited {
            url: url.to_owned(),
            retry_after_secs,
        });
    }
    if status == StatusCode::FORBIDDEN {
        return Err(ScraperError::Forbidden {
            url: url.to_owned(),
        });
    }
    if !status.is_success() {
        return Err(ScraperError::ServiceUnavailable {
            url: url.to_owned(),
            reason: format!("HTTP {}", status.as_u16()),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    if !is_html_content_type(&content_type) {
        return Err(ScraperError::InvalidInput {
            url: url.to_owned(),
            reason: format!("expected an HTML page, got content-type \"{content_type}\""),
        });
    }

    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_owned(), v.to_owned()))
        })
        .collect();
    let final_url = response.url().to_string();
    let status_code = status.as_u16();
    let body = response.text().await?;

    Ok(FetchOutcome {
        body,
        status: status_code,
        headers,
        final_url,
    })
}

/// Accepts `text/html` and `application/xhtml+xml`, with or without a
/// charset parameter. An absent content-type is treated as HTML — some
/// storefront CDNs omit it on cached responses.
fn is_html_content_type(content_type: &str) -> bool {
    if content_type.is_empty() {
        return true;
    }
    let lowered = content_type.to_ascii_lowercase();
    lowered.contains("text/html") || lowered.contains("application/xhtml")
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
