//! Scrape orchestration: compose the fetcher and extractor for one URL,
//! and drive strictly sequential batches with adaptive politeness.

use std::time::Duration;

use serde::Serialize;
use smartstore_core::{AppConfig, ProductRecord, ProductUrl, StorefrontRules};

use crate::blocked;
use crate::client::{FetchOptions, PageClient};
use crate::error::{ErrorKind, ScraperError};
use crate::extract::{self, ExtractOptions};
use crate::render::{RenderCapture, RenderedCapture};

/// Escalation seed for batches configured with a zero inter-request
/// delay; doubling zero would never escalate.
const MIN_ESCALATED_DELAY: Duration = Duration::from_millis(500);

/// Combined policy for a scrape run.
#[derive(Debug, Clone, Copy)]
pub struct ScrapeOptions {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_retry_delay: Duration,
    pub max_images: usize,
    pub max_description_len: usize,
    pub extract_specifications: bool,
    /// GET the store root before the product page (best effort).
    pub establish_session: bool,
    /// Delay between batch items. Doubles for the rest of a batch after a
    /// rate-limit failure, and never resets within that batch.
    pub batch_delay: Duration,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl ScrapeOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.request_timeout_secs,
            max_retries: config.max_retries,
            base_retry_delay: Duration::from_millis(config.base_retry_delay_ms),
            max_images: config.max_images,
            max_description_len: config.max_description_len,
            extract_specifications: config.extract_specifications,
            establish_session: config.establish_session,
            batch_delay: Duration::from_millis(config.batch_delay_ms),
        }
    }

    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            max_retries: self.max_retries,
            base_delay: self.base_retry_delay,
            identity: None,
        }
    }

    fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            max_images: self.max_images,
            max_description_len: self.max_description_len,
            extract_specifications: self.extract_specifications,
        }
    }
}

/// One failed batch item.
#[derive(Debug, Serialize)]
pub struct FailedScrape {
    pub url: String,
    pub kind: ErrorKind,
    pub reason: String,
}

/// Partition of a batch run. Accumulated across the whole batch and
/// returned whole — there is no partial delivery.
#[derive(Debug, Default, Serialize)]
pub struct BatchOutcome {
    pub succeeded: Vec<ProductRecord>,
    pub failed: Vec<FailedScrape>,
}

/// Composes [`PageClient`] and [`extract`] for single URLs and batches.
pub struct Scraper {
    client: PageClient,
    opts: ScrapeOptions,
    render: Option<Box<dyn RenderCapture>>,
}

impl Scraper {
    /// Builds a scraper for the given storefront.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(rules: StorefrontRules, opts: ScrapeOptions) -> Result<Self, ScraperError> {
        let client = PageClient::new(rules, opts.timeout_secs)?;
        Ok(Self {
            client,
            opts,
            render: None,
        })
    }

    /// Installs a render-and-capture fallback, consulted only when HTML
    /// extraction fails for want of a mandatory field.
    #[must_use]
    pub fn with_render_fallback(mut self, render: Box<dyn RenderCapture>) -> Self {
        self.render = Some(render);
        self
    }

    /// Scrapes one product page into a [`ProductRecord`].
    ///
    /// Fetch-level retries have already run when an error surfaces here;
    /// this layer never re-retries, it only classifies and reports.
    ///
    /// # Errors
    ///
    /// Any [`ScraperError`] from URL validation, fetching, or extraction,
    /// with the fetch retry budget already exhausted.
    pub async fn scrape_one(&self, url: &str) -> Result<ProductRecord, ScraperError> {
        let product_url = ProductUrl::parse(url, self.client.rules()).map_err(|e| {
            ScraperError::InvalidInput {
                url: url.to_owned(),
                reason: e.to_string(),
            }
        })?;

        if self.opts.establish_session {
            // Best effort: a failed warm-up only degrades camouflage.
            if let Err(err) = self.client.warm_session(&product_url.store_root()).await {
                tracing::debug!(url, error = %err, "session pre-warm failed; continuing");
            }
        }

        let outcome = self
            .client
            .fetch_product(&product_url, &self.opts.fetch_options())
            .await?;

        if blocked::looks_blocked(&outcome.body) {
            // Proceed anyway: the page may still carry extractable content,
            // and a false positive here must not discard a real listing.
            tracing::warn!(
                url,
                body_bytes = outcome.body.len(),
                "fetched body looks like a blocked/challenge page"
            );
        }

        let record = match extract::extract_product(
            &outcome.body,
            product_url.as_str(),
            &self.opts.extract_options(),
        ) {
            Ok(record) => record,
            Err(err @ ScraperError::FieldMissing { .. }) => {
                let Some(render) = &self.render else {
                    return Err(err);
                };
                tracing::warn!(url, error = %err, "HTML extraction failed; trying render fallback");
                let capture = render.render_and_capture(product_url.as_str()).await?;
                record_from_capture(&product_url, &capture, &self.opts.extract_options())?
            }
            Err(err) => return Err(err),
        };

        let warnings = extract::validate_record(&record)?;
        for warning in warnings {
            tracing::warn!(url, %warning, "structural gap in extracted record");
        }

        Ok(record)
    }

    /// Scrapes a batch of URLs strictly sequentially.
    ///
    /// Sequential-by-design: parallel requests against one storefront are
    /// the fastest way to get the whole batch rate limited. Between items
    /// the configured delay is slept; a rate-limit failure doubles it for
    /// every subsequent item in the batch. Failures are recorded, never
    /// fatal to the batch.
    pub async fn scrape_many(&self, urls: &[String]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let mut delay = self.opts.batch_delay;

        for (idx, url) in urls.iter().enumerate() {
            if idx > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            tracing::info!(
                item = idx + 1,
                total = urls.len(),
                url = %url,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "scraping batch item"
            );

            match self.scrape_one(url).await {
                Ok(record) => outcome.succeeded.push(record),
                Err(err) => {
                    if err.kind() == ErrorKind::RateLimited {
                        delay = escalate(delay);
                        tracing::warn!(
                            url = %url,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            "rate limited — escalating inter-request delay for the rest of the batch"
                        );
                    }
                    outcome.failed.push(FailedScrape {
                        url: url.clone(),
                        kind: err.kind(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "batch scrape finished"
        );
        outcome
    }
}

/// Doubles the inter-request delay, seeding from a floor when the
/// configured delay was zero so escalation is always monotonic.
fn escalate(delay: Duration) -> Duration {
    if delay.is_zero() {
        MIN_ESCALATED_DELAY
    } else {
        delay.saturating_mul(2)
    }
}

/// Builds a record from a rendered capture, applying the same
/// plausibility bounds as the HTML path.
fn record_from_capture(
    url: &ProductUrl,
    capture: &RenderedCapture,
    opts: &ExtractOptions,
) -> Result<ProductRecord, ScraperError> {
    let product = &capture.product_json;

    let title = ["name", "title", "productName"]
        .iter()
        .find_map(|key| product.get(key).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|t| (4..200).contains(&t.chars().count()))
        .ok_or(ScraperError::FieldMissing {
            field: "title",
            url: url.as_str().to_owned(),
        })?;

    let original = ["price", "salePrice", "originalPrice"]
        .iter()
        .find_map(|key| product.get(key).and_then(serde_json::Value::as_f64));
    let discounted = ["discountedPrice", "discountedSalePrice"]
        .iter()
        .find_map(|key| product.get(key).and_then(serde_json::Value::as_f64))
        .filter(|d| original.is_none_or(|o| *d < o));

    let price = original.map(|o| smartstore_core::PriceInfo {
        original: Some(o),
        discounted,
        currency: "KRW".to_owned(),
        display: crate::extract::format_krw(discounted.unwrap_or(o)),
    });

    let images: Vec<String> = product
        .get("images")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.as_str().map(str::to_owned).or_else(|| {
                        ["url", "src"]
                            .iter()
                            .find_map(|k| item.get(k).and_then(|v| v.as_str()))
                            .map(str::to_owned)
                    })
                })
                .take(opts.max_images)
                .collect()
        })
        .unwrap_or_default();

    let availability = product
        .get("stockQuantity")
        .and_then(serde_json::Value::as_i64)
        .is_none_or(|q| q > 0);

    Ok(ProductRecord {
        title: title.to_owned(),
        price,
        images,
        description: None,
        brand: product
            .get("brand")
            .and_then(|v| v.as_str())
            .map(str::to_owned),
        category_path: Vec::new(),
        rating: None,
        shipping: None,
        seller: None,
        product_id: url.product_id().to_owned(),
        source_url: url.as_str().to_owned(),
        availability,
        specifications: std::collections::BTreeMap::new(),
        reviews: None,
    })
}
