//! Application configuration shared by the scraper pipeline and the CLI.

/// Runtime configuration, loaded from environment variables by
/// [`crate::config::load_app_config`]. Every field has a default; the
/// scraper runs unconfigured.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Total per-attempt HTTP timeout in seconds.
    pub request_timeout_secs: u64,
    /// Additional fetch attempts after the first failure.
    pub max_retries: u32,
    /// Base delay for the retry schedule; attempt `n` waits
    /// `base × n` plus jitter.
    pub base_retry_delay_ms: u64,
    /// Cap on extracted gallery images per product.
    pub max_images: usize,
    /// Cap on description length in characters.
    pub max_description_len: usize,
    /// Delay between items in a batch scrape. Doubles for the remainder of
    /// a batch after a rate-limit failure.
    pub batch_delay_ms: u64,
    /// Whether to extract specification tables.
    pub extract_specifications: bool,
    /// Whether to GET the store root before the product page to pick up
    /// session cookies (best effort).
    pub establish_session: bool,
    /// Default log level for the CLI subscriber.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_retries: 3,
            base_retry_delay_ms: 1_000,
            max_images: 10,
            max_description_len: 2_000,
            batch_delay_ms: 2_000,
            extract_specifications: true,
            establish_session: false,
            log_level: "info".to_owned(),
        }
    }
}
