//! Acquisition-and-extraction pipeline for storefront product pages.
//!
//! The pipeline is three stages: a [`client::PageClient`] that retrieves a
//! product page under retry/backoff and identity-rotation policies, an
//! [`extract`] stage that recovers typed fields from heterogeneous HTML via
//! cascading selector strategies, and a [`scrape::Scraper`] that composes
//! the two for single URLs and sequential batches.

pub mod blocked;
pub mod client;
pub mod error;
pub mod extract;
pub mod identity;
pub mod render;
mod retry;
pub mod scrape;

pub use client::{FetchOptions, FetchOutcome, PageClient};
pub use error::{ErrorKind, ScraperError};
pub use extract::{extract_product, validate_record, ExtractOptions, StructuralWarning};
pub use render::{RenderCapture, RenderedCapture};
pub use scrape::{BatchOutcome, FailedScrape, ScrapeOptions, Scraper};
