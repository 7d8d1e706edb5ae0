//! Opaque render-and-capture fallback for script-rendered pages.
//!
//! Some listings ship an empty HTML shell and hydrate everything client
//! side. An external capability — a driven browser that waits for the
//! product and benefits API responses and hands back their parsed bodies
//! — covers those. This module only defines the seam; the browser side is
//! deliberately out of scope.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ScraperError;

/// Parsed bodies of the two background API responses a rendered product
/// page settles on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedCapture {
    /// The product detail payload.
    pub product_json: Value,
    /// The purchase-benefits payload (coupons, point accrual).
    pub benefits_json: Value,
}

/// One-method capability: drive a browser at `url`, wait for the two
/// background responses, return their parsed bodies.
///
/// Implementations live outside this crate. The boxed-future signature
/// keeps the trait object-safe so the orchestrator can hold a
/// `Box<dyn RenderCapture>`.
pub trait RenderCapture: Send + Sync {
    fn render_and_capture<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<RenderedCapture, ScraperError>> + Send + 'a>>;
}
