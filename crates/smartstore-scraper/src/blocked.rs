//! Blocked-content heuristic.
//!
//! A fetched body can be a 200 response and still be a bot challenge or an
//! interstitial rather than the product page. This check is advisory: the
//! orchestrator logs a suspected block and proceeds, letting extraction
//! under-populate fields rather than discarding a possibly-real page.

/// Bodies shorter than this are treated as suspect — real product listings
/// carry markup well past this size.
const MIN_PLAUSIBLE_BODY_BYTES: usize = 1_000;

/// Challenge/interstitial markers across the languages the storefront
/// serves. Matched case-insensitively against the whole body.
const BLOCKING_MARKERS: &[&str] = &[
    "captcha",
    "access denied",
    "unusual traffic",
    "verify you are human",
    "just a moment",
    "please enable cookies",
    "/cdn-cgi/challenge-platform/",
    "비정상적인 접근",
    "자동입력 방지",
    "접속이 일시적으로 제한",
    "차단되었습니다",
];

/// Returns `true` when the body looks like a challenge page rather than
/// real content: suspiciously short, or carrying a known blocking marker.
#[must_use]
pub fn looks_blocked(body: &str) -> bool {
    if body.len() < MIN_PLAUSIBLE_BODY_BYTES {
        return true;
    }
    contains_blocking_marker(body)
}

/// Marker scan alone, independent of the length heuristic.
#[must_use]
pub fn contains_blocking_marker(body: &str) -> bool {
    let lowered = body.to_lowercase();
    BLOCKING_MARKERS.iter().any(|m| lowered.contains(m))
}
