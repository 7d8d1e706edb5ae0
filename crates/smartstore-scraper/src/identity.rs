//! Rotating browser client identities.
//!
//! Each identity is a user-agent string plus the header set a real browser
//! with that user-agent would send. The pool is fixed and immutable; a
//! single atomic cursor rotates through it round-robin so consecutive
//! fetches present different fingerprints. This is camouflage, not a
//! correctness requirement — but an identity must be applied whole (mixing
//! a Chrome UA with Firefox accept headers is itself a bot signal).

use std::sync::atomic::{AtomicUsize, Ordering};

/// A browser fingerprint: user-agent plus matching request headers.
#[derive(Debug, Clone, Copy)]
pub struct ClientIdentity {
    pub user_agent: &'static str,
    pub accept: &'static str,
    pub accept_language: &'static str,
    /// `Sec-Ch-Ua-Platform` client hint, quoted as browsers send it.
    pub platform: &'static str,
}

/// Fixed pool of realistic desktop browser profiles.
static IDENTITY_POOL: [ClientIdentity; 5] = [
    ClientIdentity {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        accept_language: "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7",
        platform: "\"Windows\"",
    },
    ClientIdentity {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        accept_language: "ko-KR,ko;q=0.9,en-US;q=0.8",
        platform: "\"macOS\"",
    },
    ClientIdentity {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        accept_language: "ko-KR,ko;q=0.9,en;q=0.8",
        platform: "\"Linux\"",
    },
    ClientIdentity {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        accept_language: "ko-KR,ko;q=0.8,en-US;q=0.5,en;q=0.3",
        platform: "\"Windows\"",
    },
    ClientIdentity {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        accept_language: "ko-KR,ko;q=0.9",
        platform: "\"macOS\"",
    },
];

/// Round-robin cursor over [`IDENTITY_POOL`].
///
/// The cursor is the only mutable state the fetcher shares across calls;
/// `Relaxed` ordering suffices because only rotation fairness matters.
#[derive(Debug, Default)]
pub struct IdentityPool {
    cursor: AtomicUsize,
}

impl IdentityPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next identity in rotation.
    pub fn next_identity(&self) -> &'static ClientIdentity {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed);
        &IDENTITY_POOL[idx % IDENTITY_POOL.len()]
    }

    /// Number of identities in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        IDENTITY_POOL.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}
