//! Network fetching behind a trait.
//!
//! This module provides:
//! - `Fetch`: the network seam the cache manager fetches through
//! - `HttpFetcher`: the reqwest-backed implementation used in production
//! - `FetchError`: failure taxonomy for a single fetch attempt
//!
//! Strategies make exactly one fetch attempt per request; there is no retry
//! or backoff. Recovery happens at the strategy level via cache fallback.

pub mod error;
pub mod http;

use std::future::Future;

use crate::models::{Request, ResponseSnapshot};

pub use error::FetchError;
pub use http::HttpFetcher;

/// Network access used by the cache manager.
///
/// Futures are `Send` so revalidation fetches can be detached onto the
/// runtime without blocking the response path.
pub trait Fetch: Send + Sync {
    fn fetch(
        &self,
        request: &Request,
    ) -> impl Future<Output = Result<ResponseSnapshot, FetchError>> + Send;
}
