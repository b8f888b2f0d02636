//! Offline resource cache manager for the Muslim Guide PWA.
//!
//! This library implements the service-worker caching layer that keeps the
//! app shell usable without a network connection. Every outbound GET request
//! is classified into a routing class and handled by a fixed strategy:
//!
//! - HTML navigations: network-first with a synthetic offline fallback
//! - API calls: network-first, falling back to the last cached response
//! - Static assets: cache-first with background revalidation
//! - Everything else: network-first
//!
//! Cached responses live in versioned generations (`static`, `dynamic`,
//! `runtime`). A deploy installs a new generation set atomically, supersedes
//! the old one on activation, and announces the new version to connected
//! clients over a broadcast channel.

pub mod config;
pub mod fetch;
pub mod manager;
pub mod models;
pub mod notify;
pub mod routing;
pub mod store;

pub use config::ManagerConfig;
pub use fetch::{Fetch, FetchError, HttpFetcher};
pub use manager::{CacheManager, FetchOutcome, InterceptError, LifecycleState};
pub use models::{Request, ResponseSnapshot};
pub use notify::UpdateNotice;
pub use routing::{GenerationName, RouteTable, RoutingClass, Strategy};
pub use store::{CacheEntry, CacheStore, DiskStore, MemoryStore};
