//! Request descriptors and response snapshots.
//!
//! A [`Request`] is the normalized view of an outbound request that the
//! manager routes on: method, URL, and the `Accept` header. A
//! [`ResponseSnapshot`] is the stored form of a response: status, headers,
//! and body bytes, detached from any live connection so it can be cached
//! and replayed.

use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};

/// Status and body used for the synthetic offline page served when an HTML
/// navigation has neither network nor cache.
const OFFLINE_STATUS: u16 = 503;
const OFFLINE_BODY: &[u8] = b"Offline";

/// Normalized descriptor of an outbound request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub accept: Option<String>,
}

impl Request {
    /// Create a GET request for the given URL.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            accept: None,
        }
    }

    /// Set the `Accept` header used for routing and for the network fetch.
    pub fn with_accept(mut self, accept: &str) -> Self {
        self.accept = Some(accept.to_string());
        self
    }

    /// Cache key for this request. Fragments never reach the server, so they
    /// are stripped before the URL is used as a key.
    pub fn key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.to_string()
    }
}

/// A stored response: status, headers, and body bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ResponseSnapshot {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The synthetic response served for offline HTML navigations.
    pub fn offline() -> Self {
        Self {
            status: OFFLINE_STATUS,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: OFFLINE_BODY.to_vec(),
        }
    }

    /// Body interpreted as UTF-8, lossy.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_strips_fragment() {
        let url = Url::parse("https://example.com/page.html#section").unwrap();
        let request = Request::get(url);
        assert_eq!(request.key(), "https://example.com/page.html");
    }

    #[test]
    fn test_key_keeps_query() {
        let url = Url::parse("https://example.com/api?city=Cairo").unwrap();
        let request = Request::get(url);
        assert_eq!(request.key(), "https://example.com/api?city=Cairo");
    }

    #[test]
    fn test_offline_snapshot() {
        let offline = ResponseSnapshot::offline();
        assert_eq!(offline.status, 503);
        assert_eq!(offline.body_text(), "Offline");
        assert!(!offline.is_success());
    }

    #[test]
    fn test_is_success_bounds() {
        let mut snapshot = ResponseSnapshot::offline();
        snapshot.status = 200;
        assert!(snapshot.is_success());
        snapshot.status = 299;
        assert!(snapshot.is_success());
        snapshot.status = 300;
        assert!(!snapshot.is_success());
        snapshot.status = 404;
        assert!(!snapshot.is_success());
    }
}
