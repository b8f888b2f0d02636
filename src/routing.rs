//! Request routing: which strategy and generation handles a request.
//!
//! Routing policy is an explicit ordered table of (matcher, strategy,
//! generation) rows built from the manager configuration. The first
//! matching row wins; a catch-all handles everything the table misses.
//!
//! Row order mirrors the deployed worker: HTML navigations are checked
//! before API calls, so an HTML page served from an API host still gets
//! the offline fallback.

use crate::config::ManagerConfig;
use crate::models::Request;

/// Classification bucket a request falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingClass {
    HtmlNavigation,
    ApiCall,
    StaticAsset,
    Other,
}

/// Fixed caching policy applied to a routing class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Try the network, fall back to cache. `offline_fallback` controls
    /// whether a synthetic offline response is synthesized when neither
    /// is available.
    NetworkFirst { offline_fallback: bool },
    /// Serve from cache, revalidate in the background on a hit.
    CacheFirstRevalidate,
}

/// The three named generations of one deployed version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationName {
    Static,
    Dynamic,
    Runtime,
}

impl GenerationName {
    pub const ALL: [GenerationName; 3] = [
        GenerationName::Static,
        GenerationName::Dynamic,
        GenerationName::Runtime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationName::Static => "static",
            GenerationName::Dynamic => "dynamic",
            GenerationName::Runtime => "runtime",
        }
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    HtmlNavigation,
    ApiCall {
        hosts: Vec<String>,
        paths: Vec<String>,
    },
    StaticAsset {
        extensions: Vec<String>,
    },
    Any,
}

impl Matcher {
    fn matches(&self, request: &Request) -> bool {
        match self {
            Matcher::HtmlNavigation => {
                let accepts_html = request
                    .accept
                    .as_deref()
                    .is_some_and(|accept| accept.contains("text/html"));
                let path = request.url.path();
                accepts_html || path == "/" || path.ends_with(".html")
            }
            Matcher::ApiCall { hosts, paths } => {
                let host = request.url.host_str().unwrap_or("");
                hosts.iter().any(|marker| host.contains(marker.as_str()))
                    || paths
                        .iter()
                        .any(|marker| request.url.path().contains(marker.as_str()))
            }
            Matcher::StaticAsset { extensions } => {
                let path = request.url.path();
                match path.rsplit_once('.') {
                    Some((_, ext)) => extensions.iter().any(|e| e == ext),
                    None => false,
                }
            }
            Matcher::Any => true,
        }
    }
}

/// One row of routing policy.
#[derive(Debug, Clone)]
pub struct Route {
    pub class: RoutingClass,
    pub strategy: Strategy,
    pub generation: GenerationName,
    matcher: Matcher,
}

impl Route {
    pub fn matches(&self, request: &Request) -> bool {
        self.matcher.matches(request)
    }
}

/// Ordered routing table; first match wins.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    fallback: Route,
}

impl RouteTable {
    pub fn new(config: &ManagerConfig) -> Self {
        let routes = vec![
            Route {
                class: RoutingClass::HtmlNavigation,
                strategy: Strategy::NetworkFirst {
                    offline_fallback: true,
                },
                generation: GenerationName::Runtime,
                matcher: Matcher::HtmlNavigation,
            },
            Route {
                class: RoutingClass::ApiCall,
                strategy: Strategy::NetworkFirst {
                    offline_fallback: false,
                },
                generation: GenerationName::Dynamic,
                matcher: Matcher::ApiCall {
                    hosts: config.api_hosts.clone(),
                    paths: config.api_paths.clone(),
                },
            },
            Route {
                class: RoutingClass::StaticAsset,
                strategy: Strategy::CacheFirstRevalidate,
                generation: GenerationName::Static,
                matcher: Matcher::StaticAsset {
                    extensions: config.static_extensions.clone(),
                },
            },
        ];
        let fallback = Route {
            class: RoutingClass::Other,
            strategy: Strategy::NetworkFirst {
                offline_fallback: false,
            },
            generation: GenerationName::Runtime,
            matcher: Matcher::Any,
        };
        Self { routes, fallback }
    }

    pub fn classify(&self, request: &Request) -> &Route {
        self.routes
            .iter()
            .find(|route| route.matches(request))
            .unwrap_or(&self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    fn table() -> RouteTable {
        RouteTable::new(&ManagerConfig::new("v1"))
    }

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[test]
    fn test_html_by_accept_header() {
        let request = get("http://localhost:5173/prayer-times").with_accept("text/html,*/*");
        assert_eq!(table().classify(&request).class, RoutingClass::HtmlNavigation);
    }

    #[test]
    fn test_html_by_root_path() {
        let request = get("http://localhost:5173/");
        assert_eq!(table().classify(&request).class, RoutingClass::HtmlNavigation);
    }

    #[test]
    fn test_html_by_extension() {
        let request = get("http://localhost:5173/index.html");
        assert_eq!(table().classify(&request).class, RoutingClass::HtmlNavigation);
    }

    #[test]
    fn test_api_by_hostname() {
        let request = get("https://abc.supabase.co/rest/v1/verses");
        assert_eq!(table().classify(&request).class, RoutingClass::ApiCall);
    }

    #[test]
    fn test_api_by_path_marker() {
        let request = get("http://localhost:5173/functions/adhan-proxy?city=Cairo");
        assert_eq!(table().classify(&request).class, RoutingClass::ApiCall);
    }

    #[test]
    fn test_static_by_extension() {
        let table = table();
        for url in [
            "http://localhost:5173/assets/index.css",
            "http://localhost:5173/assets/app.js",
            "http://localhost:5173/icon.svg",
            "http://localhost:5173/fonts/amiri.woff2",
        ] {
            assert_eq!(table.classify(&get(url)).class, RoutingClass::StaticAsset);
        }
    }

    #[test]
    fn test_other_fallback() {
        let request = get("http://localhost:5173/robots.txt");
        let table = table();
        let route = table.classify(&request);
        assert_eq!(route.class, RoutingClass::Other);
        assert_eq!(route.generation, GenerationName::Runtime);
    }

    #[test]
    fn test_html_wins_over_api_host() {
        // Navigation to a page hosted on an API-marked host is still a
        // navigation, so it keeps the offline fallback.
        let request = get("https://abc.supabase.co/app.html").with_accept("text/html");
        let table = table();
        let route = table.classify(&request);
        assert_eq!(route.class, RoutingClass::HtmlNavigation);
        assert_eq!(
            route.strategy,
            Strategy::NetworkFirst {
                offline_fallback: true
            }
        );
    }
}
