// src/checker/http.rs
// =============================================================================
// This module asks remote servers for the headers of a URL.
//
// Key functionality:
// - Makes HTTP HEAD requests (lightweight, no body download), or GET when
//   configured to
// - Never follows redirects itself: the redirect chain walker does that, so
//   we can see the 3xx status and its Location header
// - Turns every transport failure (DNS, refused connection, timeout, TLS)
//   into a "no status" result instead of an error
// - Throttles: sleeps before every request except the very first one,
//   including the GET retry after a refused HEAD
//
// Everything here is strictly sequential. One request is in flight at a time.
// =============================================================================

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::throttle::Throttle;
use crate::config::CrawlerConfig;
use crate::error::{CrawlError, CrawlResult};

/// Which HTTP method is used for header checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Head,
    Get,
}

impl FromStr for RequestMethod {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "head" => Ok(RequestMethod::Head),
            "get" => Ok(RequestMethod::Get),
            other => Err(CrawlError::Config(format!(
                "unknown http_request_method '{}' (expected 'head' or 'get')",
                other
            ))),
        }
    }
}

// The part of a response we care about
//
// status: None means the request never got an answer
// location: the Location header, already made absolute
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderResult {
    pub status: Option<u16>,
    pub location: Option<String>,
}

impl HeaderResult {
    /// Result for a request that failed at the transport level
    pub fn failed() -> Self {
        Self::default()
    }
}

/// Display form of an optional status ("404", or "error" for no response)
pub fn status_label(status: Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "error".to_string(),
    }
}

/// Anything that can fetch headers for a URL
///
/// The redirect chain walker only needs this, which keeps it testable
/// without a network.
#[async_trait]
pub trait HeaderFetch: Send {
    async fn get_headers(&mut self, url: &str) -> HeaderResult;
}

/// Header resolver backed by reqwest
pub struct HeaderResolver {
    client: Client,
    method: RequestMethod,
    throttle: Throttle,
}

impl HeaderResolver {
    /// Build a resolver from config, using `method` for every check
    pub fn new(config: &CrawlerConfig, method: RequestMethod) -> CrawlResult<Self> {
        // One client for the whole run (connection pooling). Redirects are
        // handled by us, not by reqwest.
        let client = Client::builder()
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self::with_client(client, method, config.request_delay()))
    }

    pub fn with_client(client: Client, method: RequestMethod, delay: Duration) -> Self {
        Self {
            client,
            method,
            throttle: Throttle::new(delay),
        }
    }

    /// Number of requests sent so far
    #[cfg(test)]
    pub fn requests(&self) -> usize {
        self.throttle.calls()
    }

    // Every request goes through here, so every one is throttled and counted
    async fn send(
        &mut self,
        url: &str,
        method: RequestMethod,
    ) -> Result<Response, reqwest::Error> {
        self.throttle.wait().await;
        match method {
            RequestMethod::Head => self.client.head(url).send().await,
            RequestMethod::Get => self.client.get(url).send().await,
        }
    }
}

#[async_trait]
impl HeaderFetch for HeaderResolver {
    async fn get_headers(&mut self, url: &str) -> HeaderResult {
        let mut response = match self.send(url, self.method).await {
            Ok(response) => response,
            Err(e) => {
                debug!(url, reason = describe_error(&e), "header request failed");
                return HeaderResult::failed();
            }
        };

        // Some servers refuse HEAD outright; ask again with GET before
        // calling the link broken
        if self.method == RequestMethod::Head
            && matches!(
                response.status(),
                StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
            )
        {
            if let Ok(retry) = self.send(url, RequestMethod::Get).await {
                response = retry;
            }
        }

        analyze_response(url, &response)
    }
}

// Pulls the status code and the (absolute) Location header out of a response
fn analyze_response(url: &str, response: &Response) -> HeaderResult {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| resolve_location(url, v));

    HeaderResult {
        status: Some(response.status().as_u16()),
        location,
    }
}

/// Resolve a Location header against the URL that was requested
///
/// Uses RFC 3986 reference resolution, so "/new", "new", "../new" and
/// "//other.host/new" all come out right. If the request URL can't be
/// parsed the header is returned untouched.
pub fn resolve_location(request_url: &str, location: &str) -> String {
    match Url::parse(request_url) {
        Ok(base) => base
            .join(location)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| location.to_string()),
        Err(_) => location.to_string(),
    }
}

// Short description of a transport error, for the debug log
fn describe_error(error: &reqwest::Error) -> &'static str {
    let error_string = error.to_string().to_lowercase();

    if error.is_timeout() {
        "request timed out"
    } else if error.is_connect() {
        // Connection errors often mean DNS issues or host unreachable
        if error_string.contains("dns") {
            "could not resolve hostname"
        } else {
            "connection failed"
        }
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        "SSL certificate error"
    } else if error.is_builder() {
        "invalid URL"
    } else {
        "request error"
    }
}
