// src/checker/redirect.rs
// =============================================================================
// Follows 301/302 responses to find out where a link really ends up.
//
// The walk stops at the first non-redirect response, when a hop has no
// Location header, when a location repeats (loop), or when the configured
// depth is used up. Whatever happens, the status reported for the link stays
// the status of the first response; only `location` is improved.
// =============================================================================

use std::collections::HashSet;

use super::http::{status_label, HeaderFetch, HeaderResult};

/// Statuses that trigger (and continue) a redirect walk
pub fn is_redirect(status: Option<u16>) -> bool {
    matches!(status, Some(301 | 302))
}

/// One request made while walking a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectHop {
    pub url: String,
    pub status: Option<u16>,
    pub location: Option<String>,
}

impl RedirectHop {
    /// Log line for this hop
    pub fn describe(&self) -> String {
        match (&self.location, is_redirect(self.status)) {
            (Some(location), true) => format!(
                "RECURSIVE CHECK: {} ({} => {})",
                self.url,
                status_label(self.status),
                location
            ),
            _ => format!("RECURSIVE CHECK: {} ({})", self.url, status_label(self.status)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectChain {
    /// Status and location to report for the original URL
    pub result: HeaderResult,
    pub hops: Vec<RedirectHop>,
    /// The walk stopped because a location was visited twice
    pub looped: bool,
}

/// Walk the redirect chain that starts with `first`, the response for `url`
pub async fn follow_redirects<F>(
    fetcher: &mut F,
    url: &str,
    first: HeaderResult,
    max_depth: usize,
) -> RedirectChain
where
    F: HeaderFetch + ?Sized,
{
    let mut chain = RedirectChain {
        result: first.clone(),
        hops: Vec::new(),
        looped: false,
    };

    if !is_redirect(first.status) || max_depth == 0 {
        return chain;
    }
    let Some(mut next) = first.location else {
        return chain;
    };

    let mut visited = HashSet::from([url.to_string()]);
    let mut depth = 0;

    while depth < max_depth {
        if !visited.insert(next.clone()) {
            chain.looped = true;
            break;
        }
        depth += 1;

        let headers = fetcher.get_headers(&next).await;
        chain.hops.push(RedirectHop {
            url: next.clone(),
            status: headers.status,
            location: headers.location.clone(),
        });

        if !is_redirect(headers.status) {
            // Found the real location of the document
            chain.result.location = Some(next);
            break;
        }

        match headers.location {
            Some(location) => {
                chain.result.location = Some(location.clone());
                next = location;
            }
            None => break,
        }
    }

    chain
}
