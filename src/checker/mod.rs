// src/checker/mod.rs
// =============================================================================
// This module contains the link-level building blocks of a crawl.
//
// Submodules:
// - pattern: delimited regexes from the config file
// - html: extracts link candidates from rendered markup
// - normalize: makes candidates absolute (or root-relative) and tidy
// - checkable: the result type of every "should we check this?" decision
// - http: fetches status and Location headers for one URL
// - redirect: follows 301/302 chains up to a depth bound
// - throttle: the fixed delay between requests, pages and batches
//
// Apart from the request throttle, none of these keep state between links.
// The caches and the decision order live in the crawl module.
// =============================================================================

mod checkable;
mod html;
mod http;
mod normalize;
mod pattern;
mod redirect;
mod throttle;

pub use checkable::CheckableValue;
pub use html::extract_html_links;
pub use http::{status_label, HeaderFetch, HeaderResolver, HeaderResult, RequestMethod};
pub use normalize::{expand_fragment, is_http_url, is_valid_url, normalize_url, prefix_host};
pub use pattern::DelimitedRegex;
pub use redirect::{follow_redirects, RedirectHop};
pub use throttle::Throttle;
