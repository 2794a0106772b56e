//! Response header handling.
//!
//! # Responsibilities
//! - Merge compression overrides over upstream headers
//! - Rewrite Content-Security-Policy so the proxy's own origin is allowed
//! - Flatten multi-valued headers into one string per name for the adapters

pub mod csp;

use std::collections::BTreeMap;

use axum::http::HeaderMap;

pub use csp::patch_csp;

/// Flat header mapping handed to the host adapters. Names are lowercase.
pub type FlatHeaders = BTreeMap<String, String>;

/// Overlay `overrides` on `base`: every name present in `overrides` replaces
/// all of its values in `base`.
pub fn merge(mut base: HeaderMap, overrides: &HeaderMap) -> HeaderMap {
    for name in overrides.keys() {
        base.remove(name);
        for value in overrides.get_all(name) {
            base.append(name.clone(), value.clone());
        }
    }
    base
}

/// Patch CSP values for `host` and flatten to one value per header name.
///
/// Repeated values are joined with `", "`.
pub fn patch_headers(headers: &HeaderMap, host: &str) -> FlatHeaders {
    let mut flat = FlatHeaders::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        let value = if name.as_str().eq_ignore_ascii_case(csp::CONTENT_SECURITY_POLICY) {
            patch_csp(&joined, host)
        } else {
            joined
        };
        flat.insert(name.as_str().to_string(), value);
    }
    flat
}
