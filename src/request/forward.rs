//! Header allow-list for the upstream fetch.

use axum::http::HeaderMap;

/// The only inbound headers ever sent upstream.
pub const FORWARDED_HEADERS: [&str; 5] = ["cookie", "dnt", "referer", "user-agent", "x-forwarded-for"];

/// Copy the allow-listed headers (all of their values) into a fresh map.
pub fn pick_forwarded(headers: &HeaderMap) -> HeaderMap {
    let mut picked = HeaderMap::new();
    for name in FORWARDED_HEADERS {
        for value in headers.get_all(name) {
            picked.append(name, value.clone());
        }
    }
    picked
}
