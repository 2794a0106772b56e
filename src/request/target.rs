//! Target URL extraction and normalization.
//!
//! # Steps
//! 1. `url` is required; without it the request is answered with
//!    [`IDENTITY_BODY`] and nothing is fetched.
//! 2. Any other query parameter is appended to `url`.
//! 3. If the result is JSON, it is decoded: a string replaces the URL, an
//!    array of fragments is rejoined with `&url=`.
//! 4. A middlebox-mangled `http://1.1.x.y/bmi/` prefix is collapsed back to
//!    `http://`.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::config::OptionStrategy;
use crate::request::options::QUERY_OPTION_KEYS;
use crate::request::QueryParams;

/// Body returned when no `url` parameter is present.
pub const IDENTITY_BODY: &str = "bandwidth-hero-proxy";

/// Separator used to rejoin multi-part URLs.
const FRAGMENT_SEPARATOR: &str = "&url=";

static MANGLED_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)http://1\.1\.\d\.\d/bmi/(https?://)?").expect("static regex is valid")
});

/// Result of URL resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlResolution {
    Missing,
    Target(String),
}

/// Extract and normalize the upstream image URL.
///
/// In [`OptionStrategy::Query`] mode the option keys (`jpeg`, `bw`, `l`) belong
/// to the proxy and are not appended to the target.
pub fn resolve_url(query: &QueryParams, strategy: OptionStrategy) -> UrlResolution {
    let raw = match query.get("url") {
        Some(value) => value.values().join(FRAGMENT_SEPARATOR),
        None => return UrlResolution::Missing,
    };
    if raw.is_empty() {
        return UrlResolution::Missing;
    }

    let extras: Vec<(&str, &str)> = query
        .iter()
        .filter(|(key, _)| *key != "url")
        .filter(|(key, _)| {
            strategy != OptionStrategy::Query || !QUERY_OPTION_KEYS.contains(key)
        })
        .flat_map(|(key, value)| value.values().into_iter().map(move |v| (key, v)))
        .collect();

    let assembled = append_query(&raw, &extras);
    let decoded = decode_json(assembled);

    UrlResolution::Target(MANGLED_PREFIX.replace(&decoded, "http://").into_owned())
}

fn append_query(raw: &str, extras: &[(&str, &str)]) -> String {
    if extras.is_empty() {
        return raw.to_string();
    }

    match Url::parse(raw) {
        Ok(mut url) => {
            url.query_pairs_mut().extend_pairs(extras.iter().copied());
            url.to_string()
        }
        Err(_) => {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(extras.iter().copied())
                .finish();
            let separator = if raw.contains('?') { '&' } else { '?' };
            format!("{raw}{separator}{encoded}")
        }
    }
}

fn decode_json(raw: String) -> String {
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(serde_json::Value::String(url)) => url,
        Ok(serde_json::Value::Array(parts)) => parts
            .into_iter()
            .map(|part| match part {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(FRAGMENT_SEPARATOR),
        _ => raw,
    }
}
