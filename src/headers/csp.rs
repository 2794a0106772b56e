//! Content-Security-Policy rewriting.

pub const CONTENT_SECURITY_POLICY: &str = "content-security-policy";

const BLOCK_ALL_MIXED_CONTENT: &str = "block-all-mixed-content";
const PATCHED_DIRECTIVES: [&str; 3] = ["img-src", "default-src", "connect-src"];

/// Allow `https://<host>` in `img-src`, `default-src` and `connect-src`, and
/// drop `block-all-mixed-content`.
///
/// Each token is rewritten at its first occurrence only.
pub fn patch_csp(policy: &str, host: &str) -> String {
    let mut patched = policy.replacen(BLOCK_ALL_MIXED_CONTENT, "", 1);
    for directive in PATCHED_DIRECTIVES {
        patched = patched.replacen(directive, &format!("{directive} https://{host}"), 1);
    }
    patched
}
