//! Caller identifier resolution.

/// Identifier used when neither a user id nor a client IP is known.
pub const UNKNOWN_IDENTIFIER: &str = "unknown";

/// Resolve the rate limit identifier for a request.
///
/// An authenticated user id wins. Otherwise the client IP is taken from proxy
/// headers in order: `CF-Connecting-IP`, the first `X-Forwarded-For` entry,
/// `X-Real-IP`. Falls back to `"unknown"`.
///
/// `header` looks up a header value by (lowercase) name.
pub fn resolve_identifier<'a>(
    user_id: Option<&str>,
    header: impl Fn(&str) -> Option<&'a str>,
) -> String {
    if let Some(uid) = user_id.map(str::trim).filter(|u| !u.is_empty()) {
        return format!("user:{}", uid);
    }

    let ip = header("cf-connecting-ip")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| {
            header("x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .or_else(|| header("x-real-ip").map(str::trim).filter(|v| !v.is_empty()));

    match ip {
        Some(ip) => format!("ip:{}", ip),
        None => UNKNOWN_IDENTIFIER.to_string(),
    }
}
