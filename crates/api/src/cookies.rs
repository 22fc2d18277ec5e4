//! The `session_id` cookie: the only place a session token is read from.

use axum::http::{HeaderMap, HeaderValue, header};

use crate::app::services::CookieSettings;

pub const SESSION_COOKIE: &str = "session_id";

/// Token from the `session_id` cookie, if present and non-empty.
///
/// Every `Cookie` header is scanned; the first matching pair wins.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a freshly issued token.
pub fn issue(token: &str, settings: CookieSettings) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        settings.max_age.as_secs()
    );
    if settings.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn expire(settings: CookieSettings) -> HeaderValue {
    if settings.secure {
        HeaderValue::from_static("session_id=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0; Secure")
    } else {
        HeaderValue::from_static("session_id=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0")
    }
}
