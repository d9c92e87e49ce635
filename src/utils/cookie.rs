//! The `jwt` session cookie.

use axum::http::{HeaderMap, header::COOKIE};

pub const COOKIE_NAME: &str = "jwt";

/// Value written on logout in place of a token.
pub const LOGGED_OUT: &str = "loggedout";

/// Builds a `Set-Cookie` value. `Secure` is added when `secure` is true.
pub fn session_cookie(value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie =
        format!("{COOKIE_NAME}={value}; Max-Age={max_age_secs}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Reads the `jwt` cookie from the request headers.
pub fn read_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            let mut parts = cookie.trim().splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(COOKIE_NAME), Some(value)) if !value.is_empty() => Some(value.to_string()),
                _ => None,
            }
        })
}
