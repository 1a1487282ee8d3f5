//! Access and refresh token cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use remit_auth::jwt::TokenPair;
use remit_core::config::auth::AuthConfig;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Set both token cookies with lifetimes matching the tokens.
pub fn set_tokens(jar: CookieJar, tokens: &TokenPair, config: &AuthConfig) -> CookieJar {
    let access_ttl = time::Duration::minutes(config.jwt_access_ttl_minutes as i64);
    let refresh_ttl = time::Duration::hours(config.jwt_refresh_ttl_hours as i64);

    jar.add(build(ACCESS_COOKIE, tokens.access_token.clone(), access_ttl, config))
        .add(build(REFRESH_COOKIE, tokens.refresh_token.clone(), refresh_ttl, config))
}

/// Overwrite both cookies with an already-expired value.
pub fn clear_tokens(jar: CookieJar, config: &AuthConfig) -> CookieJar {
    let expired = time::Duration::seconds(-1);
    jar.add(build(ACCESS_COOKIE, String::new(), expired, config))
        .add(build(REFRESH_COOKIE, String::new(), expired, config))
}

pub fn refresh_token(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

fn build(
    name: &'static str,
    value: String,
    max_age: time::Duration,
    config: &AuthConfig,
) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Strict)
        .max_age(max_age)
        .build();
    if let Some(domain) = &config.cookie_domain {
        cookie.set_domain(domain.clone());
    }
    cookie
}
