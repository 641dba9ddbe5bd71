//! Short-lived login cookies
//!
//! The direct flow keeps its code verifier in `<provider>_code_verifier`; the
//! relayed flow hands `state` and `code` to the bridge step in
//! `<provider>_auth_state` / `<provider>_auth_code`. All of them are
//! HTTP-only, `SameSite=Lax`, scoped to `/` and expire after the PKCE TTL.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use moodmix_domain::constants::{
    RELAY_CODE_COOKIE_SUFFIX, RELAY_STATE_COOKIE_SUFFIX, VERIFIER_COOKIE_SUFFIX,
};
use moodmix_domain::Provider;
use time::Duration;

/// Name of the cookie holding a direct-flow code verifier
pub fn verifier_cookie(provider: Provider) -> String {
    format!("{provider}{VERIFIER_COOKIE_SUFFIX}")
}

/// Name of the cookie relaying `state` to the bridge step
pub fn relay_state_cookie(provider: Provider) -> String {
    format!("{provider}{RELAY_STATE_COOKIE_SUFFIX}")
}

/// Name of the cookie relaying `code` to the bridge step
pub fn relay_code_cookie(provider: Provider) -> String {
    format!("{provider}{RELAY_CODE_COOKIE_SUFFIX}")
}

/// Cookie attributes shared by every cookie the auth routes set
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    pub max_age_secs: u64,
    /// Adds `Secure`; on when the public origin is https
    pub secure: bool,
}

impl CookiePolicy {
    /// Policy for an app served at `app_url`
    pub fn for_app_url(app_url: &str, max_age_secs: u64) -> Self {
        Self { max_age_secs, secure: app_url.starts_with("https://") }
    }

    fn build(&self, name: &str, value: &str, max_age: Duration) -> Cookie<'static> {
        Cookie::build((name.to_string(), value.to_string()))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(max_age)
            .secure(self.secure)
            .build()
    }

    /// Cookie storing `value` under `name`
    pub fn cookie(&self, name: &str, value: &str) -> Cookie<'static> {
        let max_age = Duration::seconds(i64::try_from(self.max_age_secs).unwrap_or(i64::MAX));
        self.build(name, value, max_age)
    }

    /// Expired cookie deleting `name` in the browser
    pub fn removal(&self, name: &str) -> Cookie<'static> {
        self.build(name, "", Duration::ZERO)
    }

    /// `jar` with `value` stored under `name`
    pub fn set(&self, jar: CookieJar, name: &str, value: &str) -> CookieJar {
        jar.add(self.cookie(name, value))
    }

    /// `jar` with `name` deleted
    pub fn clear(&self, jar: CookieJar, name: &str) -> CookieJar {
        jar.add(self.removal(name))
    }
}

/// Value of cookie `name` sent with the request; empty values count as absent.
pub fn read_cookie(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name).map(|cookie| cookie.value().to_string()).filter(|value| !value.is_empty())
}
