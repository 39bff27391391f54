use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::dom::document::Document;

pub const CSRF_HEADER: &str = "X-CSRF-Token";
pub const DEFAULT_CSRF_COOKIE: &str = "csrf-token";

/// Where the CSRF token for non-idempotent submissions comes from.
///
/// The cookie named by [`cookie_name`](Self::cookie_name) wins; `meta_token`
/// is the fallback. Configured values always beat the page's meta tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrfConfig {
    /// Unset means the page's `csrf-param`, then [`DEFAULT_CSRF_COOKIE`].
    #[serde(default)]
    pub cookie_name: Option<String>,

    #[serde(default)]
    pub meta_token: Option<String>,
}

impl CsrfConfig {
    pub fn new(cookie_name: Option<&str>, meta_token: Option<&str>) -> Self {
        Self {
            cookie_name: cookie_name.map(str::to_string),
            meta_token: meta_token.map(str::to_string),
        }
    }

    /// Name of the cookie the token is read from.
    pub fn cookie_name(&self) -> &str {
        self.cookie_name.as_deref().unwrap_or(DEFAULT_CSRF_COOKIE)
    }

    /// Fill unset fields from the page: `meta[name=csrf-param]` names the
    /// cookie, `meta[name=csrf-token]` carries the fallback token.
    pub fn with_document_defaults(mut self, document: &Document) -> Self {
        if self.cookie_name.is_none() {
            self.cookie_name = document.meta_content("csrf-param").filter(|p| !p.is_empty());
        }
        if self.meta_token.is_none() {
            self.meta_token = document.meta_content("csrf-token");
        }
        self
    }

    /// Token to send given the current `document.cookie` string.
    pub fn token(&self, cookies: &str) -> Option<String> {
        cookie_value(cookies, self.cookie_name())
            .or_else(|| self.meta_token.clone())
            .filter(|token| !token.is_empty())
    }
}

/// URL-decoded value of the cookie called `name` in a `a=1; b=2` string.
/// Empty values count as absent.
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .map(str::trim)
        .filter_map(|cookie| cookie.split_once('='))
        .find(|(cookie_name, _)| *cookie_name == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
        .map(|value| percent_decode_str(value).decode_utf8_lossy().into_owned())
}
