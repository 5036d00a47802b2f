//! Reading request cookies and collecting `Set-Cookie` headers
//!
//! Stores queue their cookie writes in `ResponseCookies` while the request
//! is handled. The ticket middleware appends them to the response once the
//! handler is done.

use std::sync::Arc;

use axum::http::{header::COOKIE, HeaderMap};
use tokio::sync::Mutex;

/// Value of the first non-empty cookie called `name`
pub fn request_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    name: String,
    value: String,
    max_age: Option<u64>,
    secure: bool,
}

impl SetCookie {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            max_age: None,
            secure: false,
        }
    }

    /// Cookie that makes the client drop `name`
    pub fn removal(name: &str) -> Self {
        Self::new(name, "").with_max_age(0)
    }

    pub fn with_max_age(mut self, max_age: u64) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn to_header_value(&self) -> String {
        let mut header = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            self.name, self.value
        );
        if let Some(max_age) = self.max_age {
            header.push_str(&format!("; Max-Age={max_age}"));
        }
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }
}

/// Cookies to be written with the response, one per name
#[derive(Debug, Clone, Default)]
pub struct ResponseCookies(Arc<Mutex<Vec<SetCookie>>>);

impl ResponseCookies {
    /// Queue `cookie`, replacing an earlier write of the same name
    pub async fn push(&self, cookie: SetCookie) {
        let mut cookies = self.0.lock().await;
        cookies.retain(|queued| queued.name != cookie.name);
        cookies.push(cookie);
    }

    pub async fn take(&self) -> Vec<SetCookie> {
        std::mem::take(&mut *self.0.lock().await)
    }
}
