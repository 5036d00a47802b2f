use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::ticket::HashAlgorithm;
use crate::utils::secret::MaskedSecret;

/// Secrets shorter than this are accepted but logged as weak
pub const MIN_RECOMMENDED_SECRET_LEN: usize = 16;

pub const DEFAULT_COOKIE_NAME: &str = "AUTH_TKT";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Ticket secret is missing")]
    MissingSecret,

    #[error("Ticket max_age must be greater than zero")]
    NonPositiveMaxAge,

    #[error("Ticket reissue_time ({reissue_time}s) must be less than max_age ({max_age}s)")]
    InvalidReissueTime { reissue_time: u64, max_age: u64 },

    #[error("Invalid cookie name: '{0}'")]
    InvalidCookieName(String),
}

/// Where the ticket travels between requests
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TicketStorage {
    /// The ticket itself is the cookie value
    #[default]
    Cookie,
    /// The ticket is kept in a server-side session
    Session,
}

#[derive(Debug, Deserialize, Clone)]
#[readonly::make]
pub struct TicketSettings {
    pub secret: MaskedSecret,
    /// Seconds a ticket stays valid after issue
    pub max_age: u64,
    /// Seconds after which a still valid ticket is refreshed
    #[serde(default)]
    pub reissue_time: Option<u64>,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default)]
    pub include_ip: bool,
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    #[serde(default)]
    pub storage: TicketStorage,
    #[serde(default)]
    pub secure_cookie: bool,
}

fn default_cookie_name() -> String {
    DEFAULT_COOKIE_NAME.to_string()
}

impl TicketSettings {
    pub fn new(secret: &str, max_age: u64) -> Self {
        Self {
            secret: MaskedSecret::from_str(secret),
            max_age,
            reissue_time: None,
            cookie_name: default_cookie_name(),
            include_ip: false,
            hash_algorithm: HashAlgorithm::default(),
            storage: TicketStorage::default(),
            secure_cookie: false,
        }
    }

    pub fn with_reissue_time(mut self, reissue_time: Option<u64>) -> Self {
        self.reissue_time = reissue_time;
        self
    }

    pub fn with_cookie_name(mut self, cookie_name: &str) -> Self {
        self.cookie_name = cookie_name.to_string();
        self
    }

    pub fn with_include_ip(mut self, include_ip: bool) -> Self {
        self.include_ip = include_ip;
        self
    }

    /// Check the settings once at startup
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.secret.is_empty() {
            return Err(SettingsError::MissingSecret);
        }

        if self.max_age == 0 {
            return Err(SettingsError::NonPositiveMaxAge);
        }

        if let Some(reissue_time) = self.reissue_time {
            if reissue_time >= self.max_age {
                return Err(SettingsError::InvalidReissueTime {
                    reissue_time,
                    max_age: self.max_age,
                });
            }
        }

        if !is_valid_cookie_name(&self.cookie_name) {
            return Err(SettingsError::InvalidCookieName(self.cookie_name.clone()));
        }

        if self.secret.len() < MIN_RECOMMENDED_SECRET_LEN {
            warn!(
                "Ticket secret is only {} bytes long, at least {} are recommended",
                self.secret.len(),
                MIN_RECOMMENDED_SECRET_LEN
            );
        }

        Ok(())
    }
}

/// RFC 6265 cookie-name: a non-empty token
fn is_valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}
