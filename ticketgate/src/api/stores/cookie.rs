use async_trait::async_trait;
use axum::http::HeaderMap;
use tokio::sync::Mutex;
use ticketgate_core::auth::{StoreError, TicketStore};
use ticketgate_core::settings::TicketSettings;

use crate::api::cookies::{request_cookie, ResponseCookies, SetCookie};

/// Ticket carried as a cookie value
#[derive(Debug)]
pub struct CookieTicketStore {
    cookie_name: String,
    max_age: u64,
    secure: bool,
    current: Mutex<Option<String>>,
    cookies: ResponseCookies,
}

impl CookieTicketStore {
    pub fn from_request(
        settings: &TicketSettings,
        headers: &HeaderMap,
        cookies: ResponseCookies,
    ) -> Self {
        Self {
            cookie_name: settings.cookie_name.clone(),
            max_age: settings.max_age,
            secure: settings.secure_cookie,
            current: Mutex::new(request_cookie(headers, &settings.cookie_name)),
            cookies,
        }
    }
}

#[async_trait]
impl TicketStore for CookieTicketStore {
    async fn put(&self, ticket: &str) -> Result<(), StoreError> {
        *self.current.lock().await = Some(ticket.to_string());
        self.cookies
            .push(
                SetCookie::new(&self.cookie_name, ticket)
                    .with_max_age(self.max_age)
                    .with_secure(self.secure),
            )
            .await;
        Ok(())
    }

    async fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self.current.lock().await.clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.current.lock().await = None;
        self.cookies
            .push(SetCookie::removal(&self.cookie_name).with_secure(self.secure))
            .await;
        Ok(())
    }
}
