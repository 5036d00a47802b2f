use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[allow(unused)]
#[readonly::make]
pub struct ApiServer {
    pub bind_address: String,
    /// Take the client IP from `X-Forwarded-For` when running behind a proxy
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

impl Default for ApiServer {
    fn default() -> Self {
        ApiServer {
            bind_address: "0.0.0.0:21380".to_string(),
            trust_forwarded_for: false,
        }
    }
}
