use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::{collections::HashMap, env};
use ticketgate_core::authorization::{Acl, Group};
use ticketgate_core::settings::{api_server::ApiServer, TicketSettings};

/// A user allowed to log in with a password
#[derive(Debug, Deserialize, Clone)]
#[readonly::make]
pub struct UserSettings {
    /// bcrypt hash of the password
    pub password_hash: String,
    /// Opaque data carried in the user's tickets
    #[serde(default)]
    pub user_data: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[readonly::make]
pub struct AuthorizationSettings {
    /// Groups of requests without a valid ticket
    #[serde(default)]
    pub anonymous_groups: Vec<String>,
    /// Give up on group resolution after this many milliseconds
    #[serde(default)]
    pub groups_timeout_ms: Option<u64>,
    /// Ordered entries, the first match decides
    #[serde(default)]
    pub acl: Acl,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub api: ApiServer,
    pub auth: TicketSettings,
    #[serde(default)]
    pub users: HashMap<String, UserSettings>,
    #[serde(default)]
    pub authorization: AuthorizationSettings,
}

impl Settings {
    pub fn get_environment() -> Environment {
        Environment::default()
            .prefix("TICKETGATE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("TICKETGATE_RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("api.bind_address", "0.0.0.0:21380")?
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Self::get_environment());

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Load settings from a single file, used by tests and tooling
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::with_name(path))
            .build()?
            .try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth
            .validate()
            .map_err(|e| ConfigError::Message(format!("Invalid auth settings: {e}")))?;

        for (user_id, user) in &self.users {
            if user_id.is_empty() {
                return Err(ConfigError::Message("Empty user id in users".into()));
            }
            if user.password_hash.is_empty() {
                return Err(ConfigError::Message(format!(
                    "Missing password_hash for user '{user_id}'"
                )));
            }
            if user.groups.iter().any(|group| group.is_empty()) {
                return Err(ConfigError::Message(format!(
                    "Empty group name for user '{user_id}'"
                )));
            }
            if let Some(group) = user.groups.iter().find(|g| Group::is_reserved_name(g)) {
                return Err(ConfigError::Message(format!(
                    "Reserved group name '{group}' for user '{user_id}'"
                )));
            }
        }

        if let Some(group) = self
            .authorization
            .anonymous_groups
            .iter()
            .find(|g| Group::is_reserved_name(g))
        {
            return Err(ConfigError::Message(format!(
                "Reserved group name '{group}' in authorization.anonymous_groups"
            )));
        }

        if self.authorization.groups_timeout_ms == Some(0) {
            return Err(ConfigError::Message(
                "authorization.groups_timeout_ms must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketgate_core::authorization::{Effect, Group};
    use ticketgate_core::settings::TicketStorage;

    const CONFIG: &str = r#"
api:
  bind_address: "127.0.0.1:9000"
auth:
  secret: "0123456789abcdef-signing"
  max_age: 3600
  reissue_time: 600
  storage: session
users:
  alice:
    password_hash: "$2b$04$abcdefghijklmnopqrstuu"
    user_data: "tenant=1"
    groups: ["editors"]
authorization:
  anonymous_groups: ["guests"]
  groups_timeout_ms: 250
  acl:
    - effect: allow
      principal: "system.Everyone"
      permissions: ["view"]
    - effect: deny
      principal: "user:mallory"
      permissions: ["edit"]
"#;

    fn parse(yaml: &str) -> Result<Settings, ConfigError> {
        Config::builder()
            .add_source(File::from_str(yaml, config::FileFormat::Yaml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_settings_from_yaml() {
        let settings = parse(CONFIG).unwrap();
        settings.validate().unwrap();

        assert_eq!(settings.api.bind_address, "127.0.0.1:9000");
        assert_eq!(settings.auth.max_age, 3600);
        assert_eq!(settings.auth.reissue_time, Some(600));
        assert_eq!(settings.auth.storage, TicketStorage::Session);
        assert_eq!(settings.users["alice"].user_data, "tenant=1");
        assert_eq!(settings.users["alice"].groups, vec!["editors"]);
        assert_eq!(settings.authorization.anonymous_groups, vec!["guests"]);
        assert_eq!(settings.authorization.groups_timeout_ms, Some(250));

        let acl = &settings.authorization.acl;
        assert_eq!(acl.len(), 2);
        assert_eq!(acl[0].principal, Group::Everyone);
        assert_eq!(acl[1].effect, Effect::Deny);
        assert_eq!(acl[1].principal, Group::user("mallory"));
    }

    #[test]
    fn test_minimal_settings_use_defaults() {
        let settings = parse("auth:\n  secret: \"0123456789abcdef\"\n  max_age: 60\n").unwrap();
        settings.validate().unwrap();

        assert_eq!(settings.api.bind_address, "0.0.0.0:21380");
        assert!(settings.users.is_empty());
        assert!(settings.authorization.acl.is_empty());
        assert_eq!(settings.auth.cookie_name, "AUTH_TKT");
    }

    #[test]
    fn test_validate_rejects_bad_ticket_settings() {
        let settings =
            parse("auth:\n  secret: \"0123456789abcdef\"\n  max_age: 60\n  reissue_time: 60\n")
                .unwrap();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("reissue_time"));
    }

    #[test]
    fn test_validate_rejects_user_without_hash() {
        let yaml = "auth:\n  secret: \"0123456789abcdef\"\n  max_age: 60\nusers:\n  bob:\n    password_hash: \"\"\n";
        let err = parse(yaml).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("bob"));
    }

    #[test]
    fn test_validate_rejects_reserved_group_names() {
        let base = "auth:\n  secret: \"0123456789abcdef\"\n  max_age: 60\n";

        let yaml = format!(
            "{base}users:\n  bob:\n    password_hash: \"x\"\n    groups: [\"system.AuthenticatedUser\"]\n"
        );
        let err = parse(&yaml).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("system.AuthenticatedUser"));

        let yaml = format!("{base}authorization:\n  anonymous_groups: [\"user:admin\"]\n");
        let err = parse(&yaml).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("user:admin"));
    }
}
