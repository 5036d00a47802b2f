use std::collections::HashMap;

use async_trait::async_trait;
use ticketgate_core::authorization::GroupsCallback;

use crate::settings::config::Settings;

/// Group memberships taken from the `users` and `authorization` settings
///
/// Users missing from the configuration get no group information, so a
/// still valid ticket of a removed user is denied everything.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredGroups {
    users: HashMap<String, Vec<String>>,
    anonymous: Vec<String>,
}

impl ConfiguredGroups {
    pub fn new(users: HashMap<String, Vec<String>>, anonymous: Vec<String>) -> Self {
        Self { users, anonymous }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let users = settings
            .users
            .iter()
            .map(|(user_id, user)| (user_id.clone(), user.groups.clone()))
            .collect();

        Self::new(users, settings.authorization.anonymous_groups.clone())
    }
}

#[async_trait]
impl GroupsCallback for ConfiguredGroups {
    async fn groups(&self, user_id: Option<&str>) -> anyhow::Result<Option<Vec<String>>> {
        match user_id {
            Some(user_id) => Ok(self.users.get(user_id).cloned()),
            None => Ok(Some(self.anonymous.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> ConfiguredGroups {
        ConfiguredGroups::new(
            HashMap::from([("alice".to_string(), vec!["editors".to_string()])]),
            vec!["guests".to_string()],
        )
    }

    #[tokio::test]
    async fn test_known_user_gets_configured_groups() {
        assert_eq!(
            groups().groups(Some("alice")).await.unwrap(),
            Some(vec!["editors".to_string()])
        );
    }

    #[tokio::test]
    async fn test_anonymous_gets_anonymous_groups() {
        assert_eq!(
            groups().groups(None).await.unwrap(),
            Some(vec!["guests".to_string()])
        );
    }

    #[tokio::test]
    async fn test_unknown_user_is_undetermined() {
        assert_eq!(groups().groups(Some("mallory")).await.unwrap(), None);
    }
}
