use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const EVERYONE: &str = "system.Everyone";
pub const AUTHENTICATED_USER: &str = "system.AuthenticatedUser";
pub const USER_PREFIX: &str = "user:";

/// Principal an access control entry is matched against
///
/// `Everyone` and `AuthenticatedUser` are pseudo-groups added by the
/// `GroupResolver`; they never come from the application callback.
/// `User` matches exactly one user id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Group {
    Everyone,
    AuthenticatedUser,
    User(String),
    Named(String),
}

/// Groups a requester belongs to
pub type GroupSet = HashSet<Group>;

impl Group {
    pub fn named(name: impl Into<String>) -> Self {
        Group::Named(name.into())
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Group::User(user_id.into())
    }

    /// Parse the textual form used in configuration
    ///
    /// `system.Everyone`, `system.AuthenticatedUser` and `user:<id>` are
    /// reserved, everything else is an application group name.
    pub fn parse(s: &str) -> Self {
        match s {
            EVERYONE => Group::Everyone,
            AUTHENTICATED_USER => Group::AuthenticatedUser,
            _ => match s.strip_prefix(USER_PREFIX) {
                Some(user_id) => Group::User(user_id.to_string()),
                None => Group::Named(s.to_string()),
            },
        }
    }

    /// Whether `name` parses to a pseudo-group or a user principal
    pub fn is_reserved_name(name: &str) -> bool {
        !matches!(Group::parse(name), Group::Named(_))
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::Everyone => write!(f, "{}", EVERYONE),
            Group::AuthenticatedUser => write!(f, "{}", AUTHENTICATED_USER),
            Group::User(user_id) => write!(f, "{}{}", USER_PREFIX, user_id),
            Group::Named(name) => write!(f, "{}", name),
        }
    }
}

impl From<String> for Group {
    fn from(s: String) -> Self {
        Group::parse(&s)
    }
}

impl From<&str> for Group {
    fn from(s: &str) -> Self {
        Group::parse(s)
    }
}

impl From<Group> for String {
    fn from(group: Group) -> Self {
        group.to_string()
    }
}
