use std::collections::BTreeSet;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use super::group::{Group, GroupSet};

/// Outcome of a matching access control entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "allow",
            Effect::Deny => "deny",
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Effect::Allow)
    }
}

/// One rule: `effect` applies to members of `principal` for `permissions`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessControlEntry {
    pub effect: Effect,
    pub principal: Group,
    pub permissions: BTreeSet<String>,
}

impl AccessControlEntry {
    pub fn new<P, S>(effect: Effect, principal: impl Into<Group>, permissions: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            effect,
            principal: principal.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allow<P, S>(principal: impl Into<Group>, permissions: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Effect::Allow, principal, permissions)
    }

    pub fn deny<P, S>(principal: impl Into<Group>, permissions: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Effect::Deny, principal, permissions)
    }

    pub fn matches(&self, groups: &GroupSet, permission: &str) -> bool {
        groups.contains(&self.principal) && self.permissions.contains(permission)
    }
}

/// Ordered list of access control entries. Order is policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Acl(Vec<AccessControlEntry>);

impl Acl {
    pub fn new(entries: Vec<AccessControlEntry>) -> Self {
        Self(entries)
    }
}

impl Deref for Acl {
    type Target = [AccessControlEntry];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<AccessControlEntry>> for Acl {
    fn from(entries: Vec<AccessControlEntry>) -> Self {
        Self(entries)
    }
}

impl FromIterator<AccessControlEntry> for Acl {
    fn from_iter<I: IntoIterator<Item = AccessControlEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// First-match-wins evaluation of access control entries
///
/// Entries are scanned in the order given. The first entry whose principal
/// is in the requester's groups and whose permissions include the target
/// decides: `Allow` grants, `Deny` refuses. Later entries are never
/// consulted. Without a matching entry access is denied.
pub struct AclEvaluator;

impl AclEvaluator {
    /// The deciding entry and its position, if any
    pub fn first_match<'a>(
        groups: &GroupSet,
        permission: &str,
        aces: &'a [AccessControlEntry],
    ) -> Option<(usize, &'a AccessControlEntry)> {
        aces.iter()
            .enumerate()
            .find(|(_, ace)| ace.matches(groups, permission))
    }

    /// Whether `permission` is granted
    ///
    /// `None` groups mean the application could not tell who the requester
    /// belongs to. That denies everything, including entries for
    /// `Everyone`.
    pub fn evaluate(groups: Option<&GroupSet>, permission: &str, aces: &[AccessControlEntry]) -> bool {
        let Some(groups) = groups else {
            return false;
        };

        Self::first_match(groups, permission, aces)
            .map(|(_, ace)| ace.effect.is_allow())
            .unwrap_or(false)
    }
}
