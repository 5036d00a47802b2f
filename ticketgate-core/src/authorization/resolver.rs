use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::group::{Group, GroupSet};
use crate::auth::TicketAuthenticator;
use crate::context::RequestContext;

/// Application hook mapping a user id to its group names
///
/// `Ok(None)` means the application cannot tell, which is different from
/// `Ok(Some(vec![]))`, a known user without extra groups. `user_id` is
/// `None` for anonymous requests.
#[async_trait]
pub trait GroupsCallback: Send + Sync {
    async fn groups(&self, user_id: Option<&str>) -> anyhow::Result<Option<Vec<String>>>;
}

/// Resolves a requester's full group set
///
/// This is the only place the pseudo-groups are added: `Everyone` always,
/// `AuthenticatedUser` and the requester's own `User` principal when a
/// user id is present.
#[derive(Clone)]
pub struct GroupResolver {
    callback: Arc<dyn GroupsCallback>,
    timeout: Option<Duration>,
}

impl GroupResolver {
    pub fn new(callback: Arc<dyn GroupsCallback>) -> Self {
        Self {
            callback,
            timeout: None,
        }
    }

    /// Give up on the callback after `timeout`, treating it as undetermined
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Group set for `user_id`, computed at most once per request
    pub async fn resolve(&self, ctx: &RequestContext, user_id: Option<&str>) -> Option<GroupSet> {
        let key = user_id.map(str::to_string);
        let mut cache = ctx.groups.lock().await;
        if let Some(groups) = cache.get(&key) {
            return groups.clone();
        }

        let groups = self
            .call_callback(user_id)
            .await
            .map(|names| Self::extend_groups(user_id, names));

        cache.insert(key, groups.clone());
        groups
    }

    /// Authenticate the request, then resolve its groups
    pub async fn resolve_request(
        &self,
        ctx: &RequestContext,
        authenticator: &TicketAuthenticator,
    ) -> Option<GroupSet> {
        let user_id = authenticator.get_ticket(ctx).await;
        self.resolve(ctx, user_id.as_deref()).await
    }

    /// Union the callback's groups with the pseudo-groups
    ///
    /// Callback names are always plain groups. Names that would read as a
    /// pseudo-group or a `user:` principal are skipped.
    pub fn extend_groups(user_id: Option<&str>, names: Vec<String>) -> GroupSet {
        let mut groups: GroupSet = names
            .into_iter()
            .filter(|name| {
                let reserved = Group::is_reserved_name(name);
                if reserved {
                    warn!(
                        "Ignoring reserved group name '{}' from groups callback for user {:?}",
                        name, user_id
                    );
                }
                !reserved
            })
            .map(Group::Named)
            .collect();
        groups.insert(Group::Everyone);

        if let Some(user_id) = user_id {
            groups.insert(Group::AuthenticatedUser);
            groups.insert(Group::user(user_id));
        }

        groups
    }

    async fn call_callback(&self, user_id: Option<&str>) -> Option<Vec<String>> {
        let result = match self.timeout {
            Some(timeout) => {
                match tokio::time::timeout(timeout, self.callback.groups(user_id)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            "Groups callback timed out after {:?} for user {:?}",
                            timeout, user_id
                        );
                        return None;
                    }
                }
            }
            None => self.callback.groups(user_id).await,
        };

        match result {
            Ok(Some(names)) => Some(names),
            Ok(None) => {
                debug!("Groups callback returned no information for user {:?}", user_id);
                None
            }
            Err(e) => {
                warn!("Groups callback failed for user {:?}: {:#}", user_id, e);
                None
            }
        }
    }
}

impl std::fmt::Debug for GroupResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupResolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTicketStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Always answers with the same groups and counts the calls
    struct FixedGroups {
        groups: Option<Vec<String>>,
        calls: AtomicUsize,
    }

    impl FixedGroups {
        fn some(groups: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                groups: Some(groups.iter().map(|s| s.to_string()).collect()),
                calls: AtomicUsize::new(0),
            })
        }

        fn none() -> Arc<Self> {
            Arc::new(Self {
                groups: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl GroupsCallback for FixedGroups {
        async fn groups(&self, _user_id: Option<&str>) -> anyhow::Result<Option<Vec<String>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.groups.clone())
        }
    }

    struct FailingGroups;

    #[async_trait]
    impl GroupsCallback for FailingGroups {
        async fn groups(&self, _user_id: Option<&str>) -> anyhow::Result<Option<Vec<String>>> {
            anyhow::bail!("directory unavailable")
        }
    }

    struct SlowGroups;

    #[async_trait]
    impl GroupsCallback for SlowGroups {
        async fn groups(&self, _user_id: Option<&str>) -> anyhow::Result<Option<Vec<String>>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Some(vec!["late".to_string()]))
        }
    }

    fn context() -> RequestContext {
        RequestContext::new(Arc::new(MemoryTicketStore::new()))
    }

    #[tokio::test]
    async fn test_authenticated_user_groups() {
        let resolver = GroupResolver::new(FixedGroups::some(&["group0", "group1"]));
        let groups = resolver.resolve(&context(), Some("some_user")).await.unwrap();

        assert!(groups.contains(&Group::named("group0")));
        assert!(groups.contains(&Group::named("group1")));
        assert!(groups.contains(&Group::user("some_user")));
        assert!(groups.contains(&Group::Everyone));
        assert!(groups.contains(&Group::AuthenticatedUser));
    }

    #[tokio::test]
    async fn test_anonymous_user_groups() {
        let resolver = GroupResolver::new(FixedGroups::some(&["group0", "group1"]));
        let groups = resolver.resolve(&context(), None).await.unwrap();

        assert!(groups.contains(&Group::named("group0")));
        assert!(groups.contains(&Group::Everyone));
        assert!(!groups.contains(&Group::AuthenticatedUser));
        assert!(!groups.iter().any(|g| matches!(g, Group::User(_))));
    }

    #[tokio::test]
    async fn test_callback_cannot_grant_reserved_groups() {
        let resolver = GroupResolver::new(FixedGroups::some(&[
            "system.AuthenticatedUser",
            "system.Everyone",
            "user:admin",
            "viewers",
        ]));

        let groups = resolver.resolve(&context(), None).await.unwrap();
        assert!(!groups.contains(&Group::AuthenticatedUser));
        assert!(!groups.contains(&Group::user("admin")));
        assert!(!groups.contains(&Group::named("system.AuthenticatedUser")));
        assert_eq!(
            groups,
            GroupSet::from([Group::Everyone, Group::named("viewers")])
        );

        let groups = resolver.resolve(&context(), Some("bob")).await.unwrap();
        assert!(!groups.contains(&Group::user("admin")));
        assert!(groups.contains(&Group::user("bob")));
        assert!(groups.contains(&Group::AuthenticatedUser));
    }

    #[tokio::test]
    async fn test_empty_groups_are_not_none() {
        let resolver = GroupResolver::new(FixedGroups::some(&[]));
        let groups = resolver.resolve(&context(), Some("alice")).await.unwrap();

        assert_eq!(groups.len(), 3);
        assert!(groups.contains(&Group::Everyone));
    }

    #[tokio::test]
    async fn test_none_from_callback_propagates() {
        let resolver = GroupResolver::new(FixedGroups::none());

        assert_eq!(resolver.resolve(&context(), Some("alice")).await, None);
        assert_eq!(resolver.resolve(&context(), None).await, None);
    }

    #[tokio::test]
    async fn test_callback_error_is_none() {
        let resolver = GroupResolver::new(Arc::new(FailingGroups));
        assert_eq!(resolver.resolve(&context(), Some("alice")).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_timeout_is_none() {
        let resolver =
            GroupResolver::new(Arc::new(SlowGroups)).with_timeout(Duration::from_millis(50));
        assert_eq!(resolver.resolve(&context(), Some("alice")).await, None);
    }

    #[tokio::test]
    async fn test_callback_runs_once_per_request_and_user() {
        let callback = FixedGroups::some(&["group0"]);
        let resolver = GroupResolver::new(callback.clone());
        let ctx = context();

        for _ in 0..3 {
            resolver.resolve(&ctx, Some("alice")).await;
        }
        assert_eq!(callback.calls.load(Ordering::SeqCst), 1);

        resolver.resolve(&ctx, None).await;
        assert_eq!(callback.calls.load(Ordering::SeqCst), 2);

        // a new request starts with an empty cache
        resolver.resolve(&context(), Some("alice")).await;
        assert_eq!(callback.calls.load(Ordering::SeqCst), 3);
    }
}
