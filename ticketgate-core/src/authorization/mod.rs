//! Access control for ticket-authenticated requests
//!
//! Groups come from the application through a `GroupsCallback` and are
//! extended with pseudo-groups by the `GroupResolver`. The `AclEvaluator`
//! then walks an ordered `Acl` and lets the first matching entry decide.

pub mod acl;
pub mod group;
pub mod resolver;

pub use acl::{AccessControlEntry, Acl, AclEvaluator, Effect};
pub use group::{Group, GroupSet};
pub use resolver::{GroupResolver, GroupsCallback};

use tracing::debug;

use crate::auth::TicketAuthenticator;
use crate::context::RequestContext;

/// Whether the requester of `ctx` holds `permission` under `aces`
pub async fn get_permitted(
    ctx: &RequestContext,
    authenticator: &TicketAuthenticator,
    resolver: &GroupResolver,
    permission: &str,
    aces: &[AccessControlEntry],
) -> bool {
    let groups = resolver.resolve_request(ctx, authenticator).await;

    let Some(groups) = groups else {
        debug!("No group information, denying '{}'", permission);
        return false;
    };

    match AclEvaluator::first_match(&groups, permission, aces) {
        Some((index, ace)) => {
            debug!(
                "'{}' {} by entry #{} ({} {})",
                permission,
                if ace.effect.is_allow() { "granted" } else { "denied" },
                index,
                ace.effect.as_str(),
                ace.principal
            );
            ace.effect.is_allow()
        }
        None => {
            debug!("'{}' denied, no matching entry", permission);
            false
        }
    }
}
