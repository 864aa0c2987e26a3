//! Subscription lookup for rate limit tiers.

use std::collections::HashSet;

use async_trait::async_trait;
use ytsum_ratelimit::UserTier;

/// Decides the plan of a caller.
///
/// Billing lives outside this service; implementations wrap whatever
/// source of truth the deployment has.
#[async_trait]
pub trait SubscriptionGate: Send + Sync {
    async fn tier_for(&self, user_id: Option<&str>) -> UserTier;
}

/// Gate backed by a fixed set of pro user ids.
#[derive(Debug, Clone, Default)]
pub struct StaticSubscriptionGate {
    pro_users: HashSet<String>,
}

impl StaticSubscriptionGate {
    pub fn new<I, S>(pro_users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pro_users: pro_users.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl SubscriptionGate for StaticSubscriptionGate {
    async fn tier_for(&self, user_id: Option<&str>) -> UserTier {
        match user_id {
            None => UserTier::Anonymous,
            Some(uid) if self.pro_users.contains(uid) => UserTier::Pro,
            Some(_) => UserTier::Authenticated,
        }
    }
}
