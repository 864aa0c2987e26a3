//! Rate limit tiers.

use std::fmt;
use std::time::Duration;

/// Route group a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    /// Transcript lookup and search-adjacent routes
    Search,
    /// Summary generation
    Summarize,
    /// Chat about a transcript
    Chat,
}

impl RouteKind {
    /// Every route group the API mounts.
    pub const ALL: [RouteKind; 3] = [RouteKind::Search, RouteKind::Summarize, RouteKind::Chat];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Search => "search",
            RouteKind::Summarize => "summarize",
            RouteKind::Chat => "chat",
        }
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription level of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UserTier {
    #[default]
    Anonymous,
    Authenticated,
    Pro,
}

impl UserTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserTier::Anonymous => "anonymous",
            UserTier::Authenticated => "authenticated",
            UserTier::Pro => "pro",
        }
    }
}

impl fmt::Display for UserTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed sliding-window configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitTier {
    /// 10 requests per hour
    SearchAnonymous,
    /// 30 requests per hour
    SearchAuthenticated,
    /// 100 requests per hour
    SearchPro,
    /// 10 requests per minute
    SummarizeAnonymous,
    /// 30 requests per minute
    SummarizeAuthenticated,
    /// 20 requests per minute
    Chat,
    /// 5 requests per hour; not bound to a route group, checked directly
    BetaSignup,
}

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);

impl RateLimitTier {
    /// Tier for a route group and caller level.
    ///
    /// Pro callers share the authenticated summarize tier; chat has a
    /// single tier for everyone.
    pub fn for_route(route: RouteKind, user: UserTier) -> Self {
        match (route, user) {
            (RouteKind::Search, UserTier::Anonymous) => Self::SearchAnonymous,
            (RouteKind::Search, UserTier::Authenticated) => Self::SearchAuthenticated,
            (RouteKind::Search, UserTier::Pro) => Self::SearchPro,
            (RouteKind::Summarize, UserTier::Anonymous) => Self::SummarizeAnonymous,
            (RouteKind::Summarize, _) => Self::SummarizeAuthenticated,
            (RouteKind::Chat, _) => Self::Chat,
        }
    }

    /// Maximum requests per window.
    pub fn limit(&self) -> u32 {
        match self {
            Self::SearchAnonymous => 10,
            Self::SearchAuthenticated => 30,
            Self::SearchPro => 100,
            Self::SummarizeAnonymous => 10,
            Self::SummarizeAuthenticated => 30,
            Self::Chat => 20,
            Self::BetaSignup => 5,
        }
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        match self {
            Self::SearchAnonymous
            | Self::SearchAuthenticated
            | Self::SearchPro
            | Self::BetaSignup => HOUR,
            Self::SummarizeAnonymous | Self::SummarizeAuthenticated | Self::Chat => MINUTE,
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window().as_millis() as i64
    }

    /// Stable name used in counter keys and metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SearchAnonymous => "search_anonymous",
            Self::SearchAuthenticated => "search_authenticated",
            Self::SearchPro => "search_pro",
            Self::SummarizeAnonymous => "summarize_anonymous",
            Self::SummarizeAuthenticated => "summarize_authenticated",
            Self::Chat => "chat",
            Self::BetaSignup => "beta_signup",
        }
    }
}

impl fmt::Display for RateLimitTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_limits_and_windows() {
        let cases = [
            (RateLimitTier::SearchAnonymous, 10, HOUR),
            (RateLimitTier::SearchAuthenticated, 30, HOUR),
            (RateLimitTier::SearchPro, 100, HOUR),
            (RateLimitTier::SummarizeAnonymous, 10, MINUTE),
            (RateLimitTier::SummarizeAuthenticated, 30, MINUTE),
            (RateLimitTier::Chat, 20, MINUTE),
            (RateLimitTier::BetaSignup, 5, HOUR),
        ];
        for (tier, limit, window) in cases {
            assert_eq!(tier.limit(), limit, "{}", tier);
            assert_eq!(tier.window(), window, "{}", tier);
        }
    }

    #[test]
    fn test_for_route() {
        use RateLimitTier as T;
        assert_eq!(T::for_route(RouteKind::Search, UserTier::Anonymous), T::SearchAnonymous);
        assert_eq!(T::for_route(RouteKind::Search, UserTier::Pro), T::SearchPro);
        assert_eq!(
            T::for_route(RouteKind::Summarize, UserTier::Pro),
            T::SummarizeAuthenticated
        );
        assert_eq!(
            T::for_route(RouteKind::Summarize, UserTier::Anonymous),
            T::SummarizeAnonymous
        );
        assert_eq!(T::for_route(RouteKind::Chat, UserTier::Anonymous), T::Chat);
    }

    #[test]
    fn test_route_groups_never_map_to_beta_signup() {
        for route in RouteKind::ALL {
            for user in [UserTier::Anonymous, UserTier::Authenticated, UserTier::Pro] {
                assert_ne!(RateLimitTier::for_route(route, user), RateLimitTier::BetaSignup, "{}", route);
            }
        }
    }

    #[test]
    fn test_window_ms() {
        assert_eq!(RateLimitTier::Chat.window_ms(), 60_000);
        assert_eq!(RateLimitTier::BetaSignup.window_ms(), 3_600_000);
    }
}
