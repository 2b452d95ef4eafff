//! Rate limit tiers and the rules attached to them.

use std::fmt;
use std::time::Duration;

/// A named rate limit rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Every request under `/api/`.
    General,
    /// `POST /api/users/login`.
    Login,
    /// `POST /api/users/register`.
    AccountCreation,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::General, Tier::Login, Tier::AccountCreation];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::General => "general",
            Tier::Login => "login",
            Tier::AccountCreation => "account_creation",
        }
    }

    /// Parses the CLI / config spelling of a tier.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "general" | "api" => Some(Tier::General),
            "login" => Some(Tier::Login),
            "account_creation" | "account-creation" | "create" | "register" => {
                Some(Tier::AccountCreation)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-window limit for one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRule {
    pub tier: Tier,
    pub window: Duration,
    pub max_requests: u32,
    pub key_prefix: String,
    pub message: String,
}

/// Human wording of a window length, e.g. `15 minutes`, `an hour`, `24 hours`.
pub fn window_phrase(window: Duration) -> String {
    let secs = window.as_secs().max(1);
    let (n, unit) = if secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };

    match n {
        1 if unit == "hour" => "an hour".to_string(),
        1 => format!("a {unit}"),
        n => format!("{n} {unit}s"),
    }
}

fn message_for(tier: Tier, window: Duration) -> String {
    let lead = match tier {
        Tier::General => "Too many requests from this IP",
        Tier::Login => "Too many login attempts from this IP",
        Tier::AccountCreation => "Too many accounts created from this IP",
    };
    format!("{lead}, please try again after {}", window_phrase(window))
}

impl RateLimitRule {
    /// Default rule for a tier: 100 per 15 minutes, 5 logins per hour,
    /// 3 registrations per day.
    pub fn default_for(tier: Tier) -> Self {
        let (window, max_requests, key_prefix) = match tier {
            Tier::General => (Duration::from_secs(15 * 60), 100, "rl:api:"),
            Tier::Login => (Duration::from_secs(60 * 60), 5, "rl:login:"),
            Tier::AccountCreation => (Duration::from_secs(24 * 60 * 60), 3, "rl:create:"),
        };

        Self {
            tier,
            window,
            max_requests,
            key_prefix: key_prefix.to_string(),
            message: message_for(tier, window),
        }
    }

    /// Overrides the ceiling and window, keeping the prefix. The message is
    /// reworded for the new window.
    pub fn with_limit(mut self, max_requests: u32, window: Duration) -> Self {
        self.max_requests = max_requests;
        self.window = window;
        self.message = message_for(self.tier, window);
        self
    }

    /// Counter key for a client identity.
    pub fn key_for(&self, identity: &str) -> String {
        format!("{}{}", self.key_prefix, identity)
    }
}

/// The full rule set, one rule per tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRules {
    pub general: RateLimitRule,
    pub login: RateLimitRule,
    pub account_creation: RateLimitRule,
}

impl RateLimitRules {
    pub fn rule(&self, tier: Tier) -> &RateLimitRule {
        match tier {
            Tier::General => &self.general,
            Tier::Login => &self.login,
            Tier::AccountCreation => &self.account_creation,
        }
    }
}

impl Default for RateLimitRules {
    fn default() -> Self {
        Self {
            general: RateLimitRule::default_for(Tier::General),
            login: RateLimitRule::default_for(Tier::Login),
            account_creation: RateLimitRule::default_for(Tier::AccountCreation),
        }
    }
}

/// Verdict of the rate limiter for one request and one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allow {
        limit: u32,
        remaining: u32,
        reset_after: Duration,
    },
    Deny {
        tier: Tier,
        message: String,
        retry_after: Duration,
    },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allow { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = RateLimitRules::default();

        assert_eq!(rules.general.max_requests, 100);
        assert_eq!(rules.general.window, Duration::from_secs(900));
        assert_eq!(rules.login.max_requests, 5);
        assert_eq!(rules.login.window, Duration::from_secs(3600));
        assert_eq!(rules.account_creation.max_requests, 3);
        assert_eq!(rules.account_creation.window, Duration::from_secs(86_400));
    }

    #[test]
    fn test_key_uses_tier_prefix() {
        let rules = RateLimitRules::default();

        assert_eq!(rules.rule(Tier::General).key_for("10.0.0.1"), "rl:api:10.0.0.1");
        assert_eq!(rules.rule(Tier::Login).key_for("10.0.0.1"), "rl:login:10.0.0.1");
        assert_eq!(
            rules.rule(Tier::AccountCreation).key_for("10.0.0.1"),
            "rl:create:10.0.0.1"
        );
    }

    #[test]
    fn test_default_messages() {
        let rules = RateLimitRules::default();

        assert_eq!(
            rules.general.message,
            "Too many requests from this IP, please try again after 15 minutes"
        );
        assert_eq!(
            rules.login.message,
            "Too many login attempts from this IP, please try again after an hour"
        );
        assert_eq!(
            rules.account_creation.message,
            "Too many accounts created from this IP, please try again after 24 hours"
        );
    }

    #[test]
    fn test_with_limit_rewords_message_for_window() {
        let rule = RateLimitRule::default_for(Tier::Login).with_limit(2, Duration::from_secs(10));

        assert_eq!(rule.max_requests, 2);
        assert_eq!(rule.key_prefix, "rl:login:");
        assert_eq!(
            rule.message,
            "Too many login attempts from this IP, please try again after 10 seconds"
        );

        let rule = RateLimitRule::default_for(Tier::General)
            .with_limit(100, Duration::from_secs(2 * 60 * 60));
        assert_eq!(
            rule.message,
            "Too many requests from this IP, please try again after 2 hours"
        );
    }

    #[test]
    fn test_window_phrase() {
        assert_eq!(window_phrase(Duration::from_secs(60)), "a minute");
        assert_eq!(window_phrase(Duration::from_secs(90)), "90 seconds");
        assert_eq!(window_phrase(Duration::from_secs(1)), "a second");
        assert_eq!(window_phrase(Duration::from_secs(3 * 86_400)), "72 hours");
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!(Tier::parse("LOGIN"), Some(Tier::Login));
        assert_eq!(Tier::parse("register"), Some(Tier::AccountCreation));
        assert_eq!(Tier::parse("api"), Some(Tier::General));
        assert_eq!(Tier::parse("other"), None);
    }
}
