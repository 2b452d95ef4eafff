//! Fixed-window rate limiting over a shared counter store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::counter;
use tokio::time::timeout;
use tokio_retry::Retry;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, info, warn};

use crate::domain::rate_limit::{RateLimitDecision, RateLimitRules, Tier};
use crate::infrastructure::counter::{CounterError, CounterResult, CounterStore, WindowHit};

/// Timeout and retry budget for primary counter store calls.
#[derive(Debug, Clone, Copy)]
pub struct StorePolicy {
    /// Deadline for a single call.
    pub timeout: Duration,
    /// Total attempts, including the first one.
    pub max_attempts: usize,
    /// Base of the exponential backoff between attempts, in milliseconds.
    pub backoff_base_ms: u64,
    /// Cap on a single backoff delay.
    pub max_backoff: Duration,
}

impl Default for StorePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(250),
            max_attempts: 3,
            backoff_base_ms: 10,
            max_backoff: Duration::from_secs(3),
        }
    }
}

/// Rate limiter evaluating one tier at a time.
///
/// Every check goes to the primary store first. When that fails after the
/// retry budget, the in-process fallback store decides instead, so traffic
/// keeps flowing with per-instance limits. Entering and leaving that
/// degraded mode is logged once each at WARN.
pub struct RateLimiter {
    rules: RateLimitRules,
    primary: Arc<dyn CounterStore>,
    fallback: Arc<dyn CounterStore>,
    policy: StorePolicy,
    degraded: AtomicBool,
}

impl RateLimiter {
    /// Creates a rate limiter.
    ///
    /// # Arguments
    ///
    /// - `rules` - one rule per tier, fixed for the lifetime of the process
    /// - `primary` - the shared store (Redis), or the in-process store if Redis is off
    /// - `fallback` - the in-process store used while `primary` is unreachable
    /// - `policy` - timeout and retry budget for `primary`
    pub fn new(
        rules: RateLimitRules,
        primary: Arc<dyn CounterStore>,
        fallback: Arc<dyn CounterStore>,
        policy: StorePolicy,
    ) -> Self {
        Self {
            rules,
            primary,
            fallback,
            policy,
            degraded: AtomicBool::new(false),
        }
    }

    pub fn rules(&self) -> &RateLimitRules {
        &self.rules
    }

    /// Returns true while decisions come from the in-process fallback.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Checks if the primary store answers a PING.
    pub async fn primary_healthy(&self) -> bool {
        timeout(self.policy.timeout, self.primary.health_check())
            .await
            .unwrap_or(false)
    }

    /// Counts a request from `identity` against `tier`.
    ///
    /// On [`RateLimitDecision::Allow`] the counter has been incremented. On
    /// [`RateLimitDecision::Deny`] it has not.
    pub async fn check(&self, tier: Tier, identity: &str) -> RateLimitDecision {
        let rule = self.rules.rule(tier);
        let key = rule.key_for(identity);
        let limit = u64::from(rule.max_requests);

        let hit = match self.hit_primary(&key, limit, rule.window).await {
            Ok(hit) => {
                self.note_recovery();
                hit
            }
            Err(e) => {
                self.note_fallback(&e);
                counter!("rate_limit_fallback_total").increment(1);

                match self.fallback.hit(&key, limit, rule.window).await {
                    Ok(hit) => hit,
                    Err(e) => {
                        warn!(error = %e, %tier, "Fallback counter store failed; allowing request");
                        return RateLimitDecision::Allow {
                            limit: rule.max_requests,
                            remaining: rule.max_requests,
                            reset_after: rule.window,
                        };
                    }
                }
            }
        };

        decide(tier, rule.max_requests, &rule.message, hit, identity)
    }

    /// Calls the primary under the timeout, retrying with backoff. A timeout
    /// that fires after Redis already applied the INCR makes the retry count the
    /// request twice.
    async fn hit_primary(&self, key: &str, limit: u64, window: Duration) -> CounterResult<WindowHit> {
        let policy = self.policy;
        let primary = &self.primary;
        let strategy = ExponentialBackoff::from_millis(policy.backoff_base_ms.max(1))
            .max_delay(policy.max_backoff)
            .take(policy.max_attempts.saturating_sub(1));

        Retry::start(strategy, move || async move {
            match timeout(policy.timeout, primary.hit(key, limit, window)).await {
                Ok(Ok(hit)) => Ok(hit),
                Ok(Err(e)) => {
                    debug!(error = %e, key, "Counter store call failed");
                    Err(e)
                }
                Err(_) => {
                    debug!(key, "Counter store call timed out");
                    Err(CounterError::Timeout(policy.timeout))
                }
            }
        })
        .await
    }

    fn note_fallback(&self, error: &CounterError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            warn!(
                error = %error,
                "Counter store unavailable; rate limiting falls back to in-process counters"
            );
        }
    }

    fn note_recovery(&self) {
        if self.degraded.swap(false, Ordering::AcqRel) {
            warn!("Counter store reachable again; shared rate limiting restored");
        }
    }
}

fn decide(
    tier: Tier,
    max_requests: u32,
    message: &str,
    hit: WindowHit,
    identity: &str,
) -> RateLimitDecision {
    if hit.allowed {
        let used = u32::try_from(hit.count).unwrap_or(u32::MAX);
        return RateLimitDecision::Allow {
            limit: max_requests,
            remaining: max_requests.saturating_sub(used),
            reset_after: hit.reset_after,
        };
    }

    info!(%tier, client = identity, "Rate limit exceeded");
    counter!("rate_limit_denied_total", "tier" => tier.as_str()).increment(1);

    RateLimitDecision::Deny {
        tier,
        message: message.to_string(),
        retry_after: hit.reset_after,
    }
}
