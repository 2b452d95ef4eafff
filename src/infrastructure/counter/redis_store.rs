//! Redis-backed counter store shared by every server instance.

use super::service::{CounterError, CounterResult, CounterSnapshot, CounterStore, WindowHit};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, Script, aio::ConnectionManager};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Check-and-increment in one round trip.
///
/// The expiry is only set when the key is created (or has somehow lost its
/// TTL), so the window is fixed rather than sliding. A full window is left
/// untouched, so a rejected request is never counted.
const HIT_SCRIPT: &str = r#"
local limit = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if current >= limit then
  local ttl = redis.call('PTTL', KEYS[1])
  if ttl < 0 then
    redis.call('PEXPIRE', KEYS[1], window)
    ttl = window
  end
  return {current, ttl, 0}
end
current = redis.call('INCR', KEYS[1])
local ttl = redis.call('PTTL', KEYS[1])
if ttl < 0 then
  redis.call('PEXPIRE', KEYS[1], window)
  ttl = window
end
return {current, ttl, 1}
"#;

/// Redis counter store.
///
/// The connection is opened on first use, so a Redis that is down at startup
/// still ends up as the primary store and is picked up once it comes back.
/// After that a `ConnectionManager` reconnects on its own. Errors are
/// propagated, never swallowed: the rate limiter needs them to decide when to
/// fall back.
pub struct RedisCounterStore {
    client: Client,
    manager: OnceCell<ConnectionManager>,
    script: Script,
}

impl RedisCounterStore {
    /// Parses the URL without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Connection`] if the URL is invalid.
    pub fn new(redis_url: &str) -> CounterResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            CounterError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        Ok(Self {
            client,
            manager: OnceCell::new(),
            script: Script::new(HIT_SCRIPT),
        })
    }

    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Connection`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> CounterResult<Self> {
        info!("Connecting to Redis counter store");

        let store = Self::new(redis_url)?;
        let mut test_conn = store.connection().await?;
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CounterError::Connection(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis counter store");

        Ok(store)
    }

    /// Shared connection, established on first call. A failed attempt leaves
    /// the cell empty so the next call tries again.
    async fn connection(&self) -> CounterResult<ConnectionManager> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new(self.client.clone()).await.map_err(|e| {
                    CounterError::Connection(format!("Failed to connect to Redis: {}", e))
                })?;
                info!("Redis counter store connection established");
                Ok::<_, CounterError>(manager)
            })
            .await?;

        Ok(manager.clone())
    }
}

fn millis(ttl: i64) -> Duration {
    Duration::from_millis(ttl.max(0) as u64)
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn hit(&self, key: &str, limit: u64, window: Duration) -> CounterResult<WindowHit> {
        let mut conn = self.connection().await?;
        let window_ms = window.as_millis().max(1) as u64;

        let (count, ttl, allowed): (i64, i64, i64) = self
            .script
            .key(key)
            .arg(limit)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CounterError::Operation(format!("Rate limit script failed: {}", e)))?;

        debug!(key, count, ttl_ms = ttl, allowed = allowed == 1, "Counter hit");

        Ok(WindowHit {
            count: count.max(0) as u64,
            allowed: allowed == 1,
            reset_after: millis(ttl),
        })
    }

    async fn peek(&self, key: &str) -> CounterResult<Option<CounterSnapshot>> {
        let mut conn = self.connection().await?;

        let count: Option<u64> = conn
            .get(key)
            .await
            .map_err(|e| CounterError::Operation(format!("Redis GET failed: {}", e)))?;

        let Some(count) = count else {
            return Ok(None);
        };

        let ttl: i64 = conn
            .pttl(key)
            .await
            .map_err(|e| CounterError::Operation(format!("Redis PTTL failed: {}", e)))?;

        Ok(Some(CounterSnapshot {
            count,
            reset_after: millis(ttl),
        }))
    }

    async fn reset(&self, key: &str) -> CounterResult<()> {
        let mut conn = self.connection().await?;

        conn.del::<_, i32>(key)
            .await
            .map_err(|e| CounterError::Operation(format!("Redis DEL failed: {}", e)))?;

        Ok(())
    }

    async fn health_check(&self) -> bool {
        match self.connection().await {
            Ok(mut conn) => conn.ping::<()>().await.is_ok(),
            Err(e) => {
                debug!(error = %e, "Redis health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn test_negative_ttl_clamps_to_zero() {
        assert_eq!(millis(-2), Duration::ZERO);
        assert_eq!(millis(1500), Duration::from_millis(1500));
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        assert!(matches!(
            RedisCounterStore::new("not a url"),
            Err(CounterError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_redis_reports_connection_error() {
        let store = RedisCounterStore::new("redis://127.0.0.1:1/").unwrap();

        assert!(!store.health_check().await);
        assert!(matches!(
            store.hit("rl:test", 5, Duration::from_secs(60)).await,
            Err(CounterError::Connection(_))
        ));
        assert!(store.manager.get().is_none());
    }

    fn unique_key(name: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        format!("rl:test:{name}:{nanos}")
    }

    /// Runs the hit script against a live Redis (`REDIS_URL`, default
    /// `redis://127.0.0.1:6379`).
    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_hit_script_against_redis() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let store = RedisCounterStore::connect(&url).await.unwrap();

        // Allow up to the limit, then deny without counting.
        let key = unique_key("ceiling");
        let window = Duration::from_secs(60);
        for expected in 1..=3 {
            let hit = store.hit(&key, 3, window).await.unwrap();
            assert!(hit.allowed);
            assert_eq!(hit.count, expected);
        }
        let denied = store.hit(&key, 3, window).await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.count, 3);
        assert_eq!(store.peek(&key).await.unwrap().unwrap().count, 3);

        // Later hits do not push the expiry out.
        let key_ttl = unique_key("ttl");
        let opened = store.hit(&key_ttl, 10, window).await.unwrap();
        assert!(opened.reset_after <= window);
        tokio::time::sleep(Duration::from_millis(300)).await;
        let later = store.hit(&key_ttl, 10, window).await.unwrap();
        assert_eq!(later.count, 2);
        assert!(later.reset_after < opened.reset_after);

        // A new window starts once the old one expires.
        let key_expiry = unique_key("expiry");
        let short = Duration::from_millis(200);
        assert!(store.hit(&key_expiry, 1, short).await.unwrap().allowed);
        assert!(!store.hit(&key_expiry, 1, short).await.unwrap().allowed);
        tokio::time::sleep(Duration::from_millis(350)).await;
        let reopened = store.hit(&key_expiry, 1, short).await.unwrap();
        assert!(reopened.allowed);
        assert_eq!(reopened.count, 1);

        for key in [&key, &key_ttl, &key_expiry] {
            store.reset(key).await.unwrap();
            assert!(store.peek(key).await.unwrap().is_none());
        }
    }
}
