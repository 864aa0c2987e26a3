//! Sliding-window counter stores.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Script;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{LimitResult, RateLimitError};

/// Budget for connecting to and querying the counter store.
const STORE_TIMEOUT: Duration = Duration::from_millis(500);

/// Trim the window, count, conditionally record this hit, refresh expiry.
///
/// Returns `{allowed, count, oldest_score}`.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)
local allowed = 0
if count < limit then
    redis.call('ZADD', key, now, ARGV[4])
    count = count + 1
    allowed = 1
end
redis.call('PEXPIRE', key, window)

local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
local oldest_score = now
if oldest[2] then
    oldest_score = tonumber(oldest[2])
end
return {allowed, count, oldest_score}
"#;

/// Result of recording one hit in a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHit {
    pub allowed: bool,
    /// Hits inside the window after this one was (or was not) recorded.
    pub count: u32,
    /// Timestamp of the oldest hit still inside the window.
    pub oldest_ms: i64,
}

/// Backing counter for the limiter.
#[async_trait]
pub trait SlidingWindowStore: Send + Sync {
    /// Record a hit at `now_ms` if fewer than `limit` hits fall inside the
    /// `(now - window, now]` range.
    async fn hit(&self, key: &str, limit: u32, window_ms: i64, now_ms: i64) -> LimitResult<WindowHit>;
}

// =============================================================================
// Redis
// =============================================================================

/// Sorted-set sliding window in Redis, evaluated atomically by a Lua script.
///
/// The multiplexed connection is shared between hits. A connection that
/// fails is dropped and the hit is retried once on a fresh one.
pub struct RedisWindowStore {
    client: redis::Client,
    conn: Mutex<Option<MultiplexedConnection>>,
    script: Script,
}

impl RedisWindowStore {
    /// Create a store. Does not connect until the first hit.
    pub fn new(redis_url: &str) -> LimitResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            conn: Mutex::new(None),
            script: Script::new(SLIDING_WINDOW_SCRIPT),
        })
    }

    async fn connection(&self) -> LimitResult<MultiplexedConnection> {
        let mut slot = self.conn.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        let conn = tokio::time::timeout(STORE_TIMEOUT, self.client.get_multiplexed_async_connection())
            .await
            .map_err(|_| RateLimitError::Timeout(STORE_TIMEOUT.as_millis() as u64))?
            .map_err(|e| RateLimitError::connection_failed(e.to_string()))?;
        debug!("Connected to rate limit store");

        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn reset_connection(&self) {
        self.conn.lock().await.take();
    }

    async fn run_script(&self, key: &str, limit: u32, window_ms: i64, now_ms: i64, member: &str) -> LimitResult<Vec<i64>> {
        let mut conn = self.connection().await?;

        let invocation = async {
            let reply: Vec<i64> = self
                .script
                .key(key)
                .arg(now_ms)
                .arg(window_ms)
                .arg(limit)
                .arg(member)
                .invoke_async(&mut conn)
                .await?;
            Ok::<_, RateLimitError>(reply)
        };

        let result = tokio::time::timeout(STORE_TIMEOUT, invocation)
            .await
            .map_err(|_| RateLimitError::Timeout(STORE_TIMEOUT.as_millis() as u64))
            .and_then(|r| r);

        if result.is_err() {
            self.reset_connection().await;
        }
        result
    }
}

#[async_trait]
impl SlidingWindowStore for RedisWindowStore {
    async fn hit(&self, key: &str, limit: u32, window_ms: i64, now_ms: i64) -> LimitResult<WindowHit> {
        let member = format!("{}-{}", now_ms, uuid::Uuid::new_v4());

        let reply = match self.run_script(key, limit, window_ms, now_ms, &member).await {
            Err(RateLimitError::Redis(e)) => {
                debug!(error = %e, "Rate limit store connection lost, reconnecting");
                self.run_script(key, limit, window_ms, now_ms, &member).await?
            }
            other => other?,
        };

        match reply.as_slice() {
            [allowed, count, oldest] => Ok(WindowHit {
                allowed: *allowed == 1,
                count: (*count).max(0) as u32,
                oldest_ms: *oldest,
            }),
            other => Err(RateLimitError::UnexpectedReply(format!("{:?}", other))),
        }
    }
}

// =============================================================================
// Memory
// =============================================================================

/// Hits of one key and the window they were recorded with.
#[derive(Debug, Default)]
struct Window {
    hits: VecDeque<i64>,
    window_ms: i64,
}

impl Window {
    fn prune(&mut self, now_ms: i64) {
        while self.hits.front().is_some_and(|&t| t <= now_ms - self.window_ms) {
            self.hits.pop_front();
        }
    }

    fn is_expired(&self, now_ms: i64) -> bool {
        self.hits.back().map_or(true, |&t| t <= now_ms - self.window_ms)
    }
}

/// Process-local sliding window for development and tests.
///
/// Keys whose windows have emptied are dropped on the next hit.
#[derive(Debug, Default)]
pub struct MemoryWindowStore {
    windows: Mutex<HashMap<String, Window>>,
}

impl MemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.windows.lock().await.len()
    }
}

#[async_trait]
impl SlidingWindowStore for MemoryWindowStore {
    async fn hit(&self, key: &str, limit: u32, window_ms: i64, now_ms: i64) -> LimitResult<WindowHit> {
        let mut windows = self.windows.lock().await;
        windows.retain(|k, w| k == key || !w.is_expired(now_ms));

        let window = windows.entry(key.to_string()).or_default();
        window.window_ms = window_ms;
        window.prune(now_ms);

        let allowed = (window.hits.len() as u32) < limit;
        if allowed {
            window.hits.push_back(now_ms);
        }

        let hit = WindowHit {
            allowed,
            count: window.hits.len() as u32,
            oldest_ms: window.hits.front().copied().unwrap_or(now_ms),
        };

        if window.hits.is_empty() {
            windows.remove(key);
        }
        Ok(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use crate::{RateLimitTier, RateLimiter};

    /// Name and encoded length of the first complete RESP command in `buf`.
    fn parse_command(buf: &[u8]) -> Option<(String, usize)> {
        fn line(buf: &[u8], from: usize) -> Option<(&[u8], usize)> {
            let end = buf[from..].windows(2).position(|w| w == b"\r\n")? + from;
            Some((&buf[from..end], end + 2))
        }

        let (header, mut pos) = line(buf, 0)?;
        let count: usize = std::str::from_utf8(header.strip_prefix(b"*")?).ok()?.parse().ok()?;
        let mut name = None;
        for _ in 0..count {
            let (len_line, start) = line(buf, pos)?;
            let len: usize = std::str::from_utf8(len_line.strip_prefix(b"$")?).ok()?.parse().ok()?;
            let end = start + len;
            if buf.len() < end + 2 {
                return None;
            }
            if name.is_none() {
                name = Some(String::from_utf8_lossy(&buf[start..end]).to_uppercase());
            }
            pos = end + 2;
        }
        Some((name?, pos))
    }

    /// Answers scripts with `{allowed: 1, count: 1, oldest: 0}` and anything
    /// else with `+OK`. Closes the socket after the first script when asked.
    async fn serve_resp(mut socket: TcpStream, close_after_script: bool) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            while let Some((command, used)) = parse_command(&buf) {
                buf.drain(..used);
                let is_script = command == "EVALSHA" || command == "EVAL";
                let reply: &[u8] = if is_script { b"*3\r\n:1\r\n:1\r\n:0\r\n" } else { b"+OK\r\n" };
                if socket.write_all(reply).await.is_err() {
                    return;
                }
                if is_script && close_after_script {
                    return;
                }
            }
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        }
    }

    /// Counter server whose first connection drops after one script call.
    async fn flaky_counter_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut accepted = 0usize;
            while let Ok((socket, _)) = listener.accept().await {
                accepted += 1;
                tokio::spawn(serve_resp(socket, accepted == 1));
            }
        });
        format!("redis://{}", addr)
    }

    #[tokio::test]
    async fn test_memory_window_limits_and_slides() {
        let store = MemoryWindowStore::new();

        for i in 0..3 {
            let hit = store.hit("k", 3, 1_000, 100 + i).await.unwrap();
            assert!(hit.allowed);
            assert_eq!(hit.count, (i + 1) as u32);
            assert_eq!(hit.oldest_ms, 100);
        }

        let rejected = store.hit("k", 3, 1_000, 500).await.unwrap();
        assert!(!rejected.allowed);
        assert_eq!(rejected.count, 3);

        // The first hit leaves the window at 100 + 1000
        let allowed = store.hit("k", 3, 1_000, 1_100).await.unwrap();
        assert!(allowed.allowed);
        assert_eq!(allowed.oldest_ms, 101);
    }

    #[tokio::test]
    async fn test_memory_window_keys_are_independent() {
        let store = MemoryWindowStore::new();
        assert!(store.hit("a", 1, 1_000, 0).await.unwrap().allowed);
        assert!(!store.hit("a", 1, 1_000, 1).await.unwrap().allowed);
        assert!(store.hit("b", 1, 1_000, 1).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_memory_window_drops_idle_keys() {
        let store = MemoryWindowStore::new();
        store.hit("a", 5, 1_000, 0).await.unwrap();
        store.hit("b", 5, 60_000, 0).await.unwrap();
        assert_eq!(store.tracked_keys().await, 2);

        // "a" has emptied, "b" is still inside its minute
        store.hit("c", 5, 1_000, 2_000).await.unwrap();
        assert_eq!(store.tracked_keys().await, 2);

        store.hit("c", 5, 1_000, 120_000).await.unwrap();
        assert_eq!(store.tracked_keys().await, 1);

        // A zero limit never records, so nothing is kept
        assert!(!store.hit("d", 0, 1_000, 120_001).await.unwrap().allowed);
        assert_eq!(store.tracked_keys().await, 1);
    }

    #[test]
    fn test_redis_store_rejects_bad_url() {
        assert!(RedisWindowStore::new("not-a-url").is_err());
    }

    #[tokio::test]
    async fn test_limiter_enforces_again_after_connection_drop() {
        let url = flaky_counter_server().await;
        let limiter = RateLimiter::new(Arc::new(RedisWindowStore::new(&url).unwrap()));

        let first = limiter.check_at("ip:1.2.3.4", RateLimitTier::Chat, 1_000).await;
        assert_eq!((first.limit, first.remaining), (20, 19));

        // Let the client notice the closed socket
        tokio::time::sleep(Duration::from_millis(50)).await;

        for i in 0..3 {
            let result = limiter.check_at("ip:1.2.3.4", RateLimitTier::Chat, 2_000 + i).await;
            assert!(!result.is_fail_open(), "call {} failed open", i);
            assert_eq!((result.limit, result.remaining), (20, 19));
        }
    }

    #[tokio::test]
    async fn test_redis_store_unreachable_errors() {
        let store = RedisWindowStore::new("redis://127.0.0.1:1").unwrap();
        assert!(store.hit("k", 10, 1_000, 0).await.is_err());
    }
}
