use super::Middleware;
use crate::dispatcher::HandlerRequest;
use crate::reply::{Reply, ReplyPayload};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::warn;

/// Fixed-window rate limiter: at most `limit` requests per `window`, counted
/// with atomics so concurrent coroutines never block each other.
pub struct RateLimitMiddleware {
    limit: u32,
    window: Duration,
    epoch: Instant,
    /// Window start in milliseconds since `epoch`.
    window_start: AtomicU64,
    count: AtomicU32,
}

impl RateLimitMiddleware {
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            epoch: Instant::now(),
            window_start: AtomicU64::new(0),
            count: AtomicU32::new(0),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

impl Middleware for RateLimitMiddleware {
    fn call(&self, req: &HandlerRequest, reply: &Reply) -> anyhow::Result<Option<ReplyPayload>> {
        let now = self.now_ms();
        let start = self.window_start.load(Ordering::Acquire);
        if now.saturating_sub(start) >= self.window.as_millis() as u64 {
            // One coroutine wins the rollover; losers count into the window
            // the winner opened.
            if self
                .window_start
                .compare_exchange(start, now, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.count.store(0, Ordering::Release);
            }
        }

        let n = self.count.fetch_add(1, Ordering::AcqRel) + 1;
        if n > self.limit {
            warn!(
                request_id = %req.request_id,
                path = %req.path,
                count = n,
                limit = self.limit,
                "Rate limit exceeded"
            );
            return Ok(Some(reply.error(
                429,
                "rate_limited",
                Some("too many requests, retry later"),
            )));
        }
        Ok(None)
    }
}
