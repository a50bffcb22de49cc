use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};
use crate::error::{Error, Result};
use crate::metrics::{IN_FLIGHT, RATE_LIMIT_RETRIES, WINDOW_WAITS};

pub const DEFAULT_MAX_CONCURRENT: usize = 50;
pub const DEFAULT_MAX_PER_WINDOW: usize = 800;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Client-side request governor.
///
/// Bounds how many requests are in flight at once, how many are admitted in a
/// rolling window, and absorbs server rate-limit responses by sleeping for the
/// reset delay and re-issuing the same request.
pub struct RequestGovernor {
    permits: Semaphore,
    // admission timestamps, oldest first
    window: Mutex<VecDeque<Instant>>,
    max_per_window: usize,
    window_len: Duration,
}

impl RequestGovernor {
    pub fn new(max_concurrent: usize, max_per_window: usize, window_len: Duration) -> Self {
        Self {
            permits: Semaphore::new(max_concurrent.max(1)),
            window: Mutex::new(VecDeque::new()),
            max_per_window: max_per_window.max(1),
            window_len,
        }
    }

    /// Run one logical request under both ceilings.
    ///
    /// `issue` is called once per attempt. A [`Error::RateLimited`] result puts
    /// the request back through rate admission after the reset delay, with no
    /// attempt limit. Any other error is returned as is.
    pub async fn run<T, F, Fut>(&self, resource: &str, mut issue: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _permit = self.permits.acquire().await.map_err(|_| Error::Closed)?;
        IN_FLIGHT.inc();
        let _in_flight = InFlight;

        loop {
            self.admit(resource).await;

            match issue().await {
                Err(Error::RateLimited { reset_after, .. }) => {
                    RATE_LIMIT_RETRIES.inc();
                    warn!(
                        resource,
                        wait_secs = reset_after.as_secs_f64(),
                        "Rate limit exceeded, waiting for reset"
                    );
                    sleep(reset_after).await;
                }
                other => return other,
            }
        }
    }

    // Prune, wait if full, record. The lock is held throughout so concurrent
    // callers cannot both see the same free slot.
    async fn admit(&self, resource: &str) {
        let mut window = self.window.lock().await;
        let now = Instant::now();
        prune(&mut window, now, self.window_len);

        if window.len() >= self.max_per_window {
            if let Some(&oldest) = window.front() {
                let wait = (oldest + self.window_len).saturating_duration_since(now);
                WINDOW_WAITS.inc();
                info!(
                    resource,
                    wait_secs = wait.as_secs_f64(),
                    admitted = window.len(),
                    "Request window full, waiting"
                );
                sleep(wait).await;
                prune(&mut window, Instant::now(), self.window_len);
            }
        }

        window.push_back(Instant::now());
        debug!(resource, admitted = window.len(), "Request admitted");
    }

    /// Number of admissions still inside the current window.
    pub async fn admitted_in_window(&self) -> usize {
        let mut window = self.window.lock().await;
        prune(&mut window, Instant::now(), self.window_len);
        window.len()
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Default for RequestGovernor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_PER_WINDOW, DEFAULT_WINDOW)
    }
}

fn prune(window: &mut VecDeque<Instant>, now: Instant, window_len: Duration) {
    while let Some(&front) = window.front() {
        if now.saturating_duration_since(front) >= window_len {
            window.pop_front();
        } else {
            break;
        }
    }
}

// Keeps the in-flight gauge honest when the request future is dropped early
struct InFlight;

impl Drop for InFlight {
    fn drop(&mut self) {
        IN_FLIGHT.dec();
    }
}
