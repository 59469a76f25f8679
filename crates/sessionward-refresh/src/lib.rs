//! Credential renewal scheduler for Sessionward.
//!
//! Keeps at most ONE renewal timer armed. Arming a new timer always
//! disarms the previous one, so a session can never end up with two
//! renewals racing each other.
//!
//! # When to renew
//!
//! The timer fires a little before the short-lived credential expires:
//!
//! ```text
//! leeway = max(fixed_leeway, ceil(10% of remaining))
//! delay  = max(remaining - leeway, min_delay)
//! ```
//!
//! The fixed floor absorbs clock skew and network latency for
//! short-lived credentials; the proportional term keeps long-lived ones
//! from renewing needlessly early; `min_delay` prevents a zero or
//! negative delay from turning into a renewal loop.
//!
//! # Integration
//!
//! ```ignore
//! let delay = scheduler.schedule_renewal(grant.expires_in_seconds as i64, Box::pin(async move {
//!     if let Some(manager) = weak.upgrade() {
//!         manager.refresh().await;
//!     }
//! }));
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// The work a timer runs when it fires.
///
/// Boxed so the session manager can hand over a future that itself
/// re-arms the scheduler without creating a recursive future type.
pub type RenewalTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Deadline used when a server-supplied lifetime overflows the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How early to renew, and the bounds on the computed delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Minimum safety margin before expiry. Also the threshold below
    /// which a stored credential is renewed immediately at startup.
    ///
    /// Default: 60 seconds.
    pub fixed_leeway: Duration,

    /// Safety margin as a percentage of the remaining lifetime, used
    /// when it exceeds `fixed_leeway`. Rounded up to whole seconds.
    ///
    /// Default: 10.
    pub proportional_leeway_percent: u32,

    /// Shortest delay ever scheduled.
    ///
    /// Default: 5 seconds.
    pub min_delay: Duration,

    /// Random extra delay (0..max) added to each deadline so processes
    /// sharing one store don't all renew in the same instant.
    ///
    /// Default: zero (no jitter).
    pub max_jitter: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            fixed_leeway: Duration::from_secs(60),
            proportional_leeway_percent: 10,
            min_delay: Duration::from_secs(5),
            max_jitter: Duration::ZERO,
        }
    }
}

impl RefreshPolicy {
    /// Largest accepted proportional leeway.
    pub const MAX_PROPORTIONAL_PERCENT: u32 = 100;

    /// Clamp and fix any out-of-range values so the policy is safe to use.
    ///
    /// Called automatically by [`RefreshScheduler::new`]. Rules:
    /// - `proportional_leeway_percent` capped to [`Self::MAX_PROPORTIONAL_PERCENT`].
    /// - `min_delay` raised to at least one second.
    pub fn validated(mut self) -> Self {
        if self.proportional_leeway_percent > Self::MAX_PROPORTIONAL_PERCENT {
            warn!(
                percent = self.proportional_leeway_percent,
                max = Self::MAX_PROPORTIONAL_PERCENT,
                "proportional leeway exceeds maximum, clamping"
            );
            self.proportional_leeway_percent = Self::MAX_PROPORTIONAL_PERCENT;
        }
        if self.min_delay < Duration::from_secs(1) {
            warn!(
                min_delay_ms = self.min_delay.as_millis() as u64,
                "min_delay below one second, raising to 1s"
            );
            self.min_delay = Duration::from_secs(1);
        }
        self
    }

    /// Leeway in seconds for a credential with `remaining_secs` left.
    pub fn leeway_secs(&self, remaining_secs: i64) -> i64 {
        let fixed = secs_i64(self.fixed_leeway);
        let proportional = if remaining_secs > 0 {
            // ceil(remaining * percent / 100) in integer arithmetic.
            remaining_secs
                .saturating_mul(i64::from(self.proportional_leeway_percent))
                .saturating_add(99)
                / 100
        } else {
            0
        };
        fixed.max(proportional)
    }

    /// Delay before the renewal of a credential with `remaining_secs` left.
    pub fn delay_for(&self, remaining_secs: i64) -> Duration {
        let raw = remaining_secs.saturating_sub(self.leeway_secs(remaining_secs));
        let floored = raw.max(secs_i64(self.min_delay));
        Duration::from_secs(floored.max(0) as u64)
    }

    /// `true` when a credential is so close to expiry (or past it) that
    /// it should be renewed now instead of scheduled.
    pub fn renew_immediately(&self, remaining_secs: i64) -> bool {
        remaining_secs <= secs_i64(self.fixed_leeway)
    }
}

fn secs_i64(d: Duration) -> i64 {
    i64::try_from(d.as_secs()).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Counters describing what the scheduler has done so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// Timers armed (including ones later replaced or cancelled).
    pub armed: u64,
    /// Timers that reached their deadline and ran their task.
    pub fired: u64,
    /// Timers disarmed by [`RefreshScheduler::cancel`].
    pub cancelled: u64,
    /// Timers disarmed because a newer one replaced them.
    pub superseded: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

struct PendingRenewal {
    id: u64,
    delay: Duration,
    deadline: Instant,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Shared {
    pending: Mutex<Option<PendingRenewal>>,
    stats: Mutex<RefreshStats>,
    next_id: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-timer renewal scheduler.
///
/// Must be used from within a Tokio runtime: each armed timer is a
/// spawned task that sleeps until its deadline. Dropping the scheduler
/// disarms any pending timer.
pub struct RefreshScheduler {
    policy: RefreshPolicy,
    shared: Arc<Shared>,
}

impl RefreshScheduler {
    /// Creates a scheduler with nothing armed.
    pub fn new(policy: RefreshPolicy) -> Self {
        let policy = policy.validated();
        debug!(
            fixed_leeway_secs = policy.fixed_leeway.as_secs(),
            percent = policy.proportional_leeway_percent,
            min_delay_secs = policy.min_delay.as_secs(),
            "refresh scheduler created"
        );
        Self {
            policy,
            shared: Arc::new(Shared::default()),
        }
    }

    /// The (validated) policy in use.
    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    /// Arms the timer to run `task` for a credential with
    /// `remaining_secs` left, using the policy's delay. Returns the delay.
    pub fn schedule_renewal(&self, remaining_secs: i64, task: RenewalTask) -> Duration {
        let delay = self.policy.delay_for(remaining_secs);
        debug!(remaining_secs, delay_secs = delay.as_secs(), "renewal scheduled");
        self.schedule(delay, task);
        delay
    }

    /// Arms the timer to run `task` after `delay` (plus jitter),
    /// replacing whatever was pending.
    pub fn schedule(&self, delay: Duration, task: RenewalTask) {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();
        let deadline = now
            .checked_add(delay.saturating_add(self.jitter()))
            .unwrap_or_else(|| now + FAR_FUTURE);

        // Hold the slot while spawning so the new task can't observe the
        // previous occupant.
        let mut pending = lock(&self.shared.pending);
        if let Some(previous) = pending.take() {
            previous.handle.abort();
            lock(&self.shared.stats).superseded += 1;
            trace!(id = previous.id, "pending renewal superseded");
        }

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            time::sleep_until(deadline).await;

            // Leave the slot before running, so the task may re-arm the
            // scheduler without aborting itself.
            {
                let mut pending = lock(&shared.pending);
                match pending.as_ref() {
                    Some(current) if current.id == id => {
                        pending.take();
                    }
                    _ => return,
                }
            }
            lock(&shared.stats).fired += 1;
            trace!(id, "renewal timer fired");

            task.await;
        });

        *pending = Some(PendingRenewal {
            id,
            delay,
            deadline,
            handle,
        });
        lock(&self.shared.stats).armed += 1;
    }

    /// Disarms the pending timer. Returns `true` if one was armed.
    pub fn cancel(&self) -> bool {
        let Some(previous) = lock(&self.shared.pending).take() else {
            return false;
        };
        previous.handle.abort();
        lock(&self.shared.stats).cancelled += 1;
        debug!(id = previous.id, "pending renewal cancelled");
        true
    }

    /// Whether a timer is currently armed.
    pub fn is_armed(&self) -> bool {
        lock(&self.shared.pending).is_some()
    }

    /// The delay the pending timer was armed with (jitter excluded).
    pub fn pending_delay(&self) -> Option<Duration> {
        lock(&self.shared.pending).as_ref().map(|p| p.delay)
    }

    /// When the pending timer fires (jitter included).
    pub fn deadline(&self) -> Option<Instant> {
        lock(&self.shared.pending).as_ref().map(|p| p.deadline)
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> RefreshStats {
        lock(&self.shared.stats).clone()
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.policy.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max_ms))
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(RefreshPolicy::default())
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(pending) = lock(&self.shared.pending).take() {
            pending.handle.abort();
        }
    }
}
