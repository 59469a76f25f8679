//! Integration tests for the renewal scheduler.
//!
//! Timer tests run with `start_paused = true`: the clock auto-advances
//! to the next pending timer whenever every task is idle, so an hour of
//! simulated time passes instantly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use sessionward_refresh::{RefreshPolicy, RefreshScheduler, RefreshStats, RenewalTask};
use tokio::time::{Instant, sleep};

// =========================================================================
// Helpers
// =========================================================================

fn counting_task(counter: &Arc<AtomicUsize>) -> RenewalTask {
    let counter = Arc::clone(counter);
    Box::pin(async move {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

// =========================================================================
// RefreshPolicy
// =========================================================================

#[test]
fn test_default_policy_values() {
    let policy = RefreshPolicy::default();
    assert_eq!(policy.fixed_leeway, secs(60));
    assert_eq!(policy.proportional_leeway_percent, 10);
    assert_eq!(policy.min_delay, secs(5));
    assert_eq!(policy.max_jitter, Duration::ZERO);
}

#[test]
fn test_delay_for_one_hour_renews_at_3240s() {
    let policy = RefreshPolicy::default();
    assert_eq!(policy.leeway_secs(3600), 360);
    assert_eq!(policy.delay_for(3600), secs(3240));
}

#[test]
fn test_delay_for_one_day_uses_proportional_leeway() {
    let policy = RefreshPolicy::default();
    assert_eq!(policy.delay_for(86_400), secs(77_760));
}

#[test]
fn test_delay_for_short_lifetimes_floors_at_min_delay() {
    let policy = RefreshPolicy::default();
    assert_eq!(policy.delay_for(10), secs(5));
    assert_eq!(policy.delay_for(65), secs(5));
    assert_eq!(policy.delay_for(66), secs(6));
    assert_eq!(policy.delay_for(0), secs(5));
    assert_eq!(policy.delay_for(-300), secs(5));
}

#[test]
fn test_delay_for_two_minutes_uses_fixed_leeway() {
    let policy = RefreshPolicy::default();
    assert_eq!(policy.leeway_secs(121), 60);
    assert_eq!(policy.delay_for(121), secs(61));
}

#[test]
fn test_leeway_rounds_proportional_term_up() {
    let policy = RefreshPolicy::default();
    // 10% of 601 is 60.1, rounded up to 61.
    assert_eq!(policy.leeway_secs(600), 60);
    assert_eq!(policy.leeway_secs(601), 61);
    assert_eq!(policy.delay_for(601), secs(540));
}

#[test]
fn test_leeway_huge_lifetime_does_not_overflow() {
    let policy = RefreshPolicy::default();
    let delay = policy.delay_for(i64::MAX);
    assert!(delay > secs(0));
}

#[test]
fn test_renew_immediately_at_or_below_fixed_leeway() {
    let policy = RefreshPolicy::default();
    assert!(policy.renew_immediately(60));
    assert!(policy.renew_immediately(0));
    assert!(policy.renew_immediately(-5));
    assert!(!policy.renew_immediately(61));
}

#[test]
fn test_validated_clamps_out_of_range_values() {
    let policy = RefreshPolicy {
        proportional_leeway_percent: 250,
        min_delay: Duration::ZERO,
        ..RefreshPolicy::default()
    }
    .validated();

    assert_eq!(policy.proportional_leeway_percent, 100);
    assert_eq!(policy.min_delay, secs(1));
}

#[test]
fn test_validated_keeps_sane_values() {
    let policy = RefreshPolicy::default().validated();
    assert_eq!(policy, RefreshPolicy::default());
}

// =========================================================================
// Scheduler accessors
// =========================================================================

#[test]
fn test_new_scheduler_is_idle() {
    let scheduler = RefreshScheduler::default();
    assert!(!scheduler.is_armed());
    assert_eq!(scheduler.pending_delay(), None);
    assert_eq!(scheduler.deadline(), None);
    assert_eq!(scheduler.stats(), RefreshStats::default());
}

#[test]
fn test_new_scheduler_validates_policy() {
    let scheduler = RefreshScheduler::new(RefreshPolicy {
        proportional_leeway_percent: 1_000,
        ..RefreshPolicy::default()
    });
    assert_eq!(scheduler.policy().proportional_leeway_percent, 100);
}

#[test]
fn test_cancel_when_idle_returns_false() {
    let scheduler = RefreshScheduler::default();
    assert!(!scheduler.cancel());
    assert_eq!(scheduler.stats().cancelled, 0);
}

// =========================================================================
// Timer firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_schedule_renewal_fires_after_computed_delay() {
    let scheduler = RefreshScheduler::default();
    let fired = Arc::new(AtomicUsize::new(0));

    let delay = scheduler.schedule_renewal(3600, counting_task(&fired));
    assert_eq!(delay, secs(3240));
    assert_eq!(scheduler.pending_delay(), Some(secs(3240)));
    assert!(scheduler.is_armed());

    sleep(secs(3239)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    sleep(secs(2)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(!scheduler.is_armed());
    assert_eq!(scheduler.stats().fired, 1);
}

#[tokio::test(start_paused = true)]
async fn test_schedule_replaces_pending_timer() {
    let scheduler = RefreshScheduler::default();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    scheduler.schedule(secs(10), counting_task(&first));
    scheduler.schedule(secs(20), counting_task(&second));

    sleep(secs(30)).await;
    assert_eq!(first.load(Ordering::SeqCst), 0, "replaced timer must not fire");
    assert_eq!(second.load(Ordering::SeqCst), 1);

    let stats = scheduler.stats();
    assert_eq!(stats.armed, 2);
    assert_eq!(stats.superseded, 1);
    assert_eq!(stats.fired, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_prevents_firing() {
    let scheduler = RefreshScheduler::default();
    let fired = Arc::new(AtomicUsize::new(0));

    scheduler.schedule(secs(10), counting_task(&fired));
    assert!(scheduler.cancel());
    assert!(!scheduler.is_armed());
    assert!(!scheduler.cancel());

    sleep(secs(60)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(scheduler.stats().cancelled, 1);
}

#[tokio::test(start_paused = true)]
async fn test_task_can_rearm_scheduler_without_aborting_itself() {
    let scheduler = Arc::new(RefreshScheduler::default());
    let fired = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicBool::new(false));

    let task: RenewalTask = {
        let scheduler = Arc::clone(&scheduler);
        let fired = Arc::clone(&fired);
        let finished = Arc::clone(&finished);
        Box::pin(async move {
            fired.fetch_add(1, Ordering::SeqCst);
            scheduler.schedule(secs(100), Box::pin(async {}));
            // An abort would land at this await point.
            tokio::task::yield_now().await;
            finished.store(true, Ordering::SeqCst);
        })
    };
    scheduler.schedule(secs(10), task);

    sleep(secs(11)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(finished.load(Ordering::SeqCst));
    assert!(scheduler.is_armed());
    assert_eq!(scheduler.pending_delay(), Some(secs(100)));
    assert_eq!(scheduler.stats().superseded, 0);
}

#[tokio::test(start_paused = true)]
async fn test_jitter_delays_deadline_within_bound() {
    let scheduler = RefreshScheduler::new(RefreshPolicy {
        max_jitter: secs(2),
        ..RefreshPolicy::default()
    });
    let start = Instant::now();

    scheduler.schedule(secs(10), Box::pin(async {}));

    let deadline = scheduler.deadline().unwrap();
    assert!(deadline >= start + secs(10));
    assert!(deadline < start + secs(12));
    assert_eq!(scheduler.pending_delay(), Some(secs(10)));
}

#[tokio::test(start_paused = true)]
async fn test_drop_disarms_pending_timer() {
    let fired = Arc::new(AtomicUsize::new(0));
    {
        let scheduler = RefreshScheduler::default();
        scheduler.schedule(secs(5), counting_task(&fired));
    }

    sleep(secs(10)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}
