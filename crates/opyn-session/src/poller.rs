//! Fixed-interval refresh of one remote dependency
//!
//! A [`Poller`] owns at most one timer. Every tick issues a read in its own
//! task, so a slow read never delays the next tick. Each read is stamped with
//! the poller's epoch and a sequence number when issued, and its result is
//! published only if the epoch is still current and no newer result has been
//! published. Changing the key or shutting down advances the epoch, which
//! makes every in-flight read of the previous key unpublishable.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opyn_core::SourceError;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Shortest interval a timer will run at
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// A remote read that can be refreshed for a key
#[async_trait]
pub trait Refresh: Send + Sync + 'static {
    /// What the read depends on; a new key restarts the timer
    type Key: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;
    type Output: Clone + Send + Sync + 'static;

    /// Dependency name used in logs
    fn name(&self) -> &'static str;

    async fn fetch(&self, key: &Self::Key) -> Result<Self::Output, SourceError>;
}

/// A published result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<T> {
    pub value: T,
    /// Issue order of the read that produced this value
    pub sequence: u64,
    pub published_at: DateTime<Utc>,
}

/// Counters for one poller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollerStats {
    pub ticks: u64,
    pub published: u64,
}

#[derive(Debug, Default)]
struct Gate {
    epoch: u64,
    issued: u64,
    applied: u64,
}

struct Shared<T> {
    gate: Mutex<Gate>,
    tx: watch::Sender<Option<Snapshot<T>>>,
    ticks: AtomicU64,
    published: AtomicU64,
}

impl<T> Shared<T> {
    /// Retire every read issued so far and clear the published value
    fn advance_epoch(&self) -> u64 {
        let mut gate = self.gate.lock();
        gate.epoch += 1;
        self.tx.send_replace(None);
        gate.epoch
    }

    /// Stamp a new read, or `None` if `epoch` has been retired
    fn issue(&self, epoch: u64) -> Option<u64> {
        let mut gate = self.gate.lock();
        if gate.epoch != epoch {
            return None;
        }
        gate.issued += 1;
        self.ticks.fetch_add(1, Ordering::Relaxed);
        Some(gate.issued)
    }

    fn publish(&self, epoch: u64, sequence: u64, value: T) -> bool {
        let mut gate = self.gate.lock();
        if gate.epoch != epoch || sequence <= gate.applied {
            return false;
        }
        gate.applied = sequence;
        self.tx.send_replace(Some(Snapshot {
            value,
            sequence,
            published_at: Utc::now(),
        }));
        self.published.fetch_add(1, Ordering::Relaxed);
        true
    }
}

struct Active<K> {
    key: K,
    timer: JoinHandle<()>,
}

/// Keeps the latest value of one dependency fresh for the current key
pub struct Poller<R: Refresh> {
    refresh: Arc<R>,
    interval: Duration,
    shared: Arc<Shared<R::Output>>,
    active: Mutex<Option<Active<R::Key>>>,
}

impl<R: Refresh> Poller<R> {
    pub fn new(refresh: Arc<R>, interval: Duration) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            refresh,
            interval: interval.max(MIN_INTERVAL),
            shared: Arc::new(Shared {
                gate: Mutex::new(Gate::default()),
                tx,
                ticks: AtomicU64::new(0),
                published: AtomicU64::new(0),
            }),
            active: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.refresh.name()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Point the poller at `key`.
    ///
    /// Re-arming with the key already running is a no-op. Otherwise the
    /// previous timer is cancelled, its in-flight reads are retired, and a
    /// new timer starts with an immediate first read. Must be called from
    /// within a Tokio runtime.
    pub fn set_key(&self, key: R::Key) {
        let mut active = self.active.lock();

        if let Some(current) = active.as_ref() {
            if current.key == key && !current.timer.is_finished() {
                return;
            }
        }
        if let Some(previous) = active.take() {
            previous.timer.abort();
        }

        let epoch = self.shared.advance_epoch();
        tracing::debug!(
            dependency = self.refresh.name(),
            key = ?key,
            epoch,
            interval_ms = self.interval.as_millis() as u64,
            "Arming refresh timer"
        );

        let timer = tokio::spawn(run_timer(
            Arc::clone(&self.refresh),
            Arc::clone(&self.shared),
            key.clone(),
            self.interval,
            epoch,
        ));
        *active = Some(Active { key, timer });
    }

    /// Cancel the timer and retire in-flight reads
    pub fn shutdown(&self) {
        if let Some(previous) = self.active.lock().take() {
            previous.timer.abort();
            self.shared.advance_epoch();
            tracing::debug!(dependency = self.refresh.name(), "Refresh timer stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|active| !active.timer.is_finished())
    }

    pub fn key(&self) -> Option<R::Key> {
        self.active.lock().as_ref().map(|active| active.key.clone())
    }

    pub fn latest(&self) -> Option<Snapshot<R::Output>> {
        self.shared.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot<R::Output>>> {
        self.shared.tx.subscribe()
    }

    pub fn stats(&self) -> PollerStats {
        PollerStats {
            ticks: self.shared.ticks.load(Ordering::Relaxed),
            published: self.shared.published.load(Ordering::Relaxed),
        }
    }
}

impl<R: Refresh> Drop for Poller<R> {
    fn drop(&mut self) {
        if let Some(previous) = self.active.get_mut().take() {
            previous.timer.abort();
            self.shared.advance_epoch();
        }
    }
}

async fn run_timer<R: Refresh>(
    refresh: Arc<R>,
    shared: Arc<Shared<R::Output>>,
    key: R::Key,
    interval: Duration,
    epoch: u64,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(sequence) = shared.issue(epoch) else {
            break;
        };

        let refresh = Arc::clone(&refresh);
        let shared = Arc::clone(&shared);
        let key = key.clone();
        tokio::spawn(async move {
            match refresh.fetch(&key).await {
                Ok(value) => {
                    if shared.publish(epoch, sequence, value) {
                        tracing::trace!(dependency = refresh.name(), sequence, "Refreshed");
                    } else {
                        tracing::debug!(
                            dependency = refresh.name(),
                            sequence,
                            "Discarding superseded result"
                        );
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        dependency = refresh.name(),
                        key = ?key,
                        sequence,
                        error = %e,
                        "Refresh failed, keeping last value"
                    );
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use tokio::sync::Notify;

    const INTERVAL: Duration = Duration::from_millis(1_000);

    /// Returns `"{key}-{call index}"`; selected calls block or fail
    #[derive(Default)]
    struct Scripted {
        calls: Mutex<Vec<String>>,
        held: Mutex<HashMap<usize, Arc<Notify>>>,
        failing: Mutex<HashSet<usize>>,
    }

    impl Scripted {
        fn hold(&self, call: usize) -> Arc<Notify> {
            let notify = Arc::new(Notify::new());
            self.held.lock().insert(call, Arc::clone(&notify));
            notify
        }

        fn fail(&self, call: usize) {
            self.failing.lock().insert(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl Refresh for Scripted {
        type Key = String;
        type Output = String;

        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn fetch(&self, key: &String) -> Result<String, SourceError> {
            let index = {
                let mut calls = self.calls.lock();
                calls.push(key.clone());
                calls.len() - 1
            };
            let hold = self.held.lock().get(&index).cloned();
            if let Some(notify) = hold {
                notify.notified().await;
            }
            if self.failing.lock().contains(&index) {
                return Err(SourceError::api("scripted", "unavailable"));
            }
            Ok(format!("{}-{}", key, index))
        }
    }

    fn poller() -> (Arc<Scripted>, Poller<Scripted>) {
        let refresh = Arc::new(Scripted::default());
        (Arc::clone(&refresh), Poller::new(refresh, INTERVAL))
    }

    /// Let spawned tasks run without reaching the next tick
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    fn latest_value(poller: &Poller<Scripted>) -> Option<String> {
        poller.latest().map(|snapshot| snapshot.value)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_read_is_immediate_then_periodic() {
        let (refresh, poller) = poller();
        poller.set_key("a".into());
        settle().await;

        assert_eq!(refresh.calls(), vec!["a"]);
        assert_eq!(latest_value(&poller).as_deref(), Some("a-0"));

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(refresh.calls().len(), 2);
        assert_eq!(latest_value(&poller).as_deref(), Some("a-1"));
        assert_eq!(poller.stats(), PollerStats { ticks: 2, published: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_key_does_not_rearm() {
        let (refresh, poller) = poller();
        poller.set_key("a".into());
        settle().await;
        poller.set_key("a".into());
        settle().await;

        assert_eq!(refresh.calls().len(), 1);
        assert_eq!(latest_value(&poller).as_deref(), Some("a-0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_change_replaces_timer() {
        let (refresh, poller) = poller();
        poller.set_key("a".into());
        settle().await;
        poller.set_key("b".into());
        settle().await;

        tokio::time::sleep(INTERVAL * 3).await;

        let calls = refresh.calls();
        assert_eq!(calls.iter().filter(|k| *k == "a").count(), 1);
        assert!(calls[1..].iter().all(|k| k == "b"));
        assert!(calls.len() >= 4);
        assert_eq!(poller.key().as_deref(), Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_for_old_key_is_discarded() {
        let (refresh, poller) = poller();
        let release_a = refresh.hold(0);
        refresh.fail(1);

        poller.set_key("a".into());
        settle().await;
        poller.set_key("b".into());
        settle().await;

        release_a.notify_one();
        settle().await;

        assert_eq!(refresh.calls(), vec!["a", "b"]);
        assert_eq!(latest_value(&poller), None);
        assert_eq!(poller.stats().published, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_result_does_not_overwrite_newer() {
        let (refresh, poller) = poller();
        let release_first = refresh.hold(0);

        poller.set_key("a".into());
        settle().await;
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(latest_value(&poller).as_deref(), Some("a-1"));

        release_first.notify_one();
        settle().await;

        let snapshot = poller.latest().unwrap();
        assert_eq!(snapshot.value, "a-1");
        assert_eq!(snapshot.sequence, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drops_in_flight_reads() {
        let (refresh, poller) = poller();
        let release = refresh.hold(0);

        poller.set_key("a".into());
        settle().await;
        poller.shutdown();
        assert!(!poller.is_running());

        release.notify_one();
        tokio::time::sleep(INTERVAL * 3).await;

        assert_eq!(refresh.calls().len(), 1);
        assert_eq!(latest_value(&poller), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_timer() {
        let (refresh, poller) = poller();
        poller.set_key("a".into());
        settle().await;
        drop(poller);

        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(refresh.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_waiting_for_next_tick() {
        let (refresh, poller) = poller();
        refresh.fail(0);

        poller.set_key("a".into());
        settle().await;
        assert_eq!(latest_value(&poller), None);
        assert!(poller.is_running());

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(latest_value(&poller).as_deref(), Some("a-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_read_does_not_delay_ticks() {
        let (refresh, poller) = poller();
        let _never = refresh.hold(0);

        poller.set_key("a".into());
        settle().await;
        tokio::time::sleep(INTERVAL * 2).await;

        assert_eq!(refresh.calls().len(), 3);
        assert_eq!(latest_value(&poller).as_deref(), Some("a-2"));
    }
}
