//! Weekly summary scheduling.
//!
//! A [`PeriodicScheduler`] polls wall-clock time on a fixed interval and
//! fires the weekly action at most once per ISO week, however often it
//! polls. The dedup gate is an explicit compare-and-set over the week key:
//! once the day/hour window matches, the week is marked fired *before* the
//! action runs, so a failed generation is not retried until the next week.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDateTime, Timelike, Weekday};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::dates::iso_week_key;
use crate::store::{SummaryKind, SummaryStore};

/// At-most-once-per-week firing gate.
///
/// `last_fired_week` is monotonically non-decreasing in calendar time and
/// survives scheduler stop/start cycles within one process run. It is not
/// persisted; after a restart the store's `exists` pre-check is the
/// remaining dedup layer.
#[derive(Debug)]
pub struct WeeklyGate {
    target_day: Weekday,
    target_hour: u32,
    last_fired_week: Option<String>,
}

impl WeeklyGate {
    pub fn new(target_day: Weekday, target_hour: u32) -> Self {
        Self {
            target_day,
            target_hour,
            last_fired_week: None,
        }
    }

    /// Compare-and-set: returns the week key to fire for, or `None`.
    ///
    /// Marks the week fired unconditionally when the window matches, even
    /// though the caller's action may still fail.
    pub fn check(&mut self, now: NaiveDateTime) -> Option<String> {
        if now.weekday() != self.target_day || now.hour() != self.target_hour {
            return None;
        }

        let week = iso_week_key(now.date());
        if self.last_fired_week.as_deref() == Some(week.as_str()) {
            return None;
        }

        self.last_fired_week = Some(week.clone());
        Some(week)
    }

    pub fn last_fired_week(&self) -> Option<&str> {
        self.last_fired_week.as_deref()
    }
}

/// The action invoked when the weekly window fires.
#[async_trait]
pub trait WeeklyAction: Send + Sync {
    async fn run(&self, week_key: &str) -> anyhow::Result<()>;
}

/// Recurring poll loop driving a [`WeeklyGate`].
///
/// Two states: Idle (no task) and Armed (interval task running). `start`
/// is idempotent and checks task liveness rather than handle identity;
/// `stop` cancels the task but keeps the gate, so re-arming within the
/// same week does not re-fire.
pub struct PeriodicScheduler {
    gate: Arc<Mutex<WeeklyGate>>,
    action: Arc<dyn WeeklyAction>,
    store: SummaryStore,
    poll_interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicScheduler {
    pub fn new(
        gate: WeeklyGate,
        action: Arc<dyn WeeklyAction>,
        store: SummaryStore,
        poll_interval: Duration,
    ) -> Self {
        Self {
            gate: Arc::new(Mutex::new(gate)),
            action,
            store,
            poll_interval,
            handle: None,
        }
    }

    /// Idle → Armed. No-op while the poll task is still alive.
    pub fn start(&mut self) {
        if self.is_armed() {
            return;
        }

        let gate = Arc::clone(&self.gate);
        let action = Arc::clone(&self.action);
        let store = self.store.clone();
        let poll_interval = self.poll_interval;

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                ticker.tick().await;

                let now = Local::now().naive_local();
                let fired = gate.lock().await.check(now);
                let Some(week) = fired else {
                    continue;
                };

                // Covers a manual generation earlier the same week, and
                // duplicates after a process restart once the file exists.
                if store.exists(SummaryKind::Weekly, &week) {
                    info!(week = %week, "Weekly summary already exists, skipping generation");
                    continue;
                }

                info!(week = %week, "Weekly summary window reached, generating");
                if let Err(e) = action.run(&week).await {
                    // Gate already marked this week fired: no retry until
                    // the next week. One bad tick never un-arms the timer.
                    error!(week = %week, error = %e, "Weekly generation failed");
                }
            }
        }));
    }

    /// Armed → Idle. Cancels the pending poll; the gate state persists.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub async fn last_fired_week(&self) -> Option<String> {
        self.gate
            .lock()
            .await
            .last_fired_week()
            .map(str::to_string)
    }
}

impl Drop for PeriodicScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Explicit per-project scheduler registry, owned by the hosting shell and
/// injected where needed. Entries are created lazily and never evicted for
/// the process lifetime; the number of open projects is small and bounded
/// by user action.
#[derive(Default)]
pub struct SchedulerRegistry {
    schedulers: Mutex<HashMap<PathBuf, Arc<Mutex<PeriodicScheduler>>>>,
}

impl SchedulerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_create<F>(
        &self,
        project: &Path,
        build: F,
    ) -> Arc<Mutex<PeriodicScheduler>>
    where
        F: FnOnce() -> PeriodicScheduler,
    {
        let mut map = self.schedulers.lock().await;
        map.entry(project.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(build())))
            .clone()
    }

    pub async fn stop_all(&self) {
        for scheduler in self.schedulers.lock().await.values() {
            scheduler.lock().await.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_gate_fires_once_per_week() {
        // 2024-06-06 is a Thursday in ISO week 2024-W23
        let mut gate = WeeklyGate::new(Weekday::Thu, 17);

        assert_eq!(gate.check(dt(2024, 6, 6, 17)).as_deref(), Some("2024-W23"));
        // Second tick in the same hour: suppressed
        assert_eq!(gate.check(dt(2024, 6, 6, 17)), None);
        // Next Thursday fires for the following week
        assert_eq!(gate.check(dt(2024, 6, 13, 17)).as_deref(), Some("2024-W24"));
    }

    #[test]
    fn test_gate_ignores_wrong_window() {
        let mut gate = WeeklyGate::new(Weekday::Thu, 17);

        assert_eq!(gate.check(dt(2024, 6, 5, 17)), None); // Wednesday
        assert_eq!(gate.check(dt(2024, 6, 6, 16)), None); // wrong hour
        assert_eq!(gate.last_fired_week(), None);
    }

    #[test]
    fn test_gate_marks_before_action_runs() {
        let mut gate = WeeklyGate::new(Weekday::Thu, 17);

        let fired = gate.check(dt(2024, 6, 6, 17));
        assert!(fired.is_some());
        // The mark is set by check itself, regardless of what the caller
        // does with the returned key.
        assert_eq!(gate.last_fired_week(), Some("2024-W23"));
    }

    struct CountingAction(AtomicUsize);

    #[async_trait]
    impl WeeklyAction for CountingAction {
        async fn run(&self, _week_key: &str) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_store(dir: &Path) -> SummaryStore {
        SummaryStore::new(dir.join("daily"), dir.join("weekly"))
    }

    /// Gate matching the current wall-clock window, so ticks fire now.
    fn open_gate() -> WeeklyGate {
        let now = Local::now().naive_local();
        WeeklyGate::new(now.weekday(), now.hour())
    }

    #[tokio::test]
    async fn test_scheduler_fires_action_at_most_once() {
        let dir = tempdir().unwrap();
        let action = Arc::new(CountingAction(AtomicUsize::new(0)));

        let mut scheduler = PeriodicScheduler::new(
            open_gate(),
            action.clone(),
            test_store(dir.path()),
            Duration::from_millis(10),
        );

        scheduler.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.stop();

        // Many ticks, one firing
        assert_eq!(action.0.load(Ordering::SeqCst), 1);

        let now = Local::now().naive_local();
        assert_eq!(
            scheduler.last_fired_week().await.as_deref(),
            Some(iso_week_key(now.date()).as_str())
        );
    }

    #[tokio::test]
    async fn test_scheduler_start_is_idempotent() {
        let dir = tempdir().unwrap();
        let action = Arc::new(CountingAction(AtomicUsize::new(0)));

        let mut scheduler = PeriodicScheduler::new(
            open_gate(),
            action.clone(),
            test_store(dir.path()),
            Duration::from_millis(10),
        );

        scheduler.start();
        scheduler.start();
        assert!(scheduler.is_armed());

        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.stop();
        assert!(!scheduler.is_armed());

        assert_eq!(action.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scheduler_skips_when_artifact_exists() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path());
        let week = iso_week_key(Local::now().date_naive());
        store
            .save(SummaryKind::Weekly, &week, "already generated")
            .unwrap();

        let action = Arc::new(CountingAction(AtomicUsize::new(0)));
        let mut scheduler = PeriodicScheduler::new(
            open_gate(),
            action.clone(),
            store,
            Duration::from_millis(10),
        );

        scheduler.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.stop();

        assert_eq!(action.0.load(Ordering::SeqCst), 0);
        // The gate still marked the week: the window was consumed
        assert_eq!(scheduler.last_fired_week().await.as_deref(), Some(week.as_str()));
    }

    #[tokio::test]
    async fn test_gate_survives_stop_start() {
        let dir = tempdir().unwrap();
        let action = Arc::new(CountingAction(AtomicUsize::new(0)));

        let mut scheduler = PeriodicScheduler::new(
            open_gate(),
            action.clone(),
            test_store(dir.path()),
            Duration::from_millis(10),
        );

        scheduler.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.stop();

        scheduler.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.stop();

        // Re-arming within the same week must not re-fire
        assert_eq!(action.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_registry_returns_same_instance() {
        let dir = tempdir().unwrap();
        let registry = SchedulerRegistry::new();

        let build = || {
            PeriodicScheduler::new(
                WeeklyGate::new(Weekday::Thu, 17),
                Arc::new(CountingAction(AtomicUsize::new(0))),
                test_store(dir.path()),
                Duration::from_secs(3600),
            )
        };

        let a = registry.get_or_create(Path::new("/proj"), build).await;
        let b = registry.get_or_create(Path::new("/proj"), build).await;

        assert!(Arc::ptr_eq(&a, &b));
    }
}
