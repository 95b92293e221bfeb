//! Periodic refresh: turns clock ticks into [`RefreshChargeEvent`]s.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use {
    tokio::{
        sync::Mutex,
        task::JoinHandle,
        time::{self, MissedTickBehavior},
    },
    tracing::{debug, error, info, warn},
};

use crate::{Result, clock::Clock, events::RefreshChargeEvent, store::SkillMutator};

/// Default refresh cadence.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(1000);

/// Shortest cadence the ticker accepts.
pub const MIN_PERIOD: Duration = Duration::from_millis(10);

/// Repeating task that refreshes every skill's charge from the clock.
///
/// Stopping it needs no cleanup: each refresh is a single atomic store write.
/// The loop holds only a weak reference, and dropping the ticker aborts it.
pub struct RefreshTicker {
    mutator: Arc<dyn SkillMutator>,
    clock: Arc<dyn Clock>,
    period: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshTicker {
    pub fn new(mutator: Arc<dyn SkillMutator>, clock: Arc<dyn Clock>, period: Duration) -> Arc<Self> {
        let period = if period < MIN_PERIOD {
            warn!(?period, min = ?MIN_PERIOD, "refresh period too short, clamping");
            MIN_PERIOD
        } else {
            period
        };
        Arc::new(Self {
            mutator,
            clock,
            period,
            handle: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start the loop. Calling it while already running does nothing.
    pub async fn start(self: &Arc<Self>) {
        let mut handle = self.handle.lock().await;
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("refresh ticker already running");
            return;
        }
        *handle = Some(tokio::spawn(Self::run(Arc::downgrade(self), self.period)));
        info!(period_ms = period_ms(self.period), "refresh ticker started");
    }

    /// Stop the loop.
    pub async fn stop(&self) {
        if let Some(h) = self.handle.lock().await.take() {
            h.abort();
            info!("refresh ticker stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Refresh once with the clock's current instant.
    pub async fn tick(&self) -> Result<usize> {
        let event = RefreshChargeEvent {
            now: self.clock.now(),
        };
        self.mutator.handle_refresh(event).await
    }

    async fn run(ticker: Weak<Self>, period: Duration) {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Some(ticker) = ticker.upgrade() else {
                debug!("refresh ticker dropped, loop exiting");
                return;
            };
            match ticker.tick().await {
                Ok(0) => {},
                Ok(count) => debug!(count, "refresh tick recharged skills"),
                // Healthy skills were still credited; the failing one is
                // reported on every tick until it is removed.
                Err(e) => error!(error = %e, defect = e.is_defect(), "refresh tick failed"),
            }
        }
    }
}

impl Drop for RefreshTicker {
    fn drop(&mut self) {
        if let Some(h) = self.handle.get_mut().take() {
            h.abort();
        }
    }
}

/// Milliseconds for logging, saturating instead of truncating.
pub(crate) fn period_ms(period: Duration) -> u64 {
    u64::try_from(period.as_millis()).unwrap_or(u64::MAX)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            clock::ManualClock,
            events::{CreateSkillEvent, UseSkillEvent},
            policy::RecastPolicy,
            store::SkillReader,
            store_memory::InMemorySkillStore,
            types::SkillName,
        },
        chrono::{NaiveDate, NaiveDateTime, TimeDelta},
    };

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    async fn store_with_spent_skill() -> (Arc<InMemorySkillStore>, crate::types::SkillId) {
        let store = Arc::new(InMemorySkillStore::new());
        let event = CreateSkillEvent::new(
            SkillName::new("Dash").unwrap(),
            1,
            RecastPolicy::duration(TimeDelta::seconds(60)).unwrap(),
            false,
            t0(),
        )
        .unwrap();
        let id = store.handle_create(event).await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_tick_uses_clock() {
        let (store, id) = store_with_spent_skill().await;
        let clock = Arc::new(ManualClock::new(t0()));
        let ticker = RefreshTicker::new(store.clone(), clock.clone(), DEFAULT_PERIOD);

        assert_eq!(ticker.tick().await.unwrap(), 0);
        clock.advance(TimeDelta::seconds(60));
        assert_eq!(ticker.tick().await.unwrap(), 1);
        assert_eq!(store.get_by_id(id).await.unwrap().casting_charge(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_refreshes_until_stopped() {
        let (store, id) = store_with_spent_skill().await;
        let clock = Arc::new(ManualClock::new(t0()));
        let ticker = RefreshTicker::new(
            store.clone(),
            clock.clone(),
            Duration::from_millis(100),
        );

        ticker.start().await;
        assert!(ticker.is_running().await);
        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(store.get_by_id(id).await.unwrap().casting_charge(), 0);

        clock.advance(TimeDelta::seconds(60));
        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(store.get_by_id(id).await.unwrap().casting_charge(), 1);

        ticker.stop().await;
        assert!(!ticker.is_running().await);

        store
            .handle_use(UseSkillEvent {
                skill_id: id,
                used_at: clock.now(),
            })
            .await
            .unwrap();
        clock.advance(TimeDelta::seconds(600));
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(store.get_by_id(id).await.unwrap().casting_charge(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_the_ticker_ends_the_loop() {
        let (store, id) = store_with_spent_skill().await;
        let clock = Arc::new(ManualClock::new(t0()));
        let ticker = RefreshTicker::new(
            store.clone(),
            clock.clone(),
            Duration::from_millis(100),
        );
        ticker.start().await;
        time::sleep(Duration::from_millis(150)).await;
        drop(ticker);

        clock.advance(TimeDelta::seconds(60));
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(store.get_by_id(id).await.unwrap().casting_charge(), 0);
    }

    #[test]
    fn test_period_ms_saturates() {
        assert_eq!(period_ms(Duration::from_millis(250)), 250);
        assert_eq!(period_ms(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_period_is_clamped() {
        let ticker = RefreshTicker::new(
            Arc::new(InMemorySkillStore::new()),
            Arc::new(ManualClock::new(t0())),
            Duration::ZERO,
        );
        assert_eq!(ticker.period(), MIN_PERIOD);
    }
}
