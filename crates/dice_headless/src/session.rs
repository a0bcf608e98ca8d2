//! A live game: the economy behind a single lock, the rolling-display
//! timers and the auto-roll task.
//!
//! Every mutation takes the lock, applies one engine operation, captures a
//! snapshot and releases the lock. The snapshot is then written on the
//! blocking pool. Timers only ever call back into the economy through the
//! same lock, so the engine itself stays single-threaded.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use dice_core::data::TierKey;
use dice_core::economy::{Economy, RejectReason};
use dice_core::math::Vec2Fixed;
use dice_core::rng::SeededRng;
use dice_core::roll::RollOutcome;
use dice_core::snapshot::Snapshot;
use dice_core::state::DieId;

use crate::protocol::StateReport;
use crate::save::{save_snapshot, SaveError};
use crate::SessionConfig;

/// Milliseconds since an origin, on tokio's clock so tests can pause it.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
    origin_ms: u64,
}

impl Clock {
    /// Clock reading `origin_ms` now.
    #[must_use]
    pub fn starting_at(origin_ms: u64) -> Self {
        Self {
            start: Instant::now(),
            origin_ms,
        }
    }

    /// Current reading.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        let elapsed = u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.origin_ms.saturating_add(elapsed)
    }
}

struct Inner {
    economy: Economy,
    rng: SeededRng,
    save_path: Option<PathBuf>,
    save_seq: u64,
    last_written: Arc<std::sync::Mutex<u64>>,
}

impl Inner {
    /// Capture the current state for writing once the lock is released.
    fn pending_save(&mut self) -> Option<PendingSave> {
        let path = self.save_path.clone()?;
        self.save_seq += 1;
        Some(PendingSave {
            path,
            seq: self.save_seq,
            snapshot: self.economy.snapshot(),
            last_written: Arc::clone(&self.last_written),
        })
    }
}

/// A snapshot captured under the session lock.
struct PendingSave {
    path: PathBuf,
    seq: u64,
    snapshot: Snapshot,
    last_written: Arc<std::sync::Mutex<u64>>,
}

impl PendingSave {
    /// Write unless a later capture already reached the disk. Returns
    /// whether the file was written.
    fn write_if_newer(&self) -> Result<bool, SaveError> {
        let mut last = self
            .last_written
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.seq <= *last {
            return Ok(false);
        }
        save_snapshot(&self.path, &self.snapshot)?;
        *last = self.seq;
        Ok(true)
    }
}

/// Write a captured snapshot on the blocking pool.
async fn persist(save: Option<PendingSave>) {
    let Some(save) = save else {
        return;
    };
    match tokio::task::spawn_blocking(move || save.write_if_newer()).await {
        Ok(Ok(true)) => {}
        Ok(Ok(false)) => debug!("Skipped a stale save"),
        Ok(Err(e)) => warn!("Failed to save: {e}"),
        Err(e) => warn!("Save task failed: {e}"),
    }
}

struct AutoRollTask {
    interval_ms: u64,
    handle: JoinHandle<()>,
}

/// A running game.
pub struct Session {
    inner: Arc<Mutex<Inner>>,
    clock: Clock,
    auto_roll_enabled: bool,
    auto_roll: Option<AutoRollTask>,
}

impl Session {
    /// Wrap an economy. The clock starts after the latest saved roll so
    /// restored cooldowns have already elapsed.
    #[must_use]
    pub fn new(economy: Economy, config: &SessionConfig) -> Self {
        let cooldown = economy.config().roll_cooldown_ms;
        let origin = economy
            .state()
            .dice
            .values()
            .filter_map(|d| d.last_roll_time)
            .max()
            .map_or(0, |t| t.saturating_add(cooldown));

        Self {
            inner: Arc::new(Mutex::new(Inner {
                economy,
                rng: SeededRng::new(config.seed),
                save_path: config.save_path.clone(),
                save_seq: 0,
                last_written: Arc::new(std::sync::Mutex::new(0)),
            })),
            clock: Clock::starting_at(origin),
            auto_roll_enabled: config.auto_roll,
            auto_roll: None,
        }
    }

    /// Current game time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Buy a die.
    pub async fn purchase_die(&self, tier: TierKey) -> Result<(DieId, u64), RejectReason> {
        let mut inner = self.inner.lock().await;
        let id = inner.economy.try_purchase_die(tier)?;
        let save = inner.pending_save();
        let currency = inner.economy.currency();
        drop(inner);

        persist(save).await;
        Ok((id, currency))
    }

    /// Roll a die now and schedule the end of its rolling display.
    pub async fn roll(
        &self,
        id: DieId,
        face: Option<u8>,
    ) -> Result<(RollOutcome, u64), RejectReason> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let now = self.clock.now_ms();
        let outcome = inner.economy.try_roll_die(id, face, now, &mut inner.rng)?;
        let save = inner.pending_save();
        let display = inner.economy.rolling_display_ms();
        let currency = inner.economy.currency();
        drop(guard);

        persist(save).await;
        schedule_finish(Arc::clone(&self.inner), id, now, display);
        Ok((outcome, currency))
    }

    /// Buy a skill. Returns the tiers it unlocked.
    pub async fn purchase_skill(&self, id: &str) -> Result<(Vec<TierKey>, u64), RejectReason> {
        let mut inner = self.inner.lock().await;
        let unlocked = inner.economy.try_purchase_skill(id)?;
        let save = inner.pending_save();
        let currency = inner.economy.currency();
        drop(inner);

        persist(save).await;
        Ok((unlocked, currency))
    }

    /// Buy an upgrade level. Returns the new level.
    pub async fn purchase_upgrade(&self, id: &str) -> Result<(u32, u64), RejectReason> {
        let mut inner = self.inner.lock().await;
        let level = inner.economy.try_purchase_upgrade(id)?;
        let save = inner.pending_save();
        let currency = inner.economy.currency();
        drop(inner);

        persist(save).await;
        Ok((level, currency))
    }

    /// Store a die position. Returns false for unknown dice.
    pub async fn move_die(&self, id: DieId, position: Vec2Fixed) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.economy.update_die_position(id, position) {
            return false;
        }
        let save = inner.pending_save();
        drop(inner);

        persist(save).await;
        true
    }

    /// Start over.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.economy.reset_progression();
        let save = inner.pending_save();
        drop(inner);

        persist(save).await;
    }

    /// Full state report.
    pub async fn report(&self) -> StateReport {
        StateReport::from_economy(&self.inner.lock().await.economy)
    }

    /// State hash.
    pub async fn state_hash(&self) -> u64 {
        self.inner.lock().await.economy.state_hash()
    }

    /// Current balance.
    pub async fn currency(&self) -> u64 {
        self.inner.lock().await.economy.currency()
    }

    /// Run `f` against the economy under the lock.
    pub async fn with_economy<T>(&self, f: impl FnOnce(&Economy) -> T) -> T {
        f(&self.inner.lock().await.economy)
    }

    /// Interval of the running auto-roll task, if any.
    #[must_use]
    pub fn auto_roll_interval(&self) -> Option<u64> {
        self.auto_roll.as_ref().map(|t| t.interval_ms)
    }

    /// Start, restart or stop the auto-roll task to match the purchased
    /// skills. Call after every command.
    pub async fn sync_automation(&mut self) {
        let wanted = if self.auto_roll_enabled {
            self.inner
                .lock()
                .await
                .economy
                .automation()
                .auto_roll_interval_ms
        } else {
            None
        };
        if wanted == self.auto_roll_interval() {
            return;
        }

        self.stop_auto_roll();
        if let Some(interval_ms) = wanted {
            info!("Auto-roll started every {} ms", interval_ms);
            let handle = tokio::spawn(auto_roll_loop(
                Arc::clone(&self.inner),
                self.clock,
                interval_ms,
            ));
            self.auto_roll = Some(AutoRollTask {
                interval_ms,
                handle,
            });
        }
    }

    fn stop_auto_roll(&mut self) {
        if let Some(task) = self.auto_roll.take() {
            task.handle.abort();
            info!("Auto-roll stopped");
        }
    }

    /// Cancel background tasks.
    pub fn shutdown(&mut self) {
        self.stop_auto_roll();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop_auto_roll();
    }
}

fn schedule_finish(inner: Arc<Mutex<Inner>>, id: DieId, roll_time: u64, display_ms: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(display_ms)).await;
        if inner.lock().await.economy.finish_roll(id, roll_time) {
            debug!("{} settled", id);
        }
    });
}

async fn auto_roll_loop(inner: Arc<Mutex<Inner>>, clock: Clock, interval_ms: u64) {
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let mut guard = inner.lock().await;
        let state = &mut *guard;
        let now = clock.now_ms();
        let Some(target) = state.economy.auto_roll_target(now, &mut state.rng) else {
            debug!("Auto-roll found no eligible die");
            continue;
        };
        match state.economy.try_roll_die(target, None, now, &mut state.rng) {
            Ok(outcome) => {
                debug!("Auto-rolled {} for {}", target, outcome.reward);
                let save = state.pending_save();
                let display = state.economy.rolling_display_ms();
                drop(guard);
                persist(save).await;
                schedule_finish(Arc::clone(&inner), target, now, display);
            }
            Err(reason) => debug!("Auto-roll rejected: {reason}"),
        }
    }
}
