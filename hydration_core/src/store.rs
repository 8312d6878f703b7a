//! The hydration store: single owner of the live hydration state.
//!
//! Every mutation follows the same path:
//! 1. Run the day-rollover check
//! 2. Build the next state on a copy
//! 3. Persist it through the backend
//! 4. Only then commit it, recompute achievements, and publish a snapshot
//!
//! A failed write therefore leaves the in-memory state exactly as it was.

use crate::achievements;
use crate::clock::{Clock, SystemClock};
use crate::history;
use crate::persist::{JsonFileBackend, PersistedState, StateBackend};
use crate::{
    Achievements, Config, DailyData, Error, HydrationSnapshot, ProgressBand, Result, Statistics,
    Timeframe, WaterEntry, DEFAULT_DAILY_GOAL_ML,
};
use chrono::{Local, NaiveDate, Utc};
use std::path::Path;
use tokio::sync::watch;
use uuid::Uuid;

/// Tunables that come from configuration rather than persisted state
#[derive(Clone, Debug, PartialEq)]
pub struct StoreOptions {
    /// Goal used when the persisted one is missing or invalid
    pub default_goal: f64,
    /// Prune archived days older than this at rollover; `None` keeps all
    pub retention_days: Option<u32>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            default_goal: DEFAULT_DAILY_GOAL_ML,
            retention_days: None,
        }
    }
}

impl From<&Config> for StoreOptions {
    fn from(config: &Config) -> Self {
        Self {
            default_goal: config.goal.default_ml,
            retention_days: config.history.retention_days,
        }
    }
}

/// Receiver side of the store's change feed
///
/// Each committed mutation publishes a fresh snapshot. Only the newest one
/// is kept; a slow reader skips intermediate states. Drop the subscription
/// (or call [`Subscription::unsubscribe`]) to stop observing.
#[derive(Debug)]
pub struct Subscription {
    receiver: watch::Receiver<HydrationSnapshot>,
}

impl Subscription {
    /// Newest snapshot not yet seen by this subscription
    pub fn changed(&mut self) -> Option<HydrationSnapshot> {
        match self.receiver.has_changed() {
            Ok(true) => Some(self.receiver.borrow_and_update().clone()),
            // Ok(false): nothing new; Err: the store is gone
            _ => None,
        }
    }

    /// Current snapshot, whether or not it was seen before
    pub fn latest(&self) -> HydrationSnapshot {
        self.receiver.borrow().clone()
    }

    pub fn unsubscribe(self) {}
}

/// Hydration state and history engine
pub struct HydrationStore<B = JsonFileBackend, C = SystemClock> {
    backend: B,
    clock: C,
    options: StoreOptions,
    state: PersistedState,
    achievements: Achievements,
    publisher: watch::Sender<HydrationSnapshot>,
}

impl HydrationStore<JsonFileBackend, SystemClock> {
    /// Open the file-backed store in `data_dir` on the system clock
    pub fn open_in_dir(data_dir: &Path, options: StoreOptions) -> Result<Self> {
        Self::open(JsonFileBackend::in_dir(data_dir), SystemClock::new(), options)
    }
}

impl<B: StateBackend, C: Clock> HydrationStore<B, C> {
    /// Load persisted state and bring it up to date
    ///
    /// Missing or corrupt data falls back to defaults. The rollover check runs
    /// before the store is returned, so the first observed state is current.
    pub fn open(backend: B, clock: C, options: StoreOptions) -> Result<Self> {
        if !options.default_goal.is_finite() || options.default_goal <= 0.0 {
            return Err(Error::InvalidGoal(options.default_goal));
        }

        let mut state = backend.load(options.default_goal)?;
        state.sanitize(options.default_goal);

        let achievements = achievements::evaluate(
            &state.historical_data,
            state.current_intake,
            state.daily_goal,
            clock.today(),
        );
        let (publisher, _) = watch::channel(build_snapshot(&state, &achievements));

        let mut store = Self {
            backend,
            clock,
            options,
            state,
            achievements,
            publisher,
        };
        store.check_rollover()?;

        tracing::info!(
            intake = store.state.current_intake,
            goal = store.state.daily_goal,
            history = store.state.historical_data.len(),
            "Hydration store opened"
        );
        Ok(store)
    }

    /// Release the store, handing back its backend and clock
    ///
    /// Outstanding subscriptions stop receiving updates.
    pub fn into_parts(self) -> (B, C) {
        (self.backend, self.clock)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Log a new intake event
    pub fn add_entry(&mut self, amount: f64) -> Result<WaterEntry> {
        if !amount.is_finite() || amount <= 0.0 {
            tracing::warn!("Rejected intake amount {}", amount);
            return Err(Error::InvalidAmount(amount));
        }
        self.check_rollover()?;

        let entry = WaterEntry::new(
            Uuid::new_v4(),
            amount,
            self.clock.now().with_timezone(&Utc),
        );

        let mut next = self.state.clone();
        next.today_entries.insert(0, entry.clone());
        next.current_intake = entry_total(&next.today_entries);
        self.commit(next)?;

        tracing::info!(
            id = %entry.id,
            amount,
            total = self.state.current_intake,
            "Logged intake"
        );
        Ok(entry)
    }

    /// Remove an entry logged today
    ///
    /// Unknown ids are not an error: the call returns `Ok(None)` and nothing
    /// is written.
    pub fn remove_entry(&mut self, id: Uuid) -> Result<Option<WaterEntry>> {
        self.check_rollover()?;

        let Some(idx) = self.state.today_entries.iter().position(|e| e.id == id) else {
            tracing::debug!(%id, "No entry to remove");
            return Ok(None);
        };

        let mut next = self.state.clone();
        let removed = next.today_entries.remove(idx);
        next.current_intake = entry_total(&next.today_entries);
        self.commit(next)?;

        tracing::info!(
            id = %removed.id,
            amount = removed.amount,
            total = self.state.current_intake,
            "Removed intake entry"
        );
        Ok(Some(removed))
    }

    /// Change the daily goal
    ///
    /// Rollover runs first, so a day being archived keeps the goal it was
    /// logged against.
    pub fn update_goal(&mut self, new_goal: f64) -> Result<()> {
        if !new_goal.is_finite() || new_goal <= 0.0 {
            tracing::warn!("Rejected daily goal {}", new_goal);
            return Err(Error::InvalidGoal(new_goal));
        }
        self.check_rollover()?;

        let mut next = self.state.clone();
        next.daily_goal = new_goal;
        self.commit(next)?;

        tracing::info!(goal = new_goal, "Daily goal updated");
        Ok(())
    }

    /// Wipe today's entries and all history; the goal is kept
    pub fn reset_all(&mut self) -> Result<()> {
        let mut next = PersistedState::with_goal(self.state.daily_goal);
        next.last_active_date = Some(self.clock.today());
        self.commit(next)?;

        tracing::info!("All hydration data reset");
        Ok(())
    }

    /// Archive the previous day if the calendar day has changed
    ///
    /// Returns `true` when a rollover happened. Only the last active day is
    /// archived, and only if something was logged; days the app was not used
    /// leave no record. Safe to call as often as desired.
    pub fn check_rollover(&mut self) -> Result<bool> {
        let today = self.clock.today();
        let last_active = self
            .state
            .last_active_date
            .or_else(|| self.infer_active_day());

        if let Some(day) = last_active.filter(|day| *day > today) {
            // Wall clock went backwards; the day stays live until it actually passes
            tracing::warn!(
                last_active = %day,
                %today,
                "Clock is behind the last active day, skipping rollover"
            );
            return Ok(false);
        }

        if last_active == Some(today) {
            if self.state.last_active_date.is_none() {
                // Entries from today but no recorded day: adopt them as-is
                let mut next = self.state.clone();
                next.last_active_date = Some(today);
                self.commit(next)?;
            }
            return Ok(false);
        }

        let mut next = self.state.clone();
        if let Some(day) = last_active.filter(|_| next.current_intake > 0.0) {
            let record = DailyData::new(
                Uuid::new_v4(),
                day,
                next.current_intake,
                next.today_entries.len(),
                next.daily_goal,
            );
            tracing::info!(
                date = %record.date,
                total = record.total_intake,
                goal_met = record.goal_met,
                "Archived day"
            );
            next.historical_data.insert(0, record);
        }

        next.current_intake = 0.0;
        next.today_entries.clear();
        next.last_active_date = Some(today);
        if let Some(days) = self.options.retention_days {
            history::prune_history(&mut next.historical_data, today, days);
        }

        self.commit(next)?;
        tracing::debug!(%today, "Day rollover complete");
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Intake logged today
    ///
    /// Reads 0 once the clock has moved past the active day, even before
    /// [`Self::refresh`] archives it.
    pub fn current_intake(&self) -> f64 {
        if self.live_day_is_current() {
            self.state.current_intake
        } else {
            0.0
        }
    }

    pub fn daily_goal(&self) -> f64 {
        self.state.daily_goal
    }

    /// Today's entries, most recent first
    pub fn today_entries(&self) -> &[WaterEntry] {
        if self.live_day_is_current() {
            &self.state.today_entries
        } else {
            &[]
        }
    }

    /// Archived days, most recent first
    pub fn historical_data(&self) -> &[DailyData] {
        &self.state.historical_data
    }

    pub fn last_active_date(&self) -> Option<NaiveDate> {
        self.state.last_active_date
    }

    /// Achievement state as of the last commit; call [`Self::refresh`] first
    /// when the store may have been idle across midnight
    pub fn achievements(&self) -> &Achievements {
        &self.achievements
    }

    /// Fraction of the goal reached today, capped at 1.0
    pub fn progress_ratio(&self) -> f64 {
        if self.state.daily_goal <= 0.0 {
            return 0.0;
        }
        (self.current_intake() / self.state.daily_goal).min(1.0)
    }

    pub fn progress_band(&self) -> ProgressBand {
        ProgressBand::classify(self.current_intake(), self.state.daily_goal)
    }

    /// Records inside the timeframe, most recent first, live day included
    pub fn data_for_timeframe(&self, timeframe: Timeframe) -> Vec<DailyData> {
        let today = self.clock.today();
        let mut records = history::filter_timeframe(&self.state.historical_data, today, timeframe);
        if let Some(live) = self.live_record(today) {
            records.insert(0, live);
        }
        records
    }

    pub fn statistics(&self, timeframe: Timeframe) -> Statistics {
        history::compute_statistics(&self.data_for_timeframe(timeframe))
    }

    /// Everything worth exporting: the live day, then all archived days
    pub fn export_records(&self) -> Vec<DailyData> {
        let mut records = Vec::with_capacity(self.state.historical_data.len() + 1);
        records.extend(self.live_record(self.clock.today()));
        records.extend(self.state.historical_data.iter().cloned());
        records
    }

    /// State as of the last commit
    pub fn snapshot(&self) -> HydrationSnapshot {
        build_snapshot(&self.state, &self.achievements)
    }

    /// Roll over if the day changed, then return the current snapshot
    ///
    /// Long-lived holders of a store call this before presenting state, so a
    /// day left open overnight is archived before anything is shown.
    pub fn refresh(&mut self) -> Result<HydrationSnapshot> {
        self.check_rollover()?;
        Ok(self.snapshot())
    }

    /// Observe committed changes
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.publisher.subscribe(),
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn commit(&mut self, next: PersistedState) -> Result<()> {
        if let Err(e) = self.backend.save(&next) {
            tracing::error!("Failed to persist hydration state: {}", e);
            return Err(e);
        }
        self.state = next;
        self.achievements = achievements::evaluate(
            &self.state.historical_data,
            self.state.current_intake,
            self.state.daily_goal,
            self.clock.today(),
        );
        self.publisher
            .send_replace(build_snapshot(&self.state, &self.achievements));
        Ok(())
    }

    fn live_day_is_current(&self) -> bool {
        self.state.last_active_date == Some(self.clock.today())
    }

    fn live_record(&self, today: NaiveDate) -> Option<DailyData> {
        if !self.live_day_is_current() {
            return None;
        }
        history::live_day_record(
            today,
            self.state.current_intake,
            self.state.today_entries.len(),
            self.state.daily_goal,
        )
    }

    /// Day of the oldest live entry, for state saved without an active day
    fn infer_active_day(&self) -> Option<NaiveDate> {
        self.state
            .today_entries
            .last()
            .map(|e| e.timestamp.with_timezone(&Local).date_naive())
    }
}

fn entry_total(entries: &[WaterEntry]) -> f64 {
    entries.iter().map(|e| e.amount).sum()
}

fn build_snapshot(state: &PersistedState, achievements: &Achievements) -> HydrationSnapshot {
    HydrationSnapshot {
        current_intake: state.current_intake,
        daily_goal: state.daily_goal,
        today_entries: state.today_entries.clone(),
        historical_data: state.historical_data.clone(),
        last_active_date: state.last_active_date,
        achievements: achievements.clone(),
        progress_band: ProgressBand::classify(state.current_intake, state.daily_goal),
    }
}
