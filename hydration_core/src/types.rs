//! Core domain types for the WaterCheck hydration engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Logged intake entries and archived daily records
//! - Timeframes and the statistics derived from them
//! - Progress bands and achievement state
//! - Snapshots handed to observers

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Goal used when none is configured or the stored one is unusable.
pub const DEFAULT_DAILY_GOAL_ML: f64 = 2500.0;

// ============================================================================
// Entry and Record Types
// ============================================================================

/// A single logged water intake event
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WaterEntry {
    pub id: Uuid,
    /// Amount in milliliters
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

impl WaterEntry {
    pub fn new(id: Uuid, amount: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            amount,
            timestamp,
        }
    }

    /// Clock time of the entry in the given timezone, e.g. `14:05`
    pub fn time_label<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: fmt::Display,
    {
        self.timestamp.with_timezone(tz).format("%H:%M").to_string()
    }

    /// Relative age of the entry as seen from `now`
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        let elapsed = (now - self.timestamp).num_seconds();
        if elapsed < 60 {
            "Just now".to_string()
        } else if elapsed < 3600 {
            format!("{}m ago", elapsed / 60)
        } else {
            format!("{}h ago", elapsed / 3600)
        }
    }
}

/// Summary of one archived calendar day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyData {
    pub id: Uuid,
    pub date: NaiveDate,
    /// Sum of all amounts logged that day, in milliliters
    pub total_intake: f64,
    pub entry_count: usize,
    /// Frozen against the goal in effect when the day was archived
    pub goal_met: bool,
}

impl DailyData {
    /// Build a record, deriving `goal_met` from the goal in effect right now
    pub fn new(id: Uuid, date: NaiveDate, total_intake: f64, entry_count: usize, goal: f64) -> Self {
        Self {
            id,
            date,
            total_intake,
            entry_count,
            goal_met: total_intake >= goal,
        }
    }
}

// ============================================================================
// Timeframes and Statistics
// ============================================================================

/// Window used to filter history for display and statistics
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    #[default]
    Week,
    Month,
    Year,
}

impl Timeframe {
    /// Number of days looked back from today
    pub fn days(self) -> i64 {
        match self {
            Timeframe::Week => 7,
            Timeframe::Month => 30,
            Timeframe::Year => 365,
        }
    }
}

impl FromStr for Timeframe {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "week" | "w" => Ok(Timeframe::Week),
            "month" | "m" => Ok(Timeframe::Month),
            "year" | "y" => Ok(Timeframe::Year),
            other => Err(crate::Error::Other(format!(
                "Unknown timeframe: {} (expected week, month or year)",
                other
            ))),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Year => "year",
        };
        f.write_str(name)
    }
}

/// Aggregates over the records of one timeframe
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Statistics {
    pub average_intake: f64,
    pub best_day_intake: f64,
    pub goal_met_days: usize,
    pub total_days: usize,
}

impl Statistics {
    /// Share of days that met the goal, 0-100
    pub fn goal_met_percentage(&self) -> f64 {
        if self.total_days == 0 {
            return 0.0;
        }
        self.goal_met_days as f64 / self.total_days as f64 * 100.0
    }
}

// ============================================================================
// Progress and Achievements
// ============================================================================

/// Coarse status of today's progress toward the goal
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressBand {
    /// Goal reached
    Complete,
    /// At least 80%
    Almost,
    /// At least 50%
    Halfway,
    Starting,
}

impl ProgressBand {
    pub fn classify(intake: f64, goal: f64) -> Self {
        if intake >= goal {
            ProgressBand::Complete
        } else if intake >= goal * 0.8 {
            ProgressBand::Almost
        } else if intake >= goal * 0.5 {
            ProgressBand::Halfway
        } else {
            ProgressBand::Starting
        }
    }
}

/// Which achievement message applies right now
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "days", rename_all = "snake_case")]
pub enum AchievementKind {
    /// Today's intake already exceeds yesterday's
    BeatYesterday,
    /// Goal met on this many consecutive archived days
    Streak(u32),
    GoalAchieved,
}

/// Derived achievement state, recomputed after every mutation
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Achievements {
    pub streak: u32,
    /// Largest archived daily total (today excluded)
    pub best_day: f64,
    pub yesterday_intake: f64,
    pub message: Option<AchievementKind>,
}

// ============================================================================
// Observer Snapshot
// ============================================================================

/// Immutable view of the store published to subscribers
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct HydrationSnapshot {
    pub current_intake: f64,
    pub daily_goal: f64,
    pub today_entries: Vec<WaterEntry>,
    pub historical_data: Vec<DailyData>,
    pub last_active_date: Option<NaiveDate>,
    pub achievements: Achievements,
    pub progress_band: ProgressBand,
}
