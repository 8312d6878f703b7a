//! Streak and achievement logic.
//!
//! Achievements are derived state: they are recomputed from history and the
//! live counters after every mutation and never persisted.
//!
//! Message priority (first match wins):
//! 1. Today's intake is positive and exceeds yesterday's
//! 2. A streak of at least [`STREAK_MESSAGE_MIN`] days
//! 3. Today's goal is reached

use crate::{AchievementKind, Achievements, DailyData};
use chrono::NaiveDate;

/// Shortest streak worth announcing
pub const STREAK_MESSAGE_MIN: u32 = 3;

/// Count consecutive goal-met days, starting from the most recent record
///
/// Stops at the first day that missed the goal, or at the first gap between
/// two records. Days are compared by exact calendar adjacency, so two
/// goal-met records with a missing day between them do not chain.
pub fn compute_streak(history: &[DailyData]) -> u32 {
    let mut days: Vec<&DailyData> = history.iter().collect();
    days.sort_by(|a, b| b.date.cmp(&a.date));

    let mut streak = 0;
    let mut prev: Option<NaiveDate> = None;
    for day in days {
        if !day.goal_met {
            break;
        }
        if let Some(prev) = prev {
            if prev.pred_opt() != Some(day.date) {
                break;
            }
        }
        streak += 1;
        prev = Some(day.date);
    }
    streak
}

/// Largest archived daily total, 0 with no history
pub fn best_day(history: &[DailyData]) -> f64 {
    history
        .iter()
        .map(|d| d.total_intake)
        .fold(0.0, f64::max)
}

/// Total archived for the day before `today`, 0 if there is none
pub fn yesterday_intake(history: &[DailyData], today: NaiveDate) -> f64 {
    let Some(yesterday) = today.pred_opt() else {
        return 0.0;
    };
    history
        .iter()
        .find(|d| d.date == yesterday)
        .map(|d| d.total_intake)
        .unwrap_or(0.0)
}

/// Recompute all achievement state
pub fn evaluate(
    history: &[DailyData],
    current_intake: f64,
    daily_goal: f64,
    today: NaiveDate,
) -> Achievements {
    let streak = compute_streak(history);
    let yesterday = yesterday_intake(history, today);

    let message = if current_intake > yesterday && current_intake > 0.0 {
        Some(AchievementKind::BeatYesterday)
    } else if streak >= STREAK_MESSAGE_MIN {
        Some(AchievementKind::Streak(streak))
    } else if current_intake >= daily_goal {
        Some(AchievementKind::GoalAchieved)
    } else {
        None
    };

    tracing::trace!(streak, yesterday, ?message, "Achievements evaluated");

    Achievements {
        streak,
        best_day: best_day(history),
        yesterday_intake: yesterday,
        message,
    }
}
