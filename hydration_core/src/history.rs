//! Timeframe views over archived daily records.
//!
//! This module filters history to a trailing window, synthesizes a record for
//! the live day, and derives summary statistics. Everything here is pure:
//! callers pass in "today" so results are reproducible.

use crate::{DailyData, Statistics, Timeframe};
use chrono::{Duration, NaiveDate};
use uuid::Uuid;

/// First day still inside the timeframe ending today
pub fn cutoff_date(today: NaiveDate, timeframe: Timeframe) -> NaiveDate {
    today - Duration::days(timeframe.days())
}

/// Transient record for the live day, if anything was logged
///
/// The record carries the nil id: it is never persisted and gets a real id
/// only when the day is archived.
pub fn live_day_record(
    today: NaiveDate,
    current_intake: f64,
    entry_count: usize,
    daily_goal: f64,
) -> Option<DailyData> {
    if current_intake > 0.0 {
        Some(DailyData::new(
            Uuid::nil(),
            today,
            current_intake,
            entry_count,
            daily_goal,
        ))
    } else {
        None
    }
}

/// Records dated on or after the timeframe cutoff, order preserved
pub fn filter_timeframe(
    history: &[DailyData],
    today: NaiveDate,
    timeframe: Timeframe,
) -> Vec<DailyData> {
    let cutoff = cutoff_date(today, timeframe);
    history
        .iter()
        .filter(|d| d.date >= cutoff)
        .cloned()
        .collect()
}

/// Summary statistics over a set of records
pub fn compute_statistics(records: &[DailyData]) -> Statistics {
    if records.is_empty() {
        return Statistics::default();
    }

    let total: f64 = records.iter().map(|d| d.total_intake).sum();
    let best = records
        .iter()
        .map(|d| d.total_intake)
        .fold(f64::MIN, f64::max);

    Statistics {
        average_intake: total / records.len() as f64,
        best_day_intake: best,
        goal_met_days: records.iter().filter(|d| d.goal_met).count(),
        total_days: records.len(),
    }
}

/// Drop records older than `retention_days` before today
///
/// Returns how many records were removed.
pub fn prune_history(history: &mut Vec<DailyData>, today: NaiveDate, retention_days: u32) -> usize {
    let cutoff = today - Duration::days(i64::from(retention_days));
    let before = history.len();
    history.retain(|d| d.date >= cutoff);
    let removed = before - history.len();
    if removed > 0 {
        tracing::info!(
            "Pruned {} daily records older than {} (retention {} days)",
            removed,
            cutoff,
            retention_days
        );
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOAL: f64 = 2000.0;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    fn record(days_ago: i64, total: f64) -> DailyData {
        DailyData::new(
            Uuid::new_v4(),
            today() - Duration::days(days_ago),
            total,
            3,
            GOAL,
        )
    }

    /// Ten days of history, alternating 1000 / 3000 ml, most recent first
    fn alternating_history() -> Vec<DailyData> {
        (1..=10)
            .map(|days_ago| {
                let total = if days_ago % 2 == 1 { 1000.0 } else { 3000.0 };
                record(days_ago, total)
            })
            .collect()
    }

    #[test]
    fn test_week_keeps_seven_most_recent() {
        let history = alternating_history();
        let week = filter_timeframe(&history, today(), Timeframe::Week);

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, today() - Duration::days(1));
        assert_eq!(week[6].date, today() - Duration::days(7));

        // days_ago 2, 4, 6 hit 3000 ml
        let stats = compute_statistics(&week);
        assert_eq!(stats.goal_met_days, 3);
        assert_eq!(stats.total_days, 7);
        assert_eq!(stats.best_day_intake, 3000.0);
    }

    #[test]
    fn test_month_and_year_include_everything_recent() {
        let history = alternating_history();
        assert_eq!(filter_timeframe(&history, today(), Timeframe::Month).len(), 10);
        assert_eq!(filter_timeframe(&history, today(), Timeframe::Year).len(), 10);

        let old = vec![record(31, 2500.0), record(400, 2500.0)];
        assert!(filter_timeframe(&old, today(), Timeframe::Month).is_empty());
        assert_eq!(filter_timeframe(&old, today(), Timeframe::Year).len(), 1);
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let history = vec![record(7, 500.0), record(8, 500.0)];
        let week = filter_timeframe(&history, today(), Timeframe::Week);
        assert_eq!(week.len(), 1);
        assert_eq!(cutoff_date(today(), Timeframe::Week), week[0].date);
    }

    #[test]
    fn test_statistics_empty() {
        assert_eq!(compute_statistics(&[]), Statistics::default());
    }

    #[test]
    fn test_statistics_average() {
        let records = vec![record(1, 1000.0), record(2, 2000.0), record(3, 3000.0)];
        let stats = compute_statistics(&records);
        assert_eq!(stats.average_intake, 2000.0);
        assert_eq!(stats.best_day_intake, 3000.0);
        assert_eq!(stats.goal_met_days, 2);
    }

    #[test]
    fn test_live_day_record() {
        assert!(live_day_record(today(), 0.0, 0, GOAL).is_none());

        let live = live_day_record(today(), 2200.0, 5, GOAL).unwrap();
        assert_eq!(live.date, today());
        assert_eq!(live.entry_count, 5);
        assert!(live.goal_met);
        assert!(live.id.is_nil());
    }

    #[test]
    fn test_prune_history() {
        let mut history = alternating_history();
        let removed = prune_history(&mut history, today(), 5);
        assert_eq!(removed, 5);
        assert_eq!(history.len(), 5);
        assert!(history.iter().all(|d| d.date >= today() - Duration::days(5)));

        assert_eq!(prune_history(&mut history, today(), 5), 0);
    }
}
