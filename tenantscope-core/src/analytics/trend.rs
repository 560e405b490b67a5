//! Weekly activity trend.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::window_events;
use crate::filter::FilterContext;
use crate::period::Period;
use crate::repository::EventRepository;

/// Activity in one Monday-starting week, clipped to the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyPoint {
    /// Monday the week starts on
    pub week_start: NaiveDate,
    pub active_users: usize,
    pub weight: f64,
}

/// Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// One point per week touched by `period`, including quiet weeks.
pub fn weekly_trend(
    repo: &EventRepository,
    ctx: &FilterContext,
    period: &Period,
) -> Vec<WeeklyPoint> {
    let mut weeks: BTreeMap<NaiveDate, (BTreeSet<&str>, f64)> = BTreeMap::new();

    let last = week_start(period.end().date_naive());
    let mut cursor = week_start(period.start().date_naive());
    while cursor <= last {
        weeks.insert(cursor, Default::default());
        cursor += Duration::days(7);
    }

    for event in window_events(repo, ctx, period) {
        let (users, weight) = weeks
            .entry(week_start(event.timestamp.date_naive()))
            .or_default();
        users.insert(event.user_id.as_str());
        *weight += event.weight;
    }

    weeks
        .into_iter()
        .map(|(week_start, (users, weight))| WeeklyPoint {
            week_start,
            active_users: users.len(),
            weight,
        })
        .collect()
}
