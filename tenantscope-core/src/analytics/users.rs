//! User-level metrics: active, new, known and dormant users, per-user
//! summaries and window totals.
//!
//! All counts are distinct user identities. "New" is decided against the
//! repository-wide first-seen index, so a user is new exactly once no
//! matter which window is being inspected.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::delta::ratio;
use super::{filtered_events, window_events};
use crate::filter::FilterContext;
use crate::period::Period;
use crate::repository::EventRepository;
use crate::types::{UsageEvent, UserSummary};

/// Distinct users with at least one matching event in `period`.
pub fn active_users<'a>(
    repo: &'a EventRepository,
    ctx: &FilterContext,
    period: &Period,
) -> BTreeSet<&'a str> {
    window_events(repo, ctx, period)
        .map(|e| e.user_id.as_str())
        .collect()
}

/// Active users of `period` whose first event anywhere in the repository
/// is not before `period.start`.
pub fn new_users<'a>(
    repo: &'a EventRepository,
    ctx: &FilterContext,
    period: &Period,
) -> BTreeSet<&'a str> {
    active_users(repo, ctx, period)
        .into_iter()
        .filter(|user| {
            repo.first_seen(user)
                .map_or(false, |first| first >= period.start())
        })
        .collect()
}

/// Distinct matching users with any event at or before `as_of`.
pub fn known_users<'a>(
    repo: &'a EventRepository,
    ctx: &FilterContext,
    as_of: DateTime<Utc>,
) -> BTreeSet<&'a str> {
    filtered_events(repo, ctx)
        .filter(|e| e.timestamp <= as_of)
        .map(|e| e.user_id.as_str())
        .collect()
}

/// Per-user summaries for `period`, most recently seen first.
pub fn user_summaries(
    repo: &EventRepository,
    ctx: &FilterContext,
    period: &Period,
) -> Vec<UserSummary> {
    let mut by_user: BTreeMap<&str, (&UsageEvent, DateTime<Utc>, f64)> = BTreeMap::new();

    for event in window_events(repo, ctx, period) {
        by_user
            .entry(event.user_id.as_str())
            .and_modify(|(latest, first, weight)| {
                if event.timestamp >= latest.timestamp {
                    *latest = event;
                }
                *first = (*first).min(event.timestamp);
                *weight += event.weight;
            })
            .or_insert((event, event.timestamp, event.weight));
    }

    let mut summaries: Vec<UserSummary> = by_user
        .into_iter()
        .map(|(user_id, (latest, first_seen, weight))| UserSummary {
            user_id: user_id.to_string(),
            tenancy: latest.tenancy.clone(),
            component: latest.component.clone(),
            environment: latest.environment.clone(),
            first_seen,
            last_seen: latest.timestamp,
            event_count: weight,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.last_seen
            .cmp(&a.last_seen)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    summaries
}

/// Summaries whose user id contains `query`, ignoring case.
///
/// A blank query returns every summary.
pub fn search_users<'a>(summaries: &'a [UserSummary], query: &str) -> Vec<&'a UserSummary> {
    let needle = query.trim().to_lowercase();
    summaries
        .iter()
        .filter(|s| needle.is_empty() || s.user_id.to_lowercase().contains(&needle))
        .collect()
}

/// Headline user and volume figures for one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindowTotals {
    /// Distinct users active in the window
    pub active_users: usize,
    /// Active users seen for the first time ever in the window
    pub new_users: usize,
    /// Distinct users seen at or before the window end
    pub known_users: usize,
    /// Known users with no activity in the window
    pub dormant_users: usize,
    /// Number of event records in the window
    pub event_records: usize,
    /// Sum of event weight in the window
    pub total_weight: f64,
}

impl WindowTotals {
    pub fn compute(repo: &EventRepository, ctx: &FilterContext, period: &Period) -> Self {
        let mut active: BTreeSet<&str> = BTreeSet::new();
        let mut event_records = 0usize;
        let mut total_weight = 0.0;

        for event in window_events(repo, ctx, period) {
            active.insert(event.user_id.as_str());
            event_records += 1;
            total_weight += event.weight;
        }

        let new_users = active
            .iter()
            .filter(|user| {
                repo.first_seen(user)
                    .map_or(false, |first| first >= period.start())
            })
            .count();
        let known_users = known_users(repo, ctx, period.end()).len();

        Self {
            active_users: active.len(),
            new_users,
            known_users,
            dormant_users: known_users.saturating_sub(active.len()),
            event_records,
            total_weight,
        }
    }

    /// Average weight per active user (e.g. session hours per user).
    pub fn weight_per_active_user(&self) -> f64 {
        ratio(self.total_weight, self.active_users as f64)
    }

    /// Average event records per active user.
    pub fn events_per_active_user(&self) -> f64 {
        ratio(self.event_records as f64, self.active_users as f64)
    }
}
