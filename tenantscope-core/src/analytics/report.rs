//! Full usage report for one filter and window.
//!
//! Bundles every metric the dashboard shows so presentation layers can
//! render or export a single value.

use serde::Serialize;

use super::delta::MetricDelta;
use super::distribution::FrequencyDistribution;
use super::engine::AnalyticsSettings;
use super::licence::LicenceReport;
use super::rollup::{top_tenancies, TenancyActivity, TenancyPivot, TenancyRollup};
use super::trend::{weekly_trend, WeeklyPoint};
use super::users::{user_summaries, WindowTotals};
use crate::error::Result;
use crate::filter::FilterContext;
use crate::period::Period;
use crate::repository::EventRepository;
use crate::types::UserSummary;

/// Headline figures with change vs the comparison window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub active_users: MetricDelta,
    pub new_users: MetricDelta,
    pub dormant_users: MetricDelta,
    /// Known users as of the window end (no comparison)
    pub known_users: usize,
    pub event_records: MetricDelta,
    pub total_weight: MetricDelta,
    pub weight_per_active_user: MetricDelta,
    pub events_per_active_user: MetricDelta,
}

impl Overview {
    pub fn from_totals(current: &WindowTotals, previous: &WindowTotals) -> Self {
        Self {
            active_users: MetricDelta::from_counts(current.active_users, previous.active_users),
            new_users: MetricDelta::from_counts(current.new_users, previous.new_users),
            dormant_users: MetricDelta::from_counts(
                current.dormant_users,
                previous.dormant_users,
            ),
            known_users: current.known_users,
            event_records: MetricDelta::from_counts(
                current.event_records,
                previous.event_records,
            ),
            total_weight: MetricDelta::new(current.total_weight, previous.total_weight),
            weight_per_active_user: MetricDelta::new(
                current.weight_per_active_user(),
                previous.weight_per_active_user(),
            ),
            events_per_active_user: MetricDelta::new(
                current.events_per_active_user(),
                previous.events_per_active_user(),
            ),
        }
    }
}

/// Everything computed for one `(filter, window)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    pub filter: FilterContext,
    pub period: Period,
    pub comparison: Period,
    pub overview: Overview,
    pub distribution: FrequencyDistribution,
    pub licences: LicenceReport,
    pub rollup: TenancyRollup,
    pub pivot: TenancyPivot,
    pub top_tenancies: Vec<TenancyActivity>,
    pub weekly_trend: Vec<WeeklyPoint>,
    pub users: Vec<UserSummary>,
}

impl UsageReport {
    /// Pretty-printed JSON document of the whole report.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Compute the full report. Pure over the repository, so calling it twice
/// with the same inputs yields equal reports.
pub fn generate_report(
    repo: &EventRepository,
    ctx: &FilterContext,
    period: &Period,
    settings: &AnalyticsSettings,
) -> UsageReport {
    let comparison = period.comparison();

    let current = WindowTotals::compute(repo, ctx, period);
    let previous = WindowTotals::compute(repo, ctx, &comparison);

    tracing::debug!(
        period = %period.label(),
        comparison = %comparison.label(),
        active = current.active_users,
        previous_active = previous.active_users,
        "Computed window totals"
    );

    let report = UsageReport {
        filter: ctx.clone(),
        period: *period,
        comparison,
        overview: Overview::from_totals(&current, &previous),
        distribution: FrequencyDistribution::compute(repo, ctx, period),
        licences: LicenceReport::compute(repo, ctx, period, &settings.capacity),
        rollup: TenancyRollup::compute(repo, ctx, period),
        pivot: TenancyPivot::compute(repo, ctx, period),
        top_tenancies: top_tenancies(repo, ctx, period, settings.top_tenancies),
        weekly_trend: weekly_trend(repo, ctx, period),
        users: user_summaries(repo, ctx, period),
    };

    tracing::info!(
        period = %period.label(),
        active_users = current.active_users,
        tenancies = report.pivot.rows.len(),
        licence_rows = report.licences.rows.len(),
        "Generated usage report"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UsageEvent;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn repo() -> EventRepository {
        let at = |m: u32, d: u32| Utc.with_ymd_and_hms(2024, m, d, 12, 0, 0).unwrap();
        EventRepository::new(
            vec![
                UsageEvent::new("u1", "Acme", "Connect", "Production", at(2, 10)),
                UsageEvent::new("u1", "Acme", "Connect", "Production", at(3, 10)).with_weight(4.0),
                UsageEvent::new("u2", "Globex", "Workbench", "Production", at(3, 11)),
            ],
            vec![],
        )
        .unwrap()
    }

    fn march() -> Period {
        Period::from_dates(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_overview_deltas() {
        let report = generate_report(
            &repo(),
            &FilterContext::all(),
            &march(),
            &AnalyticsSettings::default(),
        );
        let overview = &report.overview;
        assert_eq!(overview.active_users.current, 2.0);
        assert_eq!(overview.active_users.previous, 1.0);
        assert_eq!(overview.active_users.percent_change, 100.0);
        assert_eq!(overview.new_users.current, 1.0);
        assert_eq!(overview.known_users, 2);
        assert_eq!(overview.total_weight.current, 5.0);
        assert_eq!(overview.weight_per_active_user.current, 2.5);
        assert_eq!(overview.weight_per_active_user.previous, 1.0);
        assert_eq!(report.top_tenancies.len(), 2);
        assert_eq!(report.users.len(), 2);
    }

    #[test]
    fn test_report_is_idempotent() {
        let repo = repo();
        let ctx = FilterContext::all().with_component("Connect");
        let settings = AnalyticsSettings::default();
        let first = generate_report(&repo, &ctx, &march(), &settings);
        let second = generate_report(&repo, &ctx, &march(), &settings);
        assert_eq!(first, second);
    }

    #[test]
    fn test_report_to_json() {
        let report = generate_report(
            &repo(),
            &FilterContext::all().with_tenancy("Acme"),
            &march(),
            &AnalyticsSettings::default(),
        );
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["overview"]["active_users"]["current"], 1.0);
        assert_eq!(value["filter"]["tenancy"]["exact"], "Acme");
        assert!(json.contains("\n  \"period\""));
    }
}
