//! Analytics engine
//!
//! A thin facade binding an [`EventRepository`] to the settings metrics
//! need (capacity ceilings, ranking limits), so presentation layers only
//! ever pass a filter and a window.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tenantscope_core::analytics::{AnalyticsSettings, UsageEngine};
//!
//! let engine = UsageEngine::new(&repo, AnalyticsSettings::from_config(&config));
//! let report = engine.report(&FilterContext::all(), &period);
//! println!("{} active users", report.overview.active_users.current);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use super::distribution::FrequencyDistribution;
use super::licence::LicenceReport;
use super::report::{generate_report, UsageReport};
use super::rollup::{top_tenancies, TenancyActivity, TenancyPivot, TenancyRollup};
use super::trend::{weekly_trend, WeeklyPoint};
use super::users::{self, WindowTotals};
use crate::config::Config;
use crate::filter::{FilterContext, FilterOptions};
use crate::period::Period;
use crate::repository::EventRepository;
use crate::types::UserSummary;

/// Default platform ceiling for the Connect component.
pub const DEFAULT_CONNECT_CAPACITY: u64 = 10_000;
/// Default platform ceiling for the Workbench component.
pub const DEFAULT_WORKBENCH_CAPACITY: u64 = 5_000;
const DEFAULT_TOP_TENANCIES: usize = 5;

/// Inputs to the metrics that do not come from the event data.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSettings {
    /// Component name to platform licence ceiling
    pub capacity: BTreeMap<String, u64>,
    /// How many tenancies the activity ranking keeps
    pub top_tenancies: usize,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            capacity: BTreeMap::from([
                ("Connect".to_string(), DEFAULT_CONNECT_CAPACITY),
                ("Workbench".to_string(), DEFAULT_WORKBENCH_CAPACITY),
            ]),
            top_tenancies: DEFAULT_TOP_TENANCIES,
        }
    }
}

impl AnalyticsSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            capacity: config.licences.capacity.clone(),
            top_tenancies: config.report.top_tenancies,
        }
    }
}

/// Read-only analytics over one loaded repository.
#[derive(Debug, Clone)]
pub struct UsageEngine<'a> {
    repo: &'a EventRepository,
    settings: AnalyticsSettings,
}

impl<'a> UsageEngine<'a> {
    pub fn new(repo: &'a EventRepository, settings: AnalyticsSettings) -> Self {
        Self { repo, settings }
    }

    pub fn repository(&self) -> &'a EventRepository {
        self.repo
    }

    pub fn settings(&self) -> &AnalyticsSettings {
        &self.settings
    }

    /// Values the filter selectors can take.
    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions::from_repository(self.repo)
    }

    pub fn active_users(&self, ctx: &FilterContext, period: &Period) -> BTreeSet<&'a str> {
        users::active_users(self.repo, ctx, period)
    }

    pub fn new_users(&self, ctx: &FilterContext, period: &Period) -> BTreeSet<&'a str> {
        users::new_users(self.repo, ctx, period)
    }

    pub fn totals(&self, ctx: &FilterContext, period: &Period) -> WindowTotals {
        WindowTotals::compute(self.repo, ctx, period)
    }

    pub fn distribution(&self, ctx: &FilterContext, period: &Period) -> FrequencyDistribution {
        FrequencyDistribution::compute(self.repo, ctx, period)
    }

    pub fn licences(&self, ctx: &FilterContext, period: &Period) -> LicenceReport {
        LicenceReport::compute(self.repo, ctx, period, &self.settings.capacity)
    }

    pub fn rollup(&self, ctx: &FilterContext, period: &Period) -> TenancyRollup {
        TenancyRollup::compute(self.repo, ctx, period)
    }

    pub fn pivot(&self, ctx: &FilterContext, period: &Period) -> TenancyPivot {
        TenancyPivot::compute(self.repo, ctx, period)
    }

    pub fn top_tenancies(&self, ctx: &FilterContext, period: &Period) -> Vec<TenancyActivity> {
        top_tenancies(self.repo, ctx, period, self.settings.top_tenancies)
    }

    pub fn weekly_trend(&self, ctx: &FilterContext, period: &Period) -> Vec<WeeklyPoint> {
        weekly_trend(self.repo, ctx, period)
    }

    /// User directory for the window, optionally narrowed by a search query.
    pub fn users(
        &self,
        ctx: &FilterContext,
        period: &Period,
        query: Option<&str>,
    ) -> Vec<UserSummary> {
        let summaries = users::user_summaries(self.repo, ctx, period);
        match query {
            Some(q) => users::search_users(&summaries, q)
                .into_iter()
                .cloned()
                .collect(),
            None => summaries,
        }
    }

    pub fn report(&self, ctx: &FilterContext, period: &Period) -> UsageReport {
        generate_report(self.repo, ctx, period, &self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UsageEvent;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn repo() -> EventRepository {
        let at = |d: u32| Utc.with_ymd_and_hms(2024, 3, d, 9, 30, 0).unwrap();
        EventRepository::new(
            vec![
                UsageEvent::new("alice", "Acme", "Connect", "Production", at(4)),
                UsageEvent::new("bob", "Acme", "Connect", "Production", at(5)),
                UsageEvent::new("carol", "Globex", "Connect", "Production", at(6)),
            ],
            vec![],
        )
        .unwrap()
    }

    fn week() -> Period {
        Period::from_dates(
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_default_settings() {
        let settings = AnalyticsSettings::default();
        assert_eq!(settings.capacity.get("Connect"), Some(&10_000));
        assert_eq!(settings.capacity.get("Workbench"), Some(&5_000));
        assert_eq!(settings.top_tenancies, 5);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.report.top_tenancies = 1;
        let settings = AnalyticsSettings::from_config(&config);
        assert_eq!(settings.top_tenancies, 1);
        assert_eq!(settings.capacity, AnalyticsSettings::default().capacity);
    }

    #[test]
    fn test_engine_respects_top_limit() {
        let repo = repo();
        let settings = AnalyticsSettings {
            top_tenancies: 1,
            ..AnalyticsSettings::default()
        };
        let engine = UsageEngine::new(&repo, settings);
        let top = engine.top_tenancies(&FilterContext::all(), &week());
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].tenancy, "Acme");
    }

    #[test]
    fn test_engine_user_search() {
        let repo = repo();
        let engine = UsageEngine::new(&repo, AnalyticsSettings::default());
        let ctx = FilterContext::all();
        assert_eq!(engine.users(&ctx, &week(), None).len(), 3);

        let hits = engine.users(&ctx, &week(), Some("AL"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].user_id, "alice");
    }

    #[test]
    fn test_engine_report_matches_free_function() {
        let repo = repo();
        let engine = UsageEngine::new(&repo, AnalyticsSettings::default());
        let ctx = FilterContext::all();
        assert_eq!(
            engine.report(&ctx, &week()),
            generate_report(&repo, &ctx, &week(), &AnalyticsSettings::default())
        );
        assert_eq!(engine.active_users(&ctx, &week()).len(), 3);
        assert_eq!(engine.filter_options().tenancies.len(), 3);
    }
}
