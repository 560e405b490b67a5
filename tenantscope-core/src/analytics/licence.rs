//! Licence utilization.
//!
//! `active` is always window-derived: distinct users active for the
//! tenancy/component in the window. `assigned` comes from the allocation
//! snapshot and missing rows count as zero. Active counts are never clipped
//! to the assignment, so over-assignment shows up as utilization above 100%.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::delta::{percent_of, MetricDelta};
use super::window_events;
use crate::filter::FilterContext;
use crate::period::Period;
use crate::repository::EventRepository;
use crate::types::TenancyKey;

/// Utilization for one `(tenancy, component)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LicenceRow {
    pub tenancy: String,
    pub component: String,
    /// Licences assigned to this tenancy
    pub assigned: u64,
    /// Distinct active users in the current window
    pub active: usize,
    /// Active users now vs the comparison window
    pub active_delta: MetricDelta,
    /// `active` as a share of `assigned`
    pub utilization_pct: f64,
    /// `active` as a share of the component's platform ceiling
    pub capacity_pct: f64,
}

/// Utilization summed over tenancies for one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentLicenceSummary {
    pub component: String,
    pub assigned: u64,
    pub active: usize,
    /// Fixed platform ceiling, 0 when none is configured
    pub capacity: u64,
    pub assigned_capacity_pct: f64,
    pub active_capacity_pct: f64,
    pub active_delta: MetricDelta,
}

/// Licence rows and per-component summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LicenceReport {
    /// Sorted by tenancy, then component
    pub rows: Vec<LicenceRow>,
    /// Sorted by component
    pub components: Vec<ComponentLicenceSummary>,
}

fn active_by_key<'a>(
    repo: &'a EventRepository,
    ctx: &FilterContext,
    period: &Period,
) -> BTreeMap<(&'a str, &'a str), BTreeSet<&'a str>> {
    let mut groups: BTreeMap<(&str, &str), BTreeSet<&str>> = BTreeMap::new();
    for event in window_events(repo, ctx, period) {
        groups
            .entry((event.tenancy.as_str(), event.component.as_str()))
            .or_default()
            .insert(event.user_id.as_str());
    }
    groups
}

impl LicenceReport {
    /// Compute utilization for `period`, with deltas against its comparison
    /// window. `capacity` maps component to platform ceiling.
    pub fn compute(
        repo: &EventRepository,
        ctx: &FilterContext,
        period: &Period,
        capacity: &BTreeMap<String, u64>,
    ) -> Self {
        let current = active_by_key(repo, ctx, period);
        let previous = active_by_key(repo, ctx, &period.comparison());

        let mut keys: BTreeSet<TenancyKey> = repo
            .allocations()
            .iter()
            .filter(|a| ctx.matches_allocation(&a.tenancy, &a.component))
            .map(|a| (a.tenancy.clone(), a.component.clone()))
            .collect();
        keys.extend(
            current
                .keys()
                .chain(previous.keys())
                .map(|(t, c)| (t.to_string(), c.to_string())),
        );

        let ceiling = |component: &str| capacity.get(component).copied().unwrap_or(0);
        let count = |groups: &BTreeMap<(&str, &str), BTreeSet<&str>>, t: &str, c: &str| {
            groups.get(&(t, c)).map_or(0, BTreeSet::len)
        };

        let rows: Vec<LicenceRow> = keys
            .iter()
            .map(|(tenancy, component)| {
                let assigned = repo.assigned(tenancy, component);
                let active = count(&current, tenancy.as_str(), component.as_str());
                let active_prev = count(&previous, tenancy.as_str(), component.as_str());
                LicenceRow {
                    tenancy: tenancy.clone(),
                    component: component.clone(),
                    assigned,
                    active,
                    active_delta: MetricDelta::from_counts(active, active_prev),
                    utilization_pct: percent_of(active as f64, assigned as f64),
                    capacity_pct: percent_of(active as f64, ceiling(component.as_str()) as f64),
                }
            })
            .collect();

        let mut sums: BTreeMap<&str, (u64, usize, usize)> = BTreeMap::new();
        for row in &rows {
            let entry = sums.entry(row.component.as_str()).or_default();
            entry.0 += row.assigned;
            entry.1 += row.active;
            entry.2 += row.active_delta.previous as usize;
        }

        let components = sums
            .into_iter()
            .map(|(component, (assigned, active, active_prev))| {
                let capacity = ceiling(component);
                ComponentLicenceSummary {
                    component: component.to_string(),
                    assigned,
                    active,
                    capacity,
                    assigned_capacity_pct: percent_of(assigned as f64, capacity as f64),
                    active_capacity_pct: percent_of(active as f64, capacity as f64),
                    active_delta: MetricDelta::from_counts(active, active_prev),
                }
            })
            .collect();

        Self { rows, components }
    }

    pub fn row(&self, tenancy: &str, component: &str) -> Option<&LicenceRow> {
        self.rows
            .iter()
            .find(|r| r.tenancy == tenancy && r.component == component)
    }

    pub fn component(&self, component: &str) -> Option<&ComponentLicenceSummary> {
        self.components.iter().find(|c| c.component == component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Allocation, UsageEvent};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn capacity() -> BTreeMap<String, u64> {
        BTreeMap::from([("Connect".to_string(), 10), ("Workbench".to_string(), 0)])
    }

    fn march() -> Period {
        Period::from_dates(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
        .unwrap()
    }

    fn repo() -> EventRepository {
        let day = |m: u32, d: u32| Utc.with_ymd_and_hms(2024, m, d, 9, 0, 0).unwrap();
        EventRepository::new(
            vec![
                UsageEvent::new("a1", "Acme", "Connect", "Production", day(3, 2)),
                UsageEvent::new("a2", "Acme", "Connect", "Production", day(3, 3)),
                UsageEvent::new("a3", "Acme", "Connect", "Production", day(3, 4)),
                UsageEvent::new("a1", "Acme", "Connect", "Production", day(2, 10)),
                UsageEvent::new("w1", "Acme", "Workbench", "Production", day(2, 11)),
                UsageEvent::new("g1", "Globex", "Connect", "Production", day(3, 9)),
            ],
            vec![
                Allocation::new("Acme", "Connect", 2),
                Allocation::new("Initech", "Connect", 5),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_over_assignment_is_reported_not_clipped() {
        let report = LicenceReport::compute(&repo(), &FilterContext::all(), &march(), &capacity());
        let acme = report.row("Acme", "Connect").unwrap();
        assert_eq!(acme.assigned, 2);
        assert_eq!(acme.active, 3);
        assert_eq!(acme.utilization_pct, 150.0);
        assert_eq!(acme.capacity_pct, 30.0);
        assert_eq!(acme.active_delta.previous, 1.0);
        assert_eq!(acme.active_delta.percent_change, 200.0);
    }

    #[test]
    fn test_missing_allocation_defaults_to_zero() {
        let report = LicenceReport::compute(&repo(), &FilterContext::all(), &march(), &capacity());
        let globex = report.row("Globex", "Connect").unwrap();
        assert_eq!(globex.assigned, 0);
        assert_eq!(globex.active, 1);
        assert_eq!(globex.utilization_pct, 0.0);

        let initech = report.row("Initech", "Connect").unwrap();
        assert_eq!(initech.assigned, 5);
        assert_eq!(initech.active, 0);
    }

    #[test]
    fn test_inactive_now_but_active_before_keeps_row() {
        let report = LicenceReport::compute(&repo(), &FilterContext::all(), &march(), &capacity());
        let workbench = report.row("Acme", "Workbench").unwrap();
        assert_eq!(workbench.active, 0);
        assert_eq!(workbench.active_delta.previous, 1.0);
        assert_eq!(workbench.active_delta.percent_change, -100.0);
        assert_eq!(workbench.capacity_pct, 0.0);
    }

    #[test]
    fn test_component_summary() {
        let report = LicenceReport::compute(&repo(), &FilterContext::all(), &march(), &capacity());
        let connect = report.component("Connect").unwrap();
        assert_eq!(connect.assigned, 7);
        assert_eq!(connect.active, 4);
        assert_eq!(connect.capacity, 10);
        assert_eq!(connect.assigned_capacity_pct, 70.0);
        assert_eq!(connect.active_capacity_pct, 40.0);
        assert_eq!(connect.active_delta.previous, 1.0);
    }

    #[test]
    fn test_tenancy_filter_limits_rows() {
        let ctx = FilterContext::all().with_tenancy("Initech");
        let report = LicenceReport::compute(&repo(), &ctx, &march(), &capacity());
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].tenancy, "Initech");
    }
}
