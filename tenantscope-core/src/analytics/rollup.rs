//! Tenancy and component rollups.
//!
//! Totals are cumulative over every matching event; active counts are
//! restricted to the window. Rows cover the outer union of keys seen in
//! either grouping, and absent combinations report zero instead of being
//! dropped.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::{filtered_events, window_events};
use crate::filter::FilterContext;
use crate::period::Period;
use crate::repository::EventRepository;

/// Tenancy label used for synthetic per-component total rows.
pub const TOTAL_ROW: &str = "Total";

/// One `(tenancy, component)` row of the rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenancyRollupRow {
    pub tenancy: String,
    pub component: String,
    /// Distinct users with any matching event to date
    pub total_users: usize,
    /// Distinct users active in the window
    pub active_users: usize,
    /// Event weight inside the window
    pub weight: f64,
}

/// Rollup rows plus one total row per component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenancyRollup {
    /// Sorted by tenancy, then component
    pub rows: Vec<TenancyRollupRow>,
    /// One row per component with tenancy [`TOTAL_ROW`]
    pub totals: Vec<TenancyRollupRow>,
}

#[derive(Default)]
struct KeyStats<'a> {
    all_users: BTreeSet<&'a str>,
    active_users: BTreeSet<&'a str>,
    weight: f64,
}

fn group_by_key<'a>(
    repo: &'a EventRepository,
    ctx: &FilterContext,
    period: &Period,
) -> BTreeMap<(&'a str, &'a str), KeyStats<'a>> {
    let mut groups: BTreeMap<(&str, &str), KeyStats<'_>> = BTreeMap::new();

    for event in filtered_events(repo, ctx) {
        let stats = groups
            .entry((event.tenancy.as_str(), event.component.as_str()))
            .or_default();
        stats.all_users.insert(event.user_id.as_str());
        if period.contains(event.timestamp) {
            stats.active_users.insert(event.user_id.as_str());
            stats.weight += event.weight;
        }
    }

    groups
}

impl TenancyRollup {
    pub fn compute(repo: &EventRepository, ctx: &FilterContext, period: &Period) -> Self {
        let groups = group_by_key(repo, ctx, period);

        let rows: Vec<TenancyRollupRow> = groups
            .iter()
            .map(|((tenancy, component), stats)| TenancyRollupRow {
                tenancy: tenancy.to_string(),
                component: component.to_string(),
                total_users: stats.all_users.len(),
                active_users: stats.active_users.len(),
                weight: stats.weight,
            })
            .collect();

        let mut by_component: BTreeMap<&str, TenancyRollupRow> = BTreeMap::new();
        for row in &rows {
            let total = by_component
                .entry(row.component.as_str())
                .or_insert_with(|| TenancyRollupRow {
                    tenancy: TOTAL_ROW.to_string(),
                    component: row.component.clone(),
                    total_users: 0,
                    active_users: 0,
                    weight: 0.0,
                });
            total.total_users += row.total_users;
            total.active_users += row.active_users;
            total.weight += row.weight;
        }

        Self {
            totals: by_component.into_values().collect(),
            rows,
        }
    }

    /// Row for a key, if that key was observed.
    pub fn row(&self, tenancy: &str, component: &str) -> Option<&TenancyRollupRow> {
        self.rows
            .iter()
            .find(|r| r.tenancy == tenancy && r.component == component)
    }

    /// Total row for a component, if the component was observed.
    pub fn total_for(&self, component: &str) -> Option<&TenancyRollupRow> {
        self.totals.iter().find(|r| r.component == component)
    }
}

/// Per-component cell of a pivot row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComponentCell {
    pub component: String,
    pub total_users: usize,
    pub active_users: usize,
    /// Assigned licences from the allocation snapshot
    pub assigned: u64,
}

/// One tenancy with its components side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenancyPivotRow {
    pub tenancy: String,
    pub total_users: usize,
    pub active_users: usize,
    /// One cell per pivot column, in [`TenancyPivot::components`] order
    pub components: Vec<ComponentCell>,
}

impl TenancyPivotRow {
    pub fn cell(&self, component: &str) -> Option<&ComponentCell> {
        self.components.iter().find(|c| c.component == component)
    }
}

/// Per-tenancy summary split by component.
///
/// Every tenancy with any matching event appears exactly once, with a cell
/// for every component column even where it has no activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenancyPivot {
    /// Column order for every row's cells
    pub components: Vec<String>,
    pub rows: Vec<TenancyPivotRow>,
}

impl TenancyPivot {
    pub fn compute(repo: &EventRepository, ctx: &FilterContext, period: &Period) -> Self {
        let groups = group_by_key(repo, ctx, period);

        let tenancies: BTreeSet<&str> = groups.keys().map(|(tenancy, _)| *tenancy).collect();
        let components: BTreeSet<&str> = groups
            .keys()
            .map(|(_, component)| *component)
            .chain(
                repo.allocations()
                    .iter()
                    .filter(|a| ctx.matches_allocation(&a.tenancy, &a.component))
                    .map(|a| a.component.as_str()),
            )
            .collect();

        let rows = tenancies
            .iter()
            .map(|tenancy| {
                let cells: Vec<ComponentCell> = components
                    .iter()
                    .map(|component| {
                        let stats = groups.get(&(*tenancy, *component));
                        ComponentCell {
                            component: component.to_string(),
                            total_users: stats.map_or(0, |s| s.all_users.len()),
                            active_users: stats.map_or(0, |s| s.active_users.len()),
                            assigned: repo.assigned(tenancy, component),
                        }
                    })
                    .collect();

                TenancyPivotRow {
                    tenancy: tenancy.to_string(),
                    total_users: cells.iter().map(|c| c.total_users).sum(),
                    active_users: cells.iter().map(|c| c.active_users).sum(),
                    components: cells,
                }
            })
            .collect();

        Self {
            components: components.into_iter().map(String::from).collect(),
            rows,
        }
    }
}

/// A tenancy ranked by activity in the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenancyActivity {
    pub tenancy: String,
    pub active_users: usize,
    pub weight: f64,
}

/// The `limit` tenancies with most active users; ties break by name.
pub fn top_tenancies(
    repo: &EventRepository,
    ctx: &FilterContext,
    period: &Period,
    limit: usize,
) -> Vec<TenancyActivity> {
    let mut by_tenancy: BTreeMap<&str, (BTreeSet<&str>, f64)> = BTreeMap::new();
    for event in window_events(repo, ctx, period) {
        let (users, weight) = by_tenancy.entry(event.tenancy.as_str()).or_default();
        users.insert(event.user_id.as_str());
        *weight += event.weight;
    }

    let mut ranked: Vec<TenancyActivity> = by_tenancy
        .into_iter()
        .map(|(tenancy, (users, weight))| TenancyActivity {
            tenancy: tenancy.to_string(),
            active_users: users.len(),
            weight,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.active_users
            .cmp(&a.active_users)
            .then_with(|| a.tenancy.cmp(&b.tenancy))
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Allocation, UsageEvent};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn repo() -> EventRepository {
        let day = |m: u32, d: u32| Utc.with_ymd_and_hms(2024, m, d, 9, 0, 0).unwrap();
        EventRepository::new(
            vec![
                UsageEvent::new("a1", "Acme", "Connect", "Production", day(3, 2)).with_weight(2.0),
                UsageEvent::new("a2", "Acme", "Connect", "Production", day(1, 9)),
                UsageEvent::new("a3", "Acme", "Workbench", "Production", day(1, 9)),
                UsageEvent::new("g1", "Globex", "Connect", "Production", day(3, 3)),
                UsageEvent::new("g1", "Globex", "Connect", "Production", day(3, 4)),
            ],
            vec![
                Allocation::new("Acme", "Connect", 10),
                Allocation::new("Initech", "Analyst", 4),
            ],
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
    fn test_rollup_outer_union_keeps_inactive_keys() {
        let rollup = TenancyRollup::compute(&repo(), &FilterContext::all(), &march());
        assert_eq!(rollup.rows.len(), 3);

        let workbench = rollup.row("Acme", "Workbench").unwrap();
        assert_eq!(workbench.total_users, 1);
        assert_eq!(workbench.active_users, 0);
        assert_eq!(workbench.weight, 0.0);

        let acme_connect = rollup.row("Acme", "Connect").unwrap();
        assert_eq!(acme_connect.total_users, 2);
        assert_eq!(acme_connect.active_users, 1);
        assert_eq!(acme_connect.weight, 2.0);
    }

    #[test]
    fn test_rollup_totals_per_component() {
        let rollup = TenancyRollup::compute(&repo(), &FilterContext::all(), &march());
        let connect = rollup.total_for("Connect").unwrap();
        assert_eq!(connect.tenancy, TOTAL_ROW);
        assert_eq!(connect.total_users, 3);
        assert_eq!(connect.active_users, 2);
        assert_eq!(connect.weight, 4.0);
        assert_eq!(rollup.totals.len(), 2);
    }

    #[test]
    fn test_pivot_has_every_tenancy_once_with_all_columns() {
        let pivot = TenancyPivot::compute(&repo(), &FilterContext::all(), &march());
        assert_eq!(pivot.components, vec!["Analyst", "Connect", "Workbench"]);

        let tenancies: Vec<_> = pivot.rows.iter().map(|r| r.tenancy.as_str()).collect();
        assert_eq!(tenancies, vec!["Acme", "Globex"]);

        let globex = &pivot.rows[1];
        assert_eq!(globex.components.len(), 3);
        assert_eq!(globex.cell("Workbench").unwrap().active_users, 0);
        assert_eq!(globex.active_users, 1);

        let acme = &pivot.rows[0];
        assert_eq!(acme.total_users, 3);
        assert_eq!(acme.active_users, 1);
        assert_eq!(acme.cell("Connect").unwrap().assigned, 10);
    }

    #[test]
    fn test_top_tenancies() {
        let top = top_tenancies(&repo(), &FilterContext::all(), &march(), 5);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].tenancy, "Acme");
        assert_eq!(top[0].active_users, 1);
        assert_eq!(top[1].tenancy, "Globex");
        assert_eq!(top[1].weight, 2.0);

        assert_eq!(top_tenancies(&repo(), &FilterContext::all(), &march(), 1).len(), 1);
    }
}
