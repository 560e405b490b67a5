//! Analytics module for tenantscope
//!
//! Turns the event snapshot plus a [`FilterContext`] and [`Period`] into
//! derived metrics:
//! - Active, new, known and dormant users, per-user summaries
//! - Usage-frequency distribution
//! - Tenancy/component rollups and the per-tenancy pivot
//! - Licence utilization against allocations and capacity ceilings
//! - Weekly trend and top tenancies
//! - Period-over-period deltas
//!
//! ## Dependency graph
//!
//! ```text
//! FilterContext ─┐
//!                ├─► Period ─► comparison Period
//!                │      │             │
//!                ▼      ▼             ▼
//!          per-metric computations (pure functions)
//!                       │
//!                       ▼
//!                 MetricDelta ─► UsageReport
//! ```
//!
//! Every function here is a pure function of its arguments: nothing reads
//! ambient state, and recomputing with identical inputs yields identical
//! outputs. Grouped outputs are emitted in sorted key order.

pub mod delta;
pub mod distribution;
pub mod engine;
pub mod licence;
pub mod report;
pub mod rollup;
pub mod trend;
pub mod users;

pub use delta::{percent_change, MetricDelta};
pub use distribution::{BandCount, FrequencyBand, FrequencyDistribution};
pub use engine::{AnalyticsSettings, UsageEngine};
pub use licence::{ComponentLicenceSummary, LicenceReport, LicenceRow};
pub use report::{generate_report, Overview, UsageReport};
pub use rollup::{
    ComponentCell, TenancyActivity, TenancyPivot, TenancyPivotRow, TenancyRollup,
    TenancyRollupRow, TOTAL_ROW,
};
pub use trend::WeeklyPoint;
pub use users::WindowTotals;

use crate::filter::FilterContext;
use crate::period::Period;
use crate::repository::EventRepository;
use crate::types::UsageEvent;

/// Events that pass the filter, regardless of time.
pub(crate) fn filtered_events<'a: 'c, 'c>(
    repo: &'a EventRepository,
    ctx: &'c FilterContext,
) -> impl Iterator<Item = &'a UsageEvent> + 'c {
    repo.events().iter().filter(move |e| ctx.matches(e))
}

/// Events that pass the filter and fall inside `period`.
pub(crate) fn window_events<'a: 'c, 'c>(
    repo: &'a EventRepository,
    ctx: &'c FilterContext,
    period: &Period,
) -> impl Iterator<Item = &'a UsageEvent> + 'c {
    let period = *period;
    filtered_events(repo, ctx).filter(move |e| period.contains(e.timestamp))
}
