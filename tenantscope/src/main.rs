//! tenantscope - usage and licence report CLI
//!
//! Loads the event log and allocation snapshot, applies the selected
//! filters and prints a report for one window against the window before it.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tenantscope_core::analytics::{
    AnalyticsSettings, FrequencyDistribution, UsageEngine, UsageReport,
};
use tenantscope_core::export::{self, Table};
use tenantscope_core::filter::{ALL_COMPONENTS, ALL_ENVIRONMENTS, ALL_TENANCIES};
use tenantscope_core::format::{
    format_change, format_count, format_delta_count, format_percent, format_weight,
};
use tenantscope_core::{Config, EventRepository, FilterContext, Period, Selector};

#[derive(Parser, Debug)]
#[command(name = "tenantscope")]
#[command(about = "Usage and licence utilization reports for multi-tenant platforms")]
#[command(version)]
struct Args {
    /// First day of the window (format: YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// Last day of the window (format: YYYY-MM-DD, default: latest event)
    #[arg(long)]
    to: Option<String>,

    /// Window length in days when --from is not given
    #[arg(long, conflicts_with = "from")]
    days: Option<u32>,

    /// Only include this tenancy
    #[arg(long)]
    tenancy: Option<String>,

    /// Only include this environment
    #[arg(long)]
    environment: Option<String>,

    /// Only include this component
    #[arg(long)]
    component: Option<String>,

    /// Show users whose id contains this text
    #[arg(long)]
    search: Option<String>,

    /// Export format (md = markdown, json = JSON, csv = one table as CSV)
    #[arg(long, value_enum)]
    export: Option<ExportFormat>,

    /// Table written by --export csv
    #[arg(long, value_enum, default_value_t = TableKind::Licences)]
    table: TableKind,

    /// List the values each filter accepts and exit
    #[arg(long)]
    list_filters: bool,

    /// Event log CSV (overrides config)
    #[arg(long)]
    events: Option<PathBuf>,

    /// Allocation snapshot CSV (overrides config)
    #[arg(long)]
    allocations: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Md,
    Json,
    Csv,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum TableKind {
    Licences,
    Tenancies,
    Rollup,
    Users,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration and data
    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = tenantscope_core::logging::init(&config.logging).ok();

    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| config.data.events_path());
    let allocations_path = args
        .allocations
        .clone()
        .unwrap_or_else(|| config.data.allocations_path());

    let repo = EventRepository::load(&events_path, &allocations_path)
        .with_context(|| format!("failed to load usage data from {}", events_path.display()))?;
    let engine = UsageEngine::new(&repo, AnalyticsSettings::from_config(&config));

    if args.list_filters {
        print_filter_options(&engine);
        return Ok(());
    }

    let period = resolve_period(&args, &repo, config.report.default_window_days)?;
    let ctx = FilterContext::from_choices(
        args.tenancy.as_deref().unwrap_or(ALL_TENANCIES),
        args.environment.as_deref().unwrap_or(ALL_ENVIRONMENTS),
        args.component.as_deref().unwrap_or(ALL_COMPONENTS),
    );

    let mut report = engine.report(&ctx, &period);
    if let Some(query) = &args.search {
        report.users = engine.users(&ctx, &period, Some(query));
    }

    // Output based on export format
    match args.export {
        Some(ExportFormat::Json) => print_json(&report)?,
        Some(ExportFormat::Md) => print_markdown(&report, args.search.is_some()),
        Some(ExportFormat::Csv) => {
            let table = select_table(&report, args.table);
            table
                .write_csv(std::io::stdout().lock())
                .context("failed to write CSV")?;
        }
        None => print_terminal(&report, args.search.is_some()),
    }

    Ok(())
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD (e.g., 2024-03-31)", value))
}

/// Explicit `--from/--to`, otherwise a trailing window ending at `--to` or
/// at the latest event in the data.
fn resolve_period(args: &Args, repo: &EventRepository, default_days: u32) -> Result<Period> {
    let end = match &args.to {
        Some(to) => parse_date(to)?,
        None => repo
            .latest_timestamp()
            .map(|ts| ts.date_naive())
            .unwrap_or_else(|| Local::now().date_naive()),
    };

    if let Some(from) = &args.from {
        let start = parse_date(from)?;
        if start > end {
            anyhow::bail!("--from {} is after --to {}", start, end);
        }
        return Ok(Period::from_dates(start, end)?);
    }

    let days = args.days.unwrap_or(default_days);
    if days == 0 {
        anyhow::bail!("--days must be at least 1");
    }
    Ok(Period::trailing_days(end, days)?)
}

fn select_table(report: &UsageReport, kind: TableKind) -> Table {
    match kind {
        TableKind::Licences => export::licence_table(&report.licences),
        TableKind::Tenancies => export::tenancy_table(&report.pivot),
        TableKind::Rollup => export::rollup_table(&report.rollup),
        TableKind::Users => export::user_table(&report.users),
    }
}

fn print_filter_options(engine: &UsageEngine<'_>) {
    let options = engine.filter_options();
    println!("Tenancies:    {}", options.tenancies.join(", "));
    println!("Environments: {}", options.environments.join(", "));
    println!("Components:   {}", options.components.join(", "));
}

fn filter_label(report: &UsageReport) -> String {
    let describe = |selector: &Selector, all: &str| match selector {
        Selector::All => all.to_string(),
        Selector::Exact(value) => value.clone(),
    };
    format!(
        "{} / {} / {}",
        describe(&report.filter.tenancy, ALL_TENANCIES),
        describe(&report.filter.environment, ALL_ENVIRONMENTS),
        describe(&report.filter.component, ALL_COMPONENTS),
    )
}

fn print_terminal(report: &UsageReport, show_users: bool) {
    let title = format!("Usage Report: {}", report.period.label());

    // Header
    println!();
    println!("╭{}╮", "─".repeat(60));
    println!("│{:^60}│", title);
    println!("╰{}╯", "─".repeat(60));
    println!("   Filter:     {}", filter_label(report));
    println!("   Compared to {}", report.comparison.label());
    println!();

    if report.overview.known_users == 0 {
        println!("  No activity found for this selection.");
        println!();
        return;
    }

    let overview = &report.overview;
    println!("OVERVIEW");
    println!(
        "   Active users:   {:<22} New users: {}",
        format_delta_count(&overview.active_users),
        format_delta_count(&overview.new_users)
    );
    println!(
        "   Dormant users:  {:<22} Known users: {}",
        format_delta_count(&overview.dormant_users),
        format_count(overview.known_users as u64)
    );
    println!(
        "   Total weight:   {} ({})",
        format_weight(overview.total_weight.current),
        format_change(overview.total_weight.percent_change)
    );
    println!(
        "   Per active user: {} weight, {} events",
        format_weight(overview.weight_per_active_user.current),
        format_weight(overview.events_per_active_user.current)
    );
    println!();

    print_distribution(&report.distribution);

    if !report.licences.components.is_empty() {
        println!("LICENCES");
        for summary in &report.licences.components {
            println!(
                "   {:<12} assigned {:>8}  active {:>8}  of {:>8} ceiling  ({} active, {})",
                summary.component,
                format_count(summary.assigned),
                format_count(summary.active as u64),
                format_count(summary.capacity),
                format_percent(summary.active_capacity_pct),
                format_change(summary.active_delta.percent_change)
            );
        }
        for row in &report.licences.rows {
            println!(
                "     {:<20} {:<12} {:>6} / {:<6} {:>8}",
                row.tenancy,
                row.component,
                format_count(row.active as u64),
                format_count(row.assigned),
                format_percent(row.utilization_pct)
            );
        }
        println!();
    }

    if !report.top_tenancies.is_empty() {
        println!("TOP TENANCIES");
        for (i, tenancy) in report.top_tenancies.iter().enumerate() {
            println!(
                "   {}. {:<24} {:>6} active  {:>10} weight",
                i + 1,
                tenancy.tenancy,
                format_count(tenancy.active_users as u64),
                format_weight(tenancy.weight)
            );
        }
        println!();
    }

    println!("WEEKLY TREND");
    let peak = report
        .weekly_trend
        .iter()
        .map(|p| p.active_users)
        .max()
        .unwrap_or(0)
        .max(1);
    for point in &report.weekly_trend {
        let bar = "█".repeat(point.active_users * 30 / peak);
        println!(
            "   {}  {:>6}  {}",
            point.week_start.format("%b %d"),
            format_count(point.active_users as u64),
            bar
        );
    }
    println!();

    if show_users {
        println!("USERS ({})", report.users.len());
        for user in &report.users {
            println!(
                "   {:<24} {:<16} {:<12} last seen {}",
                user.user_id,
                user.tenancy,
                user.component,
                user.last_seen.format("%Y-%m-%d")
            );
        }
        println!();
    }
}

fn print_distribution(distribution: &FrequencyDistribution) {
    println!("USAGE FREQUENCY");
    for bucket in &distribution.buckets {
        println!(
            "   {:<12} {:>6}  {:>7}",
            bucket.label,
            format_count(bucket.users as u64),
            format_percent(bucket.percent)
        );
    }
    println!();
}

fn print_markdown(report: &UsageReport, show_users: bool) {
    println!("# Usage Report: {}", report.period.label());
    println!();
    println!("*Filter: {}*", filter_label(report));
    println!();
    println!("*Compared to {}*", report.comparison.label());
    println!();

    let overview = &report.overview;
    println!("## Summary");
    println!();
    let mut summary = Table::new(["Metric", "Current", "Previous", "Change"]);
    for (name, delta) in [
        ("Active users", &overview.active_users),
        ("New users", &overview.new_users),
        ("Dormant users", &overview.dormant_users),
        ("Event records", &overview.event_records),
        ("Total weight", &overview.total_weight),
        ("Weight per active user", &overview.weight_per_active_user),
        ("Events per active user", &overview.events_per_active_user),
    ] {
        summary.push_row(vec![
            name.to_string(),
            format_weight(delta.current),
            format_weight(delta.previous),
            format_change(delta.percent_change),
        ]);
    }
    print!("{}", summary.to_markdown());
    println!();
    println!("Known users: {}", format_count(overview.known_users as u64));
    println!();

    println!("## Usage Frequency");
    println!();
    let mut bands = Table::new(["Band", "Users", "Share"]);
    for bucket in &report.distribution.buckets {
        bands.push_row(vec![
            bucket.label.to_string(),
            format_count(bucket.users as u64),
            format_percent(bucket.percent),
        ]);
    }
    print!("{}", bands.to_markdown());
    println!();

    println!("## Licences");
    println!();
    print!("{}", export::licence_table(&report.licences).to_markdown());
    println!();

    println!("## Tenancies");
    println!();
    print!("{}", export::tenancy_table(&report.pivot).to_markdown());
    println!();

    if show_users {
        println!("## Users");
        println!();
        print!("{}", export::user_table(&report.users).to_markdown());
        println!();
    }
}

fn print_json(report: &UsageReport) -> Result<()> {
    let json = report.to_json().context("failed to serialize report")?;
    println!("{}", json);
    Ok(())
}
