//! Tabular export of report sections as CSV or Markdown.

use std::io::Write;

use crate::analytics::{LicenceReport, TenancyPivot, TenancyRollup};
use crate::error::{Error, Result};
use crate::types::UserSummary;

/// A rectangular table of already-rendered cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    /// GitHub-flavored Markdown table. Pipes in cells are escaped.
    pub fn to_markdown(&self) -> String {
        let line = |cells: &[String]| {
            let joined: Vec<String> = cells.iter().map(|c| c.replace('|', "\\|")).collect();
            format!("| {} |\n", joined.join(" | "))
        };

        let mut out = line(self.headers.as_slice());
        out.push_str(&format!(
            "|{}\n",
            "---|".repeat(self.headers.len().max(1))
        ));
        for row in &self.rows {
            out.push_str(&line(row.as_slice()));
        }
        out
    }
}

fn pct(value: f64) -> String {
    format!("{:.1}", value)
}

/// One row per `(tenancy, component)` with assigned vs active licences.
pub fn licence_table(report: &LicenceReport) -> Table {
    let mut table = Table::new([
        "tenancy",
        "component",
        "assigned",
        "active",
        "previous_active",
        "change_pct",
        "utilization_pct",
        "capacity_pct",
    ]);
    for row in &report.rows {
        table.push_row(vec![
            row.tenancy.clone(),
            row.component.clone(),
            row.assigned.to_string(),
            row.active.to_string(),
            (row.active_delta.previous as u64).to_string(),
            pct(row.active_delta.percent_change),
            pct(row.utilization_pct),
            pct(row.capacity_pct),
        ]);
    }
    table
}

/// Tenancy pivot with total/active/assigned columns per component.
pub fn tenancy_table(pivot: &TenancyPivot) -> Table {
    let mut headers = vec![
        "tenancy".to_string(),
        "total_users".to_string(),
        "active_users".to_string(),
    ];
    for component in &pivot.components {
        headers.push(format!("{} total", component));
        headers.push(format!("{} active", component));
        headers.push(format!("{} assigned", component));
    }

    let mut table = Table::new(headers);
    for row in &pivot.rows {
        let mut cells = vec![
            row.tenancy.clone(),
            row.total_users.to_string(),
            row.active_users.to_string(),
        ];
        for cell in &row.components {
            cells.push(cell.total_users.to_string());
            cells.push(cell.active_users.to_string());
            cells.push(cell.assigned.to_string());
        }
        table.push_row(cells);
    }
    table
}

/// Rollup rows followed by the per-component total rows.
pub fn rollup_table(rollup: &TenancyRollup) -> Table {
    let mut table = Table::new(["tenancy", "component", "total_users", "active_users", "weight"]);
    for row in rollup.rows.iter().chain(&rollup.totals) {
        table.push_row(vec![
            row.tenancy.clone(),
            row.component.clone(),
            row.total_users.to_string(),
            row.active_users.to_string(),
            format!("{:.1}", row.weight),
        ]);
    }
    table
}

pub fn user_table<'a, I>(users: I) -> Table
where
    I: IntoIterator<Item = &'a UserSummary>,
{
    let mut table = Table::new([
        "user_id",
        "tenancy",
        "component",
        "environment",
        "first_seen",
        "last_seen",
        "events",
    ]);
    for user in users {
        table.push_row(vec![
            user.user_id.clone(),
            user.tenancy.clone(),
            user.component.clone(),
            user.environment.clone(),
            user.first_seen.to_rfc3339(),
            user.last_seen.to_rfc3339(),
            format!("{:.1}", user.event_count),
        ]);
    }
    table
}
