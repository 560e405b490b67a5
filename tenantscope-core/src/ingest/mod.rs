//! Ingestion of the event log and allocation snapshot
//!
//! Both inputs are delimited files with a header row. Loading is strict:
//! the first malformed record aborts the load with
//! [`Error::SchemaViolation`](crate::Error::SchemaViolation) naming its line,
//! so a bad export never produces a silently smaller dataset.
//!
//! ## Formats
//!
//! ```text
//! events.csv       user_id,tenancy,component,environment,timestamp,weight
//! allocations.csv  tenancy,component,assigned
//! ```
//!
//! `weight` may be omitted (column or cell) and defaults to `1`. Column
//! names from older dashboard exports (`userId`, `lastLogin`, `loginCount`,
//! `licencesUsed`) are accepted as aliases.

mod timestamp;

pub use timestamp::parse_timestamp;

use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{Allocation, UsageEvent};

/// One row of the event log as it appears on disk.
#[derive(Debug, Deserialize)]
struct EventRecord {
    #[serde(alias = "userId", alias = "user_identity")]
    user_id: String,
    tenancy: String,
    component: String,
    #[serde(alias = "environment_or_product", alias = "product")]
    environment: String,
    #[serde(alias = "lastLogin", alias = "date")]
    timestamp: String,
    #[serde(default, alias = "loginCount")]
    weight: Option<f64>,
}

/// One row of the allocation snapshot as it appears on disk.
#[derive(Debug, Deserialize)]
struct AllocationRecord {
    tenancy: String,
    component: String,
    #[serde(alias = "licencesUsed", alias = "assignedCount", alias = "assigned_count")]
    assigned: u64,
}

/// Load the event log from a file.
pub fn load_events(path: &Path) -> Result<Vec<UsageEvent>> {
    tracing::debug!(path = %path.display(), "Reading event log");
    let file = std::fs::File::open(path)?;
    read_events(file)
}

/// Load the allocation snapshot from a file.
pub fn load_allocations(path: &Path) -> Result<Vec<Allocation>> {
    tracing::debug!(path = %path.display(), "Reading allocation snapshot");
    let file = std::fs::File::open(path)?;
    read_allocations(file)
}

/// Parse an event log from any reader.
pub fn read_events<R: Read>(reader: R) -> Result<Vec<UsageEvent>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut events = Vec::new();

    for row in rdr.records() {
        let row = row?;
        let line = line_of(&row);
        let record: EventRecord = row
            .deserialize(Some(&headers))
            .map_err(|e| Error::schema_at(line, format!("malformed event: {e}")))?;

        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| {
            Error::schema_at(
                line,
                format!("unparsable timestamp '{}'", record.timestamp),
            )
        })?;
        let weight = record.weight.unwrap_or(1.0);
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::schema_at(line, format!("invalid weight {weight}")));
        }
        if record.user_id.is_empty() {
            return Err(Error::schema_at(line, "empty user id"));
        }

        events.push(UsageEvent {
            user_id: record.user_id,
            tenancy: record.tenancy,
            component: record.component,
            environment: record.environment,
            timestamp,
            weight,
        });
    }

    Ok(events)
}

/// Parse an allocation snapshot from any reader.
pub fn read_allocations<R: Read>(reader: R) -> Result<Vec<Allocation>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut allocations = Vec::new();

    for row in rdr.records() {
        let row = row?;
        let line = line_of(&row);
        let record: AllocationRecord = row
            .deserialize(Some(&headers))
            .map_err(|e| Error::schema_at(line, format!("malformed allocation: {e}")))?;
        allocations.push(Allocation {
            tenancy: record.tenancy,
            component: record.component,
            assigned: record.assigned,
        });
    }

    Ok(allocations)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn line_of(row: &csv::StringRecord) -> u64 {
    row.position().map(|p| p.line()).unwrap_or(0)
}
