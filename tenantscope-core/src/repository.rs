//! The immutable event snapshot every computation reads from.
//!
//! [`EventRepository`] is built once per process (see [`crate::ingest`]) and
//! then only borrowed. It owns the events, the allocation snapshot and the
//! first-seen index used for new-user detection.

use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{Allocation, TenancyKey, UsageEvent};

/// Read-only snapshot of usage events and licence allocations.
#[derive(Debug, Clone, Default)]
pub struct EventRepository {
    events: Vec<UsageEvent>,
    allocations: Vec<Allocation>,
    /// (tenancy, component) -> assigned licences
    assigned: BTreeMap<TenancyKey, u64>,
    /// user -> earliest event across the whole repository
    first_seen: HashMap<String, DateTime<Utc>>,
}

/// Tenancy and component pinned to a user by their first event.
struct UserDims<'a> {
    tenancy: &'a str,
    component: &'a str,
}

impl EventRepository {
    /// Validate and index a snapshot.
    ///
    /// Fails with [`Error::SchemaViolation`] when a user appears under more
    /// than one tenancy or component, when an event has an empty user id or
    /// a negative/non-finite weight, or when an allocation key repeats.
    pub fn new(events: Vec<UsageEvent>, allocations: Vec<Allocation>) -> Result<Self> {
        let first_seen = index_users(&events)?;

        let mut assigned = BTreeMap::new();
        for allocation in &allocations {
            let key = (allocation.tenancy.clone(), allocation.component.clone());
            if assigned.insert(key, allocation.assigned).is_some() {
                return Err(Error::schema(format!(
                    "duplicate allocation for tenancy '{}' component '{}'",
                    allocation.tenancy, allocation.component
                )));
            }
        }

        tracing::debug!(
            events = events.len(),
            users = first_seen.len(),
            allocations = allocations.len(),
            "Event repository indexed"
        );

        Ok(Self {
            events,
            allocations,
            assigned,
            first_seen,
        })
    }

    /// Load both CSV snapshots from disk and validate them.
    ///
    /// A missing allocations file is treated as an empty snapshot.
    pub fn load(events_path: &Path, allocations_path: &Path) -> Result<Self> {
        let events = crate::ingest::load_events(events_path)?;
        let allocations = if allocations_path.exists() {
            crate::ingest::load_allocations(allocations_path)?
        } else {
            tracing::info!(
                path = %allocations_path.display(),
                "No allocation snapshot found, assuming no assigned licences"
            );
            Vec::new()
        };

        let repo = Self::new(events, allocations)?;
        tracing::info!(
            events = repo.events.len(),
            users = repo.user_count(),
            allocations = repo.allocations.len(),
            "Loaded usage snapshot"
        );
        Ok(repo)
    }

    pub fn events(&self) -> &[UsageEvent] {
        &self.events
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of distinct users in the whole repository.
    pub fn user_count(&self) -> usize {
        self.first_seen.len()
    }

    /// Earliest event of `user_id` across the whole repository.
    pub fn first_seen(&self, user_id: &str) -> Option<DateTime<Utc>> {
        self.first_seen.get(user_id).copied()
    }

    /// Assigned licences for a key; missing rows count as zero.
    pub fn assigned(&self, tenancy: &str, component: &str) -> u64 {
        self.assigned
            .get(&(tenancy.to_string(), component.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Timestamp of the newest event, if any.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.events.iter().map(|e| e.timestamp).max()
    }

    /// Timestamp of the oldest event, if any.
    pub fn earliest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.events.iter().map(|e| e.timestamp).min()
    }
}

/// Check the one-tenancy/one-component rule and collect first-seen times.
fn index_users(events: &[UsageEvent]) -> Result<HashMap<String, DateTime<Utc>>> {
    let mut dims: HashMap<&str, UserDims<'_>> = HashMap::new();
    let mut first_seen: HashMap<String, DateTime<Utc>> = HashMap::new();

    for (idx, event) in events.iter().enumerate() {
        if event.user_id.trim().is_empty() {
            return Err(Error::schema(format!("event #{} has an empty user id", idx + 1)));
        }
        if !event.weight.is_finite() || event.weight < 0.0 {
            return Err(Error::schema(format!(
                "event #{} for user {} has invalid weight {}",
                idx + 1,
                event.user_id,
                event.weight
            )));
        }

        match dims.entry(event.user_id.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(UserDims {
                    tenancy: &event.tenancy,
                    component: &event.component,
                });
            }
            Entry::Occupied(slot) => {
                let known = slot.get();
                if known.tenancy != event.tenancy {
                    return Err(Error::schema(format!(
                        "user {} maps to tenancies '{}' and '{}'",
                        event.user_id, known.tenancy, event.tenancy
                    )));
                }
                if known.component != event.component {
                    return Err(Error::schema(format!(
                        "user {} maps to components '{}' and '{}'",
                        event.user_id, known.component, event.component
                    )));
                }
            }
        }

        first_seen
            .entry(event.user_id.clone())
            .and_modify(|ts| *ts = (*ts).min(event.timestamp))
            .or_insert(event.timestamp);
    }

    Ok(first_seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_first_seen_is_global_minimum() {
        let repo = EventRepository::new(
            vec![
                UsageEvent::new("u1", "Acme", "Connect", "Production", at(9)),
                UsageEvent::new("u1", "Acme", "Connect", "Staging", at(2)),
                UsageEvent::new("u2", "Acme", "Workbench", "Production", at(5)),
            ],
            vec![],
        )
        .unwrap();

        assert_eq!(repo.first_seen("u1"), Some(at(2)));
        assert_eq!(repo.first_seen("u2"), Some(at(5)));
        assert_eq!(repo.first_seen("u3"), None);
        assert_eq!(repo.user_count(), 2);
        assert_eq!(repo.latest_timestamp(), Some(at(9)));
    }

    #[test]
    fn test_user_with_two_tenancies_is_rejected() {
        let err = EventRepository::new(
            vec![
                UsageEvent::new("u1", "Acme", "Connect", "Production", at(1)),
                UsageEvent::new("u1", "Globex", "Connect", "Production", at(2)),
            ],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaViolation { .. }));
        assert!(err.to_string().contains("tenancies"));
    }

    #[test]
    fn test_user_with_two_components_is_rejected() {
        let err = EventRepository::new(
            vec![
                UsageEvent::new("u1", "Acme", "Connect", "Production", at(1)),
                UsageEvent::new("u1", "Acme", "Workbench", "Production", at(2)),
            ],
            vec![],
        )
        .unwrap_err();
        assert!(err.to_string().contains("components"));
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let err = EventRepository::new(
            vec![UsageEvent::new("u1", "Acme", "Connect", "Production", at(1)).with_weight(-1.0)],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaViolation { .. }));
    }

    #[test]
    fn test_allocation_lookup_defaults_to_zero() {
        let repo = EventRepository::new(vec![], vec![Allocation::new("Acme", "Connect", 40)]).unwrap();
        assert_eq!(repo.assigned("Acme", "Connect"), 40);
        assert_eq!(repo.assigned("Acme", "Workbench"), 0);
        assert!(repo.is_empty());
    }

    #[test]
    fn test_duplicate_allocation_is_rejected() {
        let err = EventRepository::new(
            vec![],
            vec![
                Allocation::new("Acme", "Connect", 40),
                Allocation::new("Acme", "Connect", 50),
            ],
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate allocation"));
    }
}
