//! Core domain types for tenantscope
//!
//! These are the value objects the aggregation engine reads and produces.
//! None of them has an identity beyond the computation that built it.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Tenancy** | A customer organisation on the platform |
//! | **Component** | A licensed product surface (e.g. Connect, Workbench) |
//! | **Environment** | Deployment stage or product line an event came from |
//! | **Event** | One login/usage occurrence by one user |
//! | **Allocation** | Externally assigned licence count for a tenancy/component |
//! | **Window** | Inclusive time range that metrics are counted over |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Raw inputs
// ============================================

/// A single login/usage occurrence.
///
/// Events are never mutated after loading; the engine only filters and
/// groups them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    /// User identity
    pub user_id: String,
    /// Tenancy the user belongs to
    pub tenancy: String,
    /// Component the user is licensed for
    pub component: String,
    /// Environment or product the event came from
    pub environment: String,
    /// When the event happened
    pub timestamp: DateTime<Utc>,
    /// Login count or session-hours contribution
    pub weight: f64,
}

impl UsageEvent {
    /// Create an event with the default weight of one.
    pub fn new(
        user_id: impl Into<String>,
        tenancy: impl Into<String>,
        component: impl Into<String>,
        environment: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            tenancy: tenancy.into(),
            component: component.into(),
            environment: environment.into(),
            timestamp,
            weight: 1.0,
        }
    }

    /// Replace the weight of this event.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// Assigned licence count for one tenancy/component pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub tenancy: String,
    pub component: String,
    /// Licences assigned to the tenancy for this component
    pub assigned: u64,
}

impl Allocation {
    pub fn new(tenancy: impl Into<String>, component: impl Into<String>, assigned: u64) -> Self {
        Self {
            tenancy: tenancy.into(),
            component: component.into(),
            assigned,
        }
    }
}

// ============================================
// Derived values
// ============================================

/// Per-user activity within a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub user_id: String,
    /// Tenancy taken from the most recent event in the window
    pub tenancy: String,
    /// Component taken from the most recent event in the window
    pub component: String,
    /// Environment taken from the most recent event in the window
    pub environment: String,
    /// Earliest event in the window
    pub first_seen: DateTime<Utc>,
    /// Most recent event in the window
    pub last_seen: DateTime<Utc>,
    /// Sum of event weight in the window
    pub event_count: f64,
}

/// Key used by every tenancy/component grouping.
pub type TenancyKey = (String, String);
