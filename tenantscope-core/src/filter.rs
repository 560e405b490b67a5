//! Dimension filters applied before any aggregation.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::repository::EventRepository;
use crate::types::UsageEvent;

/// Choice shown for "every tenancy".
pub const ALL_TENANCIES: &str = "All Tenancies";
/// Choice shown for "every environment".
pub const ALL_ENVIRONMENTS: &str = "All Environments";
/// Choice shown for "every component".
pub const ALL_COMPONENTS: &str = "All Components";

/// Environments offered even before any event mentions them.
const BASE_ENVIRONMENTS: [&str; 3] = ["Production", "Development", "Staging"];

/// Selection for a single dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Matches every value
    #[default]
    All,
    /// Matches one exact value
    Exact(String),
}

impl Selector {
    /// Map a UI choice to a selector; `sentinel` and the empty string match all.
    pub fn from_choice(value: &str, sentinel: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == sentinel {
            Selector::All
        } else {
            Selector::Exact(value.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selector::All => true,
            Selector::Exact(expected) => expected == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selector::All)
    }
}

/// Conjunction of tenancy, environment and component selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FilterContext {
    pub tenancy: Selector,
    pub environment: Selector,
    pub component: Selector,
}

impl FilterContext {
    /// A context that matches every event.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a context from the three UI choice strings.
    pub fn from_choices(tenancy: &str, environment: &str, component: &str) -> Self {
        Self {
            tenancy: Selector::from_choice(tenancy, ALL_TENANCIES),
            environment: Selector::from_choice(environment, ALL_ENVIRONMENTS),
            component: Selector::from_choice(component, ALL_COMPONENTS),
        }
    }

    pub fn with_tenancy(mut self, tenancy: impl Into<String>) -> Self {
        self.tenancy = Selector::Exact(tenancy.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Selector::Exact(environment.into());
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Selector::Exact(component.into());
        self
    }

    /// Whether an event passes all three selectors.
    pub fn matches(&self, event: &UsageEvent) -> bool {
        self.tenancy.matches(&event.tenancy)
            && self.environment.matches(&event.environment)
            && self.component.matches(&event.component)
    }

    /// Whether an allocation row passes; allocations carry no environment.
    pub fn matches_allocation(&self, tenancy: &str, component: &str) -> bool {
        self.tenancy.matches(tenancy) && self.component.matches(component)
    }
}

/// Selectable values for each dimension, sentinel first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub tenancies: Vec<String>,
    pub environments: Vec<String>,
    pub components: Vec<String>,
}

impl FilterOptions {
    pub fn from_repository(repo: &EventRepository) -> Self {
        let tenancies: BTreeSet<&str> = repo.events().iter().map(|e| e.tenancy.as_str()).collect();
        let observed_envs: BTreeSet<&str> = repo
            .events()
            .iter()
            .map(|e| e.environment.as_str())
            .collect();
        let components: BTreeSet<&str> = repo
            .events()
            .iter()
            .map(|e| e.component.as_str())
            .chain(repo.allocations().iter().map(|a| a.component.as_str()))
            .collect();

        let mut environments: Vec<String> = vec![ALL_ENVIRONMENTS.to_string()];
        for env in BASE_ENVIRONMENTS.into_iter().chain(observed_envs) {
            if !environments.iter().any(|e| e == env) {
                environments.push(env.to_string());
            }
        }

        Self {
            tenancies: std::iter::once(ALL_TENANCIES)
                .chain(tenancies)
                .map(String::from)
                .collect(),
            environments,
            components: std::iter::once(ALL_COMPONENTS)
                .chain(components)
                .map(String::from)
                .collect(),
        }
    }
}
