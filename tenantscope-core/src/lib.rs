//! # tenantscope-core
//!
//! Core library for tenantscope - usage and licence analytics for
//! multi-tenant platforms.
//!
//! This library provides:
//! - Domain types for usage events, licence allocations and user summaries
//! - CSV ingest into an immutable, shareable event repository
//! - Filtering by tenancy, environment and component
//! - Pure analytics over a reporting window and its comparison window
//! - CSV and Markdown export, configuration and logging
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Ingest:** event log and allocation snapshot CSVs, validated on load
//! - **Repository:** immutable events plus first-seen and allocation indexes
//! - **Analytics:** metrics computed on demand from a filter and a period
//!
//! ## Example
//!
//! ```rust,no_run
//! use tenantscope_core::analytics::{AnalyticsSettings, UsageEngine};
//! use tenantscope_core::{Config, EventRepository, FilterContext, Period};
//!
//! let config = Config::load().expect("failed to load config");
//! let repo = EventRepository::load(
//!     &config.data.events_path(),
//!     &config.data.allocations_path(),
//! )
//! .expect("failed to load usage data");
//!
//! let engine = UsageEngine::new(&repo, AnalyticsSettings::from_config(&config));
//! let end = repo.latest_timestamp().expect("no events").date_naive();
//! let period = Period::trailing_days(end, 30).expect("valid period");
//! let report = engine.report(&FilterContext::all(), &period);
//! println!("{} active users", report.overview.active_users.current);
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use filter::{FilterContext, FilterOptions, Selector};
pub use period::Period;
pub use repository::EventRepository;
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod period;
pub mod repository;
pub mod types;
