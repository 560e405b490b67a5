//! Usage-frequency distribution.
//!
//! Each user in the filtered population is placed in exactly one band by
//! their normalized weekly activity, `window weight / weeks in window`.
//! Bands are lower-inclusive: exactly 5.0 per week is "5–9/week".

use serde::Serialize;
use std::collections::HashMap;

use super::delta::percent_of;
use super::users::known_users;
use super::window_events;
use crate::filter::FilterContext;
use crate::period::Period;
use crate::repository::EventRepository;

/// Activity band, ordered from most to least active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyBand {
    TenPlus,
    FiveToNine,
    OneToFour,
    UnderOne,
    NoActivity,
}

impl FrequencyBand {
    /// Every band in display order.
    pub const ALL: [FrequencyBand; 5] = [
        FrequencyBand::TenPlus,
        FrequencyBand::FiveToNine,
        FrequencyBand::OneToFour,
        FrequencyBand::UnderOne,
        FrequencyBand::NoActivity,
    ];

    /// Band for a per-week activity rate.
    pub fn classify(per_week: f64) -> Self {
        if per_week >= 10.0 {
            FrequencyBand::TenPlus
        } else if per_week >= 5.0 {
            FrequencyBand::FiveToNine
        } else if per_week >= 1.0 {
            FrequencyBand::OneToFour
        } else if per_week > 0.0 {
            FrequencyBand::UnderOne
        } else {
            FrequencyBand::NoActivity
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FrequencyBand::TenPlus => "10+/week",
            FrequencyBand::FiveToNine => "5–9/week",
            FrequencyBand::OneToFour => "1–4/week",
            FrequencyBand::UnderOne => "<1/week",
            FrequencyBand::NoActivity => "no activity",
        }
    }
}

/// Users falling in one band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandCount {
    pub band: FrequencyBand,
    pub label: &'static str,
    pub users: usize,
    /// Share of the population, 0 for an empty population
    pub percent: f64,
}

/// Distribution of the filtered population over activity bands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyDistribution {
    /// Weeks the window spans (never below one)
    pub weeks: f64,
    /// Users in the filtered population as of the window end
    pub population: usize,
    pub buckets: Vec<BandCount>,
}

impl FrequencyDistribution {
    /// Bucket the population known at `period.end` by weekly activity.
    ///
    /// An empty population yields a single "no activity" bucket of zero.
    pub fn compute(repo: &EventRepository, ctx: &FilterContext, period: &Period) -> Self {
        let weeks = period.weeks();
        let population = known_users(repo, ctx, period.end());

        if population.is_empty() {
            return Self {
                weeks,
                population: 0,
                buckets: vec![BandCount {
                    band: FrequencyBand::NoActivity,
                    label: FrequencyBand::NoActivity.label(),
                    users: 0,
                    percent: 0.0,
                }],
            };
        }

        let mut weight_by_user: HashMap<&str, f64> = HashMap::new();
        for event in window_events(repo, ctx, period) {
            *weight_by_user.entry(event.user_id.as_str()).or_default() += event.weight;
        }

        let mut counts: HashMap<FrequencyBand, usize> = HashMap::new();
        for user in &population {
            let weight = weight_by_user.get(user).copied().unwrap_or(0.0);
            *counts.entry(FrequencyBand::classify(weight / weeks)).or_default() += 1;
        }

        let total = population.len();
        let buckets = FrequencyBand::ALL
            .iter()
            .map(|band| {
                let users = counts.get(band).copied().unwrap_or(0);
                BandCount {
                    band: *band,
                    label: band.label(),
                    users,
                    percent: percent_of(users as f64, total as f64),
                }
            })
            .collect();

        Self {
            weeks,
            population: total,
            buckets,
        }
    }

    /// Users in a band, 0 if the band is absent.
    pub fn users_in(&self, band: FrequencyBand) -> usize {
        self.buckets
            .iter()
            .find(|b| b.band == band)
            .map(|b| b.users)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UsageEvent;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(FrequencyBand::classify(12.0), FrequencyBand::TenPlus);
        assert_eq!(FrequencyBand::classify(10.0), FrequencyBand::TenPlus);
        assert_eq!(FrequencyBand::classify(9.99), FrequencyBand::FiveToNine);
        assert_eq!(FrequencyBand::classify(5.0), FrequencyBand::FiveToNine);
        assert_eq!(FrequencyBand::classify(4.99), FrequencyBand::OneToFour);
        assert_eq!(FrequencyBand::classify(1.0), FrequencyBand::OneToFour);
        assert_eq!(FrequencyBand::classify(0.5), FrequencyBand::UnderOne);
        assert_eq!(FrequencyBand::classify(0.0), FrequencyBand::NoActivity);
    }

    #[test]
    fn test_distribution_over_two_weeks() {
        let day = |d: u32| Utc.with_ymd_and_hms(2024, 3, d, 9, 0, 0).unwrap();
        let mut events = vec![
            // 10 per week over two weeks
            UsageEvent::new("busy", "Acme", "Connect", "Production", day(2)).with_weight(20.0),
            // exactly 5 per week
            UsageEvent::new("steady", "Acme", "Connect", "Production", day(3)).with_weight(10.0),
            UsageEvent::new("light", "Acme", "Connect", "Production", day(4)),
            // only active before the window
            UsageEvent::new("idle", "Acme", "Connect", "Production", day(1)),
        ];
        events.push(UsageEvent::new("light", "Acme", "Connect", "Production", day(5)));
        let repo = EventRepository::new(events, vec![]).unwrap();

        let period = Period::from_dates(
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        )
        .unwrap();
        let dist = FrequencyDistribution::compute(&repo, &FilterContext::all(), &period);

        assert_eq!(dist.weeks, 2.0);
        assert_eq!(dist.population, 4);
        assert_eq!(dist.buckets.len(), 5);
        assert_eq!(dist.users_in(FrequencyBand::TenPlus), 1);
        assert_eq!(dist.users_in(FrequencyBand::FiveToNine), 1);
        assert_eq!(dist.users_in(FrequencyBand::OneToFour), 1);
        assert_eq!(dist.users_in(FrequencyBand::UnderOne), 0);
        assert_eq!(dist.users_in(FrequencyBand::NoActivity), 1);
        assert_eq!(dist.buckets[0].percent, 25.0);

        let total: usize = dist.buckets.iter().map(|b| b.users).sum();
        assert_eq!(total, dist.population);
    }

    #[test]
    fn test_empty_population_has_single_bucket() {
        let repo = EventRepository::default();
        let period = Period::trailing_days(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(), 30)
            .unwrap();
        let dist = FrequencyDistribution::compute(&repo, &FilterContext::all(), &period);
        assert_eq!(dist.population, 0);
        assert_eq!(dist.buckets.len(), 1);
        assert_eq!(dist.buckets[0].band, FrequencyBand::NoActivity);
        assert_eq!(dist.buckets[0].users, 0);
    }
}
