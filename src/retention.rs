//! Memory-decay projection
//!
//! Forecasts how well reviewed material will be retained over a future
//! window, using an exponential (Ebbinghaus-style) forgetting curve. Each
//! reviewed item contributes a curve whose time constant ("stability")
//! grows with its ease factor and how often it has been revised; the
//! projected value for a day is the mean across items.
//!
//! Independent of the scheduler: it consumes a snapshot of review history
//! and never mutates anything.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::Item;

/// Scale from ease factor to stability days
const STABILITY_EASE_SCALE: f64 = 10.0;

/// Stability growth per recorded revision
const STABILITY_REVISION_WEIGHT: f64 = 0.5;

/// Decay inputs for one reviewed item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayProfile {
    /// Date of the most recent review; None if the item was never reviewed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_on: Option<NaiveDate>,
    pub ease_factor: f64,
    pub revision_count: u32,
}

impl DecayProfile {
    /// Derive a profile from an item and its review history
    pub fn from_item(item: &Item, revision_count: u32, last_reviewed_on: Option<NaiveDate>) -> Self {
        Self {
            last_reviewed_on,
            ease_factor: item.ease_factor,
            revision_count,
        }
    }

    /// Decay time constant in days
    pub fn stability(&self) -> f64 {
        self.ease_factor * STABILITY_EASE_SCALE * (1.0 + self.revision_count as f64 * STABILITY_REVISION_WEIGHT)
    }

    /// Modeled recall probability on `date`, as a percentage.
    /// Dates before the last review project full retention.
    pub fn retention_on(&self, date: NaiveDate) -> Option<f64> {
        let last = self.last_reviewed_on?;
        let days_since = (date - last).num_days().max(0) as f64;
        Some((100.0 * (-days_since / self.stability()).exp()).clamp(0.0, 100.0))
    }
}

/// One day of the projected retention curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionPoint {
    pub date: NaiveDate,
    pub retention_pct: f64,
}

/// Project the aggregate retention curve over `days` days starting at `from`.
///
/// The value for a day is the arithmetic mean of the per-item curves across
/// all profiles with a recorded review; with no such profiles the curve is
/// flat zero. Deterministic, and non-increasing over time for a fixed
/// history.
pub fn project_retention(profiles: &[DecayProfile], from: NaiveDate, days: u32) -> Vec<RetentionPoint> {
    let reviewed: Vec<&DecayProfile> = profiles
        .iter()
        .filter(|profile| profile.last_reviewed_on.is_some())
        .collect();

    (0..days)
        .map(|offset| {
            let date = from + Duration::days(i64::from(offset));
            let retention_pct = if reviewed.is_empty() {
                0.0
            } else {
                let total: f64 = reviewed
                    .iter()
                    .filter_map(|profile| profile.retention_on(date))
                    .sum();
                total / reviewed.len() as f64
            };
            RetentionPoint { date, retention_pct }
        })
        .collect()
}
