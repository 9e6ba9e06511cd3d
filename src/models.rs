//! Data models for the review scheduling system

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A reviewable unit (flashcard or topic) tracked by the scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    /// Interval growth multiplier, bounded [1.3, 3.0]
    #[serde(default = "default_ease_factor")]
    pub ease_factor: f64,
    /// Current interval in days; 0 means the item is "new"
    #[serde(default)]
    pub interval_days: i64,
    /// When the item is due for review
    pub next_review_date: NaiveDate,
    #[serde(default)]
    pub suspended: bool,
}

fn default_ease_factor() -> f64 {
    2.5
}

impl Item {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            ease_factor: default_ease_factor(),
            interval_days: 0,
            next_review_date: today,
            suspended: false,
        }
    }

    /// Check if the item is due for review
    pub fn is_due(&self, as_of: NaiveDate) -> bool {
        self.next_review_date <= as_of
    }

    /// Snapshot of the scheduling fields
    pub fn state(&self) -> ReviewState {
        ReviewState {
            ease_factor: self.ease_factor,
            interval_days: self.interval_days,
            next_review_date: self.next_review_date,
        }
    }

    /// Overwrite the scheduling fields from a state snapshot
    pub fn apply_state(&mut self, state: &ReviewState) {
        self.ease_factor = state.ease_factor;
        self.interval_days = state.interval_days;
        self.next_review_date = state.next_review_date;
    }
}

/// The scheduling fields of an item, as produced by one rating transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub ease_factor: f64,
    pub interval_days: i64,
    pub next_review_date: NaiveDate,
}

/// User rating of a single review
///
/// Serialized as the numeric 1-4 scale used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rating {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

/// Signalled for rating values outside 1-4. A programming error on the
/// caller's side, never silently clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid rating value {0}, expected 1-4")]
pub struct InvalidRating(pub u8);

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Good and Easy count as a successful recall
    pub fn is_correct(self) -> bool {
        matches!(self, Rating::Good | Rating::Easy)
    }
}

impl TryFrom<u8> for Rating {
    type Error = InvalidRating;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rating::Again),
            2 => Ok(Rating::Hard),
            3 => Ok(Rating::Good),
            4 => Ok(Rating::Easy),
            other => Err(InvalidRating(other)),
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating as u8
    }
}

/// Immutable record of a single rating, one per review. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingEvent {
    pub id: Uuid,
    pub item_id: Uuid,
    pub rating: Rating,
    pub resulting_ease_factor: f64,
    pub resulting_interval_days: i64,
    pub resulting_next_review_date: NaiveDate,
    /// When the review occurred
    pub timestamp: DateTime<Utc>,
}

impl RatingEvent {
    pub fn new(item_id: Uuid, rating: Rating, result: &ReviewState) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            rating,
            resulting_ease_factor: result.ease_factor,
            resulting_interval_days: result.interval_days,
            resulting_next_review_date: result.next_review_date,
            timestamp: Utc::now(),
        }
    }
}

/// An item placed into a session queue
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueueEntry {
    pub item: Item,
    /// True for the synthetic duplicate appended when an item is rated Again
    #[serde(default)]
    pub requeued: bool,
}

impl ReviewQueueEntry {
    pub fn new(item: Item) -> Self {
        Self {
            item,
            requeued: false,
        }
    }
}

/// Per-rating tallies for a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingCounts {
    pub again: u32,
    pub hard: u32,
    pub good: u32,
    pub easy: u32,
}

impl RatingCounts {
    pub fn increment(&mut self, rating: Rating) {
        *self.slot(rating) += 1;
    }

    pub fn decrement(&mut self, rating: Rating) {
        let slot = self.slot(rating);
        *slot = slot.saturating_sub(1);
    }

    pub fn get(&self, rating: Rating) -> u32 {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }

    /// Total ratings recorded, requeued repeats included
    pub fn total(&self) -> u32 {
        self.again + self.hard + self.good + self.easy
    }

    fn slot(&mut self, rating: Rating) -> &mut u32 {
        match rating {
            Rating::Again => &mut self.again,
            Rating::Hard => &mut self.hard,
            Rating::Good => &mut self.good,
            Rating::Easy => &mut self.easy,
        }
    }
}

/// Aggregate counts over a set of items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_items: usize,
    /// Items never successfully reviewed (interval 0)
    pub new_items: usize,
    /// Non-suspended items at or past their review date
    pub due_items: usize,
    pub suspended_items: usize,
}

/// Report produced when a review session ends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Ratings given, requeued repeats included
    pub answered: u32,
    /// Original (non-requeued) entries that reached a rating
    pub unique_rated: usize,
    pub rating_counts: RatingCounts,
    /// round(100 * (good + easy) / unique_rated); 0 when nothing was rated
    pub retention_pct: u32,
    /// Consecutive Good/Easy streak at session end
    pub streak: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub elapsed_seconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_conversion() {
        assert_eq!(Rating::try_from(1), Ok(Rating::Again));
        assert_eq!(Rating::try_from(4), Ok(Rating::Easy));
        assert_eq!(Rating::try_from(0), Err(InvalidRating(0)));
        assert_eq!(Rating::try_from(5), Err(InvalidRating(5)));
        assert_eq!(u8::from(Rating::Good), 3);
    }

    #[test]
    fn test_item_wire_shape() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let item = Item::new(today);
        let json = serde_json::to_string(&item).unwrap();

        assert!(json.contains("\"easeFactor\":2.5"));
        assert!(json.contains("\"intervalDays\":0"));
        assert!(json.contains("\"nextReviewDate\":\"2026-03-01\""));
        assert!(json.contains("\"suspended\":false"));

        let back: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, item.id);
        assert_eq!(back.next_review_date, today);
    }

    #[test]
    fn test_rating_event_wire_shape() {
        let state = ReviewState {
            ease_factor: 2.6,
            interval_days: 4,
            next_review_date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
        };
        let event = RatingEvent::new(Uuid::new_v4(), Rating::Easy, &state);
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains("\"rating\":4"));
        assert!(json.contains("\"resultingEaseFactor\":2.6"));
        assert!(json.contains("\"resultingIntervalDays\":4"));
        assert!(json.contains("\"resultingNextReviewDate\":\"2026-03-05\""));
    }

    #[test]
    fn test_rating_counts() {
        let mut counts = RatingCounts::default();
        counts.increment(Rating::Good);
        counts.increment(Rating::Good);
        counts.increment(Rating::Again);
        assert_eq!(counts.get(Rating::Good), 2);
        assert_eq!(counts.total(), 3);

        counts.decrement(Rating::Good);
        assert_eq!(counts.get(Rating::Good), 1);

        // decrement never underflows
        counts.decrement(Rating::Hard);
        assert_eq!(counts.get(Rating::Hard), 0);
    }
}
