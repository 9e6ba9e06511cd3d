//! Review scheduling algorithm
//!
//! Turns a user rating into the item's next scheduling state.
//!
//! Ratings (1-4):
//! - 1 Again: forgotten, interval resets to 0 and the item is due immediately
//! - 2 Hard: recalled with serious difficulty, interval grows slowly, ease drops
//! - 3 Good: recalled, interval multiplied by the ease factor
//! - 4 Easy: recalled effortlessly, extra interval bonus, ease rises

use chrono::{Duration, NaiveDate};

use crate::models::{Rating, ReviewState};

/// Minimum ease factor allowed
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Maximum ease factor allowed
pub const MAX_EASE_FACTOR: f64 = 3.0;

/// Ease factor assigned to items that were never reviewed
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Interval growth applied on Hard
const HARD_INTERVAL_FACTOR: f64 = 1.2;

/// Ease penalty applied on Hard
const HARD_EASE_PENALTY: f64 = 0.15;

/// Extra interval growth applied on Easy, on top of the ease factor
const EASY_INTERVAL_BONUS: f64 = 1.3;

/// Ease reward applied on Easy
const EASY_EASE_BONUS: f64 = 0.1;

/// First interval for a new item rated Good
const FIRST_GOOD_INTERVAL: i64 = 1;

/// First interval for a new item rated Easy
const FIRST_EASY_INTERVAL: i64 = 4;

/// Fixed topic-level review offsets, in days after completing a topic
pub const TOPIC_REVIEW_OFFSETS: [i64; 5] = [1, 3, 7, 21, 45];

/// Calculate the next scheduling state for an item after one rating.
///
/// Pure: the same state, rating and date always produce the same result.
/// The interval is computed from the ease factor the item had going in;
/// ease adjustments apply to the returned state only.
pub fn apply_rating(state: &ReviewState, rating: Rating, today: NaiveDate) -> ReviewState {
    let ease = state.ease_factor;
    let interval = state.interval_days;

    let (new_interval, new_ease) = match rating {
        Rating::Again => (0, ease),
        Rating::Hard => {
            let grown = (interval as f64 * HARD_INTERVAL_FACTOR).floor() as i64;
            (grown.max(1), ease - HARD_EASE_PENALTY)
        }
        Rating::Good => {
            let next = if interval < 1 {
                FIRST_GOOD_INTERVAL
            } else {
                (interval as f64 * ease).round() as i64
            };
            (next, ease)
        }
        Rating::Easy => {
            let next = if interval < 1 {
                FIRST_EASY_INTERVAL
            } else {
                (interval as f64 * ease * EASY_INTERVAL_BONUS).round() as i64
            };
            (next, ease + EASY_EASE_BONUS)
        }
    };

    ReviewState {
        ease_factor: round_ease(new_ease.clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR)),
        interval_days: new_interval,
        next_review_date: today + Duration::days(new_interval),
    }
}

/// Round the ease factor to 4 decimal digits.
///
/// Applied after every transition so repeated reviews cannot accumulate
/// floating-point drift in the persisted value.
fn round_ease(ease: f64) -> f64 {
    (ease * 10_000.0).round() / 10_000.0
}

/// The interval each rating would produce for the given state.
/// Used to label rating buttons with their outcome.
pub fn preview_intervals(state: &ReviewState, today: NaiveDate) -> [i64; 4] {
    Rating::ALL.map(|rating| apply_rating(state, rating, today).interval_days)
}

/// All topic-level review dates for a topic completed on the given day
pub fn topic_review_dates(completed_on: NaiveDate) -> [NaiveDate; 5] {
    TOPIC_REVIEW_OFFSETS.map(|offset| completed_on + Duration::days(offset))
}

/// The next topic-level review date, given how many of the fixed reviews
/// are already done. Returns None once the sequence is exhausted.
pub fn next_topic_review(completed_on: NaiveDate, revisions_done: usize) -> Option<NaiveDate> {
    TOPIC_REVIEW_OFFSETS
        .get(revisions_done)
        .map(|offset| completed_on + Duration::days(*offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn state(ease_factor: f64, interval_days: i64) -> ReviewState {
        ReviewState {
            ease_factor,
            interval_days,
            next_review_date: date(2026, 1, 1),
        }
    }

    #[test]
    fn test_good_multiplies_interval_by_ease() {
        let today = date(2026, 3, 1);
        let result = apply_rating(&state(2.5, 6), Rating::Good, today);

        assert_eq!(result.interval_days, 15);
        assert_eq!(result.ease_factor, 2.5);
        assert_eq!(result.next_review_date, date(2026, 3, 16));
    }

    #[test]
    fn test_easy_on_new_item() {
        let today = date(2026, 3, 1);
        let result = apply_rating(&state(2.5, 0), Rating::Easy, today);

        assert_eq!(result.interval_days, 4);
        assert_eq!(result.ease_factor, 2.6);
        assert_eq!(result.next_review_date, date(2026, 3, 5));
    }

    #[test]
    fn test_hard_floors_interval_growth() {
        let today = date(2026, 3, 1);
        let result = apply_rating(&state(1.35, 3), Rating::Hard, today);

        // floor(3 * 1.2) = 3; ease 1.35 - 0.15 clamps to the minimum
        assert_eq!(result.interval_days, 3);
        assert_eq!(result.ease_factor, 1.3);
        assert_eq!(result.next_review_date, date(2026, 3, 4));
    }

    #[test]
    fn test_again_resets_interval_and_keeps_ease() {
        let today = date(2026, 3, 1);
        let result = apply_rating(&state(2.1, 30), Rating::Again, today);

        assert_eq!(result.interval_days, 0);
        assert_eq!(result.ease_factor, 2.1);
        // due again immediately
        assert_eq!(result.next_review_date, today);
    }

    #[test]
    fn test_good_on_new_item() {
        let result = apply_rating(&state(2.5, 0), Rating::Good, date(2026, 3, 1));
        assert_eq!(result.interval_days, 1);
        assert_eq!(result.ease_factor, 2.5);
    }

    #[test]
    fn test_hard_on_new_item_gets_one_day() {
        let result = apply_rating(&state(2.5, 0), Rating::Hard, date(2026, 3, 1));
        assert_eq!(result.interval_days, 1);
        assert_eq!(result.ease_factor, 2.35);
    }

    #[test]
    fn test_easy_interval_uses_incoming_ease() {
        let today = date(2026, 3, 1);
        let result = apply_rating(&state(2.5, 10), Rating::Easy, today);

        // round(10 * 2.5 * 1.3) = 33, with the ease bonus applied afterwards
        assert_eq!(result.interval_days, 33);
        assert_eq!(result.ease_factor, 2.6);
    }

    #[test]
    fn test_ease_ceiling() {
        let result = apply_rating(&state(2.95, 10), Rating::Easy, date(2026, 3, 1));
        assert_eq!(result.ease_factor, 3.0);

        let again = apply_rating(&result, Rating::Easy, date(2026, 3, 1));
        assert_eq!(again.ease_factor, 3.0);
    }

    #[test]
    fn test_ease_floor() {
        let result = apply_rating(&state(1.3, 10), Rating::Hard, date(2026, 3, 1));
        assert_eq!(result.ease_factor, 1.3);
    }

    #[test]
    fn test_ease_rounded_to_four_decimals() {
        // 2.5 - 0.15 three times in f64 would drift without rounding
        let mut current = state(2.5, 10);
        for _ in 0..3 {
            current = apply_rating(&current, Rating::Hard, date(2026, 3, 1));
        }
        assert_eq!(current.ease_factor, 2.05);
    }

    #[test]
    fn test_next_review_date_matches_interval() {
        let today = date(2026, 3, 1);
        for rating in Rating::ALL {
            let result = apply_rating(&state(2.5, 6), rating, today);
            assert_eq!(
                result.next_review_date,
                today + Duration::days(result.interval_days),
                "rating {:?}",
                rating
            );
        }
    }

    #[test]
    fn test_preview_intervals() {
        let today = date(2026, 3, 1);
        assert_eq!(preview_intervals(&state(2.5, 6), today), [0, 7, 15, 20]);
        assert_eq!(preview_intervals(&state(2.5, 0), today), [0, 1, 1, 4]);
    }

    #[test]
    fn test_topic_review_dates() {
        let completed = date(2026, 3, 1);
        let dates = topic_review_dates(completed);
        assert_eq!(dates[0], date(2026, 3, 2));
        assert_eq!(dates[4], date(2026, 4, 15));

        assert_eq!(next_topic_review(completed, 0), Some(date(2026, 3, 2)));
        assert_eq!(next_topic_review(completed, 4), Some(date(2026, 4, 15)));
        assert_eq!(next_topic_review(completed, 5), None);
    }
}
