//! Due-item selection and ordering
//!
//! Builds the ordered queue a review session starts from. Overdue and due
//! items (interval > 0) always come before new items (interval 0), so a
//! bounded session surfaces scheduled work before fresh material.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{Item, ReviewQueueEntry, ReviewStats};

/// Select the non-suspended items due on or before `as_of`, in review order
pub fn select_due(items: &[Item], as_of: NaiveDate) -> Vec<ReviewQueueEntry> {
    let mut selected: Vec<&Item> = items
        .iter()
        .filter(|item| !item.suspended && item.is_due(as_of))
        .collect();
    selected.sort_by(|a, b| queue_order(a, b));

    selected
        .into_iter()
        .map(|item| ReviewQueueEntry::new(item.clone()))
        .collect()
}

/// Select an explicit set of items by id, in the same review order.
///
/// No due-date or suspension filtering: used for targeted practice over a
/// user-chosen subset. Unknown ids are skipped.
pub fn select_by_ids(items: &[Item], ids: &[Uuid]) -> Vec<ReviewQueueEntry> {
    let wanted: HashSet<Uuid> = ids.iter().copied().collect();
    let mut selected: Vec<&Item> = items.iter().filter(|item| wanted.contains(&item.id)).collect();
    selected.sort_by(|a, b| queue_order(a, b));

    selected
        .into_iter()
        .map(|item| ReviewQueueEntry::new(item.clone()))
        .collect()
}

/// Due items before new items; within each group oldest review date first,
/// ties broken by id so the ordering is deterministic.
fn queue_order(a: &Item, b: &Item) -> Ordering {
    fn group(item: &Item) -> u8 {
        if item.interval_days > 0 {
            0
        } else {
            1
        }
    }

    group(a)
        .cmp(&group(b))
        .then_with(|| a.next_review_date.cmp(&b.next_review_date))
        .then_with(|| a.id.cmp(&b.id))
}

/// Aggregate counts over a set of items
pub fn review_stats(items: &[Item], as_of: NaiveDate) -> ReviewStats {
    let mut stats = ReviewStats {
        total_items: items.len(),
        ..ReviewStats::default()
    };

    for item in items {
        if item.suspended {
            stats.suspended_items += 1;
            continue;
        }
        if item.interval_days == 0 {
            stats.new_items += 1;
        }
        if item.is_due(as_of) {
            stats.due_items += 1;
        }
    }

    stats
}
