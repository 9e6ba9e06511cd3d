//! Reversible rating commands
//!
//! Every rating produces one immutable command capturing enough to revert
//! it (undo) or replay it (redo) without re-running the rating path. The
//! session keeps plain stacks of these.

use uuid::Uuid;

use crate::models::{Rating, ReviewState};

/// Record of one applied rating
#[derive(Debug, Clone)]
pub struct RatingCommand {
    /// Queue position of the entry that was rated
    pub index: usize,
    /// Item id at the time of rating
    pub item_id: Uuid,
    /// Scheduling state before the rating, for undo and corrective persistence
    pub previous_state: ReviewState,
    /// Scheduling state the rating produced, replayed verbatim on redo
    pub new_state: ReviewState,
    pub rating: Rating,
    /// Streak value before the rating
    pub previous_streak: u32,
    /// Whether the rating appended a synthetic requeue entry
    pub did_requeue: bool,
}
