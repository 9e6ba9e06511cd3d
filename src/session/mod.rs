//! Review session state machine
//!
//! Orchestrates a single review pass over an ordered queue: reveal the
//! answer, rate it, advance. Items rated Again are requeued once at the
//! back of the same session. Every rating is captured as a reversible
//! command, so the whole pass supports undo/redo.
//!
//! The session is single-writer and entirely in-memory. Persistence is
//! dispatched through a one-way channel and never blocks or fails a
//! transition; the in-memory state stays authoritative for the rest of
//! the session regardless of persistence outcome.

pub mod command;

pub use command::RatingCommand;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::algorithm;
use crate::models::{Rating, RatingCounts, ReviewQueueEntry, SessionSummary};
use crate::storage::persist::{PersistHandle, PersistJob};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot start a session with an empty queue")]
    EmptyQueue,

    #[error("session is already complete")]
    SessionComplete,

    #[error("cannot rate before the answer is revealed")]
    NotFlipped,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// A single in-progress review session.
///
/// Created by [`ReviewSession::start`], consumed by [`ReviewSession::end`].
pub struct ReviewSession {
    queue: Vec<ReviewQueueEntry>,
    index: usize,
    flipped: bool,
    rating_counts: RatingCounts,
    streak: u32,
    undo_stack: Vec<RatingCommand>,
    redo_stack: Vec<RatingCommand>,
    started_at: DateTime<Utc>,
    persist: PersistHandle,
}

impl ReviewSession {
    /// Start a session over an ordered queue. Rejects an empty queue;
    /// callers present an "empty" state instead of a session.
    pub fn start(queue: Vec<ReviewQueueEntry>, persist: PersistHandle) -> Result<Self> {
        Self::start_at(queue, persist, Utc::now())
    }

    /// Start with an explicit clock
    pub fn start_at(
        queue: Vec<ReviewQueueEntry>,
        persist: PersistHandle,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if queue.is_empty() {
            return Err(SessionError::EmptyQueue);
        }

        Ok(Self {
            queue,
            index: 0,
            flipped: false,
            rating_counts: RatingCounts::default(),
            streak: 0,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            started_at: now,
            persist,
        })
    }

    // ==================== Inspection ====================

    pub fn is_complete(&self) -> bool {
        self.index >= self.queue.len()
    }

    /// The entry under the cursor, None once the session is complete
    pub fn current(&self) -> Option<&ReviewQueueEntry> {
        self.queue.get(self.index)
    }

    pub fn flipped(&self) -> bool {
        self.flipped
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn queue(&self) -> &[ReviewQueueEntry] {
        &self.queue
    }

    pub fn rating_counts(&self) -> &RatingCounts {
        &self.rating_counts
    }

    /// Consecutive Good/Easy count
    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // ==================== Transitions ====================

    /// Toggle between front and back of the current entry.
    /// May be invoked repeatedly before rating; never advances the cursor.
    pub fn flip(&mut self) -> Result<()> {
        if self.is_complete() {
            return Err(SessionError::SessionComplete);
        }
        self.flipped = !self.flipped;
        Ok(())
    }

    /// Rate the current entry and advance.
    ///
    /// Valid only while the answer is revealed; rejected otherwise without
    /// touching any session state.
    pub fn rate(&mut self, rating: Rating) -> Result<()> {
        self.rate_at(rating, Utc::now())
    }

    /// Rate with an explicit clock
    pub fn rate_at(&mut self, rating: Rating, now: DateTime<Utc>) -> Result<()> {
        if self.is_complete() {
            return Err(SessionError::SessionComplete);
        }
        if !self.flipped {
            return Err(SessionError::NotFlipped);
        }

        let entry = &self.queue[self.index];
        let item_id = entry.item.id;
        let previous_state = entry.item.state();
        let previous_streak = self.streak;

        let new_state = algorithm::apply_rating(&previous_state, rating, now.date_naive());

        // fire-and-forget: the session does not wait for the outcome
        self.persist.dispatch(PersistJob::Rating {
            item_id,
            rating,
            new_state: new_state.clone(),
        });

        self.rating_counts.increment(rating);
        if rating.is_correct() {
            self.streak += 1;
        } else {
            self.streak = 0;
        }

        self.queue[self.index].item.apply_state(&new_state);

        let did_requeue = rating == Rating::Again;
        if did_requeue {
            let item = self.queue[self.index].item.clone();
            self.queue.push(ReviewQueueEntry {
                item,
                requeued: true,
            });
        }

        self.undo_stack.push(RatingCommand {
            index: self.index,
            item_id,
            previous_state,
            new_state,
            rating,
            previous_streak,
            did_requeue,
        });
        self.redo_stack.clear();

        self.index += 1;
        if !self.is_complete() {
            self.flipped = false;
        }

        Ok(())
    }

    /// Revert the most recent rating. No-op (returns false) with nothing
    /// to undo.
    pub fn undo(&mut self) -> bool {
        let Some(command) = self.undo_stack.pop() else {
            return false;
        };

        self.rating_counts.decrement(command.rating);
        self.streak = command.previous_streak;
        self.index = command.index;
        self.flipped = false;

        if command.did_requeue {
            self.remove_synthetic_duplicate(&command);
        }

        self.queue[command.index]
            .item
            .apply_state(&command.previous_state);

        // corrective write: put the persisted item back to its prior state
        self.persist.dispatch(PersistJob::Restore {
            item_id: command.item_id,
            prior_state: command.previous_state.clone(),
        });

        self.redo_stack.push(command);
        true
    }

    /// Re-apply the most recently undone rating by replaying its captured
    /// forward transition. No-op (returns false) with nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(command) = self.redo_stack.pop() else {
            return false;
        };

        self.rating_counts.increment(command.rating);
        self.streak = if command.rating.is_correct() {
            command.previous_streak + 1
        } else {
            0
        };

        self.queue[command.index]
            .item
            .apply_state(&command.new_state);

        if command.did_requeue {
            let item = self.queue[command.index].item.clone();
            self.queue.push(ReviewQueueEntry {
                item,
                requeued: true,
            });
        }

        self.persist.dispatch(PersistJob::Rating {
            item_id: command.item_id,
            rating: command.rating,
            new_state: command.new_state.clone(),
        });

        self.index = command.index + 1;
        if !self.is_complete() {
            self.flipped = false;
        }

        self.undo_stack.push(command);
        true
    }

    /// Splice every queue entry for an item out of the session, e.g. after
    /// the caller deleted the item mid-session.
    ///
    /// The cursor stays on the entry it pointed at (or the next one, when
    /// that entry itself was removed); an emptied queue completes the
    /// session. Rating history referring to removed positions is no
    /// longer replayable, so both undo and redo stacks are cleared.
    pub fn remove_item(&mut self, item_id: Uuid) {
        let removed_current = self
            .current()
            .map_or(false, |entry| entry.item.id == item_id);

        let mut position = 0;
        while position < self.queue.len() {
            if self.queue[position].item.id == item_id {
                self.queue.remove(position);
                if position < self.index {
                    self.index -= 1;
                }
            } else {
                position += 1;
            }
        }

        if self.index > self.queue.len() {
            self.index = self.queue.len();
        }
        if removed_current {
            self.flipped = false;
        }

        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    // ==================== Completion ====================

    /// End the session and report its summary. Consumes the session;
    /// elapsed time stops here.
    pub fn end(self) -> SessionSummary {
        self.end_at(Utc::now())
    }

    /// End with an explicit clock
    pub fn end_at(self, now: DateTime<Utc>) -> SessionSummary {
        let rated = self.index.min(self.queue.len());
        let unique_rated = self.queue[..rated]
            .iter()
            .filter(|entry| !entry.requeued)
            .count();

        let correct = self.rating_counts.good + self.rating_counts.easy;
        let retention_pct = if unique_rated == 0 {
            0
        } else {
            (100.0 * f64::from(correct) / unique_rated as f64).round() as u32
        };

        SessionSummary {
            answered: self.rating_counts.total(),
            unique_rated,
            rating_counts: self.rating_counts,
            retention_pct,
            streak: self.streak,
            started_at: self.started_at,
            ended_at: now,
            elapsed_seconds: (now - self.started_at).num_seconds(),
        }
    }

    /// Remove the one synthetic duplicate this command appended: the
    /// first matching entry after the command's position, searching from
    /// the queue tail.
    fn remove_synthetic_duplicate(&mut self, command: &RatingCommand) {
        let found = self
            .queue
            .iter()
            .enumerate()
            .rev()
            .find(|(position, entry)| {
                *position > command.index && entry.requeued && entry.item.id == command.item_id
            })
            .map(|(position, _)| position);

        if let Some(position) = found {
            self.queue.remove(position);
        } else {
            log::warn!(
                "undo: no synthetic duplicate found for item {}",
                command.item_id
            );
        }
    }
}
