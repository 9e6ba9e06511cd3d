//! Spaced repetition scheduling and review sessions
//!
//! This crate provides:
//! - The per-item scheduling algorithm (rating → next interval/ease/date)
//! - Due-item selection and ordering for bounded review sessions
//! - A review session state machine with fail-requeue and undo/redo
//! - Memory-decay projection for retention forecasting
//! - An `ItemStore` persistence contract with a JSON-file implementation
//!   and a fire-and-forget background writer
//!
//! The session engine is synchronous and in-memory; storage hangs off a
//! one-way job channel so review flow is never blocked by I/O.

pub mod algorithm;
pub mod models;
pub mod queue;
pub mod retention;
pub mod session;
pub mod storage;

pub use models::{
    InvalidRating, Item, Rating, RatingCounts, RatingEvent, ReviewQueueEntry, ReviewState,
    ReviewStats, SessionSummary,
};
pub use queue::{review_stats, select_by_ids, select_due};
pub use retention::{project_retention, DecayProfile, RetentionPoint};
pub use session::{ReviewSession, SessionError};
pub use storage::persist::{spawn_persist_worker, ErrorSink, PersistHandle, PersistJob};
pub use storage::{ItemStore, JsonItemStore, StoreError};
