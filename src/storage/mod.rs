//! Item storage
//!
//! The `ItemStore` contract the review engine persists through, plus a
//! JSON-file implementation.
//!
//! Directory structure of the file store:
//! ```text
//! <data dir>/
//! ├── items/
//! │   └── {item-id}.json   # One item per file, last write wins
//! └── reviews.jsonl        # Append-only rating event log
//! ```
//!
//! Writes are idempotent per item: item state is a whole-file overwrite and
//! the review log is order-independent, so retried or reordered persistence
//! requests stay correct.

pub mod persist;

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Item, Rating, RatingEvent, ReviewState};
use crate::retention::DecayProfile;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Item not found: {0}")]
    ItemNotFound(Uuid),

    #[error("Invalid store path")]
    InvalidStorePath,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence contract for items and their review log.
///
/// Implementations must keep writes idempotent per item: persistence
/// requests are issued in rating order but are not guaranteed to complete
/// in that order.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Fetch the non-suspended items due on or before `as_of`, unordered
    async fn fetch_due(&self, as_of: NaiveDate) -> Result<Vec<Item>>;

    /// Fetch items by id; unknown ids are skipped
    async fn fetch_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Item>>;

    /// Record one rating event and update the item's scheduling state,
    /// as one logical operation
    async fn persist_rating(&self, item_id: Uuid, rating: Rating, new_state: ReviewState)
        -> Result<Item>;

    /// Overwrite an item's scheduling state with a prior snapshot.
    /// Used by session undo.
    async fn restore_state(&self, item_id: Uuid, prior_state: ReviewState) -> Result<Item>;

    async fn delete_item(&self, item_id: Uuid) -> Result<()>;
}

/// File-backed item store, one JSON file per item plus a JSONL review log
pub struct JsonItemStore {
    data_dir: PathBuf,
}

impl JsonItemStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Default store location under the platform data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("mneme"))
            .ok_or(StoreError::InvalidStorePath)
    }

    fn items_dir(&self) -> PathBuf {
        self.data_dir.join("items")
    }

    fn item_path(&self, item_id: Uuid) -> PathBuf {
        self.items_dir().join(format!("{}.json", item_id))
    }

    fn reviews_path(&self) -> PathBuf {
        self.data_dir.join("reviews.jsonl")
    }

    /// Create the store directories if they don't exist
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.items_dir())?;
        Ok(())
    }

    // ==================== Item Operations ====================

    /// List all items in the store
    pub fn list_items(&self) -> Result<Vec<Item>> {
        let items_dir = self.items_dir();
        if !items_dir.exists() {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        for entry in fs::read_dir(&items_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let content = fs::read_to_string(&path)?;
                let item: Item = serde_json::from_str(&content)?;
                items.push(item);
            }
        }

        Ok(items)
    }

    /// Get a specific item
    pub fn get_item(&self, item_id: Uuid) -> Result<Item> {
        let item_path = self.item_path(item_id);
        if !item_path.exists() {
            return Err(StoreError::ItemNotFound(item_id));
        }

        let content = fs::read_to_string(&item_path)?;
        let item: Item = serde_json::from_str(&content)?;
        Ok(item)
    }

    /// Create or overwrite an item
    pub fn save_item(&self, item: &Item) -> Result<()> {
        self.init()?;
        let item_path = self.item_path(item.id);
        fs::write(&item_path, serde_json::to_string_pretty(item)?)?;
        Ok(())
    }

    /// Set or clear an item's suspended flag
    pub fn set_suspended(&self, item_id: Uuid, suspended: bool) -> Result<Item> {
        let mut item = self.get_item(item_id)?;
        item.suspended = suspended;
        self.save_item(&item)?;
        Ok(item)
    }

    // ==================== Review Log ====================

    fn append_event(&self, event: &RatingEvent) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.reviews_path())?;
        let line = serde_json::to_string(event)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Read the full rating event log, oldest first
    pub fn read_events(&self) -> Result<Vec<RatingEvent>> {
        let reviews_path = self.reviews_path();
        if !reviews_path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&reviews_path)?;
        let mut events = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: RatingEvent = serde_json::from_str(&line)?;
            events.push(event);
        }

        Ok(events)
    }

    /// Derive decay profiles for every item, from the items and their
    /// review history
    pub fn decay_profiles(&self) -> Result<Vec<DecayProfile>> {
        let events = self.read_events()?;

        let profiles = self
            .list_items()?
            .iter()
            .map(|item| {
                let mut revision_count = 0u32;
                let mut last_reviewed_on: Option<NaiveDate> = None;
                for event in events.iter().filter(|event| event.item_id == item.id) {
                    revision_count += 1;
                    let reviewed_on = event.timestamp.date_naive();
                    if last_reviewed_on.map_or(true, |last| reviewed_on > last) {
                        last_reviewed_on = Some(reviewed_on);
                    }
                }
                DecayProfile::from_item(item, revision_count, last_reviewed_on)
            })
            .collect();

        Ok(profiles)
    }
}

#[async_trait]
impl ItemStore for JsonItemStore {
    async fn fetch_due(&self, as_of: NaiveDate) -> Result<Vec<Item>> {
        let items = self
            .list_items()?
            .into_iter()
            .filter(|item| !item.suspended && item.is_due(as_of))
            .collect();
        Ok(items)
    }

    async fn fetch_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        for id in ids {
            match self.get_item(*id) {
                Ok(item) => items.push(item),
                Err(StoreError::ItemNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(items)
    }

    async fn persist_rating(
        &self,
        item_id: Uuid,
        rating: Rating,
        new_state: ReviewState,
    ) -> Result<Item> {
        let mut item = self.get_item(item_id)?;
        item.apply_state(&new_state);
        self.save_item(&item)?;
        self.append_event(&RatingEvent::new(item_id, rating, &new_state))?;
        Ok(item)
    }

    async fn restore_state(&self, item_id: Uuid, prior_state: ReviewState) -> Result<Item> {
        let mut item = self.get_item(item_id)?;
        item.apply_state(&prior_state);
        self.save_item(&item)?;
        Ok(item)
    }

    async fn delete_item(&self, item_id: Uuid) -> Result<()> {
        let item_path = self.item_path(item_id);
        // already gone counts as deleted, so retries stay idempotent
        if item_path.exists() {
            fs::remove_file(&item_path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> (TempDir, JsonItemStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonItemStore::new(dir.path().to_path_buf());
        store.init().unwrap();
        (dir, store)
    }

    #[test]
    fn test_item_round_trip() {
        let (_dir, store) = store();
        let item = Item::new(date(2026, 3, 1));
        store.save_item(&item).unwrap();

        let loaded = store.get_item(item.id).unwrap();
        assert_eq!(loaded.id, item.id);
        assert_eq!(loaded.next_review_date, item.next_review_date);

        assert!(matches!(
            store.get_item(Uuid::new_v4()),
            Err(StoreError::ItemNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_due_filters() {
        let (_dir, store) = store();
        let today = date(2026, 3, 10);

        let due = Item::new(date(2026, 3, 8));
        let future = Item::new(date(2026, 3, 20));
        let mut suspended = Item::new(date(2026, 3, 1));
        suspended.suspended = true;

        for item in [&due, &future, &suspended] {
            store.save_item(item).unwrap();
        }

        let fetched = store.fetch_due(today).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].id, due.id);
    }

    #[tokio::test]
    async fn test_fetch_by_ids_skips_unknown() {
        let (_dir, store) = store();
        let item = Item::new(date(2026, 3, 1));
        store.save_item(&item).unwrap();

        let fetched = store.fetch_by_ids(&[item.id, Uuid::new_v4()]).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].id, item.id);
    }

    #[tokio::test]
    async fn test_persist_rating_updates_item_and_log() {
        let (_dir, store) = store();
        let today = date(2026, 3, 10);
        let item = Item::new(today);
        store.save_item(&item).unwrap();

        let new_state = algorithm::apply_rating(&item.state(), Rating::Easy, today);
        let updated = store
            .persist_rating(item.id, Rating::Easy, new_state.clone())
            .await
            .unwrap();

        assert_eq!(updated.interval_days, 4);
        assert_eq!(updated.ease_factor, 2.6);

        let reloaded = store.get_item(item.id).unwrap();
        assert_eq!(reloaded.state(), new_state);

        let events = store.read_events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].item_id, item.id);
        assert_eq!(events[0].rating, Rating::Easy);
        assert_eq!(events[0].resulting_interval_days, 4);

        // re-persisting the same state is a no-op on the item
        store
            .persist_rating(item.id, Rating::Easy, new_state.clone())
            .await
            .unwrap();
        assert_eq!(store.get_item(item.id).unwrap().state(), new_state);
    }

    #[tokio::test]
    async fn test_restore_state_reverts_item() {
        let (_dir, store) = store();
        let today = date(2026, 3, 10);
        let item = Item::new(today);
        store.save_item(&item).unwrap();
        let prior = item.state();

        let new_state = algorithm::apply_rating(&prior, Rating::Good, today);
        store
            .persist_rating(item.id, Rating::Good, new_state)
            .await
            .unwrap();

        store.restore_state(item.id, prior.clone()).await.unwrap();
        assert_eq!(store.get_item(item.id).unwrap().state(), prior);

        // the log keeps the event; only item state is restored
        assert_eq!(store.read_events().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_item_is_idempotent() {
        let (_dir, store) = store();
        let item = Item::new(date(2026, 3, 1));
        store.save_item(&item).unwrap();

        store.delete_item(item.id).await.unwrap();
        assert!(matches!(
            store.get_item(item.id),
            Err(StoreError::ItemNotFound(_))
        ));

        // deleting again succeeds
        store.delete_item(item.id).await.unwrap();
    }

    #[test]
    fn test_set_suspended() {
        let (_dir, store) = store();
        let item = Item::new(date(2026, 3, 1));
        store.save_item(&item).unwrap();

        let suspended = store.set_suspended(item.id, true).unwrap();
        assert!(suspended.suspended);
        assert!(store.get_item(item.id).unwrap().suspended);
    }

    #[tokio::test]
    async fn test_decay_profiles_from_history() {
        let (_dir, store) = store();
        let today = date(2026, 3, 10);
        let reviewed = Item::new(today);
        let untouched = Item::new(today);
        store.save_item(&reviewed).unwrap();
        store.save_item(&untouched).unwrap();

        let first = algorithm::apply_rating(&reviewed.state(), Rating::Good, today);
        store
            .persist_rating(reviewed.id, Rating::Good, first.clone())
            .await
            .unwrap();
        let second = algorithm::apply_rating(&first, Rating::Good, today);
        store
            .persist_rating(reviewed.id, Rating::Good, second)
            .await
            .unwrap();

        let profiles = store.decay_profiles().unwrap();
        assert_eq!(profiles.len(), 2);

        let of_reviewed = profiles
            .iter()
            .find(|profile| profile.revision_count == 2)
            .expect("reviewed item profile");
        assert!(of_reviewed.last_reviewed_on.is_some());

        let of_untouched = profiles
            .iter()
            .find(|profile| profile.revision_count == 0)
            .expect("untouched item profile");
        assert!(of_untouched.last_reviewed_on.is_none());
    }
}
