use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{Entry, EngineError, NewEntry, ResultEngine, entry};

use super::Engine;

/// Maximum number of entries returned by a listing.
pub const ENTRY_LIST_LIMIT: u64 = 200;

fn not_found() -> EngineError {
    EngineError::KeyNotFound("entry".to_string())
}

impl Engine {
    /// Store a validated entry, stamping its id and timestamps.
    pub async fn create_entry(&self, new: NewEntry) -> ResultEngine<Entry> {
        let entry = Entry::stamp(new, Utc::now());
        let model = entry::ActiveModel::from(&entry)
            .insert(&self.database)
            .await?;
        tracing::debug!(entry_id = %model.id, owner = %model.created_by, "entry created");

        Entry::try_from(model)
    }

    /// Entries owned by `owner`, newest first.
    ///
    /// `limit` is capped at [`ENTRY_LIST_LIMIT`].
    pub async fn list_entries(&self, owner: &str, limit: u64) -> ResultEngine<Vec<Entry>> {
        entry::Entity::find()
            .filter(entry::Column::CreatedBy.eq(owner))
            .order_by_desc(entry::Column::CreatedAt)
            .order_by_desc(entry::Column::Id)
            .limit(limit.min(ENTRY_LIST_LIMIT))
            .all(&self.database)
            .await?
            .into_iter()
            .map(Entry::try_from)
            .collect()
    }

    /// The entry `id` if it belongs to `owner`.
    pub async fn entry(&self, owner: &str, id: &str) -> ResultEngine<Entry> {
        let model = entry::Entity::find_by_id(id.to_string())
            .filter(entry::Column::CreatedBy.eq(owner))
            .one(&self.database)
            .await?
            .ok_or_else(not_found)?;

        Entry::try_from(model)
    }

    /// Overwrite the stored entry with `updated` in a single conditional
    /// update on `(id, owner)`.
    ///
    /// Owner and creation time are never written, whatever `updated` holds.
    /// Concurrent updates serialize in the database: last write wins.
    pub async fn update_entry(&self, owner: &str, updated: &Entry) -> ResultEngine<Entry> {
        let id = updated.id.to_string();
        let mut model = entry::ActiveModel::from(updated);
        model.id = ActiveValue::NotSet;
        model.created_by = ActiveValue::NotSet;
        model.created_at = ActiveValue::NotSet;
        model.updated_at = ActiveValue::Set(Utc::now());

        let result = entry::Entity::update_many()
            .set(model)
            .filter(entry::Column::Id.eq(id.as_str()))
            .filter(entry::Column::CreatedBy.eq(owner))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(not_found());
        }
        tracing::debug!(entry_id = %id, owner, "entry updated");

        self.entry(owner, &id).await
    }

    /// Delete the entry `id` if it belongs to `owner`. Returns whether
    /// anything was deleted.
    pub async fn delete_entry(&self, owner: &str, id: &str) -> ResultEngine<bool> {
        let result = entry::Entity::delete_many()
            .filter(entry::Column::Id.eq(id))
            .filter(entry::Column::CreatedBy.eq(owner))
            .exec(&self.database)
            .await?;
        if result.rows_affected > 0 {
            tracing::debug!(entry_id = %id, owner, "entry deleted");
        }

        Ok(result.rows_affected > 0)
    }
}
