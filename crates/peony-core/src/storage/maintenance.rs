//! Destructive housekeeping that bypasses the lifecycle rules.
//!
//! Nothing here is a state transition: purging drops a thought together with
//! its history, and reindexing renumbers ids. Callers are expected to confirm
//! with the user first.

use rusqlite::{OptionalExtension, TransactionBehavior};
use tracing::info;

use super::store::Store;
use crate::error::{CoreError, StorageContext};

/// Delete a thought and all of its events. Returns how many events went with it.
pub fn purge_thought(store: &Store, id: i64) -> Result<usize, CoreError> {
    const OP: &str = "purge_thought";
    if id <= 0 {
        return Err(CoreError::validation(OP, format!("invalid thought id {id}")));
    }

    let events = store.with_conn(|conn| {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .during(OP)?;
        let exists: Option<i64> = tx
            .query_row("SELECT id FROM thoughts WHERE id = ?1", [id], |row| row.get(0))
            .optional()
            .during(OP)?;
        if exists.is_none() {
            return Err(CoreError::thought_not_found(OP, id));
        }
        let events = tx
            .execute("DELETE FROM events WHERE thought_id = ?1", [id])
            .during(OP)?;
        tx.execute("DELETE FROM thoughts WHERE id = ?1", [id])
            .during(OP)?;
        tx.commit().during(OP)?;
        Ok(events)
    })?;

    info!(thought_id = id, events, "thought purged");
    Ok(events)
}

/// Renumber thoughts densely from 1 in id order, carrying their events along,
/// and reset the id sequence so the next insert gets `max(id) + 1`.
///
/// Returns the number of thoughts whose id changed.
pub fn reindex_thought_ids(store: &Store) -> Result<usize, CoreError> {
    const OP: &str = "reindex_thought_ids";

    let moved = store.with_conn(|conn| {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .during(OP)?;
        tx.execute_batch("PRAGMA defer_foreign_keys = ON;")
            .during(OP)?;

        let ids: Vec<i64> = {
            let mut stmt = tx
                .prepare("SELECT id FROM thoughts ORDER BY id ASC")
                .during(OP)?;
            let ids = stmt
                .query_map([], |row| row.get(0))
                .during(OP)?
                .collect::<Result<Vec<i64>, _>>()
                .during(OP)?;
            ids
        };

        // Targets only ever move down, and each target slot has already been
        // vacated by an earlier iteration.
        let mut moved = 0;
        for (old, new) in ids.iter().copied().zip(1_i64..) {
            if old == new {
                continue;
            }
            tx.execute("UPDATE thoughts SET id = ?1 WHERE id = ?2", [new, old])
                .during(OP)?;
            tx.execute(
                "UPDATE events SET thought_id = ?1 WHERE thought_id = ?2",
                [new, old],
            )
            .during(OP)?;
            moved += 1;
        }

        tx.execute(
            "UPDATE sqlite_sequence
             SET seq = (SELECT COALESCE(MAX(id), 0) FROM thoughts)
             WHERE name = 'thoughts'",
            [],
        )
        .during(OP)?;
        tx.commit().during(OP)?;
        Ok(moved)
    })?;

    info!(moved, "thought ids reindexed");
    Ok(moved)
}
