use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use tracing::info;

use crate::error::{CoreError, StorageContext};

/// Layout version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

pub const PRAGMAS: &str = r#"
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;
PRAGMA journal_mode = WAL;
"#;

const CREATE_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;

/// Structural step from an empty database to version 1.
const V1_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS thoughts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL,
    current_state TEXT NOT NULL,
    tend_counter INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    last_tended_at TEXT NULL,
    eligibility_at TEXT NOT NULL,
    valence INTEGER NULL,
    energy INTEGER NULL
);

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    thought_id INTEGER NOT NULL REFERENCES thoughts(id),
    kind TEXT NOT NULL,
    at TEXT NOT NULL,
    previous_state TEXT NULL,
    next_state TEXT NULL,
    note TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_thoughts_state_eligibility ON thoughts(current_state, eligibility_at);
CREATE INDEX IF NOT EXISTS idx_thoughts_updated_at ON thoughts(updated_at);
CREATE INDEX IF NOT EXISTS idx_events_thought_id_at ON events(thought_id, at);
"#;

/// Recorded version, or 0 for a database that was never migrated.
pub fn current_version(conn: &Connection) -> Result<u32, CoreError> {
    conn.execute_batch(CREATE_VERSION_TABLE).during("migrate")?;
    let version: Option<u32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()
        .during("migrate")?;
    Ok(version.unwrap_or(0))
}

/// Bring the database up to [`SCHEMA_VERSION`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<(), CoreError> {
    let current = current_version(conn)?;
    if current == SCHEMA_VERSION {
        return Ok(());
    }
    if current > SCHEMA_VERSION {
        return Err(CoreError::SchemaTooNew {
            found: current,
            supported: SCHEMA_VERSION,
        });
    }

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .during("migrate")?;
    tx.execute_batch(V1_TABLES).during("migrate")?;
    tx.execute("DELETE FROM schema_version", []).during("migrate")?;
    tx.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )
    .during("migrate")?;
    tx.commit().during("migrate")?;

    info!(from = current, to = SCHEMA_VERSION, "schema migrated");
    Ok(())
}
