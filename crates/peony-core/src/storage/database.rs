use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::info;

use super::schema;
use crate::error::{CoreError, StorageContext};

/// Environment variable overriding the database location.
pub const DB_PATH_ENV: &str = "PEONY_DB_PATH";

/// `~/.local/share/peony/peony.db`
pub fn default_db_path() -> Result<PathBuf, CoreError> {
    let home = dirs::home_dir()
        .ok_or_else(|| CoreError::Config("Could not determine home directory".into()))?;
    Ok(home
        .join(".local")
        .join("share")
        .join("peony")
        .join("peony.db"))
}

/// `$PEONY_DB_PATH` when set and non-empty, otherwise [`default_db_path`].
pub fn resolve_db_path() -> Result<PathBuf, CoreError> {
    match std::env::var_os(DB_PATH_ENV) {
        Some(p) if !p.is_empty() => Ok(PathBuf::from(p)),
        _ => default_db_path(),
    }
}

/// Open (or create) the database file, apply pragmas and migrate.
pub fn open_connection(path: &Path) -> Result<Connection, CoreError> {
    if path.as_os_str().is_empty() {
        return Err(CoreError::validation("open", "empty database path"));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut conn = Connection::open(path).during("open")?;
    conn.execute_batch(schema::PRAGMAS).during("open")?;
    schema::migrate(&mut conn)?;

    info!(path = %path.display(), "database opened");
    Ok(conn)
}

/// A private in-memory database with the same schema.
pub fn open_in_memory() -> Result<Connection, CoreError> {
    let mut conn = Connection::open_in_memory().during("open")?;
    conn.execute_batch(schema::PRAGMAS).during("open")?;
    schema::migrate(&mut conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_nested_dirs_and_migrates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("peony.db");
        let conn = open_connection(&path).unwrap();
        assert!(path.exists());
        assert_eq!(schema::current_version(&conn).unwrap(), schema::SCHEMA_VERSION);
    }

    #[test]
    fn test_reopen_is_harmless() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("peony.db");
        drop(open_connection(&path).unwrap());
        let conn = open_connection(&path).unwrap();
        assert_eq!(schema::current_version(&conn).unwrap(), schema::SCHEMA_VERSION);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = open_in_memory().unwrap();
        let on: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(on, 1);
    }

    #[test]
    fn test_empty_path_rejected() {
        let err = open_connection(Path::new("")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[test]
    fn test_default_db_path_ends_with_file_name() {
        let p = default_db_path().unwrap();
        assert_eq!(p.file_name().unwrap(), "peony.db");
        assert!(p.ends_with(Path::new("peony").join("peony.db")));
    }
}
