pub mod database;
pub mod maintenance;
mod rows;
pub mod schema;
mod store;

pub use database::{default_db_path, open_connection, resolve_db_path, DB_PATH_ENV};
pub use maintenance::{purge_thought, reindex_thought_ids};
pub use store::{Store, StoreOptions};
