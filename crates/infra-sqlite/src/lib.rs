// Exchanger Infrastructure - SQLite Adapter
// Implements: Notifier (journal), SyncMarker (durable), run log

mod connection;
mod error;
mod journal;
mod migration;

pub use connection::create_pool;
pub use journal::{JournalEntry, RunRecord, SqliteJournal};
pub use migration::run_migrations;

pub(crate) use error::map_sqlx_error;
