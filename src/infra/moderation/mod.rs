// Moderation storage implementations.

mod in_memory;
mod sqlite_store;

// Backs the service-level tests; the bot itself runs on SQLite.
#[allow(unused_imports)]
pub use in_memory::InMemoryModerationStore;
pub use sqlite_store::SqliteModerationStore;
