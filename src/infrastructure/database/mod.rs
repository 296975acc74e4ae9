pub mod connector;
pub mod db;
pub mod memory;
pub mod store;

pub use connector::{ExistingStore, MongoConnector, StoreConnector};
pub use db::DatabaseManager;
pub use memory::InMemoryDataStore;
pub use store::{AppliedMigration, DataStore, MIGRATION_LEDGER, REQUIRED_TABLES};
