pub mod catalog;
pub mod database;
pub mod schema;
pub mod selection;
pub mod store;

pub use catalog::QueryCatalog;
pub use database::Database;
pub use selection::{SelectionPool, SelectionRunner};
pub use store::{JudgeStore, PendingBatch, SqliteJudgeStore};
