pub mod builtin;
mod record;
pub mod repository;
pub mod sqlite;

pub use builtin::BuiltinCatalog;
pub use repository::{InMemoryRepository, Storage, StorageError};
