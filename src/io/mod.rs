pub mod codec;
pub mod config_io;
pub mod file_store;
pub mod kv;
pub mod recovery;
pub mod state;

pub use file_store::FileStore;
pub use kv::{KvStore, MemoryStore, StorageError};
