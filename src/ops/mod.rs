pub mod search;
pub mod stats;
pub mod store;

pub use store::{NewTask, Store, StoreError};
