pub mod task;
pub mod folder;
pub mod filter;
pub mod view;
pub mod config;

pub use task::*;
pub use folder::*;
pub use filter::*;
pub use view::*;
pub use config::*;
