pub mod context;
pub mod entry;
pub mod sweeper;

pub use context::ContextStore;
pub use entry::{ContextMap, Entry};
pub use sweeper::SweepHandle;
