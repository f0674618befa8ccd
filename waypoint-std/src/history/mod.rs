//! History backends.

mod memory;

pub use memory::{HistoryOp, MemoryHistory};
