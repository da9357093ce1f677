//! This is the aironet-store crate - the record-store abstraction the core
//! runs against, plus the embedded in-memory backend.

pub mod memory;
pub mod traits;

pub use memory::MemoryStore;
pub use traits::{
    MinerFilter, MinerUpdate, Page, PeriodUpdate, SortOrder, Store, TransactionFilter,
};
