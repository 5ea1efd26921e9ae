pub mod slot;
pub mod store;

pub use slot::{HistorySlot, MemorySlot, SqliteSlot};
pub use store::AnalysisHistory;
