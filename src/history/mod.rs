//! Recorded operation history: the append-only call log, the replay engine
//! that rebuilds table state from it, and the tracked handle that records
//! as it goes.

pub mod call;
pub mod log;
pub mod replay;
pub mod tracked;

pub use call::{ArgValue, CallArg, CallRecord};
pub use log::CallLog;
pub use replay::{replay, replay_all, rollback, HistoryError};
pub use tracked::TrackedTable;
