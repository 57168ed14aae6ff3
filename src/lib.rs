pub mod history;
pub mod ingest;
pub mod table;
pub mod transform;

pub use history::{
    replay, replay_all, rollback, ArgValue, CallArg, CallLog, CallRecord, HistoryError,
    TrackedTable,
};
pub use ingest::{AdapterError, DelimitedOptions, DelimitedSource, QuerySource, RowSource};
pub use table::{Cell, CellValue, Table, TableData, TableError, TableId};
pub use transform::{filter, join, select, sort, SortOrder};
