use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::history::CallRecord;
use crate::table::TableId;

/// Process-wide registry mapping table identity to its ordered call history.
///
/// Shared by handing out `Arc<CallLog>`, never reached through a global.
/// Locking is two-level: the outer lock is held only long enough to fetch or
/// create an identity's sub-log, after which appends and reads serialize on
/// that identity's own lock. Appends for unrelated identities do not
/// contend.
#[derive(Debug, Default)]
pub struct CallLog {
    histories: Mutex<HashMap<u64, Arc<Mutex<Vec<CallRecord>>>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one record to the identity's history, creating the sub-log on
    /// first use. Never fails; growth is unbounded.
    pub fn record(&self, id: TableId, record: CallRecord) {
        tracing::trace!(
            id = %id,
            component = %record.component,
            operation = %record.operation,
            succeeded = record.succeeded,
            "Recorded call"
        );
        self.sub_log(id).lock().push(record);
    }

    /// The full ordered history for an identity. Unknown identities yield an
    /// empty sequence without creating an entry.
    pub fn history_of(&self, id: TableId) -> Vec<CallRecord> {
        match self.existing(id) {
            Some(records) => records.lock().clone(),
            None => Vec::new(),
        }
    }

    pub fn len_of(&self, id: TableId) -> usize {
        match self.existing(id) {
            Some(records) => records.lock().len(),
            None => 0,
        }
    }

    /// Forgets an identity's history entirely.
    pub fn clear(&self, id: TableId) {
        self.histories.lock().remove(&id.as_u64());
    }

    /// Keeps only the first `len` records. The tracked seam truncates the
    /// undone tail before recording a new operation on a rolled-back table.
    pub(crate) fn truncate(&self, id: TableId, len: usize) {
        if let Some(records) = self.existing(id) {
            let mut records = records.lock();
            if len < records.len() {
                tracing::debug!(id = %id, kept = len, dropped = records.len() - len, "Truncated history");
                records.truncate(len);
            }
        }
    }

    /// Pretty JSON of one identity's records, suitable for
    /// [`TrackedTable::import_history`](crate::history::TrackedTable::import_history).
    pub fn export(&self, id: TableId) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.history_of(id))
    }

    fn sub_log(&self, id: TableId) -> Arc<Mutex<Vec<CallRecord>>> {
        self.histories
            .lock()
            .entry(id.as_u64())
            .or_default()
            .clone()
    }

    fn existing(&self, id: TableId) -> Option<Arc<Mutex<Vec<CallRecord>>>> {
        self.histories.lock().get(&id.as_u64()).cloned()
    }
}
