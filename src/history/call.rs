use serde::{Deserialize, Serialize};

use crate::table::{CellValue, TableData};
use crate::transform::SortOrder;

/// A captured argument value.
///
/// The closed shape set covers every trackable operation. Concrete values
/// are captured, never just declared types: replay re-invokes operations
/// from the record alone, so a join embeds a full snapshot of its right-hand
/// table rather than a reference to ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ArgValue {
    Text(String),
    Value(CellValue),
    Names(Vec<String>),
    Order(SortOrder),
    Index(usize),
    Flag(bool),
    Table(TableData),
    Cell {
        row: usize,
        col: usize,
        header: Option<String>,
        value: CellValue,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallArg {
    pub name: String,
    pub value: ArgValue,
}

impl CallArg {
    pub fn new(name: impl Into<String>, value: ArgValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One logged invocation of a trackable operation against a table identity.
///
/// Arguments keep their call order; `succeeded` records the observed
/// outcome, so failed calls stay visible in the history even though they
/// changed nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub component: String,
    pub operation: String,
    pub succeeded: bool,
    pub ts_ms: u64,
    pub arguments: Vec<CallArg>,
}

impl CallRecord {
    pub fn new(
        component: impl Into<String>,
        operation: impl Into<String>,
        succeeded: bool,
        arguments: Vec<CallArg>,
    ) -> Self {
        Self {
            component: component.into(),
            operation: operation.into(),
            succeeded,
            ts_ms: now_ms(),
            arguments,
        }
    }

    pub fn arg(&self, name: &str) -> Option<&ArgValue> {
        self.arguments
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| &arg.value)
    }
}

fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
