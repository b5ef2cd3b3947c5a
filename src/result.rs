// ABOUTME: The canonical outcome record returned by every executable unit

use crate::error::ErrorObject;
use crate::value::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Complete,
    Failed,
    Continuation,
    Partial,
}

/// Fields per §3: `status`, `content`, `notes`, optional `error`.
/// Invariant: `status == Failed` implies `error.is_some()`.
#[derive(Debug, Clone)]
pub struct ResultRecord {
    pub status: Status,
    pub content: Value,
    pub notes: HashMap<String, Value>,
    pub error: Option<ErrorObject>,
}

impl ResultRecord {
    pub fn complete(content: Value) -> Self {
        ResultRecord {
            status: Status::Complete,
            content,
            notes: HashMap::new(),
            error: None,
        }
    }

    pub fn continuation(content: Value) -> Self {
        ResultRecord {
            status: Status::Continuation,
            content,
            notes: HashMap::new(),
            error: None,
        }
    }

    pub fn partial(content: Value) -> Self {
        ResultRecord {
            status: Status::Partial,
            content,
            notes: HashMap::new(),
            error: None,
        }
    }

    pub fn failed(error: ErrorObject) -> Self {
        ResultRecord {
            status: Status::Failed,
            content: Value::Nil,
            notes: HashMap::new(),
            error: Some(error),
        }
    }

    pub fn with_note(mut self, key: impl Into<String>, value: Value) -> Self {
        self.notes.insert(key.into(), value);
        self
    }

    pub fn is_ok(&self) -> bool {
        !matches!(self.status, Status::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ErrorObject};

    #[test]
    fn failed_always_carries_an_error() {
        let r = ResultRecord::failed(ErrorObject::new(
            ErrorKind::Internal,
            "boom",
            "something broke",
        ));
        assert_eq!(r.status, Status::Failed);
        assert!(r.error.is_some());
    }

    #[test]
    fn complete_has_no_error() {
        let r = ResultRecord::complete(Value::int(1));
        assert!(r.is_ok());
        assert!(r.error.is_none());
    }
}
