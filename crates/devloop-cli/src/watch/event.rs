use serde::Serialize;
use std::fmt;

/// Kind of filesystem change reported by the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Create,
    Modify,
    Remove,
    Rename,
    /// Anything the platform backend could not classify.
    Other,
}

impl ChangeOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeOp::Create => "create",
            ChangeOp::Modify => "modify",
            ChangeOp::Remove => "remove",
            ChangeOp::Rename => "rename",
            ChangeOp::Other => "other",
        }
    }
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One filesystem change inside a batch.
///
/// `path` is relative to the watch root and always uses `/` separators, so
/// include/exclude patterns behave the same on every platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeEvent {
    pub op: ChangeOp,
    pub path: String,
}

impl ChangeEvent {
    pub fn new(op: ChangeOp, path: impl Into<String>) -> Self {
        Self {
            op,
            path: path.into(),
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.path)
    }
}
