//! Messages for table pages.
//!
//! All internal communication of a [`super::TablePage`] flows through this
//! single message type, including lifecycle, user actions and async results.

use crate::editor::{SessionId, Submission};
use crate::record::Record;

/// Who asked for a save, which decides where its outcome is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOrigin {
    /// The editor dialog, identified by its session.
    Editor(SessionId),
    /// A row action from the actions menu.
    Action(&'static str),
}

#[derive(Debug)]
pub enum TablePageMsg<R: Record> {
    // === Lifecycle ===
    /// First load and subscription to changes
    Initialize,
    /// Reload the rows, keeping the current ones visible when there are any
    Reload,
    /// The data source reported a change
    Invalidated,
    /// Go back to the page selector
    Close,

    // === Fetch ===
    Loaded { seq: u64, rows: Vec<R> },
    LoadFailed { seq: u64, message: String },

    // === Mutations ===
    Save {
        origin: SaveOrigin,
        submission: Submission<R::Field>,
    },
    Saved { origin: SaveOrigin, record: R },
    SaveFailed { origin: SaveOrigin, message: String },
    /// Confirmed removal of a row
    Delete(R),
    Deleted { id: String },
    DeleteFailed { id: String },

    // === Export ===
    Export(Vec<R>),

    /// A component failed to handle input
    Failed(String),
}
