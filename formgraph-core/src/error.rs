//! Domain errors surfaced to callers of the editor library

use thiserror::Error;

/// Errors raised by graph construction, parsing and storage.
///
/// The node-ID, ordering and resolver functions never return these; they
/// degrade to `None`/`false` instead.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Cell not found: {0}")]
    CellNotFound(String),

    #[error("Cell already exists: {0}")]
    DuplicateCell(String),

    #[error("Cell {0} is not a question")]
    NotAQuestion(String),

    #[error("Cannot connect cell {0} to itself")]
    SelfLoop(String),

    #[error("Unknown question type: {0}")]
    UnknownQuestionType(String),

    #[error("Unknown item kind: {0}")]
    UnknownItemKind(String),

    #[error("Unknown action kind: {0}")]
    UnknownActionKind(String),

    #[error("Invalid item reference '{0}' (expected kind:index)")]
    InvalidItemRef(String),

    #[error("Range {0}-{1} holds no usable entry numbers")]
    NoEntryNumbers(String, String),

    #[error("Entry number {number} is outside the range {first}-{second}")]
    EntryNumberOutOfRange {
        number: u32,
        first: String,
        second: String,
    },

    #[error("Document is locked by another user/process: {0}")]
    Locked(String),
}
