pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod graph;
pub mod item_order;
pub mod models;
pub mod node_id;
pub mod order;
pub mod resolver;
pub mod sanitize;
pub mod storage;
pub mod text;
pub mod trigger;

// Re-export commonly used types
pub use config::{get_config_path, EditorConfig};
pub use editor::{ActionSpec, EditorHooks, FormEditor, NoopHooks, TriggerPath};
pub use error::FormError;
pub use export::{export_node_ids, node_id_records, ExportFormat, NodeIdRecord};
pub use graph::{Cell, Edge, FormGraph, GraphModel, PdfProperties, DEFAULT_PDF_NODE_MARKER};
pub use item_order::DisplayItem;
pub use models::{
    CheckboxGroup, CheckboxOption, Dropdown, DropdownOption, EntryKind, Question, QuestionType,
    Requiredness, SelectionType, TextboxEntry, TimeEntry, TriggerLabel, TriggerLocation,
    TriggerPdf, TriggerSequence, TwoNumbers,
};
pub use node_id::{
    compose_field_node_id, heal_all, heal_cell, numbered_entry_id, plan_node_ids, NodeIdContext,
    NodeIdSlot,
};
pub use order::{
    ActionKind, ActionOrder, ActionOrderEntry, ItemKind, ItemOrder, ItemOrderEntry, OrderedList,
};
pub use resolver::{find_pdf_for_question, find_pdf_name_for_question, PdfMatch};
pub use sanitize::{sanitize, sanitize_pdf_name, sanitize_with};
pub use storage::{FormDocument, Storage};
pub use trigger::{NewAction, TriggerAction};
