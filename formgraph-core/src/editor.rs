//! Editor session
//!
//! [`FormEditor`] performs the edits a user makes in the question panels.
//! Every operation is a logged no-op when its cell or payload is missing.
//! Successful edits notify the [`EditorHooks`] once per outermost update.

use log::debug;
use uuid::Uuid;

use crate::graph::FormGraph;
use crate::models::{
    CheckboxGroup, CheckboxOption, Dropdown, DropdownOption, EntryKind, Question, QuestionType,
    Requiredness, SelectionType, TextboxEntry, TimeEntry, TriggerLabel, TriggerLocation,
    TriggerPdf, TriggerSequence, TwoNumbers,
};
use crate::node_id::{append_segment, heal_cell, NodeIdContext, NodeIdSlot};
use crate::order::{ActionKind, ItemOrderEntry};
use crate::sanitize::sanitize;
use crate::text::{remove_style_key, set_style_value, strip_html};
use crate::trigger::NewAction;

/// Optional collaborators notified after edits
pub trait EditorHooks {
    fn request_autosave(&self) {}

    fn refresh_all_cells(&self) {}

    fn refresh_specific_cells(&self, _cell_ids: &[String]) {}
}

/// Hooks that do nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl EditorHooks for NoopHooks {}

/// Addresses a trigger sequence of a top-level dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerPath {
    pub dropdown: usize,
    pub sequence: usize,
}

impl TriggerPath {
    pub fn new(dropdown: usize, sequence: usize) -> Self {
        Self { dropdown, sequence }
    }
}

/// The kind of action to add to a trigger sequence, by its identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
    pub kind: ActionKind,
    pub identifier: String,
}

pub struct FormEditor<'g, H: EditorHooks = NoopHooks> {
    graph: &'g mut FormGraph,
    hooks: H,
}

impl<'g> FormEditor<'g, NoopHooks> {
    pub fn new(graph: &'g mut FormGraph) -> Self {
        Self {
            graph,
            hooks: NoopHooks,
        }
    }
}

impl<'g, H: EditorHooks> FormEditor<'g, H> {
    pub fn with_hooks(graph: &'g mut FormGraph, hooks: H) -> Self {
        Self { graph, hooks }
    }

    pub fn graph(&self) -> &FormGraph {
        &*self.graph
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Runs `edit` inside an update batch and notifies hooks when it applied
    fn batch<F>(&mut self, cell_id: &str, edit: F) -> bool
    where
        F: FnOnce(&mut FormGraph) -> bool,
    {
        self.graph.begin_update();
        let applied = edit(self.graph);
        let outermost = self.graph.end_update();

        if applied && outermost {
            self.hooks.refresh_specific_cells(&[cell_id.to_string()]);
            self.hooks.request_autosave();
        }
        applied
    }

    /// Applies `edit` to the question payload with the cell's naming context
    fn edit_question<F>(&mut self, cell_id: &str, edit: F) -> bool
    where
        F: FnOnce(&mut Question, &NodeIdContext) -> bool,
    {
        let Some(ctx) = NodeIdContext::for_cell(&*self.graph, cell_id) else {
            debug!("Edit skipped: cell {} not found", cell_id);
            return false;
        };
        self.batch(cell_id, |graph| match graph.question_mut(cell_id) {
            Some(question) => edit(question, &ctx),
            None => {
                debug!("Edit skipped: cell {} has no question", cell_id);
                false
            }
        })
    }

    /// Applies `edit` to one trigger sequence
    fn edit_sequence<F>(&mut self, cell_id: &str, path: TriggerPath, edit: F) -> bool
    where
        F: FnOnce(&mut TriggerSequence, &str, &NodeIdContext) -> bool,
    {
        self.edit_question(cell_id, |question, ctx| {
            let Some(dropdown) = question.dropdowns.get_mut(path.dropdown) else {
                return false;
            };
            let dropdown_name = dropdown.name.clone();
            match dropdown.trigger_sequences.get_mut(path.sequence) {
                Some(sequence) => edit(sequence, &dropdown_name, ctx),
                None => false,
            }
        })
    }

    /// Stores new question text (HTML stripped) and re-derives the
    /// question's IDs
    pub fn set_question_text(&mut self, cell_id: &str, text: &str) -> bool {
        let plain = strip_html(text);
        self.batch(cell_id, |graph| {
            let Some(cell) = graph.cell_mut(cell_id) else {
                debug!("Edit skipped: cell {} not found", cell_id);
                return false;
            };
            cell.value = text.to_string();
            if let Some(question) = cell.question.as_mut() {
                question.question_text = plain;
            }
            heal_cell(graph, cell_id, false);
            true
        })
    }

    /// Switches the question type.
    ///
    /// Keeps the display text and the question-level node ID, resets the
    /// payload to the new type's default shape and retags the style. Stored
    /// IDs are deliberately not regenerated here.
    pub fn set_type(&mut self, cell_id: &str, new_type: QuestionType) -> bool {
        self.batch(cell_id, |graph| {
            let Some(cell) = graph.cell_mut(cell_id) else {
                debug!("Type switch skipped: cell {} not found", cell_id);
                return false;
            };

            let text = cell.question_text();
            let node_id = cell
                .question
                .as_ref()
                .map(|q| q.node_id.clone())
                .unwrap_or_default();

            let mut style = cell.style.clone();
            for question_type in QuestionType::all() {
                style = remove_style_key(&style, question_type.as_str());
            }
            cell.style = if new_type == QuestionType::Unset {
                remove_style_key(&style, "questionType")
            } else {
                set_style_value(&style, "questionType", new_type.as_str())
            };

            let mut question = Question::new(new_type, text);
            question.node_id = node_id;
            cell.question = Some(question);
            true
        })
    }

    pub fn add_textbox(&mut self, cell_id: &str, label: &str, entry_kind: EntryKind) -> bool {
        self.edit_question(cell_id, |question, ctx| {
            let mut textbox = TextboxEntry::new(label, entry_kind);
            textbox.name_id = ctx.field_id(label);
            question.push_textbox(textbox);
            true
        })
    }

    /// Renames a textbox and regenerates its ID
    pub fn set_textbox_label(&mut self, cell_id: &str, index: usize, label: &str) -> bool {
        self.edit_question(cell_id, |question, ctx| {
            let Some(textbox) = question.textboxes.get_mut(index) else {
                return false;
            };
            textbox.placeholder = label.to_string();
            textbox.name_id = ctx.field_id(label);
            true
        })
    }

    pub fn add_checkbox_group(
        &mut self,
        cell_id: &str,
        field_name: &str,
        selection_type: SelectionType,
        required: Requiredness,
    ) -> bool {
        self.edit_question(cell_id, |question, _| {
            question.push_checkbox_group(CheckboxGroup {
                field_name: field_name.to_string(),
                options: Vec::new(),
                selection_type,
                required,
            });
            true
        })
    }

    pub fn add_checkbox_option(&mut self, cell_id: &str, group: usize, text: &str) -> bool {
        self.edit_question(cell_id, |question, ctx| {
            let Some(group) = question.checkboxes.get_mut(group) else {
                return false;
            };
            let node_id = append_segment(&ctx.field_id(&group.field_name), text);
            group.options.push(CheckboxOption {
                checkbox_text: text.to_string(),
                node_id,
            });
            true
        })
    }

    pub fn add_time(&mut self, cell_id: &str, text: &str) -> bool {
        self.edit_question(cell_id, |question, ctx| {
            question.push_time(TimeEntry {
                time_text: text.to_string(),
                time_id: ctx.field_id(text),
                ..Default::default()
            });
            true
        })
    }

    pub fn add_dropdown(&mut self, cell_id: &str, name: &str) -> bool {
        self.edit_question(cell_id, |question, _| {
            question.push_dropdown(Dropdown {
                id: format!("dropdown_{}", Uuid::new_v4().simple()),
                name: name.to_string(),
                ..Default::default()
            });
            true
        })
    }

    pub fn add_dropdown_option(&mut self, cell_id: &str, dropdown: usize, text: &str) -> bool {
        self.edit_question(cell_id, |question, _| {
            let Some(dropdown) = question.dropdowns.get_mut(dropdown) else {
                return false;
            };
            dropdown.options.push(DropdownOption {
                id: sanitize(text),
                text: text.to_string(),
                value: text.to_string(),
            });
            true
        })
    }

    pub fn add_trigger_sequence(&mut self, cell_id: &str, dropdown: usize, trigger_option: &str) -> bool {
        self.edit_question(cell_id, |question, _| {
            let Some(dropdown) = question.dropdowns.get_mut(dropdown) else {
                return false;
            };
            dropdown.trigger_sequences.push(TriggerSequence::new(
                format!("trigger_{}", Uuid::new_v4().simple()),
                trigger_option,
            ));
            true
        })
    }

    /// Appends an action to a trigger sequence, deriving its ID
    pub fn add_trigger_action(&mut self, cell_id: &str, path: TriggerPath, spec: ActionSpec) -> bool {
        self.edit_sequence(cell_id, path, |sequence, dropdown_name, ctx| {
            let trigger = sequence.trigger_option.clone();
            let field_id = ctx.trigger_field_id(&spec.identifier, dropdown_name, &trigger);
            let identifier = spec.identifier.clone();

            let action = match spec.kind {
                ActionKind::Label => NewAction::Label(TriggerLabel {
                    field_name: identifier,
                    node_id: field_id,
                }),
                ActionKind::Checkbox => NewAction::Checkbox(CheckboxGroup {
                    field_name: identifier,
                    ..Default::default()
                }),
                ActionKind::Time => NewAction::Time(TimeEntry {
                    time_text: identifier,
                    time_id: field_id,
                    ..Default::default()
                }),
                ActionKind::Location => NewAction::Location(TriggerLocation {
                    title: identifier,
                }),
                ActionKind::Pdf => NewAction::Pdf(TriggerPdf {
                    pdf_name: identifier,
                    ..Default::default()
                }),
                ActionKind::Dropdown => NewAction::Dropdown(Dropdown {
                    id: format!("dropdown_{}", Uuid::new_v4().simple()),
                    name: identifier,
                    ..Default::default()
                }),
            };
            sequence.add_action(action);
            true
        })
    }

    pub fn remove_trigger_action(
        &mut self,
        cell_id: &str,
        path: TriggerPath,
        kind: ActionKind,
        identifier: &str,
    ) -> bool {
        self.edit_sequence(cell_id, path, |sequence, _, _| {
            sequence.remove_action(kind, identifier)
        })
    }

    pub fn reorder_trigger_actions(
        &mut self,
        cell_id: &str,
        path: TriggerPath,
        dragged: (ActionKind, &str),
        target: (ActionKind, &str),
    ) -> bool {
        self.edit_sequence(cell_id, path, |sequence, _, _| {
            sequence.reorder_actions(dragged, target)
        })
    }

    pub fn set_location(&mut self, cell_id: &str) -> bool {
        self.edit_question(cell_id, |question, _| question.add_location())
    }

    pub fn remove_location(&mut self, cell_id: &str) -> bool {
        self.remove_item(cell_id, ItemOrderEntry::location())
    }

    pub fn remove_item(&mut self, cell_id: &str, item: ItemOrderEntry) -> bool {
        self.edit_question(cell_id, |question, _| question.remove_item(item))
    }

    pub fn reorder_items(&mut self, cell_id: &str, dragged: ItemOrderEntry, target: ItemOrderEntry) -> bool {
        self.edit_question(cell_id, |question, _| question.reorder_items(dragged, target))
    }

    pub fn set_two_numbers(&mut self, cell_id: &str, first: &str, second: &str) -> bool {
        self.edit_question(cell_id, |question, _| {
            question.two_numbers = Some(TwoNumbers::new(first, second));
            true
        })
    }

    /// Explicit reset: regenerates every stored ID of the question
    pub fn reset_node_ids(&mut self, cell_id: &str) -> Vec<NodeIdSlot> {
        let mut healed = Vec::new();
        self.batch(cell_id, |graph| {
            healed = heal_cell(graph, cell_id, false);
            !healed.is_empty()
        });
        healed
    }

    /// Re-derives IDs of every question, e.g. after PDF names changed
    pub fn reset_all_node_ids(&mut self) -> usize {
        let ids = self.graph.question_ids();
        let healed: usize = ids
            .iter()
            .map(|id| heal_cell(self.graph, id, false).len())
            .sum();
        if healed > 0 {
            self.hooks.refresh_all_cells();
            self.hooks.request_autosave();
        }
        healed
    }
}
