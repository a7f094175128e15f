//! Node IDs
//!
//! Field identifiers are derived, never invented: PDF name, question text,
//! dropdown name, trigger option and field text are sanitized and joined in
//! that order. Stored IDs are treated as a cache of the derivation; when a
//! stored ID disagrees with the fresh one, the fresh one overwrites it.

use log::{debug, info};

use crate::graph::{FormGraph, GraphModel};
use crate::models::{CheckboxGroup, Dropdown, Question, QuestionType, TriggerSequence};
use crate::resolver::find_pdf_name_for_question;
use crate::sanitize::{sanitize, strip_extension};

/// Builds the ID of a field inside a dropdown's trigger sequence.
///
/// With a PDF: `{pdf}_{question}_{dropdown}_{trigger}_{field}`; without one
/// the `{pdf}_{question}` base is omitted. An empty trigger drops its
/// segment.
pub fn compose_field_node_id(
    question_text: &str,
    field_name: &str,
    dropdown_name: &str,
    pdf_name: Option<&str>,
    trigger_option: &str,
) -> String {
    let field = sanitize(field_name);
    let dropdown = sanitize(dropdown_name);
    let trigger = sanitize(trigger_option);
    let base = pdf_prefix(pdf_name).map(|pdf| format!("{}_{}", pdf, sanitize(question_text)));

    match (base, trigger.is_empty()) {
        (Some(base), false) => format!("{}_{}_{}_{}", base, dropdown, trigger, field),
        (None, false) => format!("{}_{}_{}", dropdown, trigger, field),
        (Some(base), true) => format!("{}_{}_{}", base, dropdown, field),
        (None, true) => format!("{}_{}", dropdown, field),
    }
}

/// Sanitized PDF name without extension, or `None` when it sanitizes away
fn pdf_prefix(pdf_name: Option<&str>) -> Option<String> {
    pdf_name
        .map(|name| sanitize(strip_extension(name.trim())))
        .filter(|prefix| !prefix.is_empty())
}

/// Appends `_{sanitize(text)}` to `parent`; empty tokens are not appended.
pub fn append_segment(parent: &str, text: &str) -> String {
    let token = sanitize(text);
    match (parent.is_empty(), token.is_empty()) {
        (_, true) => parent.to_string(),
        (true, false) => token,
        (false, false) => format!("{}_{}", parent, token),
    }
}

/// ID of the `n`th copy of a numbered-dropdown entry
pub fn numbered_entry_id(id: &str, n: u32) -> String {
    format!("{}_{}", id, n)
}

/// The naming inputs of one question
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeIdContext {
    pub question_text: String,
    pub pdf_name: Option<String>,
}

impl NodeIdContext {
    pub fn new(question_text: impl Into<String>, pdf_name: Option<String>) -> Self {
        Self {
            question_text: question_text.into(),
            pdf_name,
        }
    }

    /// Context of a cell, with its PDF resolved over the graph
    pub fn for_cell<G: GraphModel + ?Sized>(graph: &G, cell_id: &str) -> Option<Self> {
        let cell = graph.cell(cell_id)?;
        Some(Self::new(
            cell.question_text(),
            find_pdf_name_for_question(graph, cell_id),
        ))
    }

    /// `{pdf}_{question}`, or `{question}` without a PDF
    pub fn question_id(&self) -> String {
        let question = sanitize(&self.question_text);
        match pdf_prefix(self.pdf_name.as_deref()) {
            Some(prefix) => append_segment(&prefix, &question),
            None => question,
        }
    }

    /// `{question_id}_{label}`
    pub fn field_id(&self, label: &str) -> String {
        append_segment(&self.question_id(), label)
    }

    /// See [`compose_field_node_id`]
    pub fn trigger_field_id(&self, field_name: &str, dropdown_name: &str, trigger_option: &str) -> String {
        compose_field_node_id(
            &self.question_text,
            field_name,
            dropdown_name,
            self.pdf_name.as_deref(),
            trigger_option,
        )
    }
}

/// One stored ID and what it should be
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdSlot {
    /// Location within the question payload, e.g. `textboxes[0]`
    pub path: String,
    pub stored: String,
    pub computed: String,
}

impl NodeIdSlot {
    pub fn is_stale(&self) -> bool {
        self.stored != self.computed
    }
}

/// Visits every ID-bearing field of a question with its fresh value
fn visit_slots<F>(question: &mut Question, ctx: &NodeIdContext, visit: &mut F)
where
    F: FnMut(String, &mut String, String),
{
    if question.question_type != QuestionType::Unset {
        visit("nodeId".to_string(), &mut question.node_id, ctx.question_id());
    }

    for (i, textbox) in question.textboxes.iter_mut().enumerate() {
        let computed = ctx.field_id(&textbox.placeholder);
        visit(format!("textboxes[{}]", i), &mut textbox.name_id, computed);
    }

    for (g, group) in question.checkboxes.iter_mut().enumerate() {
        let group_id = ctx.field_id(&group.field_name);
        visit_checkbox_group(&format!("checkboxes[{}]", g), group, &group_id, visit);
    }

    for (t, time) in question.times.iter_mut().enumerate() {
        let computed = ctx.field_id(&time.time_text);
        visit(format!("times[{}]", t), &mut time.time_id, computed);
    }

    for (d, dropdown) in question.dropdowns.iter_mut().enumerate() {
        visit_dropdown(&format!("dropdowns[{}]", d), dropdown, ctx, visit);
    }
}

fn visit_checkbox_group<F>(path: &str, group: &mut CheckboxGroup, group_id: &str, visit: &mut F)
where
    F: FnMut(String, &mut String, String),
{
    for (o, option) in group.options.iter_mut().enumerate() {
        let computed = append_segment(group_id, &option.checkbox_text);
        visit(format!("{}.options[{}]", path, o), &mut option.node_id, computed);
    }
}

fn visit_dropdown<F>(path: &str, dropdown: &mut Dropdown, ctx: &NodeIdContext, visit: &mut F)
where
    F: FnMut(String, &mut String, String),
{
    let name = dropdown.name.clone();
    for (s, sequence) in dropdown.trigger_sequences.iter_mut().enumerate() {
        let seq_path = format!("{}.triggerSequences[{}]", path, s);
        visit_sequence(&seq_path, sequence, &name, ctx, visit);
    }
}

fn visit_sequence<F>(
    path: &str,
    sequence: &mut TriggerSequence,
    dropdown_name: &str,
    ctx: &NodeIdContext,
    visit: &mut F,
) where
    F: FnMut(String, &mut String, String),
{
    let trigger = sequence.trigger_option.clone();

    for (l, label) in sequence.labels.iter_mut().enumerate() {
        let computed = ctx.trigger_field_id(&label.field_name, dropdown_name, &trigger);
        visit(format!("{}.labels[{}]", path, l), &mut label.node_id, computed);
    }

    for (g, group) in sequence.checkboxes.iter_mut().enumerate() {
        let group_id = ctx.trigger_field_id(&group.field_name, dropdown_name, &trigger);
        visit_checkbox_group(&format!("{}.checkboxes[{}]", path, g), group, &group_id, visit);
    }

    for (t, time) in sequence.times.iter_mut().enumerate() {
        let computed = ctx.trigger_field_id(&time.time_text, dropdown_name, &trigger);
        visit(format!("{}.times[{}]", path, t), &mut time.time_id, computed);
    }

    for (d, nested) in sequence.dropdowns.iter_mut().enumerate() {
        visit_dropdown(&format!("{}.dropdowns[{}]", path, d), nested, ctx, visit);
    }
}

/// Every ID slot of `question` with its stored and freshly computed value
pub fn plan_node_ids(question: &Question, ctx: &NodeIdContext) -> Vec<NodeIdSlot> {
    let mut scratch = question.clone();
    let mut slots = Vec::new();
    visit_slots(&mut scratch, ctx, &mut |path, stored, computed| {
        slots.push(NodeIdSlot {
            path,
            stored: stored.clone(),
            computed,
        });
    });
    slots
}

/// Overwrites stale stored IDs with their computed values.
///
/// Returns the slots that were stale. With `dry_run` nothing is written.
pub fn heal_question(question: &mut Question, ctx: &NodeIdContext, dry_run: bool) -> Vec<NodeIdSlot> {
    let mut healed = Vec::new();
    visit_slots(question, ctx, &mut |path, stored, computed| {
        if *stored == computed {
            return;
        }
        let slot = NodeIdSlot {
            path,
            stored: stored.clone(),
            computed,
        };
        if !dry_run {
            stored.clone_from(&slot.computed);
        }
        healed.push(slot);
    });
    healed
}

/// Heals one question cell of the graph. Missing cells or payloads heal
/// nothing.
pub fn heal_cell(graph: &mut FormGraph, cell_id: &str, dry_run: bool) -> Vec<NodeIdSlot> {
    let Some(ctx) = NodeIdContext::for_cell(&*graph, cell_id) else {
        debug!("Heal skipped: cell {} not found", cell_id);
        return Vec::new();
    };
    let Some(question) = graph.question_mut(cell_id) else {
        debug!("Heal skipped: cell {} has no question", cell_id);
        return Vec::new();
    };

    let healed = heal_question(question, &ctx, dry_run);
    if !dry_run {
        for slot in &healed {
            info!(
                "Healed node ID {} on {}: '{}' -> '{}'",
                slot.path, cell_id, slot.stored, slot.computed
            );
        }
    }
    healed
}

/// Heals every question in the graph, returning `(cell_id, slot)` pairs
pub fn heal_all(graph: &mut FormGraph, dry_run: bool) -> Vec<(String, NodeIdSlot)> {
    graph
        .question_ids()
        .into_iter()
        .flat_map(|id| {
            heal_cell(graph, &id, dry_run)
                .into_iter()
                .map(move |slot| (id.clone(), slot))
                .collect::<Vec<_>>()
        })
        .collect()
}
