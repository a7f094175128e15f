//! Action order of trigger sequences
//!
//! Actions are matched to `action_order` by `kind_identifier` rather than by
//! array index. An action whose key is not in the order list (renamed, or
//! added by an older editor) is shown after the ordered ones. Colliding
//! identifiers share one slot.

use std::collections::HashMap;

use crate::models::{
    CheckboxGroup, Dropdown, TimeEntry, TriggerLabel, TriggerLocation, TriggerPdf, TriggerSequence,
};
use crate::order::{action_key, ActionKind, ActionOrder, ActionOrderEntry};

/// A borrowed trigger-sequence action
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerAction<'a> {
    Label(&'a TriggerLabel),
    Checkbox(&'a CheckboxGroup),
    Time(&'a TimeEntry),
    Location(&'a TriggerLocation),
    Pdf(&'a TriggerPdf),
    Dropdown(&'a Dropdown),
}

impl TriggerAction<'_> {
    pub fn kind(&self) -> ActionKind {
        match self {
            TriggerAction::Label(_) => ActionKind::Label,
            TriggerAction::Checkbox(_) => ActionKind::Checkbox,
            TriggerAction::Time(_) => ActionKind::Time,
            TriggerAction::Location(_) => ActionKind::Location,
            TriggerAction::Pdf(_) => ActionKind::Pdf,
            TriggerAction::Dropdown(_) => ActionKind::Dropdown,
        }
    }

    /// The field name (or title) the action is keyed by
    pub fn identifier(&self) -> &str {
        match self {
            TriggerAction::Label(l) => &l.field_name,
            TriggerAction::Checkbox(c) => &c.field_name,
            TriggerAction::Time(t) => &t.time_text,
            TriggerAction::Location(l) => &l.title,
            TriggerAction::Pdf(p) => &p.pdf_name,
            TriggerAction::Dropdown(d) => &d.name,
        }
    }

    pub fn key(&self) -> String {
        action_key(self.kind(), self.identifier())
    }
}

/// A new action to append to a trigger sequence
#[derive(Debug, Clone, PartialEq)]
pub enum NewAction {
    Label(TriggerLabel),
    Checkbox(CheckboxGroup),
    Time(TimeEntry),
    Location(TriggerLocation),
    Pdf(TriggerPdf),
    Dropdown(Dropdown),
}

impl TriggerSequence {
    /// Actions in array order: labels, checkboxes, times, locations, pdfs,
    /// dropdowns
    pub fn actions(&self) -> Vec<TriggerAction<'_>> {
        let mut actions = Vec::new();
        actions.extend(self.labels.iter().map(TriggerAction::Label));
        actions.extend(self.checkboxes.iter().map(TriggerAction::Checkbox));
        actions.extend(self.times.iter().map(TriggerAction::Time));
        actions.extend(self.locations.iter().map(TriggerAction::Location));
        actions.extend(self.pdfs.iter().map(TriggerAction::Pdf));
        actions.extend(self.dropdowns.iter().map(TriggerAction::Dropdown));
        actions
    }

    /// Actions in display order according to `action_order`
    pub fn ordered_actions(&self) -> Vec<TriggerAction<'_>> {
        let actions = self.actions();
        if self.action_order.is_empty() {
            return actions;
        }

        let mut slots: HashMap<String, usize> = HashMap::new();
        for (pos, entry) in self.action_order.iter().enumerate() {
            slots
                .entry(action_key(entry.kind, &entry.identifier))
                .or_insert(pos);
        }

        let mut placed = Vec::new();
        let mut unplaced = Vec::new();
        for action in actions {
            match slots.get(&action.key()) {
                Some(&pos) => placed.push((pos, action)),
                None => unplaced.push(action),
            }
        }
        placed.sort_by_key(|(pos, _)| *pos);

        placed
            .into_iter()
            .map(|(_, action)| action)
            .chain(unplaced)
            .collect()
    }

    /// Records the current display order if no order list exists yet
    pub fn ensure_action_order(&mut self) {
        if self.action_order.is_empty() {
            let entries = self
                .actions()
                .iter()
                .map(|a| ActionOrderEntry::new(a.kind(), a.identifier()))
                .collect();
            self.action_order = ActionOrder::from_entries(entries);
        }
    }

    /// Appends an action and its order entry
    pub fn add_action(&mut self, action: NewAction) {
        self.ensure_action_order();
        let entry = match action {
            NewAction::Label(label) => {
                let entry = ActionOrderEntry::new(ActionKind::Label, &label.field_name);
                self.labels.push(label);
                entry
            }
            NewAction::Checkbox(group) => {
                let entry = ActionOrderEntry::new(ActionKind::Checkbox, &group.field_name);
                self.checkboxes.push(group);
                entry
            }
            NewAction::Time(time) => {
                let entry = ActionOrderEntry::new(ActionKind::Time, &time.time_text);
                self.times.push(time);
                entry
            }
            NewAction::Location(location) => {
                let entry = ActionOrderEntry::new(ActionKind::Location, &location.title);
                self.locations.push(location);
                entry
            }
            NewAction::Pdf(pdf) => {
                let entry = ActionOrderEntry::new(ActionKind::Pdf, &pdf.pdf_name);
                self.pdfs.push(pdf);
                entry
            }
            NewAction::Dropdown(dropdown) => {
                let entry = ActionOrderEntry::new(ActionKind::Dropdown, &dropdown.name);
                self.dropdowns.push(dropdown);
                entry
            }
        };
        self.action_order.push(entry);
    }

    /// Removes the first action of `kind` named `identifier` and its order
    /// entry
    pub fn remove_action(&mut self, kind: ActionKind, identifier: &str) -> bool {
        let removed = match kind {
            ActionKind::Label => remove_first(&mut self.labels, |l| l.field_name == identifier),
            ActionKind::Checkbox => {
                remove_first(&mut self.checkboxes, |c| c.field_name == identifier)
            }
            ActionKind::Time => remove_first(&mut self.times, |t| t.time_text == identifier),
            ActionKind::Location => remove_first(&mut self.locations, |l| l.title == identifier),
            ActionKind::Pdf => remove_first(&mut self.pdfs, |p| p.pdf_name == identifier),
            ActionKind::Dropdown => remove_first(&mut self.dropdowns, |d| d.name == identifier),
        };

        if removed {
            self.action_order.remove(&action_key(kind, identifier));
        }
        removed
    }

    /// Moves the action `dragged` to the slot of `target`
    pub fn reorder_actions(
        &mut self,
        dragged: (ActionKind, &str),
        target: (ActionKind, &str),
    ) -> bool {
        self.ensure_action_order();
        self.action_order.move_entry(
            &action_key(dragged.0, dragged.1),
            &action_key(target.0, target.1),
        )
    }
}

fn remove_first<T, F: Fn(&T) -> bool>(items: &mut Vec<T>, matches: F) -> bool {
    match items.iter().position(matches) {
        Some(pos) => {
            items.remove(pos);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str) -> NewAction {
        NewAction::Label(TriggerLabel {
            field_name: name.into(),
            node_id: String::new(),
        })
    }

    fn time(text: &str) -> NewAction {
        NewAction::Time(TimeEntry {
            time_text: text.into(),
            ..Default::default()
        })
    }

    fn keys(seq: &TriggerSequence) -> Vec<String> {
        seq.ordered_actions().iter().map(|a| a.key()).collect()
    }

    #[test]
    fn test_add_keeps_insertion_order_across_kinds() {
        let mut seq = TriggerSequence::new("t1", "Yes");
        seq.add_action(time("Start"));
        seq.add_action(label("First Name"));
        seq.add_action(NewAction::Pdf(TriggerPdf {
            pdf_name: "Addendum.pdf".into(),
            ..Default::default()
        }));

        assert_eq!(
            keys(&seq),
            vec!["time_Start", "label_First Name", "pdf_Addendum.pdf"]
        );
    }

    #[test]
    fn test_without_action_order_uses_array_order() {
        let mut seq = TriggerSequence::new("t1", "Yes");
        seq.times.push(TimeEntry {
            time_text: "Start".into(),
            ..Default::default()
        });
        seq.labels.push(TriggerLabel {
            field_name: "Name".into(),
            node_id: String::new(),
        });
        assert_eq!(keys(&seq), vec!["label_Name", "time_Start"]);
    }

    #[test]
    fn test_reorder_actions() {
        let mut seq = TriggerSequence::new("t1", "Yes");
        seq.add_action(label("A"));
        seq.add_action(label("B"));
        seq.add_action(time("C"));

        assert!(seq.reorder_actions((ActionKind::Time, "C"), (ActionKind::Label, "A")));
        assert_eq!(keys(&seq), vec!["time_C", "label_A", "label_B"]);

        assert!(!seq.reorder_actions((ActionKind::Time, "C"), (ActionKind::Time, "C")));
        assert!(!seq.reorder_actions((ActionKind::Label, "Z"), (ActionKind::Label, "A")));
    }

    #[test]
    fn test_renamed_action_falls_to_end() {
        let mut seq = TriggerSequence::new("t1", "Yes");
        seq.add_action(label("A"));
        seq.add_action(label("B"));
        seq.add_action(time("C"));
        seq.reorder_actions((ActionKind::Time, "C"), (ActionKind::Label, "A"));

        seq.labels[0].field_name = "Renamed".into();
        assert_eq!(keys(&seq), vec!["time_C", "label_B", "label_Renamed"]);
    }

    #[test]
    fn test_remove_action_prunes_order() {
        let mut seq = TriggerSequence::new("t1", "Yes");
        seq.add_action(label("A"));
        seq.add_action(time("C"));

        assert!(seq.remove_action(ActionKind::Label, "A"));
        assert!(seq.labels.is_empty());
        assert_eq!(seq.action_order.len(), 1);
        assert!(!seq.remove_action(ActionKind::Label, "A"));
        assert_eq!(keys(&seq), vec!["time_C"]);
    }
}
