//! Item order of composite questions
//!
//! `Question::item_order` records the display/persistence interleaving of the
//! `textboxes`, `checkboxes`, `times` and `dropdowns` arrays plus the
//! location marker. Entries index into those arrays by rank, so every
//! mutation here keeps `order[i].index` equal to the number of earlier
//! entries of the same kind.

use log::warn;
use std::collections::HashSet;

use crate::models::{CheckboxGroup, Dropdown, Question, TextboxEntry, TimeEntry};
use crate::order::{ItemKind, ItemOrder, ItemOrderEntry};

/// A live sub-entry of a question, in display order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayItem<'a> {
    Option(usize, &'a TextboxEntry),
    Checkbox(usize, &'a CheckboxGroup),
    Time(usize, &'a TimeEntry),
    Dropdown(usize, &'a Dropdown),
    Location,
}

impl DisplayItem<'_> {
    pub fn entry(&self) -> ItemOrderEntry {
        match self {
            DisplayItem::Option(i, _) => ItemOrderEntry::new(ItemKind::Option, *i),
            DisplayItem::Checkbox(i, _) => ItemOrderEntry::new(ItemKind::Checkbox, *i),
            DisplayItem::Time(i, _) => ItemOrderEntry::new(ItemKind::Time, *i),
            DisplayItem::Dropdown(i, _) => ItemOrderEntry::new(ItemKind::Dropdown, *i),
            DisplayItem::Location => ItemOrderEntry::location(),
        }
    }
}

/// Moves the elements of `items` into the sequence given by `sequence`
/// (old indices); elements not named keep their relative order at the end.
fn permute<T>(items: &mut Vec<T>, sequence: &[usize]) {
    let mut slots: Vec<Option<T>> = std::mem::take(items).into_iter().map(Some).collect();
    let mut arranged = Vec::with_capacity(slots.len());
    for &old in sequence {
        if let Some(item) = slots.get_mut(old).and_then(Option::take) {
            arranged.push(item);
        }
    }
    arranged.extend(slots.into_iter().flatten());
    *items = arranged;
}

impl Question {
    /// Number of live elements of `kind`
    pub fn item_count(&self, kind: ItemKind) -> usize {
        match kind {
            ItemKind::Option => self.textboxes.len(),
            ItemKind::Checkbox => self.checkboxes.len(),
            ItemKind::Time => self.times.len(),
            ItemKind::Dropdown => self.dropdowns.len(),
            ItemKind::Location => usize::from(self.location_index.is_some()),
        }
    }

    /// True when `entry` points at a live element
    pub fn is_live(&self, entry: &ItemOrderEntry) -> bool {
        entry.index < self.item_count(entry.kind)
    }

    /// Order list built from the arrays: options, checkboxes, times,
    /// dropdowns, then the location marker.
    pub fn default_item_order(&self) -> ItemOrder {
        let mut order = ItemOrder::new();
        for &kind in ItemKind::all() {
            for index in 0..self.item_count(kind) {
                order.push(ItemOrderEntry::new(kind, index));
            }
        }
        order
    }

    /// Builds the order list from the arrays if it is empty. Idempotent.
    pub fn ensure_item_order(&mut self) {
        if self.item_order.is_empty() {
            self.item_order = self.default_item_order();
            self.sync_location_index();
        }
    }

    /// Moves `dragged` to the slot of `target` and re-ranks every kind.
    ///
    /// The backing arrays are permuted to follow the new order. Returns
    /// `false` without changes when either entry is missing or both are the
    /// same.
    pub fn reorder_items(&mut self, dragged: ItemOrderEntry, target: ItemOrderEntry) -> bool {
        self.ensure_item_order();
        if !self.item_order.move_entry(&dragged, &target) {
            return false;
        }
        self.apply_item_order();
        true
    }

    /// Removes a sub-entry and its order entry, shifting same-kind siblings.
    pub fn remove_item(&mut self, entry: ItemOrderEntry) -> bool {
        if !self.is_live(&entry) {
            return false;
        }
        self.ensure_item_order();

        match entry.kind {
            ItemKind::Option => {
                self.textboxes.remove(entry.index);
            }
            ItemKind::Checkbox => {
                self.checkboxes.remove(entry.index);
            }
            ItemKind::Time => {
                self.times.remove(entry.index);
            }
            ItemKind::Dropdown => {
                self.dropdowns.remove(entry.index);
            }
            ItemKind::Location => {
                self.location_index = None;
            }
        }

        self.item_order.remove_item(entry.kind, entry.index);
        self.sync_location_index();
        true
    }

    pub fn push_textbox(&mut self, textbox: TextboxEntry) -> ItemOrderEntry {
        self.prepare_push(ItemKind::Option);
        self.textboxes.push(textbox);
        self.push_order_entry(ItemKind::Option)
    }

    pub fn push_checkbox_group(&mut self, group: CheckboxGroup) -> ItemOrderEntry {
        self.prepare_push(ItemKind::Checkbox);
        self.checkboxes.push(group);
        self.push_order_entry(ItemKind::Checkbox)
    }

    pub fn push_time(&mut self, time: TimeEntry) -> ItemOrderEntry {
        self.prepare_push(ItemKind::Time);
        self.times.push(time);
        self.push_order_entry(ItemKind::Time)
    }

    pub fn push_dropdown(&mut self, dropdown: Dropdown) -> ItemOrderEntry {
        self.prepare_push(ItemKind::Dropdown);
        self.dropdowns.push(dropdown);
        self.push_order_entry(ItemKind::Dropdown)
    }

    /// Adds the location marker at the end. No-op if one is present.
    pub fn add_location(&mut self) -> bool {
        if self.location_index.is_some() {
            return false;
        }
        self.ensure_item_order();
        self.location_index = Some(self.item_order.len());
        self.item_order.push(ItemOrderEntry::location());
        true
    }

    /// Readies the order list for a new element of `kind`.
    ///
    /// A persisted order that misses live elements of `kind`, or is not
    /// ranked, is healed first so the next entry takes the next free rank.
    fn prepare_push(&mut self, kind: ItemKind) {
        self.ensure_item_order();
        if self.item_order.next_index(kind) != self.item_count(kind) || !self.item_order.is_ranked() {
            self.apply_item_order();
        }
    }

    fn push_order_entry(&mut self, kind: ItemKind) -> ItemOrderEntry {
        let entry = ItemOrderEntry::new(kind, self.item_order.next_index(kind));
        self.item_order.push(entry);
        entry
    }

    fn sync_location_index(&mut self) {
        if self.location_index.is_some() {
            self.location_index = self.item_order.position(&ItemOrderEntry::location());
        }
    }

    /// Rewrites arrays and order list so that the order list is the single
    /// source of truth: arrays follow it, indices are ranks, stale and
    /// duplicate entries are dropped and unreferenced elements are appended.
    pub fn apply_item_order(&mut self) {
        let mut sequences: [Vec<usize>; 4] = Default::default();
        let mut seen = HashSet::new();
        let mut kinds = Vec::with_capacity(self.item_order.len());

        for entry in self.item_order.iter() {
            if !self.is_live(entry) || !seen.insert(*entry) {
                continue;
            }
            if let Some(slot) = array_slot(entry.kind) {
                sequences[slot].push(entry.index);
            }
            kinds.push(entry.kind);
        }

        permute(&mut self.textboxes, &sequences[0]);
        permute(&mut self.checkboxes, &sequences[1]);
        permute(&mut self.times, &sequences[2]);
        permute(&mut self.dropdowns, &sequences[3]);

        let mut rebuilt = ItemOrder::new();
        let mut ranks = [0usize; 5];
        for kind in kinds {
            let rank = &mut ranks[kind_slot(kind)];
            rebuilt.push(ItemOrderEntry::new(kind, *rank));
            *rank += 1;
        }
        for &kind in ItemKind::all() {
            let rank = &mut ranks[kind_slot(kind)];
            while *rank < self.item_count(kind) {
                rebuilt.push(ItemOrderEntry::new(kind, *rank));
                *rank += 1;
            }
        }

        self.item_order = rebuilt;
        self.sync_location_index();
    }

    /// Live sub-entries in display order.
    ///
    /// Stale or duplicate order entries are skipped; live elements the order
    /// list does not mention follow in default order.
    pub fn display_items(&self) -> Vec<DisplayItem<'_>> {
        let order = if self.item_order.is_empty() {
            self.default_item_order()
        } else {
            self.item_order.clone()
        };

        let mut seen = HashSet::new();
        let mut items = Vec::new();

        for entry in order.iter() {
            if !self.is_live(entry) {
                warn!("Skipping stale item order entry {}", entry);
                continue;
            }
            if seen.insert(*entry) {
                items.push(self.display_item(entry));
            }
        }

        for entry in self.default_item_order().iter() {
            if seen.insert(*entry) {
                items.push(self.display_item(entry));
            }
        }

        items
    }

    fn display_item(&self, entry: &ItemOrderEntry) -> DisplayItem<'_> {
        let i = entry.index;
        match entry.kind {
            ItemKind::Option => DisplayItem::Option(i, &self.textboxes[i]),
            ItemKind::Checkbox => DisplayItem::Checkbox(i, &self.checkboxes[i]),
            ItemKind::Time => DisplayItem::Time(i, &self.times[i]),
            ItemKind::Dropdown => DisplayItem::Dropdown(i, &self.dropdowns[i]),
            ItemKind::Location => DisplayItem::Location,
        }
    }
}

fn array_slot(kind: ItemKind) -> Option<usize> {
    match kind {
        ItemKind::Option => Some(0),
        ItemKind::Checkbox => Some(1),
        ItemKind::Time => Some(2),
        ItemKind::Dropdown => Some(3),
        ItemKind::Location => None,
    }
}

fn kind_slot(kind: ItemKind) -> usize {
    array_slot(kind).unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionType, TwoNumbers};

    fn entry(kind: ItemKind, index: usize) -> ItemOrderEntry {
        ItemOrderEntry::new(kind, index)
    }

    fn sample_question() -> Question {
        let mut q = Question::new(QuestionType::MultipleDropdownType, "How many vehicles?");
        q.two_numbers = Some(TwoNumbers::new("1", "3"));
        q.push_textbox(TextboxEntry::new("Make", Default::default()));
        q.push_textbox(TextboxEntry::new("Model", Default::default()));
        q.push_checkbox_group(CheckboxGroup {
            field_name: "Insured".into(),
            ..Default::default()
        });
        q.push_time(TimeEntry {
            time_text: "Purchase date".into(),
            ..Default::default()
        });
        q.add_location();
        q.push_textbox(TextboxEntry::new("Year", Default::default()));
        q
    }

    fn labels(q: &Question) -> Vec<String> {
        q.display_items()
            .iter()
            .map(|item| match item {
                DisplayItem::Option(_, t) => t.placeholder.clone(),
                DisplayItem::Checkbox(_, c) => c.field_name.clone(),
                DisplayItem::Time(_, t) => t.time_text.clone(),
                DisplayItem::Dropdown(_, d) => d.name.clone(),
                DisplayItem::Location => "<location>".into(),
            })
            .collect()
    }

    #[test]
    fn test_ensure_item_order_default_sequence() {
        let mut q = Question::new(QuestionType::MultipleDropdownType, "Q");
        q.textboxes = vec![TextboxEntry::default(), TextboxEntry::default()];
        q.times = vec![TimeEntry::default()];
        q.checkboxes = vec![CheckboxGroup::default()];
        q.location_index = Some(0);

        q.ensure_item_order();
        assert_eq!(
            q.item_order.entries(),
            &[
                entry(ItemKind::Option, 0),
                entry(ItemKind::Option, 1),
                entry(ItemKind::Checkbox, 0),
                entry(ItemKind::Time, 0),
                entry(ItemKind::Location, 0),
            ]
        );
        assert_eq!(q.location_index, Some(4));

        let snapshot = q.item_order.clone();
        q.ensure_item_order();
        assert_eq!(q.item_order, snapshot);
    }

    #[test]
    fn test_push_keeps_interleaving() {
        let q = sample_question();
        assert_eq!(
            labels(&q),
            vec!["Make", "Model", "Insured", "Purchase date", "<location>", "Year"]
        );
        assert!(q.item_order.is_ranked());
        assert_eq!(q.location_index, Some(4));
    }

    #[test]
    fn test_reorder_moves_and_reranks() {
        let mut q = sample_question();

        // Drag "Year" (option 2) onto "Make" (option 0)
        assert!(q.reorder_items(entry(ItemKind::Option, 2), entry(ItemKind::Option, 0)));
        assert_eq!(
            labels(&q),
            vec!["Year", "Make", "Model", "Insured", "Purchase date", "<location>"]
        );
        assert!(q.item_order.is_ranked());
        assert_eq!(q.textboxes[0].placeholder, "Year");
        assert_eq!(q.location_index, Some(5));

        // Drag the location marker before the checkbox group
        assert!(q.reorder_items(ItemOrderEntry::location(), entry(ItemKind::Checkbox, 0)));
        assert_eq!(
            labels(&q),
            vec!["Year", "Make", "Model", "<location>", "Insured", "Purchase date"]
        );
        assert_eq!(q.location_index, Some(3));
        assert!(q.item_order.is_ranked());
    }

    #[test]
    fn test_reorder_invariant_after_many_moves() {
        let mut q = sample_question();
        let moves = [
            (entry(ItemKind::Time, 0), entry(ItemKind::Option, 0)),
            (entry(ItemKind::Option, 2), entry(ItemKind::Checkbox, 0)),
            (entry(ItemKind::Option, 0), entry(ItemKind::Option, 2)),
            (ItemOrderEntry::location(), entry(ItemKind::Time, 0)),
            (entry(ItemKind::Checkbox, 0), ItemOrderEntry::location()),
        ];
        for (dragged, target) in moves {
            assert!(q.reorder_items(dragged, target));
            assert!(q.item_order.is_ranked(), "order {:?}", q.item_order);
            assert_eq!(q.item_order.len(), 6);
        }
    }

    #[test]
    fn test_reorder_rejects_invalid() {
        let mut q = sample_question();
        let before = q.clone();

        assert!(!q.reorder_items(entry(ItemKind::Option, 0), entry(ItemKind::Option, 0)));
        assert!(!q.reorder_items(entry(ItemKind::Dropdown, 0), entry(ItemKind::Option, 0)));
        assert!(!q.reorder_items(entry(ItemKind::Option, 0), entry(ItemKind::Time, 9)));
        assert_eq!(q, before);
    }

    #[test]
    fn test_remove_item_prunes_order() {
        let mut q = sample_question();

        assert!(q.remove_item(entry(ItemKind::Option, 1)));
        assert_eq!(labels(&q), vec!["Make", "Insured", "Purchase date", "<location>", "Year"]);
        assert!(q.item_order.is_ranked());
        assert_eq!(q.location_index, Some(3));

        assert!(q.remove_item(ItemOrderEntry::location()));
        assert_eq!(q.location_index, None);
        assert_eq!(labels(&q), vec!["Make", "Insured", "Purchase date", "Year"]);

        assert!(!q.remove_item(entry(ItemKind::Dropdown, 0)));
        assert!(!q.remove_item(ItemOrderEntry::location()));
    }

    #[test]
    fn test_stale_entry_is_skipped_on_render() {
        let q = sample_question();
        let clean = labels(&q);

        let mut stale = q.clone();
        let mut entries = stale.item_order.entries().to_vec();
        entries.insert(2, entry(ItemKind::Time, 7));
        stale.item_order = ItemOrder::from_entries(entries);

        assert_eq!(labels(&stale), clean);
    }

    #[test]
    fn test_apply_item_order_heals_stale_and_missing() {
        let mut q = sample_question();
        q.item_order = ItemOrder::from_entries(vec![
            entry(ItemKind::Option, 1),
            entry(ItemKind::Dropdown, 3),
            entry(ItemKind::Option, 1),
            entry(ItemKind::Option, 0),
        ]);

        q.apply_item_order();

        assert!(q.item_order.is_ranked());
        assert_eq!(
            labels(&q),
            vec!["Model", "Make", "Year", "Insured", "Purchase date", "<location>"]
        );
        assert_eq!(q.textboxes[0].placeholder, "Model");
    }

    #[test]
    fn test_push_onto_partial_persisted_order() {
        let mut q = Question::new(QuestionType::MultipleDropdownType, "Q");
        q.textboxes = vec![
            TextboxEntry::new("Make", Default::default()),
            TextboxEntry::new("Model", Default::default()),
        ];
        q.times = vec![TimeEntry {
            time_text: "Purchase date".into(),
            ..Default::default()
        }];
        // Older file that only recorded the first option
        q.item_order = ItemOrder::from_entries(vec![entry(ItemKind::Option, 0)]);

        let pushed = q.push_textbox(TextboxEntry::new("Year", Default::default()));

        assert_eq!(pushed, entry(ItemKind::Option, 2));
        assert_eq!(q.textboxes[pushed.index].placeholder, "Year");
        assert!(q.item_order.is_ranked(), "order {:?}", q.item_order);
        assert_eq!(q.item_order.len(), 4);
        assert_eq!(labels(&q), vec!["Make", "Model", "Purchase date", "Year"]);
    }

    #[test]
    fn test_push_over_stale_entry_points_at_new_element() {
        let mut q = Question::new(QuestionType::MultipleDropdownType, "Q");
        q.textboxes = vec![TextboxEntry::new("Make", Default::default())];
        q.item_order = ItemOrder::from_entries(vec![
            entry(ItemKind::Option, 1),
            entry(ItemKind::Option, 0),
        ]);

        let pushed = q.push_textbox(TextboxEntry::new("Year", Default::default()));

        assert_eq!(q.textboxes[pushed.index].placeholder, "Year");
        assert!(q.item_order.is_ranked());
        assert_eq!(labels(&q), vec!["Make", "Year"]);
    }

    #[test]
    fn test_round_trip_preserves_display_order() {
        let mut q = sample_question();
        q.reorder_items(entry(ItemKind::Time, 0), entry(ItemKind::Option, 1));

        let yaml = serde_yaml::to_string(&q).unwrap();
        let restored: Question = serde_yaml::from_str(&yaml).unwrap();

        let original: Vec<ItemOrderEntry> = q.display_items().iter().map(|i| i.entry()).collect();
        let reloaded: Vec<ItemOrderEntry> =
            restored.display_items().iter().map(|i| i.entry()).collect();
        assert_eq!(original, reloaded);
        assert_eq!(labels(&q), labels(&restored));
    }
}
