//! Ordered heterogeneous collections
//!
//! Composite questions and trigger sequences both keep an explicit order list
//! next to their per-kind arrays. [`OrderedList`] holds the list; the entry
//! type decides how an entry is matched:
//!
//! - [`ItemOrderEntry`] matches by `(kind, index)`, where `index` is the
//!   entry's rank among siblings of the same kind.
//! - [`ActionOrderEntry`] matches by the composite string `kind_identifier`,
//!   so renamed or colliding identifiers fall back to append-at-end.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FormError;

/// An entry in an [`OrderedList`], matched by its key.
pub trait OrderEntry: Clone + fmt::Debug {
    type Key: PartialEq + fmt::Debug;

    fn key(&self) -> Self::Key;
}

/// A persisted order list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedList<E> {
    entries: Vec<E>,
}

impl<E> Default for OrderedList<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E: OrderEntry> OrderedList<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<E>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the first entry matching `key`
    pub fn position(&self, key: &E::Key) -> Option<usize> {
        self.entries.iter().position(|e| e.key() == *key)
    }

    pub fn contains(&self, key: &E::Key) -> bool {
        self.position(key).is_some()
    }

    pub fn push(&mut self, entry: E) {
        self.entries.push(entry);
    }

    /// Removes the first entry matching `key`
    pub fn remove(&mut self, key: &E::Key) -> Option<E> {
        let pos = self.position(key)?;
        Some(self.entries.remove(pos))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Moves the entry matching `dragged` to the slot held by `target`.
    ///
    /// Both slots are resolved before the entry is taken out, so dragging
    /// downwards lands the entry after the target. Returns `false` (leaving
    /// the list untouched) when either key is missing or both are the same.
    pub fn move_entry(&mut self, dragged: &E::Key, target: &E::Key) -> bool {
        if dragged == target {
            return false;
        }

        let (Some(from), Some(to)) = (self.position(dragged), self.position(target)) else {
            return false;
        };

        let entry = self.entries.remove(from);
        let to = to.min(self.entries.len());
        self.entries.insert(to, entry);
        true
    }
}

impl<'a, E> IntoIterator for &'a OrderedList<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ============================================================================
// Item order (composite questions)
// ============================================================================

/// Kinds of sub-entry inside a composite question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A textbox option (backed by `textboxes`)
    Option,
    Checkbox,
    Time,
    Dropdown,
    /// Position marker with no backing array
    Location,
}

impl ItemKind {
    /// Default concatenation order used when no order list exists yet
    pub fn all() -> &'static [ItemKind] {
        &[
            ItemKind::Option,
            ItemKind::Checkbox,
            ItemKind::Time,
            ItemKind::Dropdown,
            ItemKind::Location,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Option => "option",
            ItemKind::Checkbox => "checkbox",
            ItemKind::Time => "time",
            ItemKind::Dropdown => "dropdown",
            ItemKind::Location => "location",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "option" | "textbox" => Ok(ItemKind::Option),
            "checkbox" => Ok(ItemKind::Checkbox),
            "time" => Ok(ItemKind::Time),
            "dropdown" => Ok(ItemKind::Dropdown),
            "location" => Ok(ItemKind::Location),
            _ => Err(FormError::UnknownItemKind(s.to_string())),
        }
    }
}

/// One `{type, index}` record of a question's item order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemOrderEntry {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub index: usize,
}

impl ItemOrderEntry {
    pub fn new(kind: ItemKind, index: usize) -> Self {
        Self { kind, index }
    }

    pub fn location() -> Self {
        Self::new(ItemKind::Location, 0)
    }
}

impl OrderEntry for ItemOrderEntry {
    type Key = ItemOrderEntry;

    fn key(&self) -> Self::Key {
        *self
    }
}

impl fmt::Display for ItemOrderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.index)
    }
}

/// Parses `kind:index` (or bare `location`)
impl FromStr for ItemOrderEntry {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((kind, index)) => {
                let kind = kind.trim().parse::<ItemKind>()?;
                let index = index
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| FormError::InvalidItemRef(s.to_string()))?;
                Ok(Self::new(kind, index))
            }
            None if s.trim().eq_ignore_ascii_case("location") => Ok(Self::location()),
            None => Err(FormError::InvalidItemRef(s.to_string())),
        }
    }
}

pub type ItemOrder = OrderedList<ItemOrderEntry>;

impl OrderedList<ItemOrderEntry> {
    /// Removes the entry for `(kind, index)` and shifts later siblings of the
    /// same kind down by one, mirroring a splice on the backing array.
    pub fn remove_item(&mut self, kind: ItemKind, index: usize) -> bool {
        let removed = self.remove(&ItemOrderEntry::new(kind, index)).is_some();
        for entry in self.entries.iter_mut() {
            if entry.kind == kind && entry.index > index {
                entry.index -= 1;
            }
        }
        removed
    }

    /// Next free index for `kind`
    pub fn next_index(&self, kind: ItemKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// True when every entry's index equals its rank among same-kind entries
    pub fn is_ranked(&self) -> bool {
        let mut counts = std::collections::HashMap::new();
        self.entries.iter().all(|e| {
            let count = counts.entry(e.kind).or_insert(0usize);
            let ok = e.index == *count;
            *count += 1;
            ok
        })
    }
}

// ============================================================================
// Action order (trigger sequences)
// ============================================================================

/// Kinds of action inside a trigger sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Label,
    Checkbox,
    Time,
    Location,
    Pdf,
    Dropdown,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Label => "label",
            ActionKind::Checkbox => "checkbox",
            ActionKind::Time => "time",
            ActionKind::Location => "location",
            ActionKind::Pdf => "pdf",
            ActionKind::Dropdown => "dropdown",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "label" => Ok(ActionKind::Label),
            "checkbox" => Ok(ActionKind::Checkbox),
            "time" => Ok(ActionKind::Time),
            "location" => Ok(ActionKind::Location),
            "pdf" => Ok(ActionKind::Pdf),
            "dropdown" => Ok(ActionKind::Dropdown),
            _ => Err(FormError::UnknownActionKind(s.to_string())),
        }
    }
}

/// Composite lookup key for trigger-sequence actions
pub fn action_key(kind: ActionKind, identifier: &str) -> String {
    format!("{}_{}", kind.as_str(), identifier)
}

/// One `{type, identifier}` record of a trigger sequence's action order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOrderEntry {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub identifier: String,
}

impl ActionOrderEntry {
    pub fn new(kind: ActionKind, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
        }
    }
}

impl OrderEntry for ActionOrderEntry {
    type Key = String;

    fn key(&self) -> Self::Key {
        action_key(self.kind, &self.identifier)
    }
}

pub type ActionOrder = OrderedList<ActionOrderEntry>;
