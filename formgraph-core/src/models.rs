use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::FormError;
use crate::order::{ActionOrder, ItemOrder};

/// The kind of input a question node collects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionType {
    Text,
    Number,
    Currency,
    Date,
    DateRange,
    Email,
    Phone,
    BigParagraph,
    Checkbox,
    Dropdown,
    MultipleTextboxes,
    /// Numbered dropdown with conditional entries per number
    MultipleDropdownType,
    /// No type assigned yet
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl QuestionType {
    /// Get all assignable question types
    pub fn all() -> &'static [QuestionType] {
        &[
            QuestionType::Text,
            QuestionType::Number,
            QuestionType::Currency,
            QuestionType::Date,
            QuestionType::DateRange,
            QuestionType::Email,
            QuestionType::Phone,
            QuestionType::BigParagraph,
            QuestionType::Checkbox,
            QuestionType::Dropdown,
            QuestionType::MultipleTextboxes,
            QuestionType::MultipleDropdownType,
        ]
    }

    /// Persisted tag, also used as the style flag value
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Text => "text",
            QuestionType::Number => "number",
            QuestionType::Currency => "currency",
            QuestionType::Date => "date",
            QuestionType::DateRange => "dateRange",
            QuestionType::Email => "email",
            QuestionType::Phone => "phone",
            QuestionType::BigParagraph => "bigParagraph",
            QuestionType::Checkbox => "checkbox",
            QuestionType::Dropdown => "dropdown",
            QuestionType::MultipleTextboxes => "multipleTextboxes",
            QuestionType::MultipleDropdownType => "multipleDropdownType",
            QuestionType::Unset => "",
        }
    }

    /// Get display label for the question type
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::Text => "Text",
            QuestionType::Number => "Number",
            QuestionType::Currency => "Currency",
            QuestionType::Date => "Date",
            QuestionType::DateRange => "Date Range",
            QuestionType::Email => "Email",
            QuestionType::Phone => "Phone",
            QuestionType::BigParagraph => "Big Paragraph",
            QuestionType::Checkbox => "Checkbox",
            QuestionType::Dropdown => "Dropdown",
            QuestionType::MultipleTextboxes => "Multiple Textboxes",
            QuestionType::MultipleDropdownType => "Numbered Dropdown",
            QuestionType::Unset => "(unset)",
        }
    }

    /// Types whose payload is an interleaved item order
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            QuestionType::MultipleTextboxes | QuestionType::MultipleDropdownType
        )
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for QuestionType {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.is_empty() || wanted.eq_ignore_ascii_case("unset") {
            return Ok(QuestionType::Unset);
        }
        QuestionType::all()
            .iter()
            .copied()
            .find(|t| {
                t.as_str().eq_ignore_ascii_case(wanted)
                    || t.as_str().eq_ignore_ascii_case(&wanted.replace(['-', '_'], ""))
            })
            .ok_or_else(|| FormError::UnknownQuestionType(s.to_string()))
    }
}

/// How a textbox entry is rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Label,
    Amount,
    Phone,
}

impl FromStr for EntryKind {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "label" => Ok(EntryKind::Label),
            "amount" => Ok(EntryKind::Amount),
            "phone" => Ok(EntryKind::Phone),
            _ => Err(FormError::UnknownItemKind(s.to_string())),
        }
    }
}

/// Prefill applied when a given trigger option is selected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalPrefill {
    pub trigger_option: String,
    pub value: String,
}

/// A textbox entry (shown as an "option" in composite questions)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextboxEntry {
    #[serde(default)]
    pub name_id: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default, rename = "type")]
    pub entry_kind: EntryKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefill: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_prefills: Vec<ConditionalPrefill>,
}

impl TextboxEntry {
    pub fn new(placeholder: impl Into<String>, entry_kind: EntryKind) -> Self {
        Self {
            placeholder: placeholder.into(),
            entry_kind,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub id: String,
    pub text: String,
    pub value: String,
}

/// A dropdown with its options and per-option trigger sequences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dropdown {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: Vec<DropdownOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trigger_sequences: Vec<TriggerSequence>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionType {
    Single,
    #[default]
    Multiple,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Requiredness {
    Required,
    #[default]
    Optional,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckboxOption {
    pub checkbox_text: String,
    #[serde(default)]
    pub node_id: String,
}

/// A named group of checkboxes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckboxGroup {
    pub field_name: String,
    #[serde(default)]
    pub options: Vec<CheckboxOption>,
    #[serde(default)]
    pub selection_type: SelectionType,
    #[serde(default)]
    pub required: Requiredness,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalLogic {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub time_text: String,
    #[serde(default)]
    pub time_id: String,
    #[serde(default)]
    pub conditional_logic: ConditionalLogic,
}

/// Bounds of a numbered dropdown, as typed by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoNumbers {
    pub first: String,
    pub second: String,
}

impl Default for TwoNumbers {
    fn default() -> Self {
        Self {
            first: "1".to_string(),
            second: "1".to_string(),
        }
    }
}

impl TwoNumbers {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    /// The inclusive range of numbers offered by the dropdown.
    ///
    /// Reversed bounds are swapped; `None` when either bound is unparsable.
    pub fn range(&self) -> Option<RangeInclusive<i64>> {
        let first = self.first.trim().parse::<i64>().ok()?;
        let second = self.second.trim().parse::<i64>().ok()?;
        Some(first.min(second)..=first.max(second))
    }

    /// The part of the range usable as an entry number suffix.
    ///
    /// `Ok(None)` when the bounds are unparsable and any number goes.
    pub fn entry_range(&self) -> Result<Option<RangeInclusive<u32>>, FormError> {
        let Some(range) = self.range() else {
            return Ok(None);
        };
        let low = u32::try_from((*range.start()).max(0));
        let high = u32::try_from((*range.end()).min(i64::from(u32::MAX)));
        match (low, high) {
            (Ok(low), Ok(high)) if low <= high => Ok(Some(low..=high)),
            _ => Err(FormError::NoEntryNumbers(self.first.clone(), self.second.clone())),
        }
    }

    /// True when `n` lies in the range, or the range is unparsable
    pub fn accepts(&self, n: u32) -> bool {
        self.range().map_or(true, |range| range.contains(&i64::from(n)))
    }

    /// Validates an entry number picked for this dropdown
    pub fn check_entry_number(&self, n: u32) -> Result<u32, FormError> {
        self.entry_range()?;
        if self.accepts(n) {
            Ok(n)
        } else {
            Err(FormError::EntryNumberOutOfRange {
                number: n,
                first: self.first.clone(),
                second: self.second.clone(),
            })
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerLabel {
    pub field_name: String,
    #[serde(default)]
    pub node_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerLocation {
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerPdf {
    pub pdf_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pdf_file: String,
}

/// Actions revealed when a dropdown's `trigger_option` is selected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSequence {
    pub id: String,
    pub trigger_option: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<TriggerLabel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checkboxes: Vec<CheckboxGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub times: Vec<TimeEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<TriggerLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pdfs: Vec<TriggerPdf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropdowns: Vec<Dropdown>,
    #[serde(default, skip_serializing_if = "ActionOrder::is_empty")]
    pub action_order: ActionOrder,
}

impl TriggerSequence {
    pub fn new(id: impl Into<String>, trigger_option: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            trigger_option: trigger_option.into(),
            ..Default::default()
        }
    }
}

/// Question payload attached to a graph cell.
///
/// Only the group matching `question_type` is normally populated; absent
/// arrays deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub question_type: QuestionType,

    /// HTML-stripped question text
    #[serde(default)]
    pub question_text: String,

    /// Question-level field identifier
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub node_id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub textboxes: Vec<TextboxEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropdowns: Vec<Dropdown>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checkboxes: Vec<CheckboxGroup>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub times: Vec<TimeEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub two_numbers: Option<TwoNumbers>,

    /// Slot of the location marker within `item_order`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_index: Option<usize>,

    #[serde(default, skip_serializing_if = "ItemOrder::is_empty")]
    pub item_order: ItemOrder,
}

impl Question {
    /// Creates a question of the given type with that type's default payload
    pub fn new(question_type: QuestionType, question_text: impl Into<String>) -> Self {
        let mut question = Self {
            question_type,
            question_text: question_text.into(),
            ..Default::default()
        };
        question.reset_payload();
        question
    }

    /// Replaces the type-specific payload with the default shape for
    /// `question_type`. Text and node ID are left alone.
    pub fn reset_payload(&mut self) {
        self.textboxes.clear();
        self.dropdowns.clear();
        self.checkboxes.clear();
        self.times.clear();
        self.two_numbers = None;
        self.location_index = None;
        self.item_order.clear();

        match self.question_type {
            QuestionType::MultipleTextboxes => {
                self.textboxes.push(TextboxEntry::default());
            }
            QuestionType::MultipleDropdownType => {
                self.two_numbers = Some(TwoNumbers::default());
            }
            QuestionType::Dropdown => {
                self.dropdowns.push(Dropdown {
                    id: "dropdown_0".to_string(),
                    ..Default::default()
                });
            }
            QuestionType::Checkbox => {
                self.checkboxes.push(CheckboxGroup::default());
            }
            _ => {}
        }
    }
}
