use anyhow::Result;
use inquire::{CustomType, Select};

use formgraph_core::{NodeIdSlot, QuestionType};

/// Prompts the user for a question type
pub fn prompt_question_type() -> Result<QuestionType> {
    let options = QuestionType::all()
        .iter()
        .copied()
        .filter(|t| *t != QuestionType::Unset)
        .collect::<Vec<_>>();
    let question_type = Select::new("Question type:", options).prompt()?;
    Ok(question_type)
}

/// Prompts the user for which ID to copy
pub fn prompt_slot(slots: &[NodeIdSlot]) -> Result<NodeIdSlot> {
    let options = slots
        .iter()
        .map(|slot| format!("{}  {}", slot.path, slot.computed))
        .collect::<Vec<_>>();
    let chosen = Select::new("Field:", options).raw_prompt()?;
    Ok(slots[chosen.index].clone())
}

/// Prompts for the entry number appended to a numbered dropdown ID.
/// With `bounds`, the number must fall inside them.
pub fn prompt_entry_number(bounds: Option<(u32, u32)>) -> Result<u32> {
    let message = match bounds {
        Some((low, high)) => format!("Entry number ({}-{}):", low, high),
        None => "Entry number:".to_string(),
    };

    let number = CustomType::<u32>::new(&message)
        .with_error_message("Please enter a whole number")
        .with_validator(move |n: &u32| {
            Ok(match bounds {
                Some((low, high)) if !(low..=high).contains(n) => {
                    inquire::validator::Validation::Invalid(
                        format!("Choose a number between {} and {}", low, high).into(),
                    )
                }
                _ => inquire::validator::Validation::Valid,
            })
        })
        .prompt()?;
    Ok(number)
}
