mod cli;
mod prompts;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use log::{debug, warn};

use formgraph_core::storage::{export_to_json, import_from_json};
use formgraph_core::text::set_style_value;
use formgraph_core::{
    export_node_ids, find_pdf_for_question, get_config_path, heal_all, heal_cell,
    numbered_entry_id, plan_node_ids, sanitize_pdf_name, sanitize_with, ActionKind, ActionSpec,
    Cell, DisplayItem, EditorConfig, EditorHooks, EntryKind, ExportFormat, FormDocument,
    FormEditor, FormError, FormGraph, GraphModel, ItemKind, ItemOrderEntry, NodeIdContext,
    NodeIdSlot, PdfProperties, QuestionType, Requiredness, SelectionType, Storage, TriggerAction,
    TriggerPath, TwoNumbers,
};

use crate::cli::{Cli, Command, ConfigCommand, ItemCommand, TriggerCommand};

/// Logs the notifications a diagram UI would act on
struct CliHooks;

impl EditorHooks for CliHooks {
    fn request_autosave(&self) {
        debug!("Autosave requested");
    }

    fn refresh_all_cells(&self) {
        debug!("Refresh of all cells requested");
    }

    fn refresh_specific_cells(&self, cell_ids: &[String]) {
        debug!("Refresh requested for {:?}", cell_ids);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = get_config_path()?;
    let config = EditorConfig::load_or_default(&config_path)?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    let document_path = config.resolve_document_path(cli.file.as_deref());
    debug!("Using form document {:?}", document_path);
    let storage = Storage::new(&document_path);

    match &cli.command {
        Command::Init { force } => {
            if storage.exists() && !*force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    storage.path().display()
                );
            }
            storage.save(&FormDocument::new())?;
            println!("{} Created {}", "✓".green(), storage.path().display());
        }
        Command::AddQuestion { text, r#type, id } => {
            add_question(&storage, &config, text, r#type.as_deref(), id.as_deref())?;
        }
        Command::AddPdf {
            name,
            file,
            url,
            styled,
            id,
        } => {
            let mut cell = new_cell(id.as_deref(), name);
            if *styled {
                cell.style = set_style_value("", "nodeType", &config.pdf_node_marker);
            } else {
                cell.pdf = Some(PdfProperties {
                    pdf_name: Some(name.clone()),
                    pdf_file: file.clone(),
                    pdf_url: url.clone(),
                });
            }
            add_cell(&storage, cell, "PDF")?;
        }
        Command::AddOption { label, id } => {
            add_cell(&storage, new_cell(id.as_deref(), label), "Option")?;
        }
        Command::Connect { from, to } => {
            let (_, edge_id) =
                storage.update_atomically(|document| document.graph.add_edge(from, to))?;
            let edge_id = edge_id?;
            println!("{} Connected {} -> {} ({})", "✓".green(), from, to, edge_id);
        }
        Command::Remove { id } => {
            let (_, removed) =
                storage.update_atomically(|document| document.graph.remove_cell(id))?;
            if removed.is_none() {
                return Err(FormError::CellNotFound(id.clone()).into());
            }
            println!("{} Removed {}", "✓".green(), id);
        }
        Command::SetType { id, r#type } => {
            let question_type = match r#type {
                Some(name) => name.parse::<QuestionType>()?,
                None => prompts::prompt_question_type()?,
            };
            apply_edit(&storage, &config, &format!("{} is now {}", id, question_type), |editor| {
                editor.set_type(id, question_type)
            })?;
        }
        Command::SetText { id, text } => {
            apply_edit(&storage, &config, &format!("Updated text of {}", id), |editor| {
                editor.set_question_text(id, text)
            })?;
        }
        Command::SetRange { id, first, second } => {
            apply_edit(&storage, &config, &format!("Range of {} set", id), |editor| {
                editor.set_two_numbers(id, first, second)
            })?;
        }
        Command::Show { id } => {
            let document = load_document(&storage, &config)?;
            match id {
                Some(id) => show_cell(&document.graph, id)?,
                None => list_cells(&document.graph),
            }
        }
        Command::Pdf { id } => {
            let document = load_document(&storage, &config)?;
            if document.graph.cell(id).is_none() {
                return Err(FormError::CellNotFound(id.clone()).into());
            }
            match find_pdf_for_question(&document.graph, id) {
                Some(found) => {
                    println!("{}: {}", "PDF".cyan(), found.name);
                    println!("{}: {}", "Cell".cyan(), found.cell_id);
                    println!("{}: {}", "Distance".cyan(), found.distance);
                    println!("{}: {}", "Prefix".cyan(), sanitize_pdf_name(&found.name));
                }
                None => println!("{}", "No PDF associated".yellow()),
            }
        }
        Command::Ids { id } => {
            let document = load_document(&storage, &config)?;
            let slots = planned_slots(&document.graph, id)?;
            print_slots(&slots);
        }
        Command::Heal { id, dry_run } => {
            handle_heal(&storage, &config, id.as_deref(), *dry_run)?;
        }
        Command::Item(item_cmd) => {
            handle_item_command(item_cmd, &storage, &config)?;
        }
        Command::Trigger(trigger_cmd) => {
            handle_trigger_command(trigger_cmd, &storage, &config)?;
        }
        Command::CopyId { id, slot, number } => {
            copy_id(&storage, &config, id, slot.as_deref(), *number)?;
        }
        Command::Export {
            output,
            format,
            document,
        } => {
            let loaded = load_document(&storage, &config)?;
            if *document {
                export_to_json(&loaded, output)?;
                println!("{} Exported document to {}", "✓".green(), output.display());
            } else {
                let format = match format {
                    Some(name) => name.parse::<ExportFormat>()?,
                    None => ExportFormat::from_path(output),
                };
                let count = export_node_ids(&loaded.graph, output, format)?;
                println!(
                    "{} Exported {} IDs to {}",
                    "✓".green(),
                    count,
                    output.display()
                );
            }
        }
        Command::Import { input } => {
            let document = import_from_json(input)?;
            storage.save(&document)?;
            println!(
                "{} Imported {} cells into {}",
                "✓".green(),
                document.graph.cells.len(),
                storage.path().display()
            );
        }
        Command::Sanitize {
            text,
            no_slashes,
            pdf,
        } => {
            if *pdf {
                println!("{}", sanitize_pdf_name(text));
            } else {
                println!("{}", sanitize_with(text, config.preserve_slashes && !*no_slashes));
            }
        }
        Command::Config(config_cmd) => {
            handle_config_command(config_cmd, &config, &config_path)?;
        }
    }

    Ok(())
}

fn new_cell(id: Option<&str>, value: &str) -> Cell {
    match id {
        Some(id) => Cell::new(id, value),
        None => Cell::with_new_id(value),
    }
}

fn load_document(storage: &Storage, config: &EditorConfig) -> Result<FormDocument> {
    let mut document = storage.load()?;
    document.graph.set_pdf_marker(config.pdf_node_marker.clone());
    Ok(document)
}

/// Applies an editor operation under the document lock; fails when the
/// operation changed nothing
fn apply_edit<F>(storage: &Storage, config: &EditorConfig, message: &str, edit: F) -> Result<()>
where
    F: FnOnce(&mut FormEditor<'_, CliHooks>) -> bool,
{
    let marker = config.pdf_node_marker.clone();
    let (_, applied) = storage.update_atomically(|document| {
        document.graph.set_pdf_marker(marker);
        let mut editor = FormEditor::with_hooks(&mut document.graph, CliHooks);
        edit(&mut editor)
    })?;

    if !applied {
        bail!("Nothing changed; check the cell ID and indices");
    }
    println!("{} {}", "✓".green(), message);
    Ok(())
}

fn add_cell(storage: &Storage, cell: Cell, what: &str) -> Result<()> {
    let id = cell.id.clone();
    let (_, added) = storage.update_atomically(|document| document.graph.add_cell(cell))?;
    added?;
    println!("{} {} cell added: {}", "✓".green(), what, id.yellow());
    Ok(())
}

fn add_question(
    storage: &Storage,
    config: &EditorConfig,
    text: &str,
    type_name: Option<&str>,
    id: Option<&str>,
) -> Result<()> {
    let question_type = match type_name {
        Some(name) => name.parse::<QuestionType>()?,
        None => prompts::prompt_question_type()?,
    };
    let cell = new_cell(id, text);
    let cell_id = cell.id.clone();
    let marker = config.pdf_node_marker.clone();

    let (_, added) = storage.update_atomically(|document| -> Result<Vec<NodeIdSlot>> {
        document.graph.set_pdf_marker(marker);
        document.graph.add_cell(cell)?;
        let mut editor = FormEditor::with_hooks(&mut document.graph, CliHooks);
        editor.set_type(&cell_id, question_type);
        Ok(editor.reset_node_ids(&cell_id))
    })?;
    let slots = added?;

    println!(
        "{} {} question added: {}",
        "✓".green(),
        question_type,
        cell_id.yellow()
    );
    for slot in &slots {
        println!("  {}: {}", slot.path.cyan(), slot.computed);
    }
    Ok(())
}

fn list_cells(graph: &FormGraph) {
    if graph.cells.is_empty() {
        println!("{}", "No cells".yellow());
        return;
    }

    println!("{}", "Cells:".blue().bold());
    for cell in &graph.cells {
        let kind = if graph.carries_pdf(cell) {
            "PDF".to_string()
        } else if cell.question.is_some() {
            cell.question_type().to_string()
        } else {
            "Option".to_string()
        };
        println!("  {} [{}] {}", cell.id.yellow(), kind.cyan(), cell.label());
    }
    println!("\n{} edges", graph.edges.len());
}

fn show_cell(graph: &FormGraph, id: &str) -> Result<()> {
    let cell = graph
        .cell(id)
        .ok_or_else(|| FormError::CellNotFound(id.to_string()))?;

    println!("{}: {}", "ID".cyan(), cell.id);
    println!("{}: {}", "Label".cyan(), cell.label());
    if !cell.style.is_empty() {
        println!("{}: {}", "Style".cyan(), cell.style);
    }
    if let Some(pdf) = &cell.pdf {
        if let Some(name) = pdf.display_name() {
            println!("{}: {}", "PDF".cyan(), name);
        }
    }

    let Some(question) = &cell.question else {
        return Ok(());
    };
    println!("{}: {}", "Type".cyan(), question.question_type);
    println!("{}: {}", "Question".cyan(), cell.question_text());
    if !question.node_id.is_empty() {
        println!("{}: {}", "Node ID".cyan(), question.node_id);
    }
    if let Some(numbers) = &question.two_numbers {
        println!("{}: {} - {}", "Range".cyan(), numbers.first, numbers.second);
    }

    let items = question.display_items();
    if !items.is_empty() {
        println!("\n{}", "Items:".blue());
        print_items(&items);
    }
    Ok(())
}

fn print_items(items: &[DisplayItem<'_>]) {
    for item in items {
        let detail = match item {
            DisplayItem::Option(_, textbox) => format!("{} ({})", textbox.placeholder, textbox.name_id),
            DisplayItem::Checkbox(_, group) => format!(
                "{} [{}]",
                group.field_name,
                group
                    .options
                    .iter()
                    .map(|o| o.checkbox_text.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            DisplayItem::Time(_, time) => format!("{} ({})", time.time_text, time.time_id),
            DisplayItem::Dropdown(_, dropdown) => format!(
                "{} [{}] ({} trigger sequences)",
                dropdown.name,
                dropdown
                    .options
                    .iter()
                    .map(|o| o.text.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                dropdown.trigger_sequences.len()
            ),
            DisplayItem::Location => "Location".to_string(),
        };
        println!("  {} {}", item.entry().to_string().yellow(), detail);
    }
}

fn planned_slots(graph: &FormGraph, id: &str) -> Result<Vec<NodeIdSlot>> {
    let ctx = NodeIdContext::for_cell(graph, id)
        .ok_or_else(|| FormError::CellNotFound(id.to_string()))?;
    let question = graph
        .question(id)
        .ok_or_else(|| FormError::NotAQuestion(id.to_string()))?;
    Ok(plan_node_ids(question, &ctx))
}

fn print_slots(slots: &[NodeIdSlot]) {
    if slots.is_empty() {
        println!("{}", "No IDs".yellow());
        return;
    }
    for slot in slots {
        if slot.is_stale() {
            println!(
                "  {}: {} {} {}",
                slot.path.cyan(),
                slot.stored.red(),
                "->".dimmed(),
                slot.computed.green()
            );
        } else {
            println!("  {}: {}", slot.path.cyan(), slot.computed);
        }
    }
}

fn handle_heal(storage: &Storage, config: &EditorConfig, id: Option<&str>, dry_run: bool) -> Result<()> {
    let marker = config.pdf_node_marker.clone();
    let heal = |graph: &mut FormGraph| -> Vec<(String, NodeIdSlot)> {
        graph.set_pdf_marker(marker.as_str());
        match id {
            Some(id) => heal_cell(graph, id, dry_run)
                .into_iter()
                .map(|slot| (id.to_string(), slot))
                .collect(),
            None => heal_all(graph, dry_run),
        }
    };

    let healed = if dry_run {
        let mut document = storage.load()?;
        heal(&mut document.graph)
    } else {
        storage.update_atomically(|document| heal(&mut document.graph))?.1
    };

    if healed.is_empty() {
        println!("{} All IDs are current", "✓".green());
        return Ok(());
    }

    let verb = if dry_run { "Stale" } else { "Healed" };
    println!("{} {} IDs:", verb.blue().bold(), healed.len());
    for (cell_id, slot) in &healed {
        println!(
            "  {} {}: {} {} {}",
            cell_id.yellow(),
            slot.path.cyan(),
            slot.stored.red(),
            "->".dimmed(),
            slot.computed.green()
        );
    }
    Ok(())
}

fn handle_item_command(cmd: &ItemCommand, storage: &Storage, config: &EditorConfig) -> Result<()> {
    match cmd {
        ItemCommand::Add {
            id,
            kind,
            label,
            entry_type,
            single,
            required,
        } => {
            let kind = kind.parse::<ItemKind>()?;
            let entry_kind = entry_type.parse::<EntryKind>()?;
            let selection = if *single {
                SelectionType::Single
            } else {
                SelectionType::Multiple
            };
            let requiredness = if *required {
                Requiredness::Required
            } else {
                Requiredness::Optional
            };
            apply_edit(storage, config, &format!("Added {} '{}' to {}", kind, label, id), |editor| {
                match kind {
                    ItemKind::Option => editor.add_textbox(id, label, entry_kind),
                    ItemKind::Checkbox => editor.add_checkbox_group(id, label, selection, requiredness),
                    ItemKind::Time => editor.add_time(id, label),
                    ItemKind::Dropdown => editor.add_dropdown(id, label),
                    ItemKind::Location => editor.set_location(id),
                }
            })?;
        }
        ItemCommand::Rename { id, index, label } => {
            apply_edit(storage, config, &format!("Renamed option {} to '{}'", index, label), |editor| {
                editor.set_textbox_label(id, *index, label)
            })?;
        }
        ItemCommand::CheckboxOption { id, group, text } => {
            apply_edit(storage, config, &format!("Added choice '{}'", text), |editor| {
                editor.add_checkbox_option(id, *group, text)
            })?;
        }
        ItemCommand::DropdownOption { id, dropdown, text } => {
            apply_edit(storage, config, &format!("Added choice '{}'", text), |editor| {
                editor.add_dropdown_option(id, *dropdown, text)
            })?;
        }
        ItemCommand::Remove { id, item } => {
            let entry = item.parse::<ItemOrderEntry>()?;
            apply_edit(storage, config, &format!("Removed {}", entry), |editor| {
                editor.remove_item(id, entry)
            })?;
        }
        ItemCommand::Move { id, item, target } => {
            let dragged = item.parse::<ItemOrderEntry>()?;
            let target = target.parse::<ItemOrderEntry>()?;
            apply_edit(storage, config, &format!("Moved {} to {}", dragged, target), |editor| {
                editor.reorder_items(id, dragged, target)
            })?;
        }
        ItemCommand::Location { id, remove } => {
            if *remove {
                apply_edit(storage, config, "Removed location", |editor| editor.remove_location(id))?;
            } else {
                apply_edit(storage, config, "Added location", |editor| editor.set_location(id))?;
            }
        }
        ItemCommand::List { id } => {
            let document = load_document(storage, config)?;
            let question = document
                .graph
                .question(id)
                .ok_or_else(|| FormError::NotAQuestion(id.clone()))?;
            let items = question.display_items();
            if items.is_empty() {
                println!("{}", "No items".yellow());
            } else {
                print_items(&items);
            }
        }
    }

    Ok(())
}

/// Parses `kind:identifier`
fn parse_action_ref(text: &str) -> Result<(ActionKind, String)> {
    let (kind, identifier) = text
        .split_once(':')
        .with_context(|| format!("Invalid action '{}' (expected kind:identifier)", text))?;
    Ok((kind.trim().parse::<ActionKind>()?, identifier.to_string()))
}

fn handle_trigger_command(cmd: &TriggerCommand, storage: &Storage, config: &EditorConfig) -> Result<()> {
    match cmd {
        TriggerCommand::Add { id, dropdown, option } => {
            apply_edit(storage, config, &format!("Added trigger sequence for '{}'", option), |editor| {
                editor.add_trigger_sequence(id, *dropdown, option)
            })?;
        }
        TriggerCommand::Action {
            id,
            dropdown,
            sequence,
            kind,
            identifier,
            remove,
        } => {
            let kind = kind.parse::<ActionKind>()?;
            let path = TriggerPath::new(*dropdown, *sequence);
            if *remove {
                apply_edit(storage, config, &format!("Removed {} '{}'", kind, identifier), |editor| {
                    editor.remove_trigger_action(id, path, kind, identifier)
                })?;
            } else {
                let spec = ActionSpec {
                    kind,
                    identifier: identifier.clone(),
                };
                apply_edit(storage, config, &format!("Added {} '{}'", kind, identifier), |editor| {
                    editor.add_trigger_action(id, path, spec)
                })?;
            }
        }
        TriggerCommand::Move {
            id,
            dropdown,
            sequence,
            action,
            target,
        } => {
            let (dragged_kind, dragged) = parse_action_ref(action)?;
            let (target_kind, target_id) = parse_action_ref(target)?;
            let path = TriggerPath::new(*dropdown, *sequence);
            apply_edit(storage, config, &format!("Moved {} to {}", action, target), |editor| {
                editor.reorder_trigger_actions(
                    id,
                    path,
                    (dragged_kind, &dragged),
                    (target_kind, &target_id),
                )
            })?;
        }
        TriggerCommand::List {
            id,
            dropdown,
            sequence,
        } => {
            let document = load_document(storage, config)?;
            let question = document
                .graph
                .question(id)
                .ok_or_else(|| FormError::NotAQuestion(id.clone()))?;
            let sequence = question
                .dropdowns
                .get(*dropdown)
                .and_then(|d| d.trigger_sequences.get(*sequence))
                .context("Trigger sequence not found")?;

            println!("{} '{}'", "Trigger".blue().bold(), sequence.trigger_option);
            for action in sequence.ordered_actions() {
                let node_id = match action {
                    TriggerAction::Label(label) => label.node_id.as_str(),
                    TriggerAction::Time(time) => time.time_id.as_str(),
                    _ => "",
                };
                println!(
                    "  {} {} {}",
                    action.kind().to_string().yellow(),
                    action.identifier(),
                    node_id.dimmed()
                );
            }
        }
    }

    Ok(())
}

/// Entry number for a numbered dropdown ID, from `--number` or a prompt.
/// Either way it has to fall inside the dropdown's range.
fn entry_number(numbers: Option<&TwoNumbers>, flag: Option<u32>) -> Result<u32> {
    let Some(numbers) = numbers else {
        return match flag {
            Some(n) => Ok(n),
            None => prompts::prompt_entry_number(None),
        };
    };
    let bounds = numbers
        .entry_range()?
        .map(|range| (*range.start(), *range.end()));
    let n = match flag {
        Some(n) => n,
        None => prompts::prompt_entry_number(bounds)?,
    };
    Ok(numbers.check_entry_number(n)?)
}

fn copy_id(
    storage: &Storage,
    config: &EditorConfig,
    id: &str,
    slot: Option<&str>,
    number: Option<u32>,
) -> Result<()> {
    let document = load_document(storage, config)?;
    let slots = planned_slots(&document.graph, id)?;
    if slots.is_empty() {
        bail!("{} has no IDs to copy", id);
    }

    let chosen = match slot {
        Some(path) => slots
            .iter()
            .find(|s| s.path == path)
            .cloned()
            .with_context(|| format!("No slot '{}' on {}", path, id))?,
        None if slots.len() == 1 => slots[0].clone(),
        None => prompts::prompt_slot(&slots)?,
    };

    let mut node_id = chosen.computed;
    if let Some(question) = document.graph.question(id) {
        if question.question_type == QuestionType::MultipleDropdownType {
            let n = entry_number(question.two_numbers.as_ref(), number)?;
            node_id = numbered_entry_id(&node_id, n);
        }
    }

    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(node_id.clone())) {
        Ok(()) => println!("{} Copied {}", "✓".green(), node_id.yellow()),
        Err(e) => {
            warn!("Clipboard unavailable: {}", e);
            println!("{}", node_id);
        }
    }
    Ok(())
}

fn handle_config_command(
    cmd: &ConfigCommand,
    config: &EditorConfig,
    config_path: &std::path::Path,
) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            println!("{}", "Configuration:".blue().bold());
            println!();
            println!("{}: {}", "File".cyan(), config_path.display());
            println!("{}: {}", "Default document".cyan(), config.default_document);
            println!("{}: {}", "Preserve slashes".cyan(), config.preserve_slashes);
            println!("{}: {}", "PDF node marker".cyan(), config.pdf_node_marker);
            println!("{}: {}", "Log level".cyan(), config.log_level);
        }
        ConfigCommand::Init => {
            if config_path.exists() {
                println!("{} already exists", config_path.display());
            } else {
                EditorConfig::create_default(config_path)?;
                println!("{} Created {}", "✓".green(), config_path.display());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_ref() {
        let (kind, identifier) = parse_action_ref("time:Date Sold").unwrap();
        assert_eq!(kind, ActionKind::Time);
        assert_eq!(identifier, "Date Sold");

        assert!(parse_action_ref("label").is_err());
        assert!(parse_action_ref("bogus:x").is_err());
    }

    #[test]
    fn test_new_cell_uses_given_id() {
        assert_eq!(new_cell(Some("q1"), "Name").id, "q1");
        assert!(!new_cell(None, "Name").id.is_empty());
    }

    #[test]
    fn test_entry_number_flag_is_range_checked() {
        let numbers = TwoNumbers::new("1", "3");
        assert_eq!(entry_number(Some(&numbers), Some(3)).unwrap(), 3);
        assert!(entry_number(Some(&numbers), Some(99)).is_err());
        assert!(entry_number(Some(&numbers), Some(0)).is_err());

        let negative = TwoNumbers::new("-3", "-1");
        assert!(entry_number(Some(&negative), Some(1)).is_err());

        let huge = TwoNumbers::new("0", &i64::MAX.to_string());
        assert_eq!(entry_number(Some(&huge), Some(u32::MAX)).unwrap(), u32::MAX);

        assert_eq!(entry_number(None, Some(7)).unwrap(), 7);
        assert_eq!(entry_number(Some(&TwoNumbers::new("a", "b")), Some(7)).unwrap(), 7);
    }

    #[test]
    fn test_numbered_id_uses_checked_number() {
        let numbers = TwoNumbers::new("3", "1");
        let n = entry_number(Some(&numbers), Some(2)).unwrap();
        assert_eq!(numbered_entry_id("vehicle_make", n), "vehicle_make_2");
    }
}
