use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Edit question-flow diagrams and their form field IDs")]
pub struct Cli {
    /// Path to the form document (defaults to $FORMGRAPH_DOCUMENT, then the config)
    #[clap(long, short = 'f')]
    pub file: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty form document
    Init {
        /// Overwrite an existing document
        #[clap(long)]
        force: bool,
    },

    /// Add a question cell
    AddQuestion {
        /// Question text
        text: String,

        /// Question type (checkbox, dropdown, text, date, multipleTextboxes, ...); prompts when omitted
        #[clap(long)]
        r#type: Option<String>,

        /// Cell ID (generated when omitted)
        #[clap(long)]
        id: Option<String>,
    },

    /// Add a PDF cell
    AddPdf {
        /// PDF name, e.g. Intake.pdf
        name: String,

        /// PDF file path
        #[clap(long)]
        file: Option<String>,

        /// PDF URL
        #[clap(long)]
        url: Option<String>,

        /// Mark the cell with the PDF node style instead of PDF properties
        #[clap(long)]
        styled: bool,

        /// Cell ID (generated when omitted)
        #[clap(long)]
        id: Option<String>,
    },

    /// Add an option cell (numbered dropdown options are plain numbers)
    AddOption {
        /// Option label
        label: String,

        /// Cell ID (generated when omitted)
        #[clap(long)]
        id: Option<String>,
    },

    /// Connect two cells with an edge
    Connect {
        /// Source cell ID
        from: String,

        /// Target cell ID
        to: String,
    },

    /// Remove a cell and its edges
    Remove {
        /// Cell ID
        id: String,
    },

    /// Switch the type of a question (IDs are kept)
    SetType {
        /// Cell ID
        id: String,

        /// New question type; prompts when omitted
        r#type: Option<String>,
    },

    /// Change the text of a question and re-derive its IDs
    SetText {
        /// Cell ID
        id: String,

        /// New question text
        text: String,
    },

    /// Set the number range of a numbered dropdown
    SetRange {
        /// Cell ID
        id: String,

        /// First number
        first: String,

        /// Second number
        second: String,
    },

    /// Show one cell, or list all cells
    Show {
        /// Cell ID
        id: Option<String>,
    },

    /// Show the PDF associated with a question
    Pdf {
        /// Cell ID
        id: String,
    },

    /// List the stored and computed IDs of a question
    Ids {
        /// Cell ID
        id: String,
    },

    /// Overwrite stale stored IDs with their computed values
    Heal {
        /// Only heal this cell
        id: Option<String>,

        /// Report stale IDs without writing
        #[clap(long)]
        dry_run: bool,
    },

    /// Manage the items of a composite question
    #[clap(subcommand)]
    Item(ItemCommand),

    /// Manage dropdown trigger sequences
    #[clap(subcommand)]
    Trigger(TriggerCommand),

    /// Copy a field ID to the clipboard
    CopyId {
        /// Cell ID
        id: String,

        /// Slot to copy, e.g. textboxes[0] (prompts when omitted)
        #[clap(long)]
        slot: Option<String>,

        /// Numeric suffix for numbered dropdowns (prompts when omitted)
        #[clap(long)]
        number: Option<u32>,
    },

    /// Export computed IDs, or the whole document as JSON
    Export {
        /// Output file
        output: PathBuf,

        /// Format: json, yaml or md (guessed from the extension when omitted)
        #[clap(long)]
        format: Option<String>,

        /// Export the whole document instead of the ID table
        #[clap(long)]
        document: bool,
    },

    /// Replace the document with one exported as JSON
    Import {
        /// JSON file written by `export --document`
        input: PathBuf,
    },

    /// Print the sanitized form of a text
    Sanitize {
        /// Text to sanitize
        text: String,

        /// Strip slashes too
        #[clap(long)]
        no_slashes: bool,

        /// Sanitize as a PDF file name
        #[clap(long)]
        pdf: bool,
    },

    /// Manage the editor configuration
    #[clap(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    /// Add an item to a question
    Add {
        /// Cell ID
        id: String,

        /// Item kind: option, checkbox, time or dropdown
        kind: String,

        /// Label, field name or dropdown name
        label: String,

        /// Entry type for options: label, amount or phone
        #[clap(long, default_value = "label")]
        entry_type: String,

        /// Checkbox groups allow a single selection
        #[clap(long)]
        single: bool,

        /// Checkbox groups are required
        #[clap(long)]
        required: bool,
    },

    /// Rename a textbox option and regenerate its ID
    Rename {
        /// Cell ID
        id: String,

        /// Option index
        index: usize,

        /// New label
        label: String,
    },

    /// Add a choice to a checkbox group
    CheckboxOption {
        /// Cell ID
        id: String,

        /// Checkbox group index
        group: usize,

        /// Choice text
        text: String,
    },

    /// Add a choice to a dropdown
    DropdownOption {
        /// Cell ID
        id: String,

        /// Dropdown index
        dropdown: usize,

        /// Choice text
        text: String,
    },

    /// Remove an item, e.g. option:1 or location
    Remove {
        /// Cell ID
        id: String,

        /// Item reference (kind:index)
        item: String,
    },

    /// Move an item onto the position of another, e.g. time:0 option:0
    Move {
        /// Cell ID
        id: String,

        /// Item to move (kind:index)
        item: String,

        /// Item whose position it takes (kind:index)
        target: String,
    },

    /// Add or remove the location block
    Location {
        /// Cell ID
        id: String,

        /// Remove the location block
        #[clap(long)]
        remove: bool,
    },

    /// List items in display order
    List {
        /// Cell ID
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TriggerCommand {
    /// Add a trigger sequence to a dropdown
    Add {
        /// Cell ID
        id: String,

        /// Dropdown index
        dropdown: usize,

        /// Dropdown option that fires the sequence
        option: String,
    },

    /// Add or remove an action of a trigger sequence
    Action {
        /// Cell ID
        id: String,

        /// Dropdown index
        dropdown: usize,

        /// Trigger sequence index
        sequence: usize,

        /// Action kind: label, checkbox, time, location, pdf or dropdown
        kind: String,

        /// Field name, title or PDF name of the action
        identifier: String,

        /// Remove the action instead of adding it
        #[clap(long)]
        remove: bool,
    },

    /// Move an action onto the position of another, e.g. time:Sold label:Model
    Move {
        /// Cell ID
        id: String,

        /// Dropdown index
        dropdown: usize,

        /// Trigger sequence index
        sequence: usize,

        /// Action to move (kind:identifier)
        action: String,

        /// Action whose position it takes (kind:identifier)
        target: String,
    },

    /// List the actions of a trigger sequence in display order
    List {
        /// Cell ID
        id: String,

        /// Dropdown index
        dropdown: usize,

        /// Trigger sequence index
        sequence: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the current configuration
    Show,

    /// Write a default config file if none exists
    Init,
}
