use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::FormError;
use crate::graph::FormGraph;

/// Current on-disk document version
pub const DOCUMENT_VERSION: u32 = 1;

/// A saved form: the diagram plus bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub graph: FormGraph,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

impl FormDocument {
    /// Creates an empty document
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            version: DOCUMENT_VERSION,
            created_at: now,
            modified_at: now,
            graph: FormGraph::new(),
        }
    }

    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

impl Default for FormDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Handles saving and loading form documents from disk with file locking
pub struct Storage {
    file_path: PathBuf,
    lock_file_path: PathBuf,
}

impl Storage {
    /// Creates a new Storage instance
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let mut lock_name = file_path.as_os_str().to_owned();
        lock_name.push(".lock");
        Self {
            file_path,
            lock_file_path: PathBuf::from(lock_name),
        }
    }

    /// Returns the path to the storage file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn exists(&self) -> bool {
        self.file_path.exists()
    }

    /// Acquire an exclusive lock on the file for writing
    /// Returns the lock file handle which must be held during the operation
    fn acquire_write_lock(&self) -> Result<File> {
        if let Some(parent) = self.lock_file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to create lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(&lock_file, |f| FileExt::try_lock_exclusive(f))?;
        Ok(lock_file)
    }

    /// Acquire a shared lock on the file for reading
    fn acquire_read_lock(&self) -> Result<Option<File>> {
        if !self.lock_file_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(&lock_file, |f| FileExt::try_lock_shared(f))?;
        Ok(Some(lock_file))
    }

    /// Retries `try_lock` for up to five seconds
    fn wait_for_lock<F>(&self, lock_file: &File, try_lock: F) -> Result<()>
    where
        F: Fn(&File) -> std::io::Result<()>,
    {
        let start = std::time::Instant::now();
        let timeout = Duration::from_secs(5);

        loop {
            match try_lock(lock_file) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > timeout {
                        return Err(FormError::Locked(self.file_path.display().to_string()).into());
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire lock on {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }

    /// Loads the document, creating an empty one if the file doesn't exist
    pub fn load(&self) -> Result<FormDocument> {
        if !self.file_path.exists() {
            debug!("Creating new form document at {:?}", self.file_path);
            let document = FormDocument::new();
            self.save(&document)?;
            return Ok(document);
        }

        let _lock = self.acquire_read_lock()?;

        let file = File::open(&self.file_path)
            .with_context(|| format!("Failed to open file: {:?}", self.file_path))?;
        let reader = BufReader::new(file);

        let document: FormDocument = serde_yaml::from_reader(reader)
            .with_context(|| format!("Failed to parse YAML from {:?}", self.file_path))?;

        Ok(document)
    }

    /// Saves the document with an exclusive lock held
    pub fn save(&self, document: &FormDocument) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut lock_file = self.acquire_write_lock()?;
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            Utc::now().to_rfc3339()
        );

        let yaml = serde_yaml::to_string(document)?;
        fs::write(&self.file_path, yaml)
            .with_context(|| format!("Failed to write {:?}", self.file_path))?;

        Ok(())
    }

    /// Reloads the document under an exclusive lock, applies `update_fn`,
    /// stamps `modified_at` and writes it back
    pub fn update_atomically<F, T>(&self, update_fn: F) -> Result<(FormDocument, T)>
    where
        F: FnOnce(&mut FormDocument) -> T,
    {
        if !self.file_path.exists() {
            self.save(&FormDocument::new())?;
        }

        let mut lock_file = self.acquire_write_lock()?;
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            Utc::now().to_rfc3339()
        );

        let file = File::open(&self.file_path)
            .with_context(|| format!("Failed to open file: {:?}", self.file_path))?;
        let reader = BufReader::new(file);
        let mut document: FormDocument = serde_yaml::from_reader(reader)
            .with_context(|| format!("Failed to parse YAML from {:?}", self.file_path))?;

        let output = update_fn(&mut document);
        document.touch();

        let yaml = serde_yaml::to_string(&document)?;
        fs::write(&self.file_path, yaml)
            .with_context(|| format!("Failed to write {:?}", self.file_path))?;

        Ok((document, output))
    }
}

/// Writes the document as pretty JSON
pub fn export_to_json(document: &FormDocument, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(document)?;
    fs::write(path, json).with_context(|| format!("Failed to write JSON to {:?}", path))?;
    Ok(())
}

/// Reads a document previously written by [`export_to_json`]
pub fn import_from_json(path: &Path) -> Result<FormDocument> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read JSON from {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON from {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::FormEditor;
    use crate::graph::{Cell, GraphModel};
    use crate::models::{EntryKind, Question, QuestionType};
    use crate::order::{ItemKind, ItemOrderEntry};
    use tempfile::TempDir;

    fn sample_document() -> FormDocument {
        let mut document = FormDocument::new();
        let mut cell = Cell::new("q", "Vehicles");
        cell.question = Some(Question::new(QuestionType::MultipleDropdownType, "Vehicles"));
        document.graph.add_cell(cell).unwrap();

        let mut editor = FormEditor::new(&mut document.graph);
        editor.add_textbox("q", "Make", EntryKind::Label);
        editor.add_time("q", "Purchased");
        editor.set_location("q");
        editor.add_textbox("q", "Model", EntryKind::Label);
        editor.reorder_items(
            "q",
            ItemOrderEntry::new(ItemKind::Option, 1),
            ItemOrderEntry::new(ItemKind::Option, 0),
        );
        document
    }

    #[test]
    fn test_load_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("nested").join("form.yaml"));

        assert!(!storage.exists());
        let document = storage.load().unwrap();
        assert!(storage.exists());
        assert!(document.graph.cells.is_empty());
        assert_eq!(document.version, DOCUMENT_VERSION);
    }

    #[test]
    fn test_yaml_round_trip_preserves_order() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("form.yaml"));
        let document = sample_document();

        storage.save(&document).unwrap();
        let loaded = storage.load().unwrap();

        assert_eq!(loaded, document);
        let before: Vec<_> = document.graph.question("q").unwrap().display_items().iter().map(|i| i.entry()).collect();
        let after: Vec<_> = loaded.graph.question("q").unwrap().display_items().iter().map(|i| i.entry()).collect();
        assert_eq!(before, after);
        assert_eq!(loaded.graph.question("q").unwrap().textboxes[0].placeholder, "Model");
    }

    #[test]
    fn test_update_atomically() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("form.yaml"));
        storage.save(&sample_document()).unwrap();

        let (document, applied) = storage
            .update_atomically(|doc| FormEditor::new(&mut doc.graph).add_time("q", "Sold"))
            .unwrap();
        assert!(applied);
        assert!(document.modified_at >= document.created_at);

        let reloaded = storage.load().unwrap();
        assert_eq!(reloaded.graph.question("q").unwrap().times.len(), 2);
        assert!(reloaded.graph.cell("q").is_some());
    }

    #[test]
    fn test_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("form.json");
        let document = sample_document();

        export_to_json(&document, &path).unwrap();
        let imported = import_from_json(&path).unwrap();
        assert_eq!(imported, document);
    }

    #[test]
    fn test_parse_error_has_context() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("form.yaml");
        fs::write(&path, "graph: [not, a, graph").unwrap();

        let err = Storage::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("Failed to parse YAML"));
    }
}
