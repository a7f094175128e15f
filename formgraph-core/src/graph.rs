//! Graph collaborator
//!
//! The editor only needs a handful of queries from the diagram model: cell
//! lookup, incident edges in edge-array order and the PDF-node predicate.
//! [`GraphModel`] captures those; [`FormGraph`] is the serializable
//! in-memory model used by storage and the CLI.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FormError;
use crate::models::{Question, QuestionType};
use crate::text::{strip_html, style_value};

/// Style marker identifying PDF nodes unless configured otherwise
pub const DEFAULT_PDF_NODE_MARKER: &str = "pdfNode";

/// PDF association carried directly by a cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
}

impl PdfProperties {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            pdf_name: Some(name.into()),
            ..Default::default()
        }
    }

    /// True when any of the three properties is non-empty
    pub fn is_present(&self) -> bool {
        [&self.pdf_name, &self.pdf_file, &self.pdf_url]
            .iter()
            .any(|p| p.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }

    /// Name to use for the association: the explicit name, else the last
    /// path segment of the file, else of the URL.
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = self.pdf_name.as_deref().filter(|s| !s.trim().is_empty()) {
            return Some(name.trim().to_string());
        }
        [&self.pdf_file, &self.pdf_url]
            .iter()
            .filter_map(|p| p.as_deref())
            .map(|p| p.trim_end_matches('/'))
            .filter_map(|p| p.rsplit(['/', '\\']).next())
            .map(|segment| segment.split(['?', '#']).next().unwrap_or(segment))
            .find(|segment| !segment.trim().is_empty())
            .map(str::to_string)
    }
}

/// A vertex of the diagram
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: String,

    /// Display label, possibly containing HTML
    #[serde(default)]
    pub value: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub style: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<Question>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<PdfProperties>,
}

impl Cell {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Creates a cell with a fresh UUID
    pub fn with_new_id(value: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string(), value)
    }

    pub fn question_type(&self) -> QuestionType {
        self.question
            .as_ref()
            .map(|q| q.question_type)
            .unwrap_or_default()
    }

    /// Plain-text label
    pub fn label(&self) -> String {
        strip_html(&self.value)
    }

    /// Question text, falling back to the label when none is stored
    pub fn question_text(&self) -> String {
        match &self.question {
            Some(q) if !q.question_text.trim().is_empty() => q.question_text.clone(),
            _ => self.label(),
        }
    }

    pub fn has_pdf_properties(&self) -> bool {
        self.pdf.as_ref().is_some_and(PdfProperties::is_present)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// Read access to the diagram model
pub trait GraphModel {
    fn cell(&self, id: &str) -> Option<&Cell>;

    /// Edges whose source is `id`, in edge-array order
    fn outgoing_edges(&self, id: &str) -> Vec<&Edge>;

    /// Edges whose target is `id`, in edge-array order
    fn incoming_edges(&self, id: &str) -> Vec<&Edge>;

    fn pdf_node_marker(&self) -> &str {
        DEFAULT_PDF_NODE_MARKER
    }

    /// True when the cell is styled as a PDF node (`nodeType=<marker>` or
    /// a bare `<marker>` flag)
    fn is_pdf_node(&self, cell: &Cell) -> bool {
        let marker = self.pdf_node_marker();
        style_value(&cell.style, "nodeType") == Some(marker)
            || style_value(&cell.style, marker).is_some()
    }

    /// True when the cell carries PDF properties or is a PDF node
    fn carries_pdf(&self, cell: &Cell) -> bool {
        cell.has_pdf_properties() || self.is_pdf_node(cell)
    }
}

/// In-memory diagram: ordered cells and edges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormGraph {
    #[serde(default)]
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(skip)]
    pdf_marker: Option<String>,
    #[serde(skip)]
    update_depth: usize,
}

impl FormGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the PDF node style marker
    pub fn set_pdf_marker(&mut self, marker: impl Into<String>) {
        self.pdf_marker = Some(marker.into());
    }

    pub fn cell_mut(&mut self, id: &str) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| c.id == id)
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.cell(id).and_then(|c| c.question.as_ref())
    }

    pub fn question_mut(&mut self, id: &str) -> Option<&mut Question> {
        self.cell_mut(id).and_then(|c| c.question.as_mut())
    }

    /// Ids of every cell carrying a question payload
    pub fn question_ids(&self) -> Vec<String> {
        self.cells
            .iter()
            .filter(|c| c.question.is_some())
            .map(|c| c.id.clone())
            .collect()
    }

    /// Adds a cell, rejecting duplicate ids
    pub fn add_cell(&mut self, cell: Cell) -> Result<(), FormError> {
        if self.cell(&cell.id).is_some() {
            return Err(FormError::DuplicateCell(cell.id));
        }
        self.cells.push(cell);
        Ok(())
    }

    /// Connects two existing cells and returns the new edge id
    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<String, FormError> {
        for id in [source, target] {
            if self.cell(id).is_none() {
                return Err(FormError::CellNotFound(id.to_string()));
            }
        }
        if source == target {
            return Err(FormError::SelfLoop(source.to_string()));
        }

        let id = Uuid::new_v4().to_string();
        self.edges.push(Edge {
            id: id.clone(),
            source: source.to_string(),
            target: target.to_string(),
        });
        Ok(id)
    }

    /// Removes a cell and every edge touching it
    pub fn remove_cell(&mut self, id: &str) -> Option<Cell> {
        let pos = self.cells.iter().position(|c| c.id == id)?;
        self.edges.retain(|e| e.source != id && e.target != id);
        Some(self.cells.remove(pos))
    }

    /// Opens an update batch
    pub fn begin_update(&mut self) {
        self.update_depth += 1;
    }

    /// Closes an update batch; returns true when the outermost batch ends
    pub fn end_update(&mut self) -> bool {
        self.update_depth = self.update_depth.saturating_sub(1);
        self.update_depth == 0
    }
}

impl GraphModel for FormGraph {
    fn cell(&self, id: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == id)
    }

    fn outgoing_edges(&self, id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.source == id).collect()
    }

    fn incoming_edges(&self, id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.target == id).collect()
    }

    fn pdf_node_marker(&self) -> &str {
        self.pdf_marker.as_deref().unwrap_or(DEFAULT_PDF_NODE_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_edge_validates_endpoints() {
        let mut graph = FormGraph::new();
        graph.add_cell(Cell::new("a", "A")).unwrap();
        graph.add_cell(Cell::new("b", "B")).unwrap();

        assert!(graph.add_edge("a", "b").is_ok());
        assert!(matches!(graph.add_edge("a", "zz"), Err(FormError::CellNotFound(_))));
        assert!(matches!(graph.add_edge("a", "a"), Err(FormError::SelfLoop(_))));
        assert!(matches!(
            graph.add_cell(Cell::new("a", "again")),
            Err(FormError::DuplicateCell(_))
        ));
    }

    #[test]
    fn test_edges_in_array_order() {
        let mut graph = FormGraph::new();
        for id in ["q", "x", "y", "z"] {
            graph.add_cell(Cell::new(id, id)).unwrap();
        }
        graph.add_edge("q", "y").unwrap();
        graph.add_edge("z", "q").unwrap();
        graph.add_edge("q", "x").unwrap();

        let targets: Vec<&str> = graph.outgoing_edges("q").iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["y", "x"]);
        let sources: Vec<&str> = graph.incoming_edges("q").iter().map(|e| e.source.as_str()).collect();
        assert_eq!(sources, vec!["z"]);
    }

    #[test]
    fn test_remove_cell_drops_incident_edges() {
        let mut graph = FormGraph::new();
        for id in ["a", "b", "c"] {
            graph.add_cell(Cell::new(id, id)).unwrap();
        }
        graph.add_edge("a", "b").unwrap();
        graph.add_edge("b", "c").unwrap();
        graph.add_edge("a", "c").unwrap();

        assert!(graph.remove_cell("b").is_some());
        assert_eq!(graph.edges.len(), 1);
        assert!(graph.remove_cell("b").is_none());
    }

    #[test]
    fn test_pdf_node_predicate() {
        let mut graph = FormGraph::new();
        let mut styled = Cell::new("p1", "Intake");
        styled.style = "rounded=1;nodeType=pdfNode;".into();
        let mut flagged = Cell::new("p2", "Other");
        flagged.style = "pdfNode;".into();
        let plain = Cell::new("q", "Question");

        assert!(graph.is_pdf_node(&styled));
        assert!(graph.is_pdf_node(&flagged));
        assert!(!graph.is_pdf_node(&plain));

        graph.set_pdf_marker("formPdf");
        assert!(!graph.is_pdf_node(&styled));
    }

    #[test]
    fn test_pdf_display_name() {
        assert_eq!(PdfProperties::named("Intake.pdf").display_name(), Some("Intake.pdf".into()));

        let from_file = PdfProperties {
            pdf_file: Some("forms/sc100.pdf".into()),
            ..Default::default()
        };
        assert_eq!(from_file.display_name(), Some("sc100.pdf".into()));

        let from_url = PdfProperties {
            pdf_url: Some("https://example.com/docs/fl150.pdf?v=2".into()),
            ..Default::default()
        };
        assert_eq!(from_url.display_name(), Some("fl150.pdf".into()));

        assert!(!PdfProperties::default().is_present());
        assert_eq!(PdfProperties::default().display_name(), None);
    }

    #[test]
    fn test_update_batches_nest() {
        let mut graph = FormGraph::new();
        graph.begin_update();
        graph.begin_update();
        assert!(!graph.end_update());
        assert!(graph.end_update());
        assert!(graph.end_update());
    }
}
