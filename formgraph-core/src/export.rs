use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::graph::FormGraph;
use crate::node_id::{plan_node_ids, NodeIdContext};

/// One computed field ID of a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdRecord {
    pub cell_id: String,
    pub question_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<String>,
    /// Location within the question payload
    pub slot: String,
    pub node_id: String,
}

/// Lists the computed IDs of every question, in cell order
pub fn node_id_records(graph: &FormGraph) -> Vec<NodeIdRecord> {
    let mut records = Vec::new();

    for cell in &graph.cells {
        let Some(question) = &cell.question else {
            continue;
        };
        let Some(ctx) = NodeIdContext::for_cell(graph, &cell.id) else {
            continue;
        };

        for slot in plan_node_ids(question, &ctx) {
            records.push(NodeIdRecord {
                cell_id: cell.id.clone(),
                question_text: ctx.question_text.clone(),
                pdf: ctx.pdf_name.clone(),
                slot: slot.path,
                node_id: slot.computed,
            });
        }
    }

    records
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
    Markdown,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "md" | "markdown" => Ok(Self::Markdown),
            other => anyhow::bail!("Unknown export format: {}", other),
        }
    }
}

impl ExportFormat {
    /// Guesses the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .unwrap_or(Self::Json)
    }
}

/// Renders the records as a Markdown table
pub fn render_markdown(records: &[NodeIdRecord]) -> String {
    let mut output = String::new();
    output.push_str("# Node IDs\n\n");

    if records.is_empty() {
        output.push_str("_No questions._\n");
        return output;
    }

    output.push_str("| Cell | Question | PDF | Slot | Node ID |\n");
    output.push_str("|------|----------|-----|------|---------|\n");
    for record in records {
        output.push_str(&format!(
            "| {} | {} | {} | {} | `{}` |\n",
            record.cell_id,
            escape_cell(&record.question_text),
            escape_cell(record.pdf.as_deref().unwrap_or("-")),
            record.slot,
            record.node_id
        ));
    }

    output
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Renders the records in the given format
pub fn render(records: &[NodeIdRecord], format: ExportFormat) -> Result<String> {
    Ok(match format {
        ExportFormat::Json => serde_json::to_string_pretty(records)?,
        ExportFormat::Yaml => serde_yaml::to_string(records)?,
        ExportFormat::Markdown => render_markdown(records),
    })
}

/// Writes the node IDs of `graph` to `output_path`
pub fn export_node_ids(graph: &FormGraph, output_path: &Path, format: ExportFormat) -> Result<usize> {
    let records = node_id_records(graph);
    let content = render(&records, format)?;
    fs::write(output_path, content)
        .with_context(|| format!("Failed to write export: {}", output_path.display()))?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Cell, PdfProperties};
    use crate::models::{Question, QuestionType};
    use tempfile::TempDir;

    fn sample_graph() -> FormGraph {
        let mut graph = FormGraph::new();

        let mut question = Cell::new("q1", "Vehicle");
        let mut payload = Question::new(QuestionType::MultipleTextboxes, "Vehicle");
        payload.textboxes[0].placeholder = "Make".to_string();
        question.question = Some(payload);
        graph.add_cell(question).unwrap();

        let mut pdf = Cell::new("p1", "PDF");
        pdf.pdf = Some(PdfProperties::named("Sales.pdf"));
        graph.add_cell(pdf).unwrap();
        graph.add_edge("q1", "p1").unwrap();

        graph.add_cell(Cell::new("plain", "Just a note")).unwrap();
        graph
    }

    #[test]
    fn test_records_use_resolved_pdf() {
        let records = node_id_records(&sample_graph());
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].slot, "nodeId");
        assert_eq!(records[0].node_id, "sales_vehicle");
        assert_eq!(records[1].slot, "textboxes[0]");
        assert_eq!(records[1].node_id, "sales_vehicle_make");
        assert!(records.iter().all(|r| r.pdf.as_deref() == Some("Sales.pdf")));
    }

    #[test]
    fn test_markdown_table() {
        let markdown = render_markdown(&node_id_records(&sample_graph()));
        assert!(markdown.starts_with("# Node IDs"));
        assert!(markdown.contains("| q1 | Vehicle | Sales.pdf | textboxes[0] | `sales_vehicle_make` |"));
    }

    #[test]
    fn test_markdown_empty() {
        assert!(render_markdown(&[]).contains("_No questions._"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("ids.yml")), ExportFormat::Yaml);
        assert_eq!(ExportFormat::from_path(Path::new("ids.md")), ExportFormat::Markdown);
        assert_eq!(ExportFormat::from_path(Path::new("ids")), ExportFormat::Json);
        assert!("csv".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_export_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.json");

        let count = export_node_ids(&sample_graph(), &path, ExportFormat::Json).unwrap();
        assert_eq!(count, 2);

        let content = fs::read_to_string(&path).unwrap();
        let records: Vec<NodeIdRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(records, node_id_records(&sample_graph()));
    }
}
