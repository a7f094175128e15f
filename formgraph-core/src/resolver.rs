//! PDF association
//!
//! A question belongs to the nearest PDF-bearing cell reachable over the
//! diagram's edges, walked in both directions. Numbered dropdowns first look
//! through their numeric option cells, which sit one hop further out than a
//! direct PDF link.

use log::debug;
use std::collections::{HashSet, VecDeque};

use crate::graph::{Cell, GraphModel};
use crate::models::QuestionType;
use crate::text::is_numeric_label;

/// The PDF cell a question resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfMatch {
    pub cell_id: String,
    pub name: String,
    /// Hops from the question; informational only
    pub distance: usize,
}

impl PdfMatch {
    fn new(cell: &Cell, distance: usize) -> Self {
        let name = cell
            .pdf
            .as_ref()
            .and_then(|p| p.display_name())
            .unwrap_or_else(|| cell.label());
        Self {
            cell_id: cell.id.clone(),
            name,
            distance,
        }
    }
}

/// Finds the PDF cell associated with the question `cell_id`.
///
/// Returns `None` when the cell does not exist or no PDF is reachable.
/// Among candidates at equal depth, the first discovered wins: outgoing
/// edges before incoming ones, each in edge-array order.
pub fn find_pdf_for_question<G: GraphModel + ?Sized>(graph: &G, cell_id: &str) -> Option<PdfMatch> {
    let Some(start) = graph.cell(cell_id) else {
        debug!("PDF lookup skipped: cell {} not found", cell_id);
        return None;
    };

    if graph.carries_pdf(start) {
        return Some(PdfMatch::new(start, 0));
    }

    if start.question_type() == QuestionType::MultipleDropdownType {
        if let Some(found) = find_via_numbered_options(graph, start) {
            debug!("Question {} resolved to PDF {} via numbered option", cell_id, found.cell_id);
            return Some(found);
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(start.id.as_str());
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
    queue.push_back((start.id.as_str(), 0));

    while let Some((current, distance)) = queue.pop_front() {
        let outgoing = graph.outgoing_edges(current).into_iter().map(|e| e.target.as_str());
        let incoming = graph.incoming_edges(current).into_iter().map(|e| e.source.as_str());

        for next in outgoing.chain(incoming) {
            if !visited.insert(next) {
                continue;
            }
            let Some(cell) = graph.cell(next) else {
                continue;
            };
            if graph.carries_pdf(cell) {
                debug!(
                    "Question {} resolved to PDF {} at distance {}",
                    cell_id,
                    cell.id,
                    distance + 1
                );
                return Some(PdfMatch::new(cell, distance + 1));
            }
            queue.push_back((cell.id.as_str(), distance + 1));
        }
    }

    debug!("No PDF reachable from question {}", cell_id);
    None
}

/// Name of the PDF associated with `cell_id`, if any
pub fn find_pdf_name_for_question<G: GraphModel + ?Sized>(graph: &G, cell_id: &str) -> Option<String> {
    find_pdf_for_question(graph, cell_id).map(|m| m.name)
}

/// Question -> numeric option cell -> PDF cell, over outgoing edges only
fn find_via_numbered_options<G: GraphModel + ?Sized>(graph: &G, question: &Cell) -> Option<PdfMatch> {
    for edge in graph.outgoing_edges(&question.id) {
        let Some(option) = graph.cell(&edge.target) else {
            continue;
        };
        if !is_numeric_label(&option.value) {
            continue;
        }
        for option_edge in graph.outgoing_edges(&option.id) {
            if let Some(target) = graph.cell(&option_edge.target) {
                if graph.carries_pdf(target) {
                    return Some(PdfMatch::new(target, 2));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{FormGraph, PdfProperties};
    use crate::models::Question;

    fn question(id: &str, question_type: QuestionType) -> Cell {
        let mut cell = Cell::new(id, id);
        cell.question = Some(Question::new(question_type, id));
        cell
    }

    fn pdf(id: &str, name: &str) -> Cell {
        let mut cell = Cell::new(id, id);
        cell.pdf = Some(PdfProperties::named(name));
        cell
    }

    fn styled_pdf(id: &str) -> Cell {
        let mut cell = Cell::new(id, format!("<b>{}</b>", id));
        cell.style = "nodeType=pdfNode;".into();
        cell
    }

    fn graph_of(cells: Vec<Cell>, edges: &[(&str, &str)]) -> FormGraph {
        let mut graph = FormGraph::new();
        for cell in cells {
            graph.add_cell(cell).unwrap();
        }
        for (source, target) in edges {
            graph.add_edge(source, target).unwrap();
        }
        graph
    }

    #[test]
    fn test_missing_cell_returns_none() {
        let graph = FormGraph::new();
        assert_eq!(find_pdf_for_question(&graph, "nope"), None);
    }

    #[test]
    fn test_cell_with_own_pdf_properties() {
        let mut q = question("q", QuestionType::Text);
        q.pdf = Some(PdfProperties {
            pdf_file: Some("uploads/Intake.pdf".into()),
            ..Default::default()
        });
        let graph = graph_of(vec![q], &[]);

        let found = find_pdf_for_question(&graph, "q").unwrap();
        assert_eq!(found.distance, 0);
        assert_eq!(found.name, "Intake.pdf");
    }

    #[test]
    fn test_follows_incoming_edges() {
        let graph = graph_of(
            vec![pdf("p", "Intake.pdf"), question("q", QuestionType::Text)],
            &[("p", "q")],
        );
        assert_eq!(find_pdf_name_for_question(&graph, "q"), Some("Intake.pdf".into()));
    }

    #[test]
    fn test_styled_pdf_node_uses_label() {
        let graph = graph_of(
            vec![question("q", QuestionType::Text), styled_pdf("Custody Form")],
            &[("q", "Custody Form")],
        );
        let found = find_pdf_for_question(&graph, "q").unwrap();
        assert_eq!(found.name, "Custody Form");
        assert_eq!(found.distance, 1);
    }

    #[test]
    fn test_terminates_on_cycle() {
        // a -> b -> c -> d -> e -> a, PDF hanging off c (distance 2 from a)
        let graph = graph_of(
            vec![
                question("a", QuestionType::Text),
                question("b", QuestionType::Text),
                question("c", QuestionType::Text),
                question("d", QuestionType::Text),
                question("e", QuestionType::Text),
                pdf("p", "Cycle.pdf"),
            ],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e"), ("e", "a"), ("c", "p")],
        );

        let found = find_pdf_for_question(&graph, "a").unwrap();
        assert_eq!(found.cell_id, "p");
        assert_eq!(found.distance, 3);
    }

    #[test]
    fn test_cycle_with_pdf_at_distance_two() {
        let graph = graph_of(
            vec![
                question("a", QuestionType::Text),
                question("b", QuestionType::Text),
                question("c", QuestionType::Text),
                question("d", QuestionType::Text),
                question("e", QuestionType::Text),
                pdf("p", "Cycle.pdf"),
            ],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e"), ("e", "a"), ("b", "p")],
        );

        let found = find_pdf_for_question(&graph, "a").unwrap();
        assert_eq!(found.cell_id, "p");
        assert_eq!(found.distance, 2);
    }

    #[test]
    fn test_unreachable_pdf_returns_none() {
        let graph = graph_of(
            vec![
                question("a", QuestionType::Text),
                question("b", QuestionType::Text),
                pdf("p", "Elsewhere.pdf"),
            ],
            &[("a", "b"), ("b", "a")],
        );
        assert_eq!(find_pdf_for_question(&graph, "a"), None);
    }

    #[test]
    fn test_tie_break_prefers_outgoing_then_edge_order() {
        let graph = graph_of(
            vec![
                question("q", QuestionType::Text),
                pdf("in", "Incoming.pdf"),
                pdf("out1", "First.pdf"),
                pdf("out2", "Second.pdf"),
            ],
            &[("in", "q"), ("q", "out1"), ("q", "out2")],
        );
        assert_eq!(find_pdf_name_for_question(&graph, "q"), Some("First.pdf".into()));
    }

    #[test]
    fn test_tie_break_at_depth_two_follows_discovery_order() {
        // q -> m1 -> pA, q <- m2 -> pB: m1 is discovered first
        let graph = graph_of(
            vec![
                question("q", QuestionType::Text),
                question("m1", QuestionType::Text),
                question("m2", QuestionType::Text),
                pdf("pB", "B.pdf"),
                pdf("pA", "A.pdf"),
            ],
            &[("m2", "q"), ("m2", "pB"), ("q", "m1"), ("m1", "pA")],
        );
        let found = find_pdf_for_question(&graph, "q").unwrap();
        assert_eq!(found.name, "A.pdf");
        assert_eq!(found.distance, 2);
    }

    #[test]
    fn test_numbered_option_path_wins_over_closer_pdf() {
        let graph = graph_of(
            vec![
                question("nd", QuestionType::MultipleDropdownType),
                pdf("near", "Near.pdf"),
                Cell::new("opt1", "1"),
                pdf("far", "Children.pdf"),
            ],
            &[("near", "nd"), ("nd", "opt1"), ("opt1", "far")],
        );

        let found = find_pdf_for_question(&graph, "nd").unwrap();
        assert_eq!(found.name, "Children.pdf");
        assert_eq!(found.distance, 2);
    }

    #[test]
    fn test_numbered_option_without_pdf_falls_back_to_bfs() {
        let graph = graph_of(
            vec![
                question("nd", QuestionType::MultipleDropdownType),
                pdf("near", "Near.pdf"),
                Cell::new("opt1", "1"),
                question("next", QuestionType::Text),
            ],
            &[("near", "nd"), ("nd", "opt1"), ("opt1", "next")],
        );

        let found = find_pdf_for_question(&graph, "nd").unwrap();
        assert_eq!(found.name, "Near.pdf");
        assert_eq!(found.distance, 1);
    }

    #[test]
    fn test_option_shortcut_only_for_numbered_dropdowns() {
        let graph = graph_of(
            vec![
                question("q", QuestionType::Dropdown),
                pdf("near", "Near.pdf"),
                Cell::new("opt1", "1"),
                pdf("far", "Far.pdf"),
            ],
            &[("near", "q"), ("q", "opt1"), ("opt1", "far")],
        );
        assert_eq!(find_pdf_name_for_question(&graph, "q"), Some("Near.pdf".into()));
    }

    #[test]
    fn test_non_numeric_children_are_not_options() {
        let graph = graph_of(
            vec![
                question("nd", QuestionType::MultipleDropdownType),
                pdf("near", "Near.pdf"),
                Cell::new("opt", "Yes"),
                pdf("far", "Far.pdf"),
            ],
            &[("near", "nd"), ("nd", "opt"), ("opt", "far")],
        );
        assert_eq!(find_pdf_name_for_question(&graph, "nd"), Some("Near.pdf".into()));
    }
}
