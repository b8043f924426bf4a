//! Notebook assembly - ordered cells into an nbformat 4 document
//!
//! The builder is purely a sequencing layer: for every section in the plan,
//! in plan order, it appends one markdown cell then one code cell. It makes
//! no model calls of its own and cannot fail; an empty plan yields an empty
//! but well-formed notebook.

use crate::codegen::CodeSynthesizer;
use crate::intent::Plan;
use crate::narrative;
use crate::section::SectionId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Markdown,
    Code,
}

/// One notebook cell, tagged with the section that produced it and its
/// position in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellKind,
    pub section: SectionId,
    pub index: usize,
    pub source: String,
}

impl Cell {
    /// nbformat 4 JSON shape for this cell. The producing section is kept
    /// in cell metadata so a reader can trace cells back to plan sections.
    pub fn to_nbformat(&self) -> Value {
        let source = split_source(&self.source);
        match self.kind {
            CellKind::Markdown => json!({
                "cell_type": "markdown",
                "metadata": {"section": self.section.as_str()},
                "source": source,
            }),
            CellKind::Code => json!({
                "cell_type": "code",
                "execution_count": null,
                "metadata": {"section": self.section.as_str()},
                "outputs": [],
                "source": source,
            }),
        }
    }
}

/// Assembled analysis notebook. Immutable once built; persistence identity
/// (the timestamped filename) is chosen by the transport layer.
#[derive(Debug, Clone)]
pub struct Notebook {
    pub cells: Vec<Cell>,
}

impl Notebook {
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Full nbformat 4.5 document recognized by Jupyter tooling.
    pub fn to_nbformat(&self) -> Value {
        json!({
            "cells": self.cells.iter().map(Cell::to_nbformat).collect::<Vec<_>>(),
            "metadata": {
                "kernelspec": {
                    "display_name": "Python 3",
                    "language": "python",
                    "name": "python3"
                },
                "language_info": {
                    "name": "python",
                    "version": "3.10"
                }
            },
            "nbformat": 4,
            "nbformat_minor": 5
        })
    }

    pub fn to_json_string(&self) -> String {
        // json! output of a static shape always serializes
        serde_json::to_string_pretty(&self.to_nbformat()).unwrap_or_else(|_| "{}".to_string())
    }
}

// nbformat convention: source as a list of lines, each keeping its newline
fn split_source(source: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut rest = source;
    while let Some(pos) = rest.find('\n') {
        lines.push(rest[..=pos].to_string());
        rest = &rest[pos + 1..];
    }
    if !rest.is_empty() {
        lines.push(rest.to_string());
    }
    lines
}

pub struct NotebookBuilder;

impl NotebookBuilder {
    /// Assemble the notebook for a resolved plan: per section in plan order,
    /// one narrative cell then one code cell. Sections are generated
    /// serially so synthesis can never reorder cells.
    pub async fn build(plan: &Plan, codegen: &CodeSynthesizer) -> Notebook {
        let mut cells = Vec::with_capacity(plan.sections.len() * 2);

        for section in &plan.sections {
            info!("Generating section: {}", section);
            let extra = section_context(plan, section);

            let body = narrative::markdown(section, &extra);
            cells.push(Cell {
                kind: CellKind::Markdown,
                section: section.clone(),
                index: cells.len(),
                source: body,
            });

            let code = codegen.synthesize(section, &plan.schema, &extra).await;
            cells.push(Cell {
                kind: CellKind::Code,
                section: section.clone(),
                index: cells.len(),
                source: code,
            });
        }

        info!("Assembled notebook with {} cells", cells.len());
        Notebook { cells }
    }
}

fn section_context(plan: &Plan, section: &SectionId) -> String {
    match section {
        SectionId::TargetAnalysis => match &plan.target_column {
            Some(target) => format!("The target variable is '{}'.", target),
            None => String::new(),
        },
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::intent::{IntentResolver, TaskType};
    use crate::llm::CompletionModel;
    use crate::schema::DatasetSchema;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct FixedModel(String);

    #[async_trait]
    impl CompletionModel for FixedModel {
        async fn complete(&self, _: &str, _: f64, _: u32) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn test_schema() -> DatasetSchema {
        let columns = vec!["a".to_string(), "b".to_string()];
        let mut dtypes = HashMap::new();
        dtypes.insert("a".to_string(), "int64".to_string());
        dtypes.insert("b".to_string(), "object".to_string());
        DatasetSchema {
            columns,
            dtypes,
            shape: (10, 2),
            sample: Vec::new(),
        }
    }

    fn plan_with_sections(sections: Vec<SectionId>) -> Plan {
        Plan {
            task_type: TaskType::Eda,
            target_column: Some("a".to_string()),
            focus_columns: Vec::new(),
            analysis_goals: Vec::new(),
            sections,
            schema: test_schema(),
        }
    }

    #[tokio::test]
    async fn test_cell_count_is_twice_section_count() {
        let codegen = CodeSynthesizer::new(Arc::new(FixedModel("df.head()".to_string())));
        let plan = plan_with_sections(SectionId::default_sections());
        let notebook = NotebookBuilder::build(&plan, &codegen).await;
        assert_eq!(notebook.cell_count(), 10);
    }

    #[tokio::test]
    async fn test_cells_alternate_and_follow_plan_order() {
        let codegen = CodeSynthesizer::new(Arc::new(FixedModel("df.head()".to_string())));
        let sections = vec![
            SectionId::Outliers,
            SectionId::DataOverview,
            SectionId::Outliers,
        ];
        let plan = plan_with_sections(sections.clone());
        let notebook = NotebookBuilder::build(&plan, &codegen).await;

        assert_eq!(notebook.cell_count(), 6);
        for (i, section) in sections.iter().enumerate() {
            let markdown = &notebook.cells[i * 2];
            let code = &notebook.cells[i * 2 + 1];
            assert_eq!(markdown.kind, CellKind::Markdown);
            assert_eq!(code.kind, CellKind::Code);
            assert_eq!(&markdown.section, section);
            assert_eq!(&code.section, section);
            assert_eq!(markdown.index, i * 2);
            assert_eq!(code.index, i * 2 + 1);
        }
    }

    #[tokio::test]
    async fn test_empty_plan_yields_empty_notebook() {
        let codegen = CodeSynthesizer::new(Arc::new(FixedModel("df.head()".to_string())));
        let plan = plan_with_sections(Vec::new());
        let notebook = NotebookBuilder::build(&plan, &codegen).await;
        assert_eq!(notebook.cell_count(), 0);

        let doc = notebook.to_nbformat();
        assert_eq!(doc["nbformat"], 4);
        assert_eq!(doc["cells"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_target_context_reaches_target_section() {
        let codegen = CodeSynthesizer::new(Arc::new(FixedModel("df['a'].hist()".to_string())));
        let plan = plan_with_sections(vec![SectionId::TargetAnalysis]);
        let notebook = NotebookBuilder::build(&plan, &codegen).await;
        assert!(notebook.cells[0].source.contains("The target variable is 'a'."));
    }

    #[test]
    fn test_nbformat_cell_shapes() {
        let markdown = Cell {
            kind: CellKind::Markdown,
            section: SectionId::DataOverview,
            index: 0,
            source: "## Title\n\nBody".to_string(),
        };
        let value = markdown.to_nbformat();
        assert_eq!(value["cell_type"], "markdown");
        assert_eq!(value["metadata"]["section"], "data_overview");

        let code = Cell {
            kind: CellKind::Code,
            section: SectionId::DataOverview,
            index: 1,
            source: "df.head()\ndf.shape".to_string(),
        };
        let value = code.to_nbformat();
        assert_eq!(value["cell_type"], "code");
        assert_eq!(value["execution_count"], Value::Null);
        assert_eq!(value["outputs"].as_array().unwrap().len(), 0);
        assert_eq!(
            value["source"],
            json!(["df.head()\n", "df.shape"])
        );
    }

    #[test]
    fn test_fallback_plan_shape() {
        let plan = IntentResolver::fallback_plan(&test_schema());
        assert_eq!(plan.sections.len(), 5);
        assert!(plan.target_column.is_none());
    }
}
