//! Intent Resolver - turn a free-text task description into a structured Plan
//!
//! One model call at low temperature, JSON-only instruction, fence stripping
//! before decoding. Any failure (transport, malformed JSON, wrong shape)
//! produces the fixed default Plan instead of an error; callers always get a
//! usable Plan.

use crate::error::Result;
use crate::extract::extract_json;
use crate::llm::CompletionModel;
use crate::schema::DatasetSchema;
use crate::section::SectionId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[serde(alias = "overview-analysis", alias = "overview_analysis")]
    Eda,
    Classification,
    Regression,
    Clustering,
    HypothesisTesting,
    Correlation,
}

/// Structured analysis plan. Produced once by the resolver, immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub task_type: TaskType,
    pub target_column: Option<String>,
    pub focus_columns: Vec<String>,
    pub analysis_goals: Vec<String>,
    pub sections: Vec<SectionId>,
    pub schema: DatasetSchema,
}

/// The shape the model is asked to emit. All fields defaulted so a sparse
/// but valid response still yields a plan.
#[derive(Debug, Deserialize)]
struct RawIntent {
    #[serde(default = "default_task_type")]
    task_type: TaskType,
    #[serde(default)]
    target_column: Option<String>,
    #[serde(default)]
    focus_columns: Vec<String>,
    #[serde(default)]
    analysis_goals: Vec<String>,
    #[serde(default)]
    suggested_sections: Vec<SectionId>,
}

fn default_task_type() -> TaskType {
    TaskType::Eda
}

pub struct IntentResolver {
    model: Arc<dyn CompletionModel>,
}

impl IntentResolver {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// Resolve the user's task text against the dataset schema. Never fails;
    /// every failure path collapses to the default overview plan.
    pub async fn resolve(&self, schema: &DatasetSchema, task_text: &str) -> Plan {
        match self.resolve_inner(schema, task_text).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!("Intent resolution failed ({}), using fallback plan", e);
                Self::fallback_plan(schema)
            }
        }
    }

    async fn resolve_inner(&self, schema: &DatasetSchema, task_text: &str) -> Result<Plan> {
        let prompt = self.build_prompt(schema, task_text);
        let response = self.model.complete(&prompt, 0.3, 1000).await?;

        let cleaned = extract_json(&response);
        let raw: RawIntent = serde_json::from_str(&cleaned)?;

        let target_column = raw
            .target_column
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("null"));

        let sections = if raw.suggested_sections.is_empty() {
            SectionId::default_sections()
        } else {
            raw.suggested_sections
        };

        info!(
            "Resolved intent: task_type={:?}, target={:?}, {} sections",
            raw.task_type,
            target_column,
            sections.len()
        );

        Ok(Plan {
            task_type: raw.task_type,
            target_column,
            focus_columns: raw.focus_columns,
            analysis_goals: raw.analysis_goals,
            sections,
            schema: schema.clone(),
        })
    }

    fn build_prompt(&self, schema: &DatasetSchema, task_text: &str) -> String {
        let dtypes: Vec<String> = schema
            .columns
            .iter()
            .map(|c| format!("{}: {}", c, schema.dtype(c).unwrap_or("unknown")))
            .collect();

        format!(
            r#"You are a data science assistant that parses task descriptions.

Dataset Schema:
- Columns: {}
- Shape: {} rows x {} columns
- Data types: {{{}}}

User Task: "{}"

Extract the following information in JSON format:
{{
    "task_type": "eda" | "classification" | "regression" | "clustering" | "hypothesis_testing" | "correlation",
    "target_column": "column_name or null if not applicable",
    "focus_columns": ["list of specific columns mentioned, or empty array"],
    "analysis_goals": ["specific analysis goals extracted from task"],
    "suggested_sections": ["list of EDA sections to include"]
}}

Default to "eda" task type unless clearly specified otherwise.
Suggested sections can include: data_overview, missing_values, distributions, correlations, target_analysis, outliers, statistical_summary.

IMPORTANT: Respond ONLY with valid JSON. Do not include any explanatory text before or after the JSON."#,
            schema.columns.join(", "),
            schema.shape.0,
            schema.shape.1,
            dtypes.join(", "),
            task_text
        )
    }

    /// Fixed default plan: overview analysis over the standard five sections.
    pub fn fallback_plan(schema: &DatasetSchema) -> Plan {
        Plan {
            task_type: TaskType::Eda,
            target_column: None,
            focus_columns: Vec::new(),
            analysis_goals: vec!["Perform exploratory data analysis".to_string()],
            sections: SectionId::default_sections(),
            schema: schema.clone(),
        }
    }
}
