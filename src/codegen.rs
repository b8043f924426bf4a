//! Code Synthesizer - per-section Python code generation
//!
//! Each section has a base instruction in a fixed catalog; the full prompt
//! adds the dataset's numerical/categorical column split and a fixed set of
//! formatting requirements. One model call per section, no caching, and a
//! two-line placeholder on any failure so the assembler always receives
//! syntactically valid code text.

use crate::error::Result;
use crate::extract::extract_code;
use crate::llm::CompletionModel;
use crate::schema::DatasetSchema;
use crate::section::SectionId;
use std::sync::Arc;
use tracing::warn;

const MAX_COLUMNS_IN_PROMPT: usize = 10;

pub struct CodeSynthesizer {
    model: Arc<dyn CompletionModel>,
}

impl CodeSynthesizer {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// Generate code for one section. Never fails and never returns empty
    /// text; model errors degrade to a placeholder naming the section.
    pub async fn synthesize(
        &self,
        section: &SectionId,
        schema: &DatasetSchema,
        extra_context: &str,
    ) -> String {
        match self.synthesize_inner(section, schema, extra_context).await {
            Ok(code) if !code.trim().is_empty() => code,
            Ok(_) => {
                warn!("Empty code response for section {}", section);
                placeholder(section, "empty model response")
            }
            Err(e) => {
                warn!("Code generation failed for {}: {}", section, e);
                placeholder(section, &e.to_string())
            }
        }
    }

    async fn synthesize_inner(
        &self,
        section: &SectionId,
        schema: &DatasetSchema,
        extra_context: &str,
    ) -> Result<String> {
        let prompt = build_prompt(section, schema, extra_context);
        let response = self.model.complete(&prompt, 0.3, 1500).await?;
        Ok(extract_code(&response))
    }
}

/// Split schema columns by dtype tag the way pandas users would:
/// int/float are numerical, object/category are categorical.
pub fn split_columns(schema: &DatasetSchema) -> (Vec<&str>, Vec<&str>) {
    let mut numerical = Vec::new();
    let mut categorical = Vec::new();
    for col in &schema.columns {
        match schema.dtype(col) {
            Some(dtype) if dtype.contains("int") || dtype.contains("float") => {
                numerical.push(col.as_str())
            }
            Some(dtype) if dtype == "object" || dtype.contains("category") => {
                categorical.push(col.as_str())
            }
            _ => {}
        }
    }
    (numerical, categorical)
}

fn build_prompt(section: &SectionId, schema: &DatasetSchema, extra_context: &str) -> String {
    let (numerical, categorical) = split_columns(schema);

    format!(
        r#"You are an expert data scientist. Generate clean, well-documented Python code for data analysis.

{}

Dataset Information:
- Total columns: {}
- Numerical columns ({}): {}
- Categorical columns ({}): {}

{}

Requirements:
- Use 'df' as the DataFrame variable name
- Include proper labels, titles, and formatting
- Add comments explaining each step
- Use modern matplotlib/seaborn styling (set style to 'whitegrid' or 'darkgrid')
- Handle edge cases (empty columns, all nulls, etc.)
- Return ONLY executable Python code, no explanations outside code comments"#,
        base_instruction(section),
        schema.columns.len(),
        numerical.len(),
        numerical[..numerical.len().min(MAX_COLUMNS_IN_PROMPT)].join(", "),
        categorical.len(),
        categorical[..categorical.len().min(MAX_COLUMNS_IN_PROMPT)].join(", "),
        extra_context
    )
}

/// Section-specific base instructions. Unknown sections get the generic one.
fn base_instruction(section: &SectionId) -> &'static str {
    match section {
        SectionId::DataOverview => {
            "Generate Python code to display dataset overview:\n\
             - Load the CSV file into pandas DataFrame named 'df'\n\
             - Display first 5 rows\n\
             - Show dataset shape\n\
             - Display column names and data types\n\
             - Show memory usage\n\n\
             Use only pandas. The dataset path will be provided."
        }
        SectionId::MissingValues => {
            "Generate Python code to analyze missing values:\n\
             - Calculate missing value count and percentage for each column\n\
             - Create a bar chart showing missing value percentages\n\
             - Display summary DataFrame with columns: [Column, Missing_Count, Missing_Percentage]\n\n\
             Use pandas, matplotlib, and seaborn."
        }
        SectionId::StatisticalSummary => {
            "Generate Python code for statistical summary:\n\
             - Use df.describe() for numerical columns\n\
             - Show value counts for categorical columns (top 10)\n\
             - Display properly formatted tables\n\n\
             Use pandas."
        }
        SectionId::Distributions => {
            "Generate Python code to visualize distributions:\n\
             - For numerical columns: histograms with KDE curves\n\
             - For categorical columns: count plots (limit to top 10 categories)\n\
             - Create subplots for better organization\n\
             - Use appropriate figure size and styling\n\n\
             Use pandas, matplotlib, and seaborn."
        }
        SectionId::Correlations => {
            "Generate Python code for correlation analysis:\n\
             - Calculate correlation matrix for numerical columns\n\
             - Create a heatmap with annotations\n\
             - Identify high correlations (> 0.7 or < -0.7)\n\
             - Display correlation findings\n\n\
             Use pandas, matplotlib, and seaborn."
        }
        SectionId::TargetAnalysis => {
            "Generate Python code to analyze the target variable:\n\
             - Show target variable distribution\n\
             - For classification: count plot and percentage breakdown\n\
             - For regression: histogram and basic statistics\n\
             - Include value counts\n\n\
             Use pandas, matplotlib, and seaborn."
        }
        SectionId::Outliers => {
            "Generate Python code for outlier detection:\n\
             - Use box plots for numerical columns\n\
             - Calculate IQR and identify outliers\n\
             - Display outlier statistics\n\n\
             Use pandas, matplotlib, and seaborn."
        }
        SectionId::Other(_) => "Generate exploratory data analysis code.",
    }
}

fn placeholder(section: &SectionId, error: &str) -> String {
    // Single quotes in the error would break the generated print statement
    let safe = error.replace('\'', "\"");
    format!(
        "# Error generating code for {}\nprint('Section generation failed: {}')",
        section, safe
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NbError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FixedModel(String);

    #[async_trait]
    impl CompletionModel for FixedModel {
        async fn complete(&self, _: &str, _: f64, _: u32) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl CompletionModel for FailingModel {
        async fn complete(&self, _: &str, _: f64, _: u32) -> Result<String> {
            Err(NbError::Llm("quota exceeded".to_string()))
        }
    }

    fn test_schema() -> DatasetSchema {
        let columns = vec!["age".to_string(), "salary".to_string(), "dept".to_string()];
        let mut dtypes = HashMap::new();
        dtypes.insert("age".to_string(), "int64".to_string());
        dtypes.insert("salary".to_string(), "float64".to_string());
        dtypes.insert("dept".to_string(), "object".to_string());
        DatasetSchema {
            columns,
            dtypes,
            shape: (50, 3),
            sample: Vec::new(),
        }
    }

    #[test]
    fn test_split_columns() {
        let schema = test_schema();
        let (numerical, categorical) = split_columns(&schema);
        assert_eq!(numerical, vec!["age", "salary"]);
        assert_eq!(categorical, vec!["dept"]);
    }

    #[test]
    fn test_prompt_embeds_columns_and_requirements() {
        let prompt = build_prompt(&SectionId::Distributions, &test_schema(), "");
        assert!(prompt.contains("age, salary"));
        assert!(prompt.contains("dept"));
        assert!(prompt.contains("Use 'df' as the DataFrame variable name"));
        assert!(prompt.contains("histograms with KDE"));
    }

    #[test]
    fn test_unknown_section_uses_generic_instruction() {
        let section = SectionId::Other("feature_importance".to_string());
        assert_eq!(
            base_instruction(&section),
            "Generate exploratory data analysis code."
        );
    }

    #[tokio::test]
    async fn test_synthesize_extracts_fenced_code() {
        let response = "Here you go:\n```python\nimport pandas as pd\ndf = pd.read_csv('data.csv')\ndf.head()\n```";
        let synth = CodeSynthesizer::new(Arc::new(FixedModel(response.to_string())));
        let code = synth
            .synthesize(&SectionId::DataOverview, &test_schema(), "")
            .await;
        assert!(code.starts_with("import pandas as pd"));
        assert!(!code.contains("```"));
    }

    #[tokio::test]
    async fn test_synthesize_idempotent_for_fixed_response() {
        let synth = CodeSynthesizer::new(Arc::new(FixedModel(
            "```python\ndf.describe()\n```".to_string(),
        )));
        let schema = test_schema();
        let a = synth
            .synthesize(&SectionId::StatisticalSummary, &schema, "")
            .await;
        let b = synth
            .synthesize(&SectionId::StatisticalSummary, &schema, "")
            .await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_synthesize_placeholder_on_failure() {
        let synth = CodeSynthesizer::new(Arc::new(FailingModel));
        let code = synth
            .synthesize(&SectionId::Correlations, &test_schema(), "")
            .await;
        assert!(code.contains("# Error generating code for correlations"));
        assert!(code.contains("print('Section generation failed:"));
    }

    #[tokio::test]
    async fn test_synthesize_never_empty() {
        let synth = CodeSynthesizer::new(Arc::new(FixedModel("   ".to_string())));
        let code = synth
            .synthesize(&SectionId::Outliers, &test_schema(), "")
            .await;
        assert!(!code.trim().is_empty());
    }
}
