//! Section identifier catalog
//!
//! The notebook is built from a closed set of analysis sections. Each known
//! section maps to exactly one prompt template and one narrative template;
//! identifiers the model invents are carried as `Other` and served by the
//! generic templates.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SectionId {
    DataOverview,
    MissingValues,
    StatisticalSummary,
    Distributions,
    Correlations,
    TargetAnalysis,
    Outliers,
    Other(String),
}

impl SectionId {
    /// The canonical snake_case identifier used in prompts and plans.
    pub fn as_str(&self) -> &str {
        match self {
            SectionId::DataOverview => "data_overview",
            SectionId::MissingValues => "missing_values",
            SectionId::StatisticalSummary => "statistical_summary",
            SectionId::Distributions => "distributions",
            SectionId::Correlations => "correlations",
            SectionId::TargetAnalysis => "target_analysis",
            SectionId::Outliers => "outliers",
            SectionId::Other(name) => name,
        }
    }

    /// Default section order used when intent resolution falls back.
    pub fn default_sections() -> Vec<SectionId> {
        vec![
            SectionId::DataOverview,
            SectionId::MissingValues,
            SectionId::StatisticalSummary,
            SectionId::Distributions,
            SectionId::Correlations,
        ]
    }
}

impl From<String> for SectionId {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "data_overview" => SectionId::DataOverview,
            "missing_values" => SectionId::MissingValues,
            "statistical_summary" => SectionId::StatisticalSummary,
            "distributions" => SectionId::Distributions,
            "correlations" => SectionId::Correlations,
            "target_analysis" => SectionId::TargetAnalysis,
            "outliers" => SectionId::Outliers,
            _ => SectionId::Other(s.trim().to_string()),
        }
    }
}

impl From<SectionId> for String {
    fn from(s: SectionId) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
