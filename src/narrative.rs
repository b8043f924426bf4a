//! Narrative Synthesizer - fixed title/description catalogs per section
//!
//! Pure lookup, no model call, no failure mode. Unknown sections get a
//! title derived mechanically from their identifier.

use crate::section::SectionId;

/// Markdown title + description for one section's narrative cell.
pub fn narrate(section: &SectionId, extra: &str) -> (String, String) {
    let title = title(section);
    let mut description = description(section).to_string();
    if !extra.is_empty() {
        if description.is_empty() {
            description = extra.to_string();
        } else {
            description.push_str("\n\n");
            description.push_str(extra);
        }
    }
    (title, description)
}

/// Full markdown body for a section's narrative cell.
pub fn markdown(section: &SectionId, extra: &str) -> String {
    let (title, description) = narrate(section, extra);
    if description.is_empty() {
        title
    } else {
        format!("{}\n\n{}", title, description)
    }
}

fn title(section: &SectionId) -> String {
    match section {
        SectionId::DataOverview => "## 📊 Dataset Overview".to_string(),
        SectionId::MissingValues => "## 🔍 Missing Values Analysis".to_string(),
        SectionId::StatisticalSummary => "## 📈 Statistical Summary".to_string(),
        SectionId::Distributions => "## 📉 Data Distributions".to_string(),
        SectionId::Correlations => "## 🔗 Correlation Analysis".to_string(),
        SectionId::TargetAnalysis => "## 🎯 Target Variable Analysis".to_string(),
        SectionId::Outliers => "## ⚠️ Outlier Detection".to_string(),
        SectionId::Other(name) => format!("## {}", title_case(name)),
    }
}

fn description(section: &SectionId) -> &'static str {
    match section {
        SectionId::DataOverview => {
            "Let's start by understanding the basic structure and characteristics of our dataset."
        }
        SectionId::MissingValues => {
            "Identifying and quantifying missing data is crucial for data quality assessment."
        }
        SectionId::StatisticalSummary => {
            "Key statistical measures provide insight into the central tendencies and spread of our data."
        }
        SectionId::Distributions => {
            "Visualizing distributions helps identify patterns, skewness, and potential data quality issues."
        }
        SectionId::Correlations => {
            "Understanding relationships between variables is essential for feature selection and modeling."
        }
        SectionId::TargetAnalysis => {
            "Analyzing the target variable reveals class balance and distribution characteristics."
        }
        SectionId::Outliers => {
            "Detecting outliers helps identify data anomalies that may require special handling."
        }
        SectionId::Other(_) => "",
    }
}

fn title_case(identifier: &str) -> String {
    identifier
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
