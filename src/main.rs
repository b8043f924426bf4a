use anyhow::{Context, Result};
use clap::Parser;
use nbforge::codegen::CodeSynthesizer;
use nbforge::intent::IntentResolver;
use nbforge::llm::LlmClient;
use nbforge::notebook::NotebookBuilder;
use nbforge::schema;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "nbforge")]
#[command(about = "Generate a runnable EDA notebook from a CSV file and a task description")]
struct Args {
    /// Path to the CSV dataset
    dataset: PathBuf,

    /// The analysis task in natural language
    task: String,

    /// Output notebook path (default: notebook.ipynb)
    #[arg(short, long, default_value = "notebook.ipynb")]
    output: PathBuf,

    /// Maximum number of rows to sample for schema inspection
    #[arg(long, default_value_t = 100)]
    row_cap: usize,

    /// OpenAI API key (or set OPENAI_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    info!("Generating notebook for {}", args.dataset.display());
    info!("Task: {}", args.task);

    let dataset_schema = schema::inspect(&args.dataset, args.row_cap)
        .with_context(|| format!("Failed to inspect {}", args.dataset.display()))?;
    info!(
        "Inspected schema: {} columns, {} sampled rows",
        dataset_schema.shape.1, dataset_schema.shape.0
    );

    let api_key = args
        .api_key
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .unwrap_or_else(|| "dummy-api-key".to_string());
    let model = Arc::new(LlmClient::new(api_key));

    let resolver = IntentResolver::new(model.clone());
    let plan = resolver.resolve(&dataset_schema, &args.task).await;
    info!(
        "Plan: task_type={:?}, {} sections",
        plan.task_type,
        plan.sections.len()
    );

    let codegen = CodeSynthesizer::new(model);
    let notebook = NotebookBuilder::build(&plan, &codegen).await;

    std::fs::write(&args.output, notebook.to_json_string())
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Notebook written to {} ({} cells)",
        args.output.display(),
        notebook.cell_count()
    );

    Ok(())
}
