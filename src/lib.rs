pub mod codegen;
pub mod error;
pub mod extract;
pub mod intent;
pub mod llm;
pub mod narrative;
pub mod notebook;
pub mod schema;
pub mod section;
