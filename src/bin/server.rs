//! HTTP server for the notebook generator
//! Simple HTTP server using tokio and basic HTTP handling

use chrono::Local;
use nbforge::codegen::CodeSynthesizer;
use nbforge::intent::IntentResolver;
use nbforge::llm::LlmClient;
use nbforge::notebook::NotebookBuilder;
use nbforge::schema;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const UPLOAD_DIR: &str = "uploads";
const OUTPUT_DIR: &str = "outputs";

#[derive(Deserialize)]
struct GenerateRequest {
    #[serde(default)]
    filename: Option<String>,
    csv: String,
    task_description: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    println!("Starting notebook generator API server...");
    println!("Server will run on http://localhost:8000");

    if std::env::var("OPENAI_API_KEY").is_ok() {
        println!("[OK] OpenAI API key found - real code generation enabled");
    } else {
        println!("[WARN] OpenAI API key not found - will use fallback responses");
    }

    std::fs::create_dir_all(UPLOAD_DIR)?;
    std::fs::create_dir_all(OUTPUT_DIR)?;

    let listener = TcpListener::bind("0.0.0.0:8000").await?;
    println!("[OK] Server listening on port 8000");

    loop {
        let (stream, addr) = listener.accept().await?;
        eprintln!("[INFO] New connection from: {}", addr);
        tokio::spawn(handle_connection(stream));
    }
}

async fn handle_connection(mut stream: TcpStream) {
    use tokio::time::{timeout, Duration};

    let mut buffer = Vec::new();
    let mut temp_buf = [0; 8192];

    let read_result = timeout(Duration::from_secs(10), async {
        loop {
            match stream.read(&mut temp_buf).await {
                Ok(0) => break,
                Ok(n) => {
                    buffer.extend_from_slice(&temp_buf[..n]);
                    if let Ok(s) = std::str::from_utf8(&buffer) {
                        if let Some(headers_end) = s.find("\r\n\r\n") {
                            if let Some(content_length) = extract_content_length(s) {
                                if buffer.len() >= headers_end + 4 + content_length {
                                    break;
                                }
                            } else if n < temp_buf.len() {
                                break;
                            }
                        }
                    }
                    // Uploads are CSV text; cap to keep memory bounded
                    if buffer.len() > 20_000_000 {
                        break;
                    }
                }
                Err(e) => {
                    eprintln!("Failed to read from stream: {}", e);
                    return Err(e);
                }
            }
        }
        Ok(())
    })
    .await;

    if read_result.is_err() {
        eprintln!("[WARN] Request read timeout");
        return;
    }

    if buffer.is_empty() {
        return;
    }

    match String::from_utf8(buffer) {
        Ok(request) => {
            let response = handle_request(&request).await;
            if let Err(e) = stream.write_all(response.as_bytes()).await {
                eprintln!("Failed to write response: {}", e);
            }
        }
        Err(e) => {
            eprintln!("Failed to parse request as UTF-8: {}", e);
        }
    }
}

fn extract_content_length(request: &str) -> Option<usize> {
    for line in request.lines() {
        if line.to_lowercase().starts_with("content-length:") {
            if let Some(value) = line.split(':').nth(1) {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

async fn handle_request(request: &str) -> String {
    let request_line = match request.lines().next() {
        Some(line) => line,
        None => return json_response(400, "Bad Request", "{}"),
    };

    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return json_response(400, "Bad Request", "{}");
    }

    let method = parts[0];
    let path = parts[1].split('?').next().unwrap_or("/").trim_end_matches('/');
    let path = if path.is_empty() { "/" } else { path };

    eprintln!("[DEBUG] Request: {} {}", method, path);

    let body = request
        .split_once("\r\n\r\n")
        .map(|(_, b)| b)
        .unwrap_or("");

    match (method, path) {
        ("OPTIONS", _) => json_response(204, "No Content", ""),
        ("GET", "/") => json_response(
            200,
            "OK",
            r#"{"message": "Notebook Generator API", "version": "0.1.0"}"#,
        ),
        ("POST", "/api/generate") => handle_generate(body).await,
        ("GET", "/api/notebooks") => handle_list_notebooks(),
        ("GET", p) if p.starts_with("/api/download/") => {
            handle_download(p.trim_start_matches("/api/download/"))
        }
        _ => json_response(404, "Not Found", r#"{"error": "Not found"}"#),
    }
}

async fn handle_generate(body: &str) -> String {
    let request: GenerateRequest = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => {
            return json_response(
                400,
                "Bad Request",
                &serde_json::json!({"error": format!("Invalid request body: {}", e)}).to_string(),
            )
        }
    };

    let request_id = uuid::Uuid::new_v4();
    eprintln!(
        "[INFO] Generation request {}: {}",
        request_id, request.task_description
    );

    // Generation identity: timestamp keys both the upload and the output
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let filename = request
        .filename
        .as_deref()
        .map(sanitize_filename)
        .unwrap_or_else(|| "dataset.csv".to_string());
    let upload_path = PathBuf::from(UPLOAD_DIR).join(format!("{}_{}", timestamp, filename));

    if let Err(e) = std::fs::write(&upload_path, &request.csv) {
        return json_response(
            500,
            "Internal Server Error",
            &serde_json::json!({"error": format!("Failed to save upload: {}", e)}).to_string(),
        );
    }

    // Only a read failure is fatal; model failures degrade to placeholders
    let dataset_schema = match schema::inspect(&upload_path, 100) {
        Ok(s) => s,
        Err(e) => {
            return json_response(
                400,
                "Bad Request",
                &serde_json::json!({"error": e.to_string()}).to_string(),
            )
        }
    };

    let api_key =
        std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| "dummy-api-key".to_string());
    let model = Arc::new(LlmClient::new(api_key));

    let resolver = IntentResolver::new(model.clone());
    let plan = resolver.resolve(&dataset_schema, &request.task_description).await;

    let codegen = CodeSynthesizer::new(model);
    let notebook = NotebookBuilder::build(&plan, &codegen).await;

    let output_filename = format!("eda_notebook_{}.ipynb", timestamp);
    let output_path = PathBuf::from(OUTPUT_DIR).join(&output_filename);

    if let Err(e) = std::fs::write(&output_path, notebook.to_json_string()) {
        return json_response(
            500,
            "Internal Server Error",
            &serde_json::json!({"error": format!("Failed to save notebook: {}", e)}).to_string(),
        );
    }

    eprintln!("[OK] Notebook generated: {}", output_path.display());

    let response = serde_json::json!({
        "status": "success",
        "message": "Notebook generated successfully",
        "notebook_filename": output_filename,
        "download_url": format!("/api/download/{}", output_filename),
        "sections_generated": notebook.cell_count(),
        "intent": {
            "task_type": plan.task_type,
            "target_column": plan.target_column,
            "focus_columns": plan.focus_columns,
            "analysis_goals": plan.analysis_goals,
            "suggested_sections": plan.sections,
        }
    });

    json_response(200, "OK", &response.to_string())
}

fn handle_list_notebooks() -> String {
    let mut notebooks = Vec::new();

    if let Ok(entries) = std::fs::read_dir(OUTPUT_DIR) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("ipynb") {
                continue;
            }
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            let (created, size) = entry
                .metadata()
                .map(|m| {
                    let created = m
                        .modified()
                        .ok()
                        .map(chrono::DateTime::<Local>::from)
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_default();
                    (created, m.len())
                })
                .unwrap_or_default();

            notebooks.push(serde_json::json!({
                "filename": name,
                "created": created,
                "size": size,
                "download_url": format!("/api/download/{}", name),
            }));
        }
    }

    notebooks.sort_by(|a, b| b["created"].as_str().cmp(&a["created"].as_str()));

    json_response(
        200,
        "OK",
        &serde_json::json!({"notebooks": notebooks}).to_string(),
    )
}

fn handle_download(filename: &str) -> String {
    let safe = sanitize_filename(filename);
    let path = PathBuf::from(OUTPUT_DIR).join(&safe);

    match std::fs::read_to_string(&path) {
        Ok(contents) => raw_response(
            200,
            "OK",
            "application/x-ipynb+json",
            &contents,
            Some(&safe),
        ),
        Err(_) => json_response(404, "Not Found", r#"{"error": "Notebook not found"}"#),
    }
}

// Strip path separators so download/upload names cannot escape their dirs
fn sanitize_filename(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("dataset.csv")
        .replace("..", "_")
}

fn json_response(status: u16, status_text: &str, body: &str) -> String {
    raw_response(status, status_text, "application/json", body, None)
}

fn raw_response(
    status: u16,
    status_text: &str,
    content_type: &str,
    body: &str,
    attachment: Option<&str>,
) -> String {
    let disposition = match attachment {
        Some(name) => format!("Content-Disposition: attachment; filename=\"{}\"\r\n", name),
        None => String::new(),
    };
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: {}\r\n\
         Content-Length: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         {}\r\n\
         {}",
        status, status_text, content_type, body.len(), disposition, body
    )
}
