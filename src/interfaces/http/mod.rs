use crate::app::AppState;
use crate::application::ReportFormat;
use crate::domain::document::UploadedDocument;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::ServerConfig;
use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{
    dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder, ResponseError,
};
use chrono::Local;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const LOG_CAPACITY: usize = 100;
const DEFAULT_HISTORY_LIMIT: i64 = 20;
const MAX_HISTORY_LIMIT: i64 = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub app_state: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
    pub max_upload_bytes: usize,
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<i64>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "detail": self.detail() }))
    }
}

#[get("/")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "Intelligent Tax Analyzer API is running" }))
}

#[post("/analyze-intelligent")]
async fn analyze_intelligent(data: web::Data<HttpState>, payload: Multipart) -> impl Responder {
    let documents = match read_uploads(payload, data.max_upload_bytes).await {
        Ok(documents) => documents,
        Err(e) => {
            add_log(&data.logs, "WARN", "HttpApi", &format!("Rejected upload: {}", e));
            return e.error_response();
        }
    };

    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!(
            "Analyzing {} document(s): {}",
            documents.len(),
            documents
                .iter()
                .map(|doc| doc.filename.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    );

    match data
        .app_state
        .sorter_use_case
        .analyze(documents, &data.logs)
        .await
    {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Analysis failed: {}", e),
            );
            e.error_response()
        }
    }
}

#[post("/generate-report/{format}")]
async fn generate_report(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> impl Responder {
    let format = match path.parse::<ReportFormat>() {
        Ok(format) => format,
        Err(e) => return e.error_response(),
    };

    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Generating {:?} report", format),
    );

    match data.app_state.report_use_case.render(format, &body) {
        Ok(bytes) => attachment(format, bytes),
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Report generation failed: {}", e),
            );
            e.error_response()
        }
    }
}

#[get("/analyses")]
async fn list_analyses(data: web::Data<HttpState>, query: web::Query<HistoryQuery>) -> impl Responder {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let result = match history(&data) {
        Ok(repository) => repository.list_recent(limit).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(summaries) => HttpResponse::Ok().json(summaries),
        Err(e) => e.error_response(),
    }
}

#[get("/analyses/{id}")]
async fn get_analysis(data: web::Data<HttpState>, path: web::Path<String>) -> impl Responder {
    let result = match history(&data) {
        Ok(repository) => repository.get(&path).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(analysis) => HttpResponse::Ok().json(analysis),
        Err(e) => e.error_response(),
    }
}

#[get("/analyses/{id}/report/{format}")]
async fn get_analysis_report(
    data: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (id, format) = path.into_inner();
    let format = match format.parse::<ReportFormat>() {
        Ok(format) => format,
        Err(e) => return e.error_response(),
    };

    match data
        .app_state
        .report_use_case
        .render_stored(&id, format)
        .await
    {
        Ok(bytes) => attachment(format, bytes),
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Stored report {} failed: {}", id, e),
            );
            e.error_response()
        }
    }
}

#[get("/models")]
async fn list_models(data: web::Data<HttpState>) -> impl Responder {
    let config = &data.app_state.llm_config;
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!(
            "Fetching models (provider={:?} base_url={})",
            config.provider, config.base_url
        ),
    );

    match data.app_state.llm_client.list_models(config).await {
        Ok(models) => HttpResponse::Ok().json(models),
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Failed to list models: {}", e),
            );
            e.error_response()
        }
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data.logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    HttpResponse::Ok().json(&*logs)
}

fn history(data: &HttpState) -> Result<&crate::infrastructure::db::AnalysisRepository> {
    data.app_state
        .repository
        .as_deref()
        .ok_or_else(|| AppError::NotFound("Analysis history is disabled".to_string()))
}

fn attachment(format: ReportFormat, bytes: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(format.content_type())
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename={}", format.file_name()),
        ))
        .body(bytes)
}

/// Every multipart part that carries a filename becomes one document.
async fn read_uploads(mut payload: Multipart, limit: usize) -> Result<Vec<UploadedDocument>> {
    let mut documents = Vec::new();
    let mut total = 0usize;

    while let Some(item) = payload.next().await {
        let mut field = item
            .map_err(|e| AppError::ValidationError(format!("Invalid multipart payload: {}", e)))?;

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .filter(|name| !name.is_empty())
            .map(|name| name.to_string());

        let mut content = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| AppError::ValidationError(format!("Failed to read upload: {}", e)))?;
            // plain form fields are drained and dropped
            if filename.is_none() {
                continue;
            }
            total += chunk.len();
            if total > limit {
                return Err(AppError::ValidationError(format!(
                    "Upload exceeds the {} byte limit",
                    limit
                )));
            }
            content.extend_from_slice(&chunk);
        }
        if let Some(filename) = filename {
            documents.push(UploadedDocument::new(filename, content));
        }
    }

    Ok(documents)
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    match level {
        "ERROR" => tracing::error!(source, "{}", message),
        "WARN" => tracing::warn!(source, "{}", message),
        "DEBUG" => tracing::debug!(source, "{}", message),
        _ => tracing::info!(source, "{}", message),
    }

    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    logs.push(entry.clone());
    if logs.len() > LOG_CAPACITY {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| {
        AppError::ValidationError(format!("Invalid JSON body: {}", err)).into()
    }))
    .service(health)
    .service(analyze_intelligent)
    .service(generate_report)
    .service(list_analyses)
    .service(get_analysis_report)
    .service(get_analysis)
    .service(list_models)
    .service(get_logs);
}

pub fn start_server(
    app_state: Arc<AppState>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
    server: &ServerConfig,
) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState {
        app_state,
        logs,
        max_upload_bytes: server.max_upload_bytes,
    });
    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .workers(server.workers.max(1))
    .bind((server.host.as_str(), server.port))?
    .run();

    Ok(server)
}
