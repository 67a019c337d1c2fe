use actix_cors::Cors;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::application::use_cases::type_parameters::TypeParametersUseCase;
use crate::application::ProgressSink;
use crate::domain::acc::FileRef;
use crate::domain::error::AppError;
use crate::domain::job::{IfcExportJob, TypeParametersJob};
use crate::infrastructure::bootstrap::AppState;

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub type SharedLogs = Arc<Mutex<Vec<LogEntry>>>;

pub struct HttpState {
    pub app: Arc<AppState>,
    pub logs: SharedLogs,
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    if let Ok(mut logs) = logs.lock() {
        logs.push(entry.clone());
        if logs.len() > MAX_LOG_ENTRIES {
            logs.remove(0);
        }
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Mirrors workflow progress into the log buffer served at `/api/logs`.
pub struct LogProgress {
    logs: SharedLogs,
    source: &'static str,
}

impl LogProgress {
    pub fn new(logs: SharedLogs, source: &'static str) -> Self {
        Self { logs, source }
    }
}

impl ProgressSink for LogProgress {
    fn progress(&self, message: &str, percentage: u8) {
        info!(source = self.source, percentage, "{}", message);
        add_log(
            &self.logs,
            "INFO",
            self.source,
            &format!("{} ({}%)", message, percentage),
        );
    }

    fn info(&self, message: &str) {
        info!(source = self.source, "{}", message);
        add_log(&self.logs, "INFO", self.source, message);
    }
}

/// 400 for unusable input, 500 for everything else.
fn error_response(err: &AppError) -> HttpResponse {
    if err.is_client_error() {
        HttpResponse::BadRequest().body(err.to_string())
    } else {
        HttpResponse::InternalServerError().body(err.to_string())
    }
}

#[derive(Deserialize)]
pub struct FileQuery {
    pub project_id: String,
    pub item_id: String,
}

impl From<FileQuery> for FileRef {
    fn from(query: FileQuery) -> Self {
        FileRef {
            project_id: query.project_id,
            item_id: query.item_id,
        }
    }
}

#[post("/type-parameters")]
async fn type_parameters(
    data: web::Data<HttpState>,
    req: web::Json<TypeParametersJob>,
) -> impl Responder {
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!(
            "Adding type parameters (project={} item={} rows={})",
            req.file.project_id,
            req.file.item_id,
            req.targets.len()
        ),
    );

    let progress = LogProgress::new(data.logs.clone(), "Automation");
    match data.app.type_parameters.execute(&req, &progress).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => {
            add_log(&data.logs, "ERROR", "HttpApi", &e.to_string());
            error_response(&e)
        }
    }
}

#[post("/ifc-export")]
async fn ifc_export(data: web::Data<HttpState>, req: web::Json<IfcExportJob>) -> impl Responder {
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!(
            "Exporting IFC (project={} item={} views={})",
            req.file.project_id,
            req.file.item_id,
            req.views.len()
        ),
    );

    let progress = LogProgress::new(data.logs.clone(), "IfcExport");
    match data.app.ifc_export.execute(&req, &progress).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => {
            add_log(&data.logs, "ERROR", "HttpApi", &e.to_string());
            error_response(&e)
        }
    }
}

#[post("/config-preview")]
async fn config_preview(req: web::Json<TypeParametersJob>) -> impl Responder {
    match TypeParametersUseCase::preview(&req) {
        Ok(configs) => HttpResponse::Ok().json(configs),
        Err(e) => error_response(&e),
    }
}

#[get("/views")]
async fn views(data: web::Data<HttpState>, query: web::Query<FileQuery>) -> impl Responder {
    let file: FileRef = query.into_inner().into();
    HttpResponse::Ok().json(data.app.views.view_names(&file).await)
}

#[get("/viewables")]
async fn viewables(data: web::Data<HttpState>, query: web::Query<FileQuery>) -> impl Responder {
    let file: FileRef = query.into_inner().into();
    match data.app.views.viewables(&file).await {
        Ok(viewables) => HttpResponse::Ok().json(viewables),
        Err(e) => {
            add_log(
                &data.logs,
                "WARN",
                "HttpApi",
                &format!("Could not fetch viewables: {}", e),
            );
            error_response(&e)
        }
    }
}

#[get("/inspect")]
async fn inspect(data: web::Data<HttpState>, query: web::Query<FileQuery>) -> impl Responder {
    let file: FileRef = query.into_inner().into();
    match data.app.views.inspect(&file).await {
        Ok(info) => HttpResponse::Ok().json(info),
        Err(e) => error_response(&e),
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data
        .logs
        .lock()
        .map(|logs| logs.clone())
        .unwrap_or_default();
    HttpResponse::Ok().json(logs)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(type_parameters)
            .service(ifc_export)
            .service(config_preview)
            .service(views)
            .service(viewables)
            .service(inspect)
            .service(get_logs),
    );
}

pub fn start_server(app: Arc<AppState>, logs: SharedLogs) -> std::io::Result<Server> {
    let host = app.config.http.host.clone();
    let port = app.config.http.port;
    let state = web::Data::new(HttpState { app, logs });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // local tool, any origin

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host.as_str(), port))?
    .run();

    info!(host = %host, port, "HTTP API listening");
    Ok(server)
}
