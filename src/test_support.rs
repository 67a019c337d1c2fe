//! In-process fake of the APS endpoints used by the clients and workflows,
//! plus a progress sink that records what a workflow reported.

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use crate::application::use_cases::automation::AutomationContext;
use crate::application::use_cases::progress::ProgressSink;
use crate::application::use_cases::workitem_poller::PollSettings;
use crate::domain::manifest::encode_urn;
use crate::domain::workitem::JSON_DATA_URL_PREFIX;
use crate::infrastructure::aps_clients::ApsClients;
use crate::infrastructure::config::{ApsConfig, AppConfig};
use std::time::Duration;

pub const PROJECT_ID: &str = "b.project-1";
pub const ITEM_ID: &str = "urn:adsk.wipprod:dm.lineage:input";
pub const VERSION_URN: &str = "urn:adsk.wipprod:fs.file:vf.input?version=3";
pub const PARENT_FOLDER: &str = "urn:adsk.wipprod:fs.folder:co.parent";
pub const INPUT_STORAGE_URN: &str = "urn:adsk.objects:os.object:wip.dm.prod/input.rvt";
pub const WORKITEM_ID: &str = "wi-1";
pub const REPORT_URL: &str = "https://reports.example.com/wi-1.txt";

struct MockState {
    statuses: Mutex<VecDeque<String>>,
    manifest: Option<Value>,
    status_requests: Mutex<usize>,
    manifest_requests: Mutex<usize>,
    submitted: Mutex<Vec<Value>>,
    created_items: Mutex<Vec<Value>>,
    completed_uploads: Mutex<Vec<String>>,
    authorization: Mutex<Option<String>>,
}

pub struct MockAps {
    addr: SocketAddr,
    state: Arc<MockState>,
}

pub fn sample_manifest() -> Value {
    json!({
        "status": "success",
        "derivatives": [{
            "name": "Foundations.rvt",
            "properties": { "Document Information": { "RVTVersion": "2023" } },
            "children": [
                { "type": "geometry", "role": "3d", "name": "{3D}", "guid": "g-3d" },
                { "type": "geometry", "role": "2d", "name": "Level 1", "guid": "g-l1" }
            ]
        }]
    })
}

impl MockAps {
    /// Work item status requests walk through `statuses`; the last one repeats.
    pub async fn start(statuses: Vec<&str>) -> Self {
        Self::start_with(statuses, Some(sample_manifest())).await
    }

    /// `manifest: None` makes the manifest endpoint answer 404.
    pub async fn start_with(statuses: Vec<&str>, manifest: Option<Value>) -> Self {
        let state = Arc::new(MockState {
            statuses: Mutex::new(statuses.into_iter().map(str::to_string).collect()),
            manifest,
            status_requests: Mutex::new(0),
            manifest_requests: Mutex::new(0),
            submitted: Mutex::new(Vec::new()),
            created_items: Mutex::new(Vec::new()),
            completed_uploads: Mutex::new(Vec::new()),
            authorization: Mutex::new(None),
        });

        let server_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(server_state.clone()))
                .default_service(web::route().to(handle_request))
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn da_url(&self) -> String {
        format!("{}/da/us-east/v3", self.base_url())
    }

    pub fn submitted_workitems(&self) -> Vec<Value> {
        self.state.submitted.lock().unwrap().clone()
    }

    pub fn created_items(&self) -> Vec<Value> {
        self.state.created_items.lock().unwrap().clone()
    }

    pub fn completed_uploads(&self) -> Vec<String> {
        self.state.completed_uploads.lock().unwrap().clone()
    }

    pub fn status_requests(&self) -> usize {
        *self.state.status_requests.lock().unwrap()
    }

    pub fn manifest_requests(&self) -> usize {
        *self.state.manifest_requests.lock().unwrap()
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.state.authorization.lock().unwrap().clone()
    }
}

pub fn test_config(mock: &MockAps) -> AppConfig {
    AppConfig {
        access_token: Some("test-token".to_string()),
        aps: ApsConfig {
            base_url: mock.base_url(),
            da_region: "us-east".to_string(),
            request_timeout_secs: 5,
        },
        ..AppConfig::default()
    }
}

/// Context against the mock with a 1 ms poll interval and a 5 ms budget.
pub fn test_context(mock: &MockAps) -> AutomationContext {
    let config = test_config(mock);
    AutomationContext {
        clients: ApsClients::from_config(&config, "test-token").unwrap(),
        catalog: config.activities,
        default_revit_version: config.default_revit_version,
        poll: PollSettings {
            interval: Duration::from_millis(1),
            max_wait: Duration::from_millis(5),
        },
    }
}

/// Decodes the JSON document carried by an inline work item argument.
pub fn inline_json_payload(argument: &Value) -> Value {
    let url = argument["url"].as_str().unwrap();
    let encoded = url.strip_prefix(JSON_DATA_URL_PREFIX).unwrap();
    let decoded = percent_encoding::percent_decode_str(encoded)
        .decode_utf8()
        .unwrap();
    serde_json::from_str(&decoded).unwrap()
}

async fn handle_request(
    req: HttpRequest,
    body: web::Bytes,
    data: web::Data<Arc<MockState>>,
) -> HttpResponse {
    if let Some(value) = req
        .headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok())
    {
        *data.authorization.lock().unwrap() = Some(value.to_string());
    }

    let method = req.method().as_str().to_uppercase();
    let path = req.path().to_string();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let body_json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    match (method.as_str(), segments.as_slice()) {
        ("POST", ["da", _, "v3", "workitems"]) => {
            data.submitted.lock().unwrap().push(body_json);
            HttpResponse::Ok().json(json!({ "id": WORKITEM_ID, "status": "pending" }))
        }
        ("GET", ["da", _, "v3", "workitems", id]) if *id == WORKITEM_ID => {
            *data.status_requests.lock().unwrap() += 1;
            let mut statuses = data.statuses.lock().unwrap();
            let status = if statuses.len() > 1 {
                statuses.pop_front().unwrap_or_default()
            } else {
                statuses.front().cloned().unwrap_or_else(|| "pending".to_string())
            };
            HttpResponse::Ok().json(json!({
                "id": WORKITEM_ID,
                "status": status,
                "reportUrl": REPORT_URL
            }))
        }
        ("GET", ["data", "v1", "projects", project, "items", item, "tip"])
            if *project == PROJECT_ID && *item == ITEM_ID =>
        {
            HttpResponse::Ok().json(json!({
                "data": {
                    "type": "versions",
                    "id": VERSION_URN,
                    "attributes": { "displayName": "Foundations.rvt", "versionNumber": 3 },
                    "relationships": {
                        "storage": { "data": { "type": "objects", "id": INPUT_STORAGE_URN } }
                    }
                }
            }))
        }
        ("GET", ["data", "v1", "projects", project, "items", item])
            if *project == PROJECT_ID && *item == ITEM_ID =>
        {
            HttpResponse::Ok().json(json!({
                "data": {
                    "type": "items",
                    "id": ITEM_ID,
                    "relationships": {
                        "parent": { "data": { "type": "folders", "id": PARENT_FOLDER } },
                        "tip": { "data": { "type": "versions", "id": VERSION_URN } }
                    }
                }
            }))
        }
        ("POST", ["data", "v1", "projects", project, "storage"]) if *project == PROJECT_ID => {
            let name = body_json
                .pointer("/data/attributes/name")
                .and_then(Value::as_str)
                .unwrap_or("unnamed");
            HttpResponse::Created().json(json!({
                "data": {
                    "type": "objects",
                    "id": format!("urn:adsk.objects:os.object:wip.dm.prod/out-{}", name)
                }
            }))
        }
        ("POST", ["data", "v1", "projects", project, "items"]) if *project == PROJECT_ID => {
            data.created_items.lock().unwrap().push(body_json);
            HttpResponse::Created().json(json!({
                "data": { "type": "items", "id": "urn:adsk.wipprod:dm.lineage:created" }
            }))
        }
        ("GET", ["oss", "v2", "buckets", _, "objects", object, "signeds3download"]) => {
            HttpResponse::Ok().json(json!({
                "status": "complete",
                "url": format!("https://s3.example.com/{}", object)
            }))
        }
        ("GET", ["oss", "v2", "buckets", _, "objects", object, "signeds3upload"]) => {
            HttpResponse::Ok().json(json!({
                "uploadKey": "upload-key",
                "urls": [format!("https://s3.example.com/upload/{}", object)]
            }))
        }
        ("POST", ["oss", "v2", "buckets", _, "objects", object, "signeds3upload"]) => {
            let key = body_json
                .get("uploadKey")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            data.completed_uploads.lock().unwrap().push(key);
            HttpResponse::Ok().json(json!({ "objectKey": object }))
        }
        ("GET", ["modelderivative", "v2", "designdata", encoded, "manifest"])
            if *encoded == encode_urn(VERSION_URN) =>
        {
            *data.manifest_requests.lock().unwrap() += 1;
            match &data.manifest {
                Some(manifest) => HttpResponse::Ok().json(manifest),
                None => HttpResponse::NotFound().json(json!({ "diagnostic": "not translated" })),
            }
        }
        _ => HttpResponse::NotFound().json(json!({
            "error": "No mock route matched.",
            "method": method,
            "path": path
        })),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Progress(String, u8),
    Info(String),
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn percentages(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::Progress(_, percentage) => Some(percentage),
                ProgressEvent::Info(_) => None,
            })
            .collect()
    }

    fn push(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ProgressSink for RecordingProgress {
    fn progress(&self, message: &str, percentage: u8) {
        self.push(ProgressEvent::Progress(message.to_string(), percentage));
    }

    fn info(&self, message: &str) {
        self.push(ProgressEvent::Info(message.to_string()));
    }
}
