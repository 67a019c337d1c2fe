//! Data Management and OSS calls used to read inputs from and write results
//! to Autodesk Construction Cloud folders.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::http::{ApsHttp, JSON_API};
use super::DataManagementClient;
use crate::domain::acc::{SignedUpload, StorageObject, TipVersion};
use crate::domain::error::{AppError, Result};

const SIGNED_URL_MINUTES: &str = "60";

#[derive(Deserialize)]
struct JsonApiDocument {
    data: Value,
}

#[derive(Deserialize)]
struct SignedDownload {
    url: Option<String>,
}

pub struct DataManagementApi {
    http: ApsHttp,
}

impl DataManagementApi {
    pub fn new(http: ApsHttp) -> Self {
        Self { http }
    }

    async fn get_document(&self, segments: &[&str]) -> Result<Value> {
        let url = self.http.endpoint(segments);
        let document: JsonApiDocument = self
            .http
            .send_json(self.http.request(Method::GET, url))
            .await?;
        Ok(document.data)
    }

    fn oss_segments<'a>(object: &'a StorageObject, action: &'a str) -> [&'a str; 7] {
        [
            "oss",
            "v2",
            "buckets",
            object.bucket.as_str(),
            "objects",
            object.object.as_str(),
            action,
        ]
    }
}

fn relationship_id<'a>(data: &'a Value, relationship: &str) -> Option<&'a str> {
    data.pointer(&format!("/relationships/{}/data/id", relationship))
        .and_then(Value::as_str)
}

fn required_id(data: &Value, what: &str) -> Result<String> {
    data.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AppError::ParseError(format!("{} response has no id", what)))
}

#[async_trait]
impl DataManagementClient for DataManagementApi {
    async fn get_tip_version(&self, project_id: &str, item_id: &str) -> Result<TipVersion> {
        let data = self
            .get_document(&["data", "v1", "projects", project_id, "items", item_id, "tip"])
            .await?;

        Ok(TipVersion {
            urn: required_id(&data, "Tip version")?,
            display_name: data
                .pointer("/attributes/displayName")
                .and_then(Value::as_str)
                .unwrap_or("model")
                .to_string(),
            storage_urn: relationship_id(&data, "storage").map(str::to_string),
        })
    }

    async fn parent_folder(&self, project_id: &str, item_id: &str) -> Result<String> {
        let data = self
            .get_document(&["data", "v1", "projects", project_id, "items", item_id])
            .await?;
        relationship_id(&data, "parent")
            .map(str::to_string)
            .ok_or_else(|| AppError::NotFound(format!("Parent folder of item {}", item_id)))
    }

    async fn create_storage(
        &self,
        project_id: &str,
        folder_id: &str,
        file_name: &str,
    ) -> Result<String> {
        let url = self
            .http
            .endpoint(&["data", "v1", "projects", project_id, "storage"]);
        let body = json!({
            "jsonapi": { "version": "1.0" },
            "data": {
                "type": "objects",
                "attributes": { "name": file_name },
                "relationships": {
                    "target": { "data": { "type": "folders", "id": folder_id } }
                }
            }
        });
        let document: JsonApiDocument = self
            .http
            .send_json(
                self.http
                    .request(Method::POST, url)
                    .header("Content-Type", JSON_API)
                    .body(body.to_string()),
            )
            .await?;
        required_id(&document.data, "Storage")
    }

    async fn signed_download_url(&self, storage_urn: &str) -> Result<String> {
        let object = StorageObject::parse(storage_urn)?;
        let url = self
            .http
            .endpoint(&Self::oss_segments(&object, "signeds3download"));
        let signed: SignedDownload = self
            .http
            .send_json(
                self.http
                    .request(Method::GET, url)
                    .query(&[("minutesExpiration", SIGNED_URL_MINUTES)]),
            )
            .await?;
        signed
            .url
            .ok_or_else(|| AppError::ParseError("Signed download has no url".to_string()))
    }

    async fn begin_signed_upload(&self, storage_urn: &str) -> Result<SignedUpload> {
        let object = StorageObject::parse(storage_urn)?;
        let url = self
            .http
            .endpoint(&Self::oss_segments(&object, "signeds3upload"));
        let upload: SignedUpload = self
            .http
            .send_json(
                self.http
                    .request(Method::GET, url)
                    .query(&[("minutesExpiration", SIGNED_URL_MINUTES)]),
            )
            .await?;
        if upload.urls.is_empty() {
            return Err(AppError::ParseError(
                "Signed upload returned no urls".to_string(),
            ));
        }
        Ok(upload)
    }

    async fn complete_signed_upload(&self, storage_urn: &str, upload_key: &str) -> Result<()> {
        let object = StorageObject::parse(storage_urn)?;
        let url = self
            .http
            .endpoint(&Self::oss_segments(&object, "signeds3upload"));
        ApsHttp::send(
            self.http
                .request(Method::POST, url)
                .json(&json!({ "uploadKey": upload_key })),
        )
        .await?;
        Ok(())
    }

    async fn create_item(
        &self,
        project_id: &str,
        folder_id: &str,
        file_name: &str,
        storage_urn: &str,
    ) -> Result<String> {
        let url = self
            .http
            .endpoint(&["data", "v1", "projects", project_id, "items"]);
        let body = json!({
            "jsonapi": { "version": "1.0" },
            "data": {
                "type": "items",
                "attributes": {
                    "displayName": file_name,
                    "extension": { "type": "items:autodesk.bim360:File", "version": "1.0" }
                },
                "relationships": {
                    "tip": { "data": { "type": "versions", "id": "1" } },
                    "parent": { "data": { "type": "folders", "id": folder_id } }
                }
            },
            "included": [{
                "type": "versions",
                "id": "1",
                "attributes": {
                    "name": file_name,
                    "extension": { "type": "versions:autodesk.bim360:File", "version": "1.0" }
                },
                "relationships": {
                    "storage": { "data": { "type": "objects", "id": storage_urn } }
                }
            }]
        });

        let document: JsonApiDocument = self
            .http
            .send_json(
                self.http
                    .request(Method::POST, url)
                    .header("Content-Type", JSON_API)
                    .body(body.to_string()),
            )
            .await?;
        let item_id = required_id(&document.data, "Item")?;
        info!(
            item_id = %item_id,
            file_name = %file_name,
            folder_id = %folder_id,
            "ACC item created"
        );
        Ok(item_id)
    }
}
