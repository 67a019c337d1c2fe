pub mod data_management;
pub mod design_automation;
pub mod http;
pub mod model_derivative;

use crate::domain::acc::{SignedUpload, TipVersion};
use crate::domain::error::Result;
use crate::domain::workitem::{WorkItemRequest, WorkItemStatusResponse};
use crate::infrastructure::config::AppConfig;
use async_trait::async_trait;
use data_management::DataManagementApi;
use design_automation::DesignAutomationApi;
use http::ApsHttp;
use model_derivative::ModelDerivativeApi;
use serde_json::Value;
use std::sync::Arc;

#[async_trait]
pub trait DesignAutomationClient: Send + Sync {
    /// Returns the id of the new work item.
    async fn submit_workitem(&self, request: &WorkItemRequest) -> Result<String>;
    async fn get_workitem_status(&self, id: &str) -> Result<WorkItemStatusResponse>;
}

#[async_trait]
pub trait DataManagementClient: Send + Sync {
    async fn get_tip_version(&self, project_id: &str, item_id: &str) -> Result<TipVersion>;
    async fn parent_folder(&self, project_id: &str, item_id: &str) -> Result<String>;
    /// Reserves an object in the folder's bucket and returns its storage URN.
    async fn create_storage(&self, project_id: &str, folder_id: &str, file_name: &str)
        -> Result<String>;
    async fn signed_download_url(&self, storage_urn: &str) -> Result<String>;
    async fn begin_signed_upload(&self, storage_urn: &str) -> Result<SignedUpload>;
    async fn complete_signed_upload(&self, storage_urn: &str, upload_key: &str) -> Result<()>;
    /// Returns the lineage URN of the new item.
    async fn create_item(
        &self,
        project_id: &str,
        folder_id: &str,
        file_name: &str,
        storage_urn: &str,
    ) -> Result<String>;
}

#[async_trait]
pub trait ModelDerivativeClient: Send + Sync {
    async fn fetch_manifest(&self, version_urn: &str) -> Result<Value>;
}

/// The three vendor APIs a workflow talks to.
#[derive(Clone)]
pub struct ApsClients {
    pub design_automation: Arc<dyn DesignAutomationClient>,
    pub data_management: Arc<dyn DataManagementClient>,
    pub model_derivative: Arc<dyn ModelDerivativeClient>,
}

impl ApsClients {
    pub fn from_config(config: &AppConfig, token: &str) -> Result<Self> {
        let timeout = config.aps.request_timeout();
        let platform = ApsHttp::new(&config.aps.base_url, token, timeout)?;
        let design_automation =
            ApsHttp::new(&config.aps.design_automation_url(), token, timeout)?;

        Ok(Self {
            design_automation: Arc::new(DesignAutomationApi::new(design_automation)),
            data_management: Arc::new(DataManagementApi::new(platform.clone())),
            model_derivative: Arc::new(ModelDerivativeApi::new(platform)),
        })
    }
}
