use async_trait::async_trait;
use reqwest::Method;
use tracing::info;

use super::http::ApsHttp;
use super::DesignAutomationClient;
use crate::domain::error::Result;
use crate::domain::workitem::{WorkItemCreated, WorkItemRequest, WorkItemStatusResponse};

pub struct DesignAutomationApi {
    http: ApsHttp,
}

impl DesignAutomationApi {
    pub fn new(http: ApsHttp) -> Self {
        Self { http }
    }
}

#[async_trait]
impl DesignAutomationClient for DesignAutomationApi {
    async fn submit_workitem(&self, request: &WorkItemRequest) -> Result<String> {
        let url = self.http.endpoint(&["workitems"]);
        let created: WorkItemCreated = self
            .http
            .send_json(self.http.request(Method::POST, url).json(request))
            .await?;

        info!(
            workitem_id = %created.id,
            activity = %request.activity_id,
            status = ?created.status.as_ref().map(|s| s.as_str()),
            "Work item submitted"
        );
        Ok(created.id)
    }

    async fn get_workitem_status(&self, id: &str) -> Result<WorkItemStatusResponse> {
        let url = self.http.endpoint(&["workitems", id]);
        self.http
            .send_json(self.http.request(Method::GET, url))
            .await
    }
}
