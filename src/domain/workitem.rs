use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const JSON_DATA_URL_PREFIX: &str = "data:application/json,";

/// Work item state as reported by Design Automation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkItemStatus {
    Pending,
    InProgress,
    Success,
    Failed,
    Cancelled,
    FailedDownload,
    FailedInstructions,
    FailedUpload,
    FailedUploadOptional,
    FailedLimitDataSize,
    FailedLimitProcessingTime,
    Other(String),
}

impl WorkItemStatus {
    pub fn as_str(&self) -> &str {
        match self {
            WorkItemStatus::Pending => "pending",
            WorkItemStatus::InProgress => "inprogress",
            WorkItemStatus::Success => "success",
            WorkItemStatus::Failed => "failed",
            WorkItemStatus::Cancelled => "cancelled",
            WorkItemStatus::FailedDownload => "failedDownload",
            WorkItemStatus::FailedInstructions => "failedInstructions",
            WorkItemStatus::FailedUpload => "failedUpload",
            WorkItemStatus::FailedUploadOptional => "failedUploadOptional",
            WorkItemStatus::FailedLimitDataSize => "failedLimitDataSize",
            WorkItemStatus::FailedLimitProcessingTime => "failedLimitProcessingTime",
            WorkItemStatus::Other(raw) => raw.as_str(),
        }
    }

    /// True once the work item will not change state again.
    pub fn is_terminal(&self) -> bool {
        match self {
            WorkItemStatus::Pending | WorkItemStatus::InProgress => false,
            WorkItemStatus::Other(raw) => raw.starts_with("failed"),
            _ => true,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, WorkItemStatus::Success)
    }
}

impl From<String> for WorkItemStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => WorkItemStatus::Pending,
            "inprogress" => WorkItemStatus::InProgress,
            "success" => WorkItemStatus::Success,
            "failed" => WorkItemStatus::Failed,
            "cancelled" => WorkItemStatus::Cancelled,
            "failedDownload" => WorkItemStatus::FailedDownload,
            "failedInstructions" => WorkItemStatus::FailedInstructions,
            "failedUpload" => WorkItemStatus::FailedUpload,
            "failedUploadOptional" => WorkItemStatus::FailedUploadOptional,
            "failedLimitDataSize" => WorkItemStatus::FailedLimitDataSize,
            "failedLimitProcessingTime" => WorkItemStatus::FailedLimitProcessingTime,
            _ => WorkItemStatus::Other(raw),
        }
    }
}

impl From<WorkItemStatus> for String {
    fn from(status: WorkItemStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for WorkItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemStatusResponse {
    pub id: String,
    pub status: WorkItemStatus,
    #[serde(default)]
    pub report_url: Option<String>,
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub stats: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Get,
    Put,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemArgument {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verb: Option<Verb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

impl WorkItemArgument {
    pub fn get(url: impl Into<String>, local_name: &str) -> Self {
        Self {
            url: url.into(),
            verb: Some(Verb::Get),
            local_name: Some(local_name.to_string()),
            headers: None,
        }
    }

    pub fn put(url: impl Into<String>, local_name: &str) -> Self {
        Self {
            url: url.into(),
            verb: Some(Verb::Put),
            local_name: Some(local_name.to_string()),
            headers: None,
        }
    }

    /// Passes a JSON document to the engine without uploading it anywhere.
    ///
    /// The body is percent-encoded so `#`, `%` and non-ASCII text survive.
    pub fn inline_json<T: Serialize>(content: &T, local_name: &str) -> serde_json::Result<Self> {
        let body = serde_json::to_string(content)?;
        Ok(Self::get(
            format!(
                "{}{}",
                JSON_DATA_URL_PREFIX,
                utf8_percent_encode(&body, NON_ALPHANUMERIC)
            ),
            local_name,
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemSignatures {
    pub activity_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemRequest {
    pub activity_id: String,
    pub arguments: BTreeMap<String, WorkItemArgument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signatures: Option<WorkItemSignatures>,
}

impl WorkItemRequest {
    pub fn new(activity_id: impl Into<String>, signature: Option<String>) -> Self {
        Self {
            activity_id: activity_id.into(),
            arguments: BTreeMap::new(),
            signatures: signature.map(|activity_id| WorkItemSignatures { activity_id }),
        }
    }

    pub fn argument(mut self, name: &str, argument: WorkItemArgument) -> Self {
        self.arguments.insert(name.to_string(), argument);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkItemCreated {
    pub id: String,
    #[serde(default)]
    pub status: Option<WorkItemStatus>,
}
