use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError(String),
    ParseError(String),
    ApiError {
        status: u16,
        body: String,
    },
    SecurityError(String),
    ConfigError(String),
    IoError(String),
    /// A work item reached a non-success terminal state, or the wait budget ran out.
    WorkItem {
        label: String,
        status: Option<String>,
        report_url: Option<String>,
    },
    Workflow {
        workflow: String,
        cause: Box<AppError>,
    },
}

impl AppError {
    /// Wraps any error into the single message shown to the user for a workflow.
    pub fn in_workflow(self, workflow: &str) -> Self {
        match self {
            AppError::Workflow { .. } => self,
            other => AppError::Workflow {
                workflow: workflow.to_string(),
                cause: Box::new(other),
            },
        }
    }

    /// True when the caller sent something unusable rather than the service failing.
    pub fn is_client_error(&self) -> bool {
        match self {
            AppError::ValidationError(_) | AppError::ParseError(_) => true,
            AppError::Workflow { cause, .. } => cause.is_client_error(),
            _ => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::ApiError { status, body } => write!(f, "API error ({}): {}", status, body),
            AppError::SecurityError(msg) => write!(f, "Security error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::WorkItem {
                label,
                status,
                report_url,
            } => {
                write!(
                    f,
                    "{} did not finish with success. Status: {}",
                    label,
                    status.as_deref().unwrap_or("None")
                )?;
                if let Some(url) = report_url {
                    write!(f, "\nReport URL: {}", url)?;
                }
                Ok(())
            }
            AppError::Workflow { workflow, cause } => write!(
                f,
                "Error in {} workflow: {}\n\nDetails:\n{:?}",
                workflow, cause, cause
            ),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workitem_message_with_report_url() {
        let err = AppError::WorkItem {
            label: "Automation".to_string(),
            status: Some("failedInstructions".to_string()),
            report_url: Some("https://example.com/report.txt".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Automation did not finish with success. Status: failedInstructions\nReport URL: https://example.com/report.txt"
        );
    }

    #[test]
    fn test_workitem_message_without_status() {
        let err = AppError::WorkItem {
            label: "IFC export".to_string(),
            status: None,
            report_url: None,
        };
        assert_eq!(
            err.to_string(),
            "IFC export did not finish with success. Status: None"
        );
    }

    #[test]
    fn test_in_workflow_wraps_once() {
        let err = AppError::NotFound("item".to_string())
            .in_workflow("Automation")
            .in_workflow("Other");
        assert_eq!(
            err.to_string(),
            "Error in Automation workflow: Not found: item\n\nDetails:\nNotFound(\"item\")"
        );
    }

    #[test]
    fn test_client_error_seen_through_workflow() {
        let invalid = AppError::ValidationError("no views".to_string()).in_workflow("IFC Export");
        assert!(invalid.is_client_error());

        let upstream = AppError::ApiError {
            status: 502,
            body: "bad gateway".to_string(),
        }
        .in_workflow("IFC Export");
        assert!(!upstream.is_client_error());
    }
}
