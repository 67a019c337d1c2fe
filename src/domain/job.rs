use serde::{Deserialize, Serialize};

use crate::domain::acc::FileRef;
use crate::domain::type_params::ParameterRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeParametersJob {
    #[serde(flatten)]
    pub file: FileRef,
    pub targets: Vec<ParameterRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfcExportJob {
    #[serde(flatten)]
    pub file: FileRef,
    #[serde(default)]
    pub views: Vec<String>,
}

/// Result of a workflow that ran to success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub workitem_id: String,
    pub report_url: Option<String>,
    pub output_file_name: String,
    pub output_item_id: Option<String>,
    pub message: String,
}
