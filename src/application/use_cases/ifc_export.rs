use std::sync::Arc;
use tracing::error;

use super::automation::AutomationContext;
use super::progress::ProgressSink;
use super::workitem_poller::POLL_START_PERCENT;
use crate::domain::acc::output_file_name;
use crate::domain::activity::ActivityKind;
use crate::domain::error::{AppError, Result};
use crate::domain::ifc_export::create_ifc_export_settings;
use crate::domain::job::{IfcExportJob, WorkflowSummary};
use crate::domain::workitem::{WorkItemArgument, WorkItemRequest};

const WORKFLOW: &str = "IFC Export";
const WORKITEM_LABEL: &str = "IFC export";

pub struct IfcExportUseCase {
    context: Arc<AutomationContext>,
}

impl IfcExportUseCase {
    pub fn new(context: Arc<AutomationContext>) -> Self {
        Self { context }
    }

    pub async fn execute(
        &self,
        job: &IfcExportJob,
        progress: &dyn ProgressSink,
    ) -> Result<WorkflowSummary> {
        self.run(job, progress).await.map_err(|err| {
            error!(error = %err, item_id = %job.file.item_id, "IFC export workflow failed");
            err.in_workflow(WORKFLOW)
        })
    }

    async fn run(
        &self,
        job: &IfcExportJob,
        progress: &dyn ProgressSink,
    ) -> Result<WorkflowSummary> {
        progress.info("Starting IFC Export workflow with ACC...");
        progress.progress("Preparing files...", 5);

        if job.file.item_id.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Please select the updated Revit file to export".to_string(),
            ));
        }
        let settings = create_ifc_export_settings(&job.views)?;

        let ctx = &self.context;
        let input = ctx
            .prepare_input(&job.file, ActivityKind::IfcExport, progress)
            .await?;

        progress.progress("Preparing IFC export settings...", 25);
        progress.info(&format!(
            "Creating IFC export configuration for {} view(s)...",
            settings.export_views.len()
        ));
        let settings_argument = WorkItemArgument::inline_json(&settings, "ifc_settings.json")?;
        progress.progress("Attaching IFC configuration to the work item...", 30);

        let output = ctx
            .reserve_output(
                &job.file.project_id,
                &input.folder_id,
                output_file_name(&input.version.name_stem(), Some("IFC"), "zip"),
            )
            .await?;

        progress.info("Creating IFC export work item...");
        progress.progress(
            "Running IFC Export (this may take a few minutes)...",
            POLL_START_PERCENT,
        );
        let request =
            WorkItemRequest::new(input.activity.alias.clone(), input.activity.signature.clone())
                .argument(
                    "rvtFile",
                    WorkItemArgument::get(input.download_url.clone(), "input.rvt"),
                )
                .argument("ifcSettings", settings_argument)
                .argument("result", WorkItemArgument::put(output.upload_url(), "result.zip"));

        let completed = ctx.run_workitem(&request, WORKITEM_LABEL, progress).await?;

        progress.info("IFC export completed successfully!");
        progress.progress("Creating ACC item for IFC output...", 92);
        progress.info("Creating ACC Item for the IFC export...");
        let item_id = ctx
            .publish_output(&job.file.project_id, &input.folder_id, &output)
            .await?;

        progress.progress("IFC export complete!", 100);

        let report_url = completed.outcome.report_url.clone();
        let message = success_message(
            &settings.export_views,
            &output.file_name,
            &completed.workitem_id,
            report_url.as_deref(),
        );
        progress.info(&message);

        Ok(WorkflowSummary {
            workitem_id: completed.workitem_id,
            report_url,
            output_file_name: output.file_name,
            output_item_id: Some(item_id),
            message,
        })
    }
}

fn success_message(
    views: &[String],
    output_file_name: &str,
    workitem_id: &str,
    report_url: Option<&str>,
) -> String {
    let mut message = format!(
        "IFC Export completed successfully!\n\n\
         Exported views: {}\n\
         - {}\n\n\
         Output file: {}\n\
         Workitem ID: {}\n",
        views.len(),
        views.join(", "),
        output_file_name,
        workitem_id
    );
    if let Some(url) = report_url {
        message.push_str(&format!("\nReport URL: {}", url));
    }
    message
}
