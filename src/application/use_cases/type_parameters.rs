use std::sync::Arc;
use tracing::error;

use super::automation::AutomationContext;
use super::progress::ProgressSink;
use super::workitem_poller::POLL_START_PERCENT;
use crate::domain::acc::output_file_name;
use crate::domain::activity::ActivityKind;
use crate::domain::error::{AppError, Result};
use crate::domain::job::{TypeParametersJob, WorkflowSummary};
use crate::domain::type_params::{
    group_parameter_rows, total_targets, validate_parameter_rows, TypeParameterConfig,
};
use crate::domain::workitem::{WorkItemArgument, WorkItemRequest};

const WORKFLOW: &str = "Automation";

/// Adds shared type parameters to Revit types and stores the updated model
/// next to the input.
pub struct TypeParametersUseCase {
    context: Arc<AutomationContext>,
}

impl TypeParametersUseCase {
    pub fn new(context: Arc<AutomationContext>) -> Self {
        Self { context }
    }

    /// Grouped configuration for a job, without touching the network.
    pub fn preview(job: &TypeParametersJob) -> Result<Vec<TypeParameterConfig>> {
        validate_parameter_rows(&job.targets)?;
        Ok(group_parameter_rows(&job.targets))
    }

    pub async fn execute(
        &self,
        job: &TypeParametersJob,
        progress: &dyn ProgressSink,
    ) -> Result<WorkflowSummary> {
        self.run(job, progress).await.map_err(|err| {
            error!(error = %err, item_id = %job.file.item_id, "Type parameters workflow failed");
            err.in_workflow(WORKFLOW)
        })
    }

    async fn run(
        &self,
        job: &TypeParametersJob,
        progress: &dyn ProgressSink,
    ) -> Result<WorkflowSummary> {
        progress.info("Starting Design Automation workflow with ACC...");
        progress.progress("Preparing files...", 5);

        if job.file.item_id.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Please select an input Revit file".to_string(),
            ));
        }
        validate_parameter_rows(&job.targets)?;

        let ctx = &self.context;
        let input = ctx
            .prepare_input(&job.file, ActivityKind::TypeParameters, progress)
            .await?;

        progress.progress("Generating parameter configuration...", 25);
        progress.info("Generating parameter configuration...");
        let config = group_parameter_rows(&job.targets);
        progress.info(&format!("   Adding {} parameter(s)", config.len()));

        let config_argument = WorkItemArgument::inline_json(&config, "revit_type_params.json")?;
        progress.progress("Attaching configuration to the work item...", 30);

        let output = ctx
            .reserve_output(
                &job.file.project_id,
                &input.folder_id,
                output_file_name(&input.version.name_stem(), None, "rvt"),
            )
            .await?;

        progress.info("Creating work item...");
        progress.progress(
            "Running Design Automation (this may take a few minutes)...",
            POLL_START_PERCENT,
        );
        let request =
            WorkItemRequest::new(input.activity.alias.clone(), input.activity.signature.clone())
                .argument(
                    "rvtFile",
                    WorkItemArgument::get(input.download_url.clone(), "input.rvt"),
                )
                .argument("configJson", config_argument)
                .argument(
                    "result",
                    WorkItemArgument::put(output.upload_url(), "output.rvt"),
                );

        let completed = ctx.run_workitem(&request, WORKFLOW, progress).await?;

        progress.info("Work item completed successfully!");
        progress.progress("Creating ACC item for output...", 92);
        progress.info("Creating ACC Item for the output...");
        let item_id = ctx
            .publish_output(&job.file.project_id, &input.folder_id, &output)
            .await?;

        progress.progress("Updated model ready for viewing!", 100);

        let report_url = completed.outcome.report_url.clone();
        let message = success_message(&config, &completed.workitem_id, report_url.as_deref());
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
    config: &[TypeParameterConfig],
    workitem_id: &str,
    report_url: Option<&str>,
) -> String {
    let mut message = format!(
        "Automation completed successfully!\n\n\
         Added parameters to Revit types:\n\
         - {} parameter configuration(s)\n\
         - Total targets: {}\n\n\
         Workitem ID: {}\n",
        config.len(),
        total_targets(config),
        workitem_id
    );
    if let Some(url) = report_url {
        message.push_str(&format!("\nReport URL: {}", url));
    }
    message
}
