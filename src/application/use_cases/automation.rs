//! Steps shared by every Design Automation workflow: locate the input model,
//! pick the engine, reserve the output, run the work item and publish the result.

use tracing::{info, warn};

use super::progress::ProgressSink;
use super::workitem_poller::{poll_until_terminal, PollOutcome, PollSettings};
use crate::domain::acc::{FileRef, SignedUpload, TipVersion};
use crate::domain::activity::{ActivityBinding, ActivityCatalog, ActivityKind};
use crate::domain::error::{AppError, Result};
use crate::domain::manifest::revit_version_from_manifest;
use crate::domain::workitem::WorkItemRequest;
use crate::infrastructure::aps_clients::ApsClients;

pub struct AutomationContext {
    pub clients: ApsClients,
    pub catalog: ActivityCatalog,
    pub default_revit_version: String,
    pub poll: PollSettings,
}

/// The input model, where it lives and how the engine downloads it.
pub struct PreparedInput {
    pub version: TipVersion,
    pub folder_id: String,
    pub download_url: String,
    pub activity: ActivityBinding,
}

pub struct ReservedOutput {
    pub file_name: String,
    pub storage_urn: String,
    pub upload: SignedUpload,
}

impl ReservedOutput {
    pub fn upload_url(&self) -> &str {
        self.upload.urls.first().map(String::as_str).unwrap_or_default()
    }
}

pub struct CompletedWorkItem {
    pub workitem_id: String,
    pub outcome: PollOutcome,
}

impl AutomationContext {
    /// Revit version recorded in the model's manifest, or the configured default.
    pub async fn detect_revit_version(
        &self,
        version_urn: &str,
        progress: &dyn ProgressSink,
    ) -> String {
        progress.info("Detecting Revit version from model...");
        match self
            .clients
            .model_derivative
            .fetch_manifest(version_urn)
            .await
        {
            Ok(manifest) => match revit_version_from_manifest(&manifest) {
                Some(version) => {
                    progress.info(&format!("Detected Revit Version: {}", version));
                    version
                }
                None => {
                    progress.info(&format!(
                        "Could not detect Revit version, using default: {}",
                        self.default_revit_version
                    ));
                    self.default_revit_version.clone()
                }
            },
            Err(err) => {
                warn!(error = %err, version_urn = %version_urn, "Manifest lookup failed");
                progress.info(&format!(
                    "Error detecting Revit version: {}, using default: {}",
                    err, self.default_revit_version
                ));
                self.default_revit_version.clone()
            }
        }
    }

    pub async fn prepare_input(
        &self,
        file: &FileRef,
        kind: ActivityKind,
        progress: &dyn ProgressSink,
    ) -> Result<PreparedInput> {
        progress.info(&format!("Project ID: {}", file.project_id));
        let dm = &self.clients.data_management;

        let version = dm.get_tip_version(&file.project_id, &file.item_id).await?;
        let revit_version = self.detect_revit_version(&version.urn, progress).await;

        let activity = self.catalog.resolve(kind, &revit_version)?;
        progress.info(&format!(
            "Using activity: {} for Revit {}",
            activity.alias, revit_version
        ));

        progress.info("Resolving target folder from input file location...");
        progress.progress("Setting up Design Automation with ACC...", 15);

        let storage_urn = version.storage_urn.clone().ok_or_else(|| {
            AppError::NotFound(format!("Storage location of version {}", version.urn))
        })?;
        progress.info("Setting up input Revit file from ACC...");
        let download_url = dm.signed_download_url(&storage_urn).await?;

        let folder_id = dm.parent_folder(&file.project_id, &file.item_id).await?;
        progress.info(&format!("Target folder resolved: {}", folder_id));

        Ok(PreparedInput {
            version,
            folder_id,
            download_url,
            activity,
        })
    }

    pub async fn reserve_output(
        &self,
        project_id: &str,
        folder_id: &str,
        file_name: String,
    ) -> Result<ReservedOutput> {
        let dm = &self.clients.data_management;
        let storage_urn = dm.create_storage(project_id, folder_id, &file_name).await?;
        let upload = dm.begin_signed_upload(&storage_urn).await?;
        Ok(ReservedOutput {
            file_name,
            storage_urn,
            upload,
        })
    }

    /// Submits the work item and waits for a successful finish.
    pub async fn run_workitem(
        &self,
        request: &WorkItemRequest,
        label: &str,
        progress: &dyn ProgressSink,
    ) -> Result<CompletedWorkItem> {
        let workitem_id = self
            .clients
            .design_automation
            .submit_workitem(request)
            .await?;
        progress.info(&format!("Workitem ID: {}", workitem_id));

        progress.info("Polling workitem status...");
        let outcome = poll_until_terminal(
            self.clients.design_automation.as_ref(),
            &workitem_id,
            self.poll,
            progress,
        )
        .await?
        .into_success(label)?;

        info!(
            workitem_id = %workitem_id,
            elapsed_secs = outcome.elapsed.as_secs(),
            "Work item succeeded"
        );
        Ok(CompletedWorkItem {
            workitem_id,
            outcome,
        })
    }

    /// Finalizes the upload and registers the file as a new item in the folder.
    pub async fn publish_output(
        &self,
        project_id: &str,
        folder_id: &str,
        output: &ReservedOutput,
    ) -> Result<String> {
        let dm = &self.clients.data_management;
        dm.complete_signed_upload(&output.storage_urn, &output.upload.upload_key)
            .await?;
        dm.create_item(project_id, folder_id, &output.file_name, &output.storage_urn)
            .await
    }
}
