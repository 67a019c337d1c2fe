use std::sync::Arc;
use tracing::{error, info};

use crate::application::use_cases::automation::AutomationContext;
use crate::application::use_cases::workitem_poller::PollSettings;
use crate::application::{IfcExportUseCase, ModelViewsUseCase, TypeParametersUseCase};
use crate::domain::error::Result;
use crate::infrastructure::aps_clients::ApsClients;
use crate::infrastructure::config::{AppConfig, ConfigService};

/// Everything the interfaces need to run workflows.
pub struct AppState {
    pub config: AppConfig,
    pub type_parameters: TypeParametersUseCase,
    pub ifc_export: IfcExportUseCase,
    pub views: ModelViewsUseCase,
}

pub fn build_state(config: AppConfig, token: &str) -> Result<Arc<AppState>> {
    let clients = ApsClients::from_config(&config, token)?;

    let context = Arc::new(AutomationContext {
        clients: clients.clone(),
        catalog: config.activities.clone(),
        default_revit_version: config.default_revit_version.clone(),
        poll: PollSettings::from(&config.polling),
    });

    Ok(Arc::new(AppState {
        type_parameters: TypeParametersUseCase::new(context.clone()),
        ifc_export: IfcExportUseCase::new(context),
        views: ModelViewsUseCase::new(clients),
        config,
    }))
}

/// Loads configuration, resolves the access token and wires the use cases.
pub fn setup() -> Result<Arc<AppState>> {
    let config = AppConfig::load().map_err(|err| {
        error!(error = %err, "Failed to load configuration");
        err
    })?;

    let token = ConfigService::new()
        .resolve_access_token(&config)
        .map_err(|err| {
            error!(error = %err, "Failed to resolve APS access token");
            err
        })?;

    info!(
        da_url = %config.aps.design_automation_url(),
        poll_interval_secs = config.polling.interval_secs,
        max_wait_secs = config.polling.max_wait_secs,
        "Configuration loaded"
    );

    build_state(config, &token)
}
