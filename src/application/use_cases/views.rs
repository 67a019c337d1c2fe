use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::acc::FileRef;
use crate::domain::error::Result;
use crate::domain::manifest::{
    encode_urn, manifest_status, revit_version_from_manifest, view_names_from_manifest,
    viewables_from_manifest, Viewable,
};
use crate::infrastructure::aps_clients::ApsClients;

const VIEW_CACHE_LIMIT: usize = 64;

/// View names per version URN; the oldest version is evicted first.
struct ViewCache {
    entries: HashMap<String, Vec<String>>,
    order: VecDeque<String>,
    max_size: usize,
}

impl ViewCache {
    fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_size,
        }
    }

    fn get(&self, version_urn: &str) -> Option<Vec<String>> {
        self.entries.get(version_urn).cloned()
    }

    fn insert(&mut self, version_urn: String, names: Vec<String>) {
        if self.entries.insert(version_urn.clone(), names).is_some() {
            return;
        }
        self.order.push_back(version_urn);
        while self.order.len() > self.max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub version_urn: String,
    pub encoded_urn: String,
    pub display_name: String,
    pub manifest_status: String,
    pub revit_version: Option<String>,
}

/// Read-only questions about a model: its views, viewables and version.
pub struct ModelViewsUseCase {
    clients: ApsClients,
    view_cache: Mutex<ViewCache>,
}

impl ModelViewsUseCase {
    pub fn new(clients: ApsClients) -> Self {
        Self::with_cache_limit(clients, VIEW_CACHE_LIMIT)
    }

    pub fn with_cache_limit(clients: ApsClients, max_cached_versions: usize) -> Self {
        Self {
            clients,
            view_cache: Mutex::new(ViewCache::new(max_cached_versions.max(1))),
        }
    }

    /// View names of the latest version; empty when anything goes wrong.
    pub async fn view_names(&self, file: &FileRef) -> Vec<String> {
        match self.try_view_names(file).await {
            Ok(names) => names,
            Err(err) => {
                warn!(error = %err, item_id = %file.item_id, "Error getting view names");
                Vec::new()
            }
        }
    }

    async fn try_view_names(&self, file: &FileRef) -> Result<Vec<String>> {
        let version = self
            .clients
            .data_management
            .get_tip_version(&file.project_id, &file.item_id)
            .await?;

        if let Some(names) = self.cached(&version.urn) {
            debug!(version_urn = %version.urn, "View names served from cache");
            return Ok(names);
        }

        let manifest = self
            .clients
            .model_derivative
            .fetch_manifest(&version.urn)
            .await?;
        let names = view_names_from_manifest(&manifest);
        self.remember(version.urn, names.clone());
        Ok(names)
    }

    fn remember(&self, version_urn: String, names: Vec<String>) {
        if let Ok(mut cache) = self.view_cache.lock() {
            cache.insert(version_urn, names);
        }
    }

    fn cached(&self, version_urn: &str) -> Option<Vec<String>> {
        self.view_cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(version_urn))
    }

    pub async fn viewables(&self, file: &FileRef) -> Result<Vec<Viewable>> {
        let version = self
            .clients
            .data_management
            .get_tip_version(&file.project_id, &file.item_id)
            .await?;
        let manifest = self
            .clients
            .model_derivative
            .fetch_manifest(&version.urn)
            .await?;
        Ok(viewables_from_manifest(&manifest))
    }

    /// Manifest problems are reported in the result rather than as an error.
    pub async fn inspect(&self, file: &FileRef) -> Result<ModelInfo> {
        let version = self
            .clients
            .data_management
            .get_tip_version(&file.project_id, &file.item_id)
            .await?;

        let (status, revit_version) = match self
            .clients
            .model_derivative
            .fetch_manifest(&version.urn)
            .await
        {
            Ok(manifest) => (
                manifest_status(&manifest).to_string(),
                revit_version_from_manifest(&manifest),
            ),
            Err(err) => {
                warn!(error = %err, version_urn = %version.urn, "Could not retrieve model info");
                (format!("unavailable ({})", err), None)
            }
        };

        Ok(ModelInfo {
            encoded_urn: encode_urn(&version.urn),
            version_urn: version.urn,
            display_name: version.display_name,
            manifest_status: status,
            revit_version,
        })
    }
}
