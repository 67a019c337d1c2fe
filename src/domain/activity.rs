use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::error::{AppError, Result};

pub const DEFAULT_REVIT_VERSION: &str = "2024";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    TypeParameters,
    IfcExport,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityKind::TypeParameters => f.write_str("type parameters"),
            ActivityKind::IfcExport => f.write_str("IFC export"),
        }
    }
}

/// One activity published once per Revit engine version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityFamily {
    /// Full alias with a `{version}` placeholder, e.g. `Owner.AddTypeParameters{version}+prod`.
    pub alias_template: String,
    pub supported_versions: Vec<String>,
    /// Public activity signatures keyed by Revit version.
    #[serde(default)]
    pub signatures: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityCatalog {
    pub type_parameters: ActivityFamily,
    pub ifc_export: ActivityFamily,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityBinding {
    pub alias: String,
    pub signature: Option<String>,
    pub engine_version: String,
}

impl Default for ActivityCatalog {
    fn default() -> Self {
        let versions: Vec<String> = ["2022", "2023", "2024", "2025"]
            .iter()
            .map(|version| version.to_string())
            .collect();
        Self {
            type_parameters: ActivityFamily {
                alias_template: "ApsFlow.AddTypeParameters{version}+prod".to_string(),
                supported_versions: versions.clone(),
                signatures: BTreeMap::new(),
            },
            ifc_export: ActivityFamily {
                alias_template: "ApsFlow.IfcExport{version}+prod".to_string(),
                supported_versions: versions,
                signatures: BTreeMap::new(),
            },
        }
    }
}

impl ActivityCatalog {
    pub fn family(&self, kind: ActivityKind) -> &ActivityFamily {
        match kind {
            ActivityKind::TypeParameters => &self.type_parameters,
            ActivityKind::IfcExport => &self.ifc_export,
        }
    }

    /// Picks the engine for a model's Revit version.
    ///
    /// Revit opens (and upgrades) files from older releases, so a model whose
    /// version has no activity runs on the nearest newer engine.
    pub fn resolve(&self, kind: ActivityKind, revit_version: &str) -> Result<ActivityBinding> {
        let family = self.family(kind);
        let requested = revit_version.trim();

        let engine_version = if family.supported_versions.iter().any(|v| v == requested) {
            requested.to_string()
        } else {
            let wanted: u32 = requested.parse().map_err(|_| {
                AppError::ValidationError(format!("Invalid Revit version '{}'", requested))
            })?;
            family
                .supported_versions
                .iter()
                .filter_map(|v| v.parse::<u32>().ok().map(|year| (year, v)))
                .filter(|(year, _)| *year > wanted)
                .min_by_key(|(year, _)| *year)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| {
                    AppError::ValidationError(format!(
                        "No {} activity supports Revit {} (supported: {})",
                        kind,
                        requested,
                        family.supported_versions.join(", ")
                    ))
                })?
        };

        Ok(ActivityBinding {
            alias: family.alias_template.replace("{version}", &engine_version),
            signature: family.signatures.get(&engine_version).cloned(),
            engine_version,
        })
    }
}
