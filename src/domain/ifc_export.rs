use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IfcExportSettings {
    pub file_version: String,
    pub export_views: Vec<String>,
    pub space_boundaries: u8,
    pub export_base_quantities: bool,
    pub split_walls_and_columns: bool,
    pub include_site_elevation: bool,
    pub export_linked_files: bool,
    pub zip_output: bool,
}

impl Default for IfcExportSettings {
    fn default() -> Self {
        Self {
            file_version: "IFC2x3CV2".to_string(),
            export_views: Vec::new(),
            space_boundaries: 0,
            export_base_quantities: true,
            split_walls_and_columns: false,
            include_site_elevation: false,
            export_linked_files: false,
            zip_output: true,
        }
    }
}

/// Builds the settings document for the selected views.
pub fn create_ifc_export_settings(views: &[String]) -> Result<IfcExportSettings> {
    let mut seen = HashSet::new();
    let export_views: Vec<String> = views
        .iter()
        .map(|view| view.trim())
        .filter(|view| !view.is_empty())
        .filter(|view| seen.insert(view.to_string()))
        .map(str::to_string)
        .collect();

    if export_views.is_empty() {
        return Err(AppError::ValidationError(
            "Please select at least one view to export to IFC.".to_string(),
        ));
    }

    Ok(IfcExportSettings {
        export_views,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_a_view() {
        let err = create_ifc_export_settings(&[]).unwrap_err();
        assert!(err
            .to_string()
            .contains("Please select at least one view to export to IFC."));
        assert!(create_ifc_export_settings(&["  ".to_string()]).is_err());
    }

    #[test]
    fn test_views_trimmed_and_deduplicated() {
        let settings = create_ifc_export_settings(&[
            " {3D} ".to_string(),
            "Level 1".to_string(),
            "{3D}".to_string(),
        ])
        .unwrap();
        assert_eq!(settings.export_views, vec!["{3D}", "Level 1"]);
    }

    #[test]
    fn test_settings_field_names() {
        let value =
            serde_json::to_value(create_ifc_export_settings(&["{3D}".to_string()]).unwrap())
                .unwrap();
        assert_eq!(value["FileVersion"], "IFC2x3CV2");
        assert_eq!(value["ExportViews"][0], "{3D}");
        assert_eq!(value["ZipOutput"], true);
    }
}
