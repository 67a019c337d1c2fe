//! Reading Model Derivative manifests.
//!
//! A manifest is kept as raw JSON: only a few fields matter here and the
//! vendor adds properties freely.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

static REVIT_YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)revit\D{0,8}((?:19|20)\d{2})").unwrap());

static BARE_YEAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*((?:19|20)\d{2})").unwrap());

/// A displayable view inside a translated model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewable {
    pub guid: String,
    pub name: String,
    pub role: String,
}

/// URL-safe base64 without padding, as the Model Derivative API expects.
pub fn encode_urn(urn: &str) -> String {
    URL_SAFE_NO_PAD.encode(urn.as_bytes())
}

pub fn manifest_status(manifest: &Value) -> &str {
    manifest
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
}

pub fn revit_version_from_manifest(manifest: &Value) -> Option<String> {
    let derivatives = manifest.get("derivatives")?.as_array()?;

    for derivative in derivatives {
        let Some(info) = derivative
            .get("properties")
            .and_then(|props| props.get("Document Information"))
        else {
            continue;
        };

        if let Some(version) = info.get("RVTVersion").and_then(year_from_value) {
            return Some(version);
        }

        if let Some(fields) = info.as_object() {
            for value in fields.values() {
                if let Some(text) = value.as_str() {
                    if let Some(captures) = REVIT_YEAR_PATTERN.captures(text) {
                        return Some(captures[1].to_string());
                    }
                }
            }
        }
    }

    None
}

fn year_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => number.as_u64().map(|year| year.to_string()),
        Value::String(text) => BARE_YEAR_PATTERN
            .captures(text)
            .map(|captures| captures[1].to_string()),
        _ => None,
    }
}

/// Names of all 2D and 3D geometry views, first occurrence wins.
pub fn view_names_from_manifest(manifest: &Value) -> Vec<String> {
    let mut seen = HashSet::new();
    viewables_from_manifest(manifest)
        .into_iter()
        .filter_map(|viewable| {
            if seen.insert(viewable.name.clone()) {
                Some(viewable.name)
            } else {
                None
            }
        })
        .collect()
}

pub fn viewables_from_manifest(manifest: &Value) -> Vec<Viewable> {
    let mut viewables = Vec::new();
    if let Some(derivatives) = manifest.get("derivatives").and_then(Value::as_array) {
        for derivative in derivatives {
            collect_viewables(derivative, &mut viewables);
        }
    }
    viewables
}

fn collect_viewables(node: &Value, out: &mut Vec<Viewable>) {
    let node_type = node.get("type").and_then(Value::as_str);
    let role = node.get("role").and_then(Value::as_str);

    if node_type == Some("geometry") && matches!(role, Some("3d") | Some("2d")) {
        if let Some(name) = node.get("name").and_then(Value::as_str) {
            out.push(Viewable {
                guid: node
                    .get("guid")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                name: name.to_string(),
                role: role.unwrap_or_default().to_string(),
            });
        }
    }

    if let Some(children) = node.get("children").and_then(Value::as_array) {
        for child in children {
            collect_viewables(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_manifest() -> Value {
        json!({
            "status": "success",
            "progress": "complete",
            "derivatives": [{
                "name": "model.rvt",
                "outputType": "svf",
                "properties": {
                    "Document Information": {
                        "RVTVersion": "2023",
                        "Project Name": "Pile foundations"
                    }
                },
                "children": [
                    {
                        "type": "geometry",
                        "role": "3d",
                        "name": "{3D}",
                        "guid": "g-1",
                        "children": [
                            {"type": "resource", "role": "graphics", "guid": "r-1"}
                        ]
                    },
                    {"type": "geometry", "role": "2d", "name": "Level 1", "guid": "g-2"},
                    {"type": "geometry", "role": "3d", "name": "{3D}", "guid": "g-3"},
                    {"type": "folder", "name": "Sheets", "children": [
                        {"type": "geometry", "role": "2d", "name": "A101 - Plan", "guid": "g-4"}
                    ]}
                ]
            }]
        })
    }

    #[test]
    fn test_encode_urn_is_unpadded_url_safe() {
        let encoded = encode_urn("urn:adsk.wipprod:fs.file:vf.abc?version=1");
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert_eq!(
            URL_SAFE_NO_PAD.decode(encoded).unwrap(),
            b"urn:adsk.wipprod:fs.file:vf.abc?version=1"
        );
    }

    #[test]
    fn test_revit_version_from_document_information() {
        assert_eq!(
            revit_version_from_manifest(&sample_manifest()).as_deref(),
            Some("2023")
        );
    }

    #[test]
    fn test_revit_version_numeric() {
        let manifest = json!({
            "derivatives": [{"properties": {"Document Information": {"RVTVersion": 2025}}}]
        });
        assert_eq!(revit_version_from_manifest(&manifest).as_deref(), Some("2025"));
    }

    #[test]
    fn test_revit_version_from_free_text() {
        let manifest = json!({"derivatives": [{"properties": {"Document Information": {
            "Generator": "Autodesk Revit 2022 (Build: 22.1.0.0)"
        }}}]});
        assert_eq!(revit_version_from_manifest(&manifest).as_deref(), Some("2022"));
    }

    #[test]
    fn test_revit_version_missing() {
        assert_eq!(revit_version_from_manifest(&json!({"status": "pending"})), None);
        assert_eq!(
            revit_version_from_manifest(&json!({"derivatives": [{"name": "x"}]})),
            None
        );
    }

    #[test]
    fn test_view_names_deduplicated_in_order() {
        assert_eq!(
            view_names_from_manifest(&sample_manifest()),
            vec!["{3D}", "Level 1", "A101 - Plan"]
        );
    }

    #[test]
    fn test_viewables_keep_guid_and_role() {
        let viewables = viewables_from_manifest(&sample_manifest());
        assert_eq!(viewables.len(), 4);
        assert_eq!(
            viewables[1],
            Viewable {
                guid: "g-2".to_string(),
                name: "Level 1".to_string(),
                role: "2d".to_string()
            }
        );
    }

    #[test]
    fn test_manifest_status_default() {
        assert_eq!(manifest_status(&sample_manifest()), "success");
        assert_eq!(manifest_status(&json!({})), "unknown");
    }
}
