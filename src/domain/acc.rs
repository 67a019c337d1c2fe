use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::error::{AppError, Result};

const STORAGE_URN_PREFIX: &str = "urn:adsk.objects:os.object:";

/// A file in an Autodesk Construction Cloud project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRef {
    pub project_id: String,
    /// Lineage URN of the item.
    pub item_id: String,
}

/// Latest version of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipVersion {
    pub urn: String,
    pub display_name: String,
    pub storage_urn: Option<String>,
}

impl TipVersion {
    /// Display name without its extension, used as the stem of output names.
    pub fn name_stem(&self) -> String {
        let stem = Path::new(&self.display_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        if stem.is_empty() {
            "model".to_string()
        } else {
            stem.to_string()
        }
    }
}

/// Bucket and object key behind a storage URN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageObject {
    pub bucket: String,
    pub object: String,
}

impl StorageObject {
    pub fn parse(storage_urn: &str) -> Result<Self> {
        let rest = storage_urn.strip_prefix(STORAGE_URN_PREFIX).ok_or_else(|| {
            AppError::ParseError(format!("Not a storage URN: {}", storage_urn))
        })?;
        match rest.split_once('/') {
            Some((bucket, object)) if !bucket.is_empty() && !object.is_empty() => Ok(Self {
                bucket: bucket.to_string(),
                object: object.to_string(),
            }),
            _ => Err(AppError::ParseError(format!(
                "Storage URN without bucket/object: {}",
                storage_urn
            ))),
        }
    }
}

/// Signed S3 upload slot handed out by OSS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUpload {
    pub upload_key: String,
    pub urls: Vec<String>,
}

pub fn output_file_name(stem: &str, marker: Option<&str>, extension: &str) -> String {
    let short_uuid: String = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
    match marker {
        Some(marker) => format!("{}_{}_{}.{}", stem, marker, short_uuid, extension),
        None => format!("{}_{}.{}", stem, short_uuid, extension),
    }
}
