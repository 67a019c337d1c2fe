use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use validator::{Validate, ValidationError};

use crate::domain::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterGroup {
    #[serde(rename = "PG_TEXT")]
    Text,
    #[serde(rename = "PG_DATA")]
    Data,
    #[serde(rename = "PG_IDENTITY_DATA")]
    IdentityData,
    #[serde(rename = "PG_GEOMETRY")]
    Geometry,
}

impl ParameterGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterGroup::Text => "PG_TEXT",
            ParameterGroup::Data => "PG_DATA",
            ParameterGroup::IdentityData => "PG_IDENTITY_DATA",
            ParameterGroup::Geometry => "PG_GEOMETRY",
        }
    }
}

impl fmt::Display for ParameterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the parameter table: which parameter to add to which Revit type.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ParameterRow {
    #[validate(custom(function = "not_blank"))]
    pub parameter_name: String,
    pub parameter_group: ParameterGroup,
    #[validate(custom(function = "not_blank"))]
    pub type_name: String,
    #[validate(custom(function = "not_blank"))]
    pub family_name: String,
    #[serde(default)]
    pub value: String,
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterTarget {
    pub type_name: String,
    pub family_name: String,
    pub value: String,
}

/// Payload entry consumed by the add-type-parameters activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TypeParameterConfig {
    pub parameter_name: String,
    pub parameter_group: ParameterGroup,
    pub targets: Vec<ParameterTarget>,
}

pub fn validate_parameter_rows(rows: &[ParameterRow]) -> Result<()> {
    if rows.is_empty() {
        return Err(AppError::ValidationError(
            "Please add at least one parameter row.".to_string(),
        ));
    }
    for (index, row) in rows.iter().enumerate() {
        row.validate().map_err(|err| {
            AppError::ValidationError(format!("Row {}: {}", index + 1, err))
        })?;
    }
    Ok(())
}

/// Groups flat rows by (parameter name, parameter group).
///
/// Groups keep the order in which their key first appears and targets keep
/// row order inside each group.
pub fn group_parameter_rows(rows: &[ParameterRow]) -> Vec<TypeParameterConfig> {
    let mut configs: Vec<TypeParameterConfig> = Vec::new();
    let mut index: HashMap<(&str, ParameterGroup), usize> = HashMap::new();

    for row in rows {
        let key = (row.parameter_name.as_str(), row.parameter_group);
        let target = ParameterTarget {
            type_name: row.type_name.clone(),
            family_name: row.family_name.clone(),
            value: row.value.clone(),
        };

        match index.get(&key) {
            Some(&position) => configs[position].targets.push(target),
            None => {
                index.insert(key, configs.len());
                configs.push(TypeParameterConfig {
                    parameter_name: row.parameter_name.clone(),
                    parameter_group: row.parameter_group,
                    targets: vec![target],
                });
            }
        }
    }

    configs
}

pub fn total_targets(configs: &[TypeParameterConfig]) -> usize {
    configs.iter().map(|config| config.targets.len()).sum()
}
