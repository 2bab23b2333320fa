use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::model::Amount;

pub const PREVIEW_ROWS: usize = 4;
pub const NO_ITEM_NAME_MESSAGE: &str = "Select an Item Name column!";

#[derive(Debug, Clone, PartialEq)]
pub enum CsvValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CsvValue {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Number(value),
            _ => Self::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for CsvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Number(value) => write!(f, "{}", Amount::new(*value)),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Ignore,
    ItemName,
    ItemQuantity,
}

impl ColumnRole {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ignore => "Ignore",
            Self::ItemName => "Item Name",
            Self::ItemQuantity => "Item Quantity",
        }
    }

    fn offered_for(field_type: FieldType) -> &'static [ColumnRole] {
        match field_type {
            FieldType::Number => &[Self::Ignore, Self::ItemName, Self::ItemQuantity],
            FieldType::Text => &[Self::Ignore, Self::ItemName],
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse csv: {0}")]
    Parse(#[from] csv::Error),
    #[error("csv header row is required")]
    MissingHeader,
    #[error("{message}")]
    Validation { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    #[error("column '{field}' does not exist")]
    UnknownColumn { field: String },
    #[error("column '{field}' cannot be used as {role}")]
    Unavailable { field: String, role: ColumnRole },
    #[error("column '{holder}' already holds Item Quantity")]
    QuantityTaken { holder: String },
}

/// A parsed delimited file, held only for the duration of an import.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedCsv {
    fields: Vec<String>,
    rows: Vec<Vec<CsvValue>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvPreview {
    pub fields: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub caption: String,
}

impl StagedCsv {
    pub fn parse<R: Read>(reader: R, delimiter: u8) -> Result<Self, ImportError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);

        let fields: Vec<String> = reader
            .headers()?
            .iter()
            .map(|field| field.trim().to_string())
            .collect();
        if fields.iter().all(String::is_empty) {
            return Err(ImportError::MissingHeader);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row = (0..fields.len())
                .map(|index| {
                    record
                        .get(index)
                        .map(CsvValue::parse)
                        .unwrap_or(CsvValue::Empty)
                })
                .collect();
            rows.push(row);
        }

        tracing::debug!(fields = fields.len(), rows = rows.len(), "parsed csv");
        Ok(Self { fields, rows })
    }

    pub fn from_path(path: &Path, delimiter: Option<u8>) -> Result<Self, ImportError> {
        let file = File::open(path).map_err(|source| ImportError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(file, delimiter.unwrap_or_else(|| default_delimiter(path)))
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn value(&self, row: usize, field: &str) -> Option<&CsvValue> {
        let index = self.field_index(field)?;
        self.rows.get(row)?.get(index)
    }

    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|candidate| candidate == field)
    }

    /// Types are sampled from the first data row only.
    pub fn field_types(&self) -> Vec<FieldType> {
        let sample = self.rows.first();
        (0..self.fields.len())
            .map(|index| match sample.and_then(|row| row.get(index)) {
                Some(CsvValue::Number(_)) => FieldType::Number,
                _ => FieldType::Text,
            })
            .collect()
    }

    pub fn preview(&self) -> CsvPreview {
        let shown = self.rows.len().min(PREVIEW_ROWS);
        CsvPreview {
            fields: self.fields.clone(),
            rows: self.rows[..shown]
                .iter()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect(),
            caption: format!("Showing {shown} of {} Rows", self.rows.len()),
        }
    }

    pub fn column_roles(&self) -> ColumnRoles {
        ColumnRoles::new(self.fields.clone(), self.field_types())
    }

    pub fn map_rows(&self, plan: &ImportPlan) -> Vec<ImportedItem> {
        self.rows
            .iter()
            .map(|row| {
                let mut name = String::new();
                for index in &plan.name_fields {
                    if let Some(value) = row.get(*index) {
                        name.push_str(&value.to_string());
                    }
                    name.push(' ');
                }
                let amount = plan
                    .quantity_field
                    .and_then(|index| row.get(index))
                    .and_then(CsvValue::as_number)
                    .map(Amount::new);
                ImportedItem { name, amount }
            })
            .collect()
    }
}

fn default_delimiter(path: &Path) -> u8 {
    match path.extension().and_then(|value| value.to_str()) {
        Some(extension) if extension.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleOption {
    pub role: ColumnRole,
    pub enabled: bool,
}

/// Per-column role selectors. At most one column holds `ItemQuantity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRoles {
    fields: Vec<String>,
    types: Vec<FieldType>,
    roles: Vec<ColumnRole>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    pub field: String,
    pub role: ColumnRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPlan {
    pub name_fields: Vec<usize>,
    pub quantity_field: Option<usize>,
}

impl ImportPlan {
    /// Column positions come from the order of `selections`. Name columns
    /// are joined in that order.
    pub fn from_selections(selections: &[ColumnSelection]) -> Result<Self, ImportError> {
        let name_fields: Vec<usize> = selections
            .iter()
            .enumerate()
            .filter(|(_, selection)| selection.role == ColumnRole::ItemName)
            .map(|(index, _)| index)
            .collect();
        if name_fields.is_empty() {
            return Err(ImportError::Validation {
                message: NO_ITEM_NAME_MESSAGE.to_string(),
            });
        }

        let quantity_field = selections
            .iter()
            .position(|selection| selection.role == ColumnRole::ItemQuantity);
        Ok(Self {
            name_fields,
            quantity_field,
        })
    }
}

impl ColumnRoles {
    pub fn new(fields: Vec<String>, types: Vec<FieldType>) -> Self {
        let roles = vec![ColumnRole::Ignore; fields.len()];
        Self {
            fields,
            types,
            roles,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn role(&self, index: usize) -> Option<ColumnRole> {
        self.roles.get(index).copied()
    }

    pub fn field_type(&self, index: usize) -> Option<FieldType> {
        self.types.get(index).copied()
    }

    fn quantity_holder(&self) -> Option<usize> {
        self.roles
            .iter()
            .position(|role| *role == ColumnRole::ItemQuantity)
    }

    pub fn options(&self, index: usize) -> Vec<RoleOption> {
        let Some(field_type) = self.field_type(index) else {
            return Vec::new();
        };
        let holder = self.quantity_holder();
        ColumnRole::offered_for(field_type)
            .iter()
            .map(|role| RoleOption {
                role: *role,
                enabled: *role != ColumnRole::ItemQuantity
                    || holder.is_none_or(|holder| holder == index),
            })
            .collect()
    }

    pub fn set_role(&mut self, index: usize, role: ColumnRole) -> Result<(), RoleError> {
        let Some(field) = self.fields.get(index).cloned() else {
            return Err(RoleError::UnknownColumn {
                field: format!("#{index}"),
            });
        };

        let Some(option) = self.options(index).into_iter().find(|option| option.role == role)
        else {
            return Err(RoleError::Unavailable { field, role });
        };

        if !option.enabled {
            let holder = self
                .quantity_holder()
                .and_then(|holder| self.fields.get(holder).cloned())
                .unwrap_or_default();
            return Err(RoleError::QuantityTaken { holder });
        }

        self.roles[index] = role;
        Ok(())
    }

    pub fn set_role_by_field(&mut self, field: &str, role: ColumnRole) -> Result<(), RoleError> {
        let index = self
            .fields
            .iter()
            .position(|candidate| candidate == field)
            .ok_or_else(|| RoleError::UnknownColumn {
                field: field.to_string(),
            })?;
        self.set_role(index, role)
    }

    /// Moves the column to its next enabled option, wrapping to `Ignore`.
    pub fn cycle(&mut self, index: usize) -> Option<ColumnRole> {
        let options = self.options(index);
        let current = self.role(index)?;
        let start = options
            .iter()
            .position(|option| option.role == current)
            .unwrap_or(0);

        let next = (1..=options.len())
            .map(|step| options[(start + step) % options.len()])
            .find(|option| option.enabled)?;
        self.roles[index] = next.role;
        Some(next.role)
    }

    pub fn selections(&self) -> Vec<ColumnSelection> {
        self.fields
            .iter()
            .zip(&self.roles)
            .map(|(field, role)| ColumnSelection {
                field: field.clone(),
                role: *role,
            })
            .collect()
    }

    pub fn plan(&self) -> Result<ImportPlan, ImportError> {
        ImportPlan::from_selections(&self.selections())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportListEntry {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ImportedItem>>,
}

/// Body for the import endpoint: the item batch rides on an "Import"
/// addition list, followed by the "Start" and "End" placeholders.
pub fn import_payload(items: Vec<ImportedItem>) -> Vec<ImportListEntry> {
    vec![
        ImportListEntry {
            name: "Import".to_string(),
            kind: Some("AD".to_string()),
            items: Some(items),
        },
        ImportListEntry {
            name: "Start".to_string(),
            kind: None,
            items: None,
        },
        ImportListEntry {
            name: "End".to_string(),
            kind: None,
            items: None,
        },
    ]
}
