use thiserror::Error;

use crate::schema::FieldType;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate field name in schema: {name}")]
    DuplicateField { name: String },

    #[error("no field named '{name}' in schema")]
    MissingField { name: String },

    #[error("source schema is missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("value of kind {found} does not fit field '{name}' ({expected})")]
    TypeMismatch {
        name: String,
        expected: FieldType,
        found: &'static str,
    },

    #[error("record has {got} values but the schema defines {expected} fields")]
    RecordArity { expected: usize, got: usize },

    #[error("record index {index} out of range ({len} records)")]
    RecordIndex { index: usize, len: usize },

    #[error("object id list has {got} entries for {expected} source records")]
    ObjectIdCount { expected: usize, got: usize },

    #[error("exposure has no photometric calibration")]
    MissingCalib,

    #[error("exposure has no WCS")]
    MissingWcs,
}

impl CatalogError {
    pub fn duplicate_field(name: impl Into<String>) -> Self {
        Self::DuplicateField { name: name.into() }
    }

    pub fn missing_field(name: impl Into<String>) -> Self {
        Self::MissingField { name: name.into() }
    }

    pub fn type_mismatch(name: impl Into<String>, expected: FieldType, found: &'static str) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            expected,
            found,
        }
    }
}
