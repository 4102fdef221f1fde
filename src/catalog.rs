//! In-memory source catalog: a [`Schema`] plus typed rows.
//!
//! This is the thin record store the conversion layer runs against.
//! Rows are validated against the schema on [`SourceCatalog::push`]
//! (arity and per-field type), reads go through pre-resolved
//! [`FieldHandle`]s, and iteration order is insertion order.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};
use crate::schema::{FieldHandle, FieldType, Schema};

/// One typed cell of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Short kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::Text(_) => "Text",
        }
    }

    /// True if this value may be stored in a field of type `ty`.
    /// Text must fit the declared fixed width.
    pub fn conforms_to(&self, ty: FieldType) -> bool {
        match (self, ty) {
            (Self::Int(_), FieldType::Int64) => true,
            (Self::Float(_), FieldType::Float64) => true,
            (Self::Text(s), FieldType::FixedString(width)) => s.len() <= width,
            _ => false,
        }
    }
}

/// One row of a [`SourceCatalog`].
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    values: Vec<Value>,
}

impl SourceRecord {
    /// Value at a pre-resolved field handle. The handle must come from
    /// this catalog's schema.
    pub fn get(&self, handle: FieldHandle) -> &Value {
        &self.values[handle.index]
    }
}

/// A schema plus its rows, in stable insertion order.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    schema: Schema,
    records: Vec<SourceRecord>,
}

impl SourceCatalog {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }

    /// Empty catalog pre-sized for `capacity` rows.
    pub fn with_capacity(schema: Schema, capacity: usize) -> Self {
        Self {
            schema,
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Handle for a field, resolving aliases.
    pub fn field(&self, name: &str) -> CatalogResult<FieldHandle> {
        self.schema.find(name)
    }

    /// Register a schema alias. The only schema mutation exposed;
    /// existing rows are untouched.
    pub fn set_alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.schema.set_alias(alias, target);
    }

    /// Append one row. Fails if the value count or any value type does
    /// not match the schema.
    pub fn push(&mut self, values: Vec<Value>) -> CatalogResult<()> {
        if values.len() != self.schema.len() {
            return Err(CatalogError::RecordArity {
                expected: self.schema.len(),
                got: values.len(),
            });
        }
        for (field, value) in self.schema.fields().iter().zip(&values) {
            if !value.conforms_to(field.ty) {
                return Err(CatalogError::type_mismatch(&field.name, field.ty, value.kind()));
            }
        }
        self.records.push(SourceRecord { values });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows in insertion order.
    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> CatalogResult<&SourceRecord> {
        self.records.get(index).ok_or(CatalogError::RecordIndex {
            index,
            len: self.records.len(),
        })
    }

    /// Value of one row's field, looked up by name.
    pub fn value(&self, index: usize, name: &str) -> CatalogResult<&Value> {
        let handle = self.schema.find(name)?;
        Ok(self.record(index)?.get(handle))
    }
}
