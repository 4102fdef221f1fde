//! Typed schemas for DIA catalogs.
//!
//! A [`Schema`] is an ordered list of named, typed fields plus an alias
//! table. Field lookups resolve aliases first, so a pipeline catalog can
//! expose `psFlux` as an alias for its own `base_PsfFlux_flux` column
//! without copying any data.
//!
//! The two canonical layouts live here as builders:
//! [`minimal_dia_object_schema`] for DIAObject summary records and
//! [`minimal_dia_source_schema`] for single-detection DIASource records.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Declared width of the `filterName` field.
pub const FILTER_NAME_WIDTH: usize = 10;

/// Closed set of storage types a schema field can carry.
///
/// `FixedString(n)` bounds the byte length of text values written to the
/// field; oversize values are rejected at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Int64,
    Float64,
    FixedString(usize),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int64 => write!(f, "Int64"),
            Self::Float64 => write!(f, "Float64"),
            Self::FixedString(width) => write!(f, "FixedString({width})"),
        }
    }
}

/// One named, typed slot in a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
}

/// Pre-resolved lookup handle for a field.
///
/// Obtained from [`Schema::find`]; valid only against records of the
/// schema that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHandle {
    pub index: usize,
    pub ty: FieldType,
}

/// Ordered field layout with name lookup and aliasing.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    aliases: HashMap<String, String>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Duplicate names are rejected.
    pub fn add_field(&mut self, name: impl Into<String>, ty: FieldType) -> CatalogResult<()> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(CatalogError::duplicate_field(name));
        }
        self.push_unchecked(&name, ty);
        Ok(())
    }

    fn push_unchecked(&mut self, name: &str, ty: FieldType) {
        self.index.insert(name.to_string(), self.fields.len());
        self.fields.push(Field {
            name: name.to_string(),
            ty,
        });
    }

    /// Canonical name for `name`, resolving one level of aliasing.
    fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Look up a field by name, resolving aliases.
    pub fn find(&self, name: &str) -> CatalogResult<FieldHandle> {
        let canonical = self.canonical(name);
        match self.index.get(canonical) {
            Some(&index) => Ok(FieldHandle {
                index,
                ty: self.fields[index].ty,
            }),
            None => Err(CatalogError::missing_field(name)),
        }
    }

    /// True if `name` resolves to a field, either directly or via alias.
    pub fn has_name(&self, name: &str) -> bool {
        self.index.contains_key(self.canonical(name))
    }

    /// True if every field of `other` is present here (aliases count)
    /// with the same declared type.
    pub fn contains(&self, other: &Schema) -> bool {
        other
            .fields
            .iter()
            .all(|field| matches!(self.find(&field.name), Ok(handle) if handle.ty == field.ty))
    }

    /// Register `alias` as another name for `target`.
    pub fn set_alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(alias.into(), target.into());
    }

    /// Canonical name an alias points at, if registered.
    pub fn alias_target(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Minimal schema for a DIAObject summary record.
///
/// Two base fields (`pixelId`, `nDiaSources`) plus three flux-statistic
/// fields per filter name. Duplicate filter names are rejected.
pub fn minimal_dia_object_schema<I, S>(filter_names: I) -> CatalogResult<Schema>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut schema = Schema::new();
    schema.add_field("pixelId", FieldType::Int64)?;
    schema.add_field("nDiaSources", FieldType::Int64)?;
    for filter_name in filter_names {
        let name = filter_name.as_ref();
        schema.add_field(format!("psFluxMean_{name}"), FieldType::Float64)?;
        schema.add_field(format!("psFluxMeanErr_{name}"), FieldType::Float64)?;
        schema.add_field(format!("psFluxSigma_{name}"), FieldType::Float64)?;
    }
    Ok(schema)
}

/// Minimal schema for a DIASource record: exactly six fixed fields.
pub fn minimal_dia_source_schema() -> Schema {
    let mut schema = Schema::new();
    for (name, ty) in [
        ("diaObjectId", FieldType::Int64),
        ("ccdVisitId", FieldType::Int64),
        ("psFlux", FieldType::Float64),
        ("psFluxErr", FieldType::Float64),
        ("filterName", FieldType::FixedString(FILTER_NAME_WIDTH)),
        ("filterId", FieldType::Int64),
    ] {
        schema.push_unchecked(name, ty);
    }
    schema
}
