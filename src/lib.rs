//! Schema definitions and conversions between pipeline DIASource
//! catalogs and the minimal association/storage schema.
//!
//! The detection pipeline produces source catalogs with its own generic
//! column names (`base_PsfFlux_flux` and friends). The association stage
//! and the prompt-products store expect a small fixed schema per
//! DIASource, plus one CcdVisit row per detector-visit. This crate owns
//! that boundary:
//!
//! - [`minimal_dia_object_schema`] / [`minimal_dia_source_schema`] —
//!   canonical DIAObject and DIASource field layouts
//! - [`ccd_visit_columns`] — the persisted CcdVisit column layout
//! - [`ExposureMetadata`] — calibration, geometry, and timing pulled
//!   from one [`Exposure`]
//! - [`ensure_source_aliases`] / [`convert_dia_sources`] — alias
//!   reconciliation and the calibrated record-by-record copy
//!
//! Everything here is synchronous and value-like: schemas are rebuilt
//! per call, metadata lives for one conversion, and the only mutation of
//! shared state is the alias registration on the input catalog's schema.

pub mod catalog;
pub mod convert;
pub mod error;
pub mod exposure;
pub mod schema;
pub mod visit;

pub use catalog::{SourceCatalog, SourceRecord, Value};
pub use convert::{calibrated_flux, convert_dia_sources, ensure_source_aliases, OverwritePatch};
pub use error::{CatalogError, CatalogResult};
pub use exposure::{Exposure, ExposureMetadata, FilterInfo, PhotoCalib, SkyWcs, VisitInfo};
pub use schema::{
    minimal_dia_object_schema, minimal_dia_source_schema, Field, FieldHandle, FieldType, Schema,
    FILTER_NAME_WIDTH,
};
pub use visit::{ccd_visit_columns, SqlType, VisitColumn};
