//! Conversion of pipeline DIASource catalogs to the association schema.
//!
//! The pipeline's detection catalogs carry their own generic column
//! names; the association stage expects the minimal DIASource schema.
//! [`ensure_source_aliases`] bridges the names, [`convert_dia_sources`]
//! performs the record-by-record copy, calibrating fluxes against the
//! exposure's zero point on the way through.

use crate::catalog::{SourceCatalog, SourceRecord, Value};
use crate::error::{CatalogError, CatalogResult};
use crate::exposure::{Exposure, ExposureMetadata};
use crate::schema::{minimal_dia_source_schema, FieldHandle, FieldType, Schema};

const GENERIC_FLUX: &str = "base_PsfFlux_flux";
const GENERIC_FLUX_ERR: &str = "base_PsfFlux_fluxSigma";

/// Register `psFlux`/`psFluxErr` aliases on a pipeline catalog if it
/// does not already satisfy the minimal DIASource schema.
///
/// Only acts when the generic flux columns exist and neither alias name
/// already resolves. Idempotent; mutates only the schema's alias table,
/// never the rows.
pub fn ensure_source_aliases(catalog: &mut SourceCatalog) {
    let schema = catalog.schema();
    if schema.contains(&minimal_dia_source_schema()) {
        return;
    }
    let has_generic = schema.has_name(GENERIC_FLUX) && schema.has_name(GENERIC_FLUX_ERR);
    let has_target = schema.has_name("psFlux") || schema.has_name("psFluxErr");
    if has_generic && !has_target {
        catalog.set_alias("psFlux", GENERIC_FLUX);
        catalog.set_alias("psFluxErr", GENERIC_FLUX_ERR);
    }
}

/// Calibrate a raw instrumental flux against a zero point.
///
/// Returns `(flux, error)` with the error propagated for a ratio with an
/// uncertain denominator:
/// `sqrt((rawErr/zp)^2 + (raw * zpErr / zp^2)^2)`.
pub fn calibrated_flux(
    raw_flux: f64,
    raw_flux_err: f64,
    zero_point: f64,
    zero_point_err: f64,
) -> (f64, f64) {
    let flux = raw_flux / zero_point;
    let err = ((raw_flux_err / zero_point).powi(2)
        + (raw_flux * zero_point_err / zero_point.powi(2)).powi(2))
    .sqrt();
    (flux, err)
}

/// Values that take precedence over the copied input fields for one
/// output record. Absent fields fall through to the plain copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverwritePatch {
    pub dia_object_id: Option<i64>,
    pub ccd_visit_id: Option<i64>,
    pub ps_flux: Option<f64>,
    pub ps_flux_err: Option<f64>,
    pub filter_name: Option<String>,
    pub filter_id: Option<i64>,
}

impl OverwritePatch {
    /// Patch value for a destination field, if this patch carries one.
    pub fn value_for(&self, field_name: &str) -> Option<Value> {
        match field_name {
            "diaObjectId" => self.dia_object_id.map(Value::Int),
            "ccdVisitId" => self.ccd_visit_id.map(Value::Int),
            "psFlux" => self.ps_flux.map(Value::Float),
            "psFluxErr" => self.ps_flux_err.map(Value::Float),
            "filterName" => self.filter_name.clone().map(Value::Text),
            "filterId" => self.filter_id.map(Value::Int),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Mapping from each destination field to the input field it is copied
/// from, resolved once per conversion so missing input fields surface
/// before any record is touched.
#[derive(Debug)]
struct CopyPlan {
    entries: Vec<(String, FieldHandle)>,
}

impl CopyPlan {
    fn build(dest: &Schema, src: &Schema) -> CatalogResult<Self> {
        let mut entries = Vec::with_capacity(dest.len());
        let mut missing = Vec::new();
        for field in dest.fields() {
            match src.find(&field.name) {
                Ok(handle) => entries.push((field.name.clone(), handle)),
                Err(_) => missing.push(field.name.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(CatalogError::MissingFields(missing));
        }
        Ok(Self { entries })
    }

    fn handle_for(&self, name: &str) -> CatalogResult<FieldHandle> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, handle)| *handle)
            .ok_or_else(|| CatalogError::missing_field(name))
    }
}

fn require_float(record: &SourceRecord, handle: FieldHandle, name: &str) -> CatalogResult<f64> {
    let value = record.get(handle);
    value
        .as_float()
        .ok_or_else(|| CatalogError::type_mismatch(name, FieldType::Float64, value.kind()))
}

fn build_patch(
    record: &SourceRecord,
    object_id: Option<i64>,
    meta: Option<&ExposureMetadata>,
    flux: FieldHandle,
    flux_err: FieldHandle,
) -> CatalogResult<OverwritePatch> {
    let mut patch = OverwritePatch {
        dia_object_id: object_id,
        ..Default::default()
    };

    if let Some(meta) = meta {
        let raw_flux = require_float(record, flux, "psFlux")?;
        let raw_flux_err = require_float(record, flux_err, "psFluxErr")?;
        let (ps_flux, ps_flux_err) = calibrated_flux(
            raw_flux,
            raw_flux_err,
            meta.flux_zero_point,
            meta.flux_zero_point_err,
        );
        patch.ps_flux = Some(ps_flux);
        patch.ps_flux_err = Some(ps_flux_err);
        patch.ccd_visit_id = Some(meta.ccd_visit_id);
        patch.filter_name = Some(meta.filter_name.clone());
        patch.filter_id = Some(meta.filter_id);
    }

    Ok(patch)
}

/// Convert a pipeline catalog into a fresh catalog with the minimal
/// DIASource schema.
///
/// Aliases are reconciled on the input first (its rows stay untouched).
/// If `object_ids` is given it must have one entry per input record;
/// each entry overwrites that record's `diaObjectId`. If `exposure` is
/// given, its metadata is extracted once and every record gets its flux
/// calibrated and its `ccdVisitId`/`filterName`/`filterId` overwritten.
/// With neither, the conversion is a pure schema remap.
///
/// # Errors
/// Fails if the input schema is missing any destination field (reported
/// batched), if `object_ids` has the wrong length, or if the exposure
/// lacks WCS or calibration.
pub fn convert_dia_sources(
    sources: &mut SourceCatalog,
    object_ids: Option<&[i64]>,
    exposure: Option<&Exposure>,
) -> CatalogResult<SourceCatalog> {
    let mut output = SourceCatalog::with_capacity(minimal_dia_source_schema(), sources.len());

    ensure_source_aliases(sources);

    if let Some(ids) = object_ids {
        if ids.len() != sources.len() {
            return Err(CatalogError::ObjectIdCount {
                expected: sources.len(),
                got: ids.len(),
            });
        }
    }

    let meta = match exposure {
        Some(exposure) => Some(ExposureMetadata::from_exposure(exposure)?),
        None => None,
    };

    let plan = CopyPlan::build(output.schema(), sources.schema())?;
    // Raw fluxes are read through the same handles the copy uses, so the
    // aliases registered above apply to both.
    let flux = plan.handle_for("psFlux")?;
    let flux_err = plan.handle_for("psFluxErr")?;

    for (index, record) in sources.records().iter().enumerate() {
        let object_id = object_ids.map(|ids| ids[index]);
        let patch = build_patch(record, object_id, meta.as_ref(), flux, flux_err)?;

        let mut values = Vec::with_capacity(plan.entries.len());
        for (name, handle) in &plan.entries {
            match patch.value_for(name) {
                Some(value) => values.push(value),
                None => values.push(record.get(*handle).clone()),
            }
        }
        output.push(values)?;
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn minimal_catalog(rows: &[(i64, i64, f64, f64, &str, i64)]) -> SourceCatalog {
        let mut catalog = SourceCatalog::new(minimal_dia_source_schema());
        for &(obj, visit, flux, flux_err, filter, filter_id) in rows {
            catalog
                .push(vec![
                    Value::Int(obj),
                    Value::Int(visit),
                    Value::Float(flux),
                    Value::Float(flux_err),
                    Value::Text(filter.into()),
                    Value::Int(filter_id),
                ])
                .unwrap();
        }
        catalog
    }

    fn pipeline_schema() -> Schema {
        let mut schema = Schema::new();
        schema.add_field("diaObjectId", FieldType::Int64).unwrap();
        schema.add_field("ccdVisitId", FieldType::Int64).unwrap();
        schema.add_field(GENERIC_FLUX, FieldType::Float64).unwrap();
        schema
            .add_field(GENERIC_FLUX_ERR, FieldType::Float64)
            .unwrap();
        schema
            .add_field("filterName", FieldType::FixedString(10))
            .unwrap();
        schema.add_field("filterId", FieldType::Int64).unwrap();
        schema
            .add_field("base_SdssCentroid_x", FieldType::Float64)
            .unwrap();
        schema
    }

    #[test]
    fn test_calibrated_flux_reference_values() {
        let (flux, err) = calibrated_flux(100.0, 10.0, 50.0, 1.0);
        assert_eq!(flux, 2.0);
        assert_abs_diff_eq!(err, (0.04f64 + 0.0016).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(err, 0.203_960_780_543_711_4, epsilon = 1e-12);
    }

    #[test]
    fn test_aliases_added_for_generic_fields() {
        let mut catalog = SourceCatalog::new(pipeline_schema());
        ensure_source_aliases(&mut catalog);

        assert_eq!(catalog.schema().alias_target("psFlux"), Some(GENERIC_FLUX));
        assert_eq!(
            catalog.schema().alias_target("psFluxErr"),
            Some(GENERIC_FLUX_ERR)
        );
    }

    #[test]
    fn test_aliases_idempotent() {
        let mut catalog = SourceCatalog::new(pipeline_schema());
        ensure_source_aliases(&mut catalog);
        let first = catalog.schema().clone();
        ensure_source_aliases(&mut catalog);

        assert!(catalog.schema().contains(&first));
        assert!(first.contains(catalog.schema()));
        assert_eq!(catalog.schema().alias_target("psFlux"), Some(GENERIC_FLUX));
    }

    #[test]
    fn test_aliases_noop_when_schema_already_minimal() {
        let mut catalog = minimal_catalog(&[]);
        ensure_source_aliases(&mut catalog);
        assert_eq!(catalog.schema().alias_target("psFlux"), None);
    }

    #[test]
    fn test_aliases_noop_without_generic_fields() {
        let mut schema = Schema::new();
        schema.add_field("someOtherFlux", FieldType::Float64).unwrap();
        let mut catalog = SourceCatalog::new(schema);
        ensure_source_aliases(&mut catalog);
        assert_eq!(catalog.schema().alias_target("psFlux"), None);
    }

    #[test]
    fn test_patch_value_precedence_names() {
        let patch = OverwritePatch {
            dia_object_id: Some(9),
            filter_name: Some("z".into()),
            ..Default::default()
        };
        assert_eq!(patch.value_for("diaObjectId"), Some(Value::Int(9)));
        assert_eq!(patch.value_for("filterName"), Some(Value::Text("z".into())));
        assert_eq!(patch.value_for("psFlux"), None);
        assert_eq!(patch.value_for("unknown"), None);
        assert!(!patch.is_empty());
        assert!(OverwritePatch::default().is_empty());
    }

    #[test]
    fn test_convert_pure_remap() {
        let mut input = minimal_catalog(&[(1, 10, 100.0, 5.0, "g", 1), (2, 10, 50.0, 2.5, "g", 1)]);
        let output = convert_dia_sources(&mut input, None, None).unwrap();

        assert_eq!(output.len(), input.len());
        for name in [
            "diaObjectId",
            "ccdVisitId",
            "psFlux",
            "psFluxErr",
            "filterName",
            "filterId",
        ] {
            for row in 0..output.len() {
                assert_eq!(
                    output.value(row, name).unwrap(),
                    input.value(row, name).unwrap(),
                    "{name} row {row}"
                );
            }
        }
    }

    #[test]
    fn test_convert_overwrites_object_id() {
        let mut input = minimal_catalog(&[(1, 10, 100.0, 5.0, "g", 1)]);
        let output = convert_dia_sources(&mut input, Some(&[7]), None).unwrap();
        assert_eq!(output.value(0, "diaObjectId").unwrap().as_int(), Some(7));
    }

    #[test]
    fn test_convert_object_id_count_mismatch() {
        let mut input = minimal_catalog(&[(1, 10, 100.0, 5.0, "g", 1), (2, 10, 50.0, 2.5, "g", 1)]);
        let err = convert_dia_sources(&mut input, Some(&[7]), None).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::ObjectIdCount {
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn test_convert_missing_fields_reported_batched() {
        let mut schema = Schema::new();
        schema.add_field("psFlux", FieldType::Float64).unwrap();
        schema.add_field("psFluxErr", FieldType::Float64).unwrap();
        let mut input = SourceCatalog::new(schema);

        let err = convert_dia_sources(&mut input, None, None).unwrap_err();
        match err {
            CatalogError::MissingFields(names) => {
                assert_eq!(names, ["diaObjectId", "ccdVisitId", "filterName", "filterId"]);
            }
            other => panic!("expected MissingFields, got {other}"),
        }
    }

    #[test]
    fn test_convert_leaves_input_rows_untouched() {
        let mut input = minimal_catalog(&[(1, 10, 100.0, 5.0, "g", 1)]);
        let before = input.records().to_vec();
        convert_dia_sources(&mut input, Some(&[99]), None).unwrap();
        assert_eq!(input.records(), before.as_slice());
    }
}
