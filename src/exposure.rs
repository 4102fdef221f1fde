//! Per-exposure calibration metadata.
//!
//! [`Exposure`] is the thin value type standing in for one calibrated
//! detector-visit image: visit info, detector id, and filter are always
//! present; WCS and photometric calibration may be absent and their
//! accessors fail accordingly. [`ExposureMetadata`] is the flat mapping
//! the conversion layer reads once per batch, with the fields of one
//! CcdVisit row.

use serde::{Deserialize, Serialize};

use crate::catalog::Value;
use crate::error::{CatalogError, CatalogResult};

const NSEC_PER_SEC: f64 = 1.0e9;

/// Visit-level bookkeeping for one exposure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisitInfo {
    /// Unique id of this detector-visit.
    pub exposure_id: i64,
    /// Exposure duration in seconds.
    pub exposure_time_s: f64,
    /// Exposure midpoint timestamp in nanoseconds.
    pub date_nsec: i64,
}

/// Sky solution for one exposure; only the reference point is needed here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyWcs {
    crval_ra_deg: f64,
    crval_dec_deg: f64,
}

impl SkyWcs {
    pub fn new(crval_ra_deg: f64, crval_dec_deg: f64) -> Self {
        Self {
            crval_ra_deg,
            crval_dec_deg,
        }
    }

    /// Sky origin as (RA, Dec) in degrees.
    pub fn sky_origin(&self) -> (f64, f64) {
        (self.crval_ra_deg, self.crval_dec_deg)
    }
}

/// Photometric zero point: flux of a zero-magnitude source, with error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoCalib {
    pub flux_mag0: f64,
    pub flux_mag0_err: f64,
}

/// Photometric band the exposure was taken in.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterInfo {
    pub name: String,
    pub id: i64,
}

impl FilterInfo {
    pub fn new(name: impl Into<String>, id: i64) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// One calibrated detector-visit image, reduced to the metadata the
/// conversion layer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Exposure {
    visit_info: VisitInfo,
    detector_id: i64,
    filter: FilterInfo,
    wcs: Option<SkyWcs>,
    photo_calib: Option<PhotoCalib>,
}

impl Exposure {
    pub fn new(visit_info: VisitInfo, detector_id: i64, filter: FilterInfo) -> Self {
        Self {
            visit_info,
            detector_id,
            filter,
            wcs: None,
            photo_calib: None,
        }
    }

    pub fn with_wcs(mut self, wcs: SkyWcs) -> Self {
        self.wcs = Some(wcs);
        self
    }

    pub fn with_photo_calib(mut self, photo_calib: PhotoCalib) -> Self {
        self.photo_calib = Some(photo_calib);
        self
    }

    pub fn visit_info(&self) -> &VisitInfo {
        &self.visit_info
    }

    pub fn detector_id(&self) -> i64 {
        self.detector_id
    }

    pub fn filter(&self) -> &FilterInfo {
        &self.filter
    }

    /// Fails with [`CatalogError::MissingWcs`] if no sky solution is attached.
    pub fn wcs(&self) -> CatalogResult<&SkyWcs> {
        self.wcs.as_ref().ok_or(CatalogError::MissingWcs)
    }

    /// Fails with [`CatalogError::MissingCalib`] if no calibration is attached.
    pub fn photo_calib(&self) -> CatalogResult<&PhotoCalib> {
        self.photo_calib.as_ref().ok_or(CatalogError::MissingCalib)
    }
}

/// Flat per-exposure metadata: the fields of one CcdVisit row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureMetadata {
    pub ccd_visit_id: i64,
    pub ccd_num: i64,
    pub filter_name: String,
    pub filter_id: i64,
    pub ra_deg: f64,
    pub decl_deg: f64,
    pub exp_time_s: f64,
    /// Exposure midpoint as MJD seconds. Plain ns → s unit conversion of
    /// the visit timestamp; no epoch recalculation.
    pub exp_midpt_mjd: f64,
    pub flux_zero_point: f64,
    pub flux_zero_point_err: f64,
}

impl ExposureMetadata {
    /// Extract calibration, geometry, and timing from one exposure.
    ///
    /// # Errors
    /// Fails if the exposure lacks a WCS or a photometric calibration;
    /// no partial metadata is returned.
    pub fn from_exposure(exposure: &Exposure) -> CatalogResult<Self> {
        let visit = exposure.visit_info();
        let (ra_deg, decl_deg) = exposure.wcs()?.sky_origin();
        let calib = exposure.photo_calib()?;
        let filter = exposure.filter();

        Ok(Self {
            ccd_visit_id: visit.exposure_id,
            ccd_num: exposure.detector_id(),
            filter_name: filter.name.clone(),
            filter_id: filter.id,
            ra_deg,
            decl_deg,
            exp_time_s: visit.exposure_time_s,
            exp_midpt_mjd: visit.date_nsec as f64 / NSEC_PER_SEC,
            flux_zero_point: calib.flux_mag0,
            flux_zero_point_err: calib.flux_mag0_err,
        })
    }

    /// Metadata as `(column, value)` pairs in [`ccd_visit_columns`]
    /// order, ready for insertion into the persisted CcdVisit table.
    ///
    /// [`ccd_visit_columns`]: crate::visit::ccd_visit_columns
    pub fn visit_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("ccdVisitId", Value::Int(self.ccd_visit_id)),
            ("ccdNum", Value::Int(self.ccd_num)),
            ("filterName", Value::Text(self.filter_name.clone())),
            ("filterId", Value::Int(self.filter_id)),
            ("ra", Value::Float(self.ra_deg)),
            ("decl", Value::Float(self.decl_deg)),
            ("expTime", Value::Float(self.exp_time_s)),
            ("expMidptMJD", Value::Float(self.exp_midpt_mjd)),
            ("fluxZeroPoint", Value::Float(self.flux_zero_point)),
            ("fluxZeroPointErr", Value::Float(self.flux_zero_point_err)),
        ]
    }
}
