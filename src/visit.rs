//! Column layout of the persisted CcdVisit table.
//!
//! One row per detector-visit. Column names, order, and declared SQL
//! types are a compatibility contract with the downstream store — do not
//! reorder or rename.

use serde::{Deserialize, Serialize};

/// Storage types the CcdVisit table declares, one per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    IntegerPrimaryKey,
    Integer,
    Text,
    Real,
}

impl SqlType {
    /// The exact type string used in the persisted table declaration.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::IntegerPrimaryKey => "INTEGER PRIMARY KEY",
            Self::Integer => "INTEGER",
            Self::Text => "TEXT",
            Self::Real => "REAL",
        }
    }
}

/// One column of the CcdVisit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitColumn {
    pub name: &'static str,
    pub ty: SqlType,
}

const CCD_VISIT_COLUMNS: [VisitColumn; 10] = [
    VisitColumn {
        name: "ccdVisitId",
        ty: SqlType::IntegerPrimaryKey,
    },
    VisitColumn {
        name: "ccdNum",
        ty: SqlType::Integer,
    },
    VisitColumn {
        name: "filterName",
        ty: SqlType::Text,
    },
    VisitColumn {
        name: "filterId",
        ty: SqlType::Integer,
    },
    VisitColumn {
        name: "ra",
        ty: SqlType::Real,
    },
    VisitColumn {
        name: "decl",
        ty: SqlType::Real,
    },
    VisitColumn {
        name: "expTime",
        ty: SqlType::Real,
    },
    VisitColumn {
        name: "expMidptMJD",
        ty: SqlType::Real,
    },
    VisitColumn {
        name: "fluxZeroPoint",
        ty: SqlType::Real,
    },
    VisitColumn {
        name: "fluxZeroPointErr",
        ty: SqlType::Real,
    },
];

/// Columns of the CcdVisit table, in persisted order.
pub fn ccd_visit_columns() -> &'static [VisitColumn] {
    &CCD_VISIT_COLUMNS
}
