//! Static metadata that fixes the shape of every exported sheet.
//!
//! The per-term rate counts and the flat column list are the single source of
//! truth for the flat-row projector and the workbook headers. Changing a rate
//! count here changes the flat sheet's column set.

use std::sync::OnceLock;

use crate::model::{ClosedSet, TermKey};

/// Display label and tier count for one financing term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermMetadata {
    pub key: TermKey,
    pub label: &'static str,
    pub rate_count: usize,
}

/// Registered terms in short → medium → long order.
pub const PRICING_TERMS: [TermMetadata; 3] = [
    TermMetadata {
        key: TermKey::Short,
        label: "36 months",
        rate_count: 3,
    },
    TermMetadata {
        key: TermKey::Medium,
        label: "48 months",
        rate_count: 4,
    },
    TermMetadata {
        key: TermKey::Long,
        label: "60 months",
        rate_count: 5,
    },
];

/// Vehicle attribute columns, in export order.
pub const VEHICLE_FIELDS: [&str; 24] = [
    "brand",
    "model",
    "trim",
    "condition",
    "category",
    "registration_date",
    "kilometers",
    "url",
    "configuration_url",
    "engine_size",
    "fuel_type",
    "transmission",
    "power_kw",
    "power_cv",
    "seats",
    "doors",
    "status",
    "visibility",
    "images",
    "exterior_color",
    "interior_color",
    "wheels",
    "pair_to_save_daily",
    "standard_equipment",
];

/// Fields that must be non-blank before a draft becomes a record, paired
/// with the label shown to the user.
pub const REQUIRED_FIELDS: [(&str, &str); 3] =
    [("brand", "Brand"), ("model", "Model"), ("trim", "Trim")];

/// Free-text field holding one entry per line.
pub const LIST_FIELD: &str = "standard_equipment";

/// Scalar pricing columns shared by every term.
pub const PRICING_SCALAR_FIELDS: [&str; 5] = [
    "monthly_avg",
    "final_min",
    "final_max",
    "down_min",
    "down_max",
];

pub const ACCESSORIES_COLUMN: &str = "accessories";
pub const TIRE_OPTIONS_COLUMN: &str = "tire_options";

/// Foreign key carried by every normalized sheet.
pub const VEHICLE_ID_COLUMN: &str = "vehicle_id";
pub const TERM_COLUMN: &str = "term";

pub const FLAT_SHEET: &str = "importable_vehicle";
pub const VEHICLES_SHEET: &str = "vehicles";
pub const PRICING_SHEET: &str = "pricing";
pub const ACCESSORIES_SHEET: &str = "accessories";
pub const TIRES_SHEET: &str = "tires";

pub fn term_metadata(key: TermKey) -> &'static TermMetadata {
    match key {
        TermKey::Short => &PRICING_TERMS[0],
        TermKey::Medium => &PRICING_TERMS[1],
        TermKey::Long => &PRICING_TERMS[2],
    }
}

/// Largest tier count across all terms.
pub fn max_rate_count() -> usize {
    PRICING_TERMS
        .iter()
        .map(|term| term.rate_count)
        .max()
        .unwrap_or(0)
}

/// `rate_<position>_<bound>` with a 1-based position.
pub fn rate_column(position: usize, bound: &str) -> String {
    format!("rate_{position}_{bound}")
}

/// Flat-sheet column for a term-scoped field, e.g. `pricing_3y_final_min`.
pub fn term_column(key: TermKey, field: &str) -> String {
    format!("pricing_{}_{field}", key.as_str())
}

/// Full ordered column list of the flat sheet.
pub fn flat_columns() -> &'static [String] {
    static COLUMNS: OnceLock<Vec<String>> = OnceLock::new();
    COLUMNS.get_or_init(|| {
        let mut columns: Vec<String> = VEHICLE_FIELDS.iter().map(|f| f.to_string()).collect();
        for term in &PRICING_TERMS {
            for field in PRICING_SCALAR_FIELDS {
                columns.push(term_column(term.key, field));
            }
            for position in 1..=term.rate_count {
                columns.push(term_column(term.key, &rate_column(position, "min")));
                columns.push(term_column(term.key, &rate_column(position, "max")));
            }
        }
        columns.push(ACCESSORIES_COLUMN.to_string());
        columns.push(TIRE_OPTIONS_COLUMN.to_string());
        columns
    })
}

pub fn vehicle_sheet_columns() -> Vec<String> {
    std::iter::once(VEHICLE_ID_COLUMN)
        .chain(VEHICLE_FIELDS)
        .map(str::to_string)
        .collect()
}

/// Pricing header sized to the widest term: every `rate_i_min` column first,
/// then every `rate_i_max` column.
pub fn pricing_columns() -> Vec<String> {
    let rates = max_rate_count();
    let mut columns: Vec<String> = [VEHICLE_ID_COLUMN, TERM_COLUMN]
        .into_iter()
        .chain(PRICING_SCALAR_FIELDS)
        .map(str::to_string)
        .collect();
    columns.extend((1..=rates).map(|position| rate_column(position, "min")));
    columns.extend((1..=rates).map(|position| rate_column(position, "max")));
    columns
}

pub fn accessory_columns() -> Vec<String> {
    vec![
        VEHICLE_ID_COLUMN.to_string(),
        "name".to_string(),
        "price".to_string(),
    ]
}

pub fn tire_columns() -> Vec<String> {
    vec![
        VEHICLE_ID_COLUMN.to_string(),
        "label".to_string(),
        "price".to_string(),
    ]
}
