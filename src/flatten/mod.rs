use std::collections::BTreeMap;

use tracing::debug;

use crate::encode::{encode_entity_list, normalize_list_field};
use crate::model::{ClosedSet, PricingTerm, VehicleRecord};
use crate::schema::{self, TermMetadata};

/// A projected row keyed by column name.
pub type Row = BTreeMap<String, String>;

/// A table that will be materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// Lays keyed rows out under `columns`. Cells missing from a row are
    /// written as empty strings.
    pub fn from_rows(sheet_name: &str, columns: Vec<String>, rows: Vec<Row>) -> Self {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|mut row| {
                columns
                    .iter()
                    .map(|column| row.remove(column).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self {
            sheet_name: sheet_name.to_string(),
            columns,
            rows,
        }
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|candidate| candidate == column)
    }

    /// Reads a cell by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows
            .get(row)
            .map(|cells| cells.get(index).map(String::as_str).unwrap_or(""))
    }
}

/// Represents all tables required to materialise the Excel workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookData {
    pub tables: Vec<SheetTable>,
}

impl WorkbookData {
    pub fn table(&self, sheet_name: &str) -> Option<&SheetTable> {
        self.tables
            .iter()
            .find(|table| table.sheet_name == sheet_name)
    }
}

/// Projects one record onto the flat sheet. The row always carries exactly
/// the columns of [`schema::flat_columns`].
pub fn flat_row(record: &VehicleRecord) -> Row {
    let mut row: Row = schema::flat_columns()
        .iter()
        .map(|column| (column.clone(), String::new()))
        .collect();

    for (field, value) in record.vehicle.fields() {
        row.insert(field.to_string(), vehicle_cell(field, value));
    }

    for term in &schema::PRICING_TERMS {
        let pricing = record.pricing.term(term.key);
        for (field, value) in schema::PRICING_SCALAR_FIELDS
            .into_iter()
            .zip(pricing.scalar_values())
        {
            row.insert(schema::term_column(term.key, field), value.to_string());
        }
        for (position, min, max) in rate_cells(term, pricing) {
            row.insert(
                schema::term_column(term.key, &schema::rate_column(position, "min")),
                min.to_string(),
            );
            row.insert(
                schema::term_column(term.key, &schema::rate_column(position, "max")),
                max.to_string(),
            );
        }
    }

    row.insert(
        schema::ACCESSORIES_COLUMN.to_string(),
        encode_entity_list(&record.accessories),
    );
    row.insert(
        schema::TIRE_OPTIONS_COLUMN.to_string(),
        encode_entity_list(&record.tires),
    );

    row
}

/// One row per record: the identifier plus every vehicle attribute.
pub fn vehicle_sheet_rows(records: &[VehicleRecord]) -> Vec<Row> {
    records
        .iter()
        .map(|record| {
            let mut row = Row::new();
            row.insert(schema::VEHICLE_ID_COLUMN.to_string(), record.id.clone());
            for (field, value) in record.vehicle.fields() {
                row.insert(field.to_string(), vehicle_cell(field, value));
            }
            row
        })
        .collect()
}

/// One row per record and term. Each row only carries the rate columns of
/// its own term, so row widths differ between terms.
pub fn pricing_sheet_rows(records: &[VehicleRecord]) -> Vec<Row> {
    let mut rows = Vec::with_capacity(records.len() * schema::PRICING_TERMS.len());

    for record in records {
        for term in &schema::PRICING_TERMS {
            let pricing = record.pricing.term(term.key);
            let mut row = Row::new();
            row.insert(schema::VEHICLE_ID_COLUMN.to_string(), record.id.clone());
            row.insert(schema::TERM_COLUMN.to_string(), term.key.as_str().to_string());
            for (field, value) in schema::PRICING_SCALAR_FIELDS
                .into_iter()
                .zip(pricing.scalar_values())
            {
                row.insert(field.to_string(), value.to_string());
            }
            for (position, min, max) in rate_cells(term, pricing) {
                row.insert(schema::rate_column(position, "min"), min.to_string());
                row.insert(schema::rate_column(position, "max"), max.to_string());
            }
            rows.push(row);
        }
    }

    rows
}

/// One row per accessory, blank names included.
pub fn accessory_sheet_rows(records: &[VehicleRecord]) -> Vec<Row> {
    records
        .iter()
        .flat_map(|record| {
            record
                .accessories
                .iter()
                .map(move |item| {
                    child_row(
                        &record.id,
                        [("name", item.name.as_str()), ("price", item.price.as_str())],
                    )
                })
        })
        .collect()
}

/// One row per tire option.
pub fn tire_sheet_rows(records: &[VehicleRecord]) -> Vec<Row> {
    records
        .iter()
        .flat_map(|record| {
            record.tires.iter().map(move |item| {
                child_row(
                    &record.id,
                    [("label", item.label.as_str()), ("price", item.price.as_str())],
                )
            })
        })
        .collect()
}

/// Assembles the five export sheets. Sheets without rows keep their header.
pub fn build_workbook(records: &[VehicleRecord]) -> WorkbookData {
    let flat_rows = records.iter().map(flat_row).collect();

    let tables = vec![
        SheetTable::from_rows(
            schema::FLAT_SHEET,
            schema::flat_columns().to_vec(),
            flat_rows,
        ),
        SheetTable::from_rows(
            schema::VEHICLES_SHEET,
            schema::vehicle_sheet_columns(),
            vehicle_sheet_rows(records),
        ),
        SheetTable::from_rows(
            schema::PRICING_SHEET,
            schema::pricing_columns(),
            pricing_sheet_rows(records),
        ),
        SheetTable::from_rows(
            schema::ACCESSORIES_SHEET,
            schema::accessory_columns(),
            accessory_sheet_rows(records),
        ),
        SheetTable::from_rows(
            schema::TIRES_SHEET,
            schema::tire_columns(),
            tire_sheet_rows(records),
        ),
    ];

    for table in &tables {
        debug!(
            sheet = %table.sheet_name,
            columns = table.columns.len(),
            rows = table.rows.len(),
            "sheet assembled"
        );
    }

    WorkbookData { tables }
}

fn vehicle_cell(field: &str, value: &str) -> String {
    if field == schema::LIST_FIELD {
        normalize_list_field(value)
    } else {
        value.to_string()
    }
}

/// Rate cells by 1-based position, capped at the registered tier count.
fn rate_cells<'a>(
    term: &TermMetadata,
    pricing: &'a PricingTerm,
) -> impl Iterator<Item = (usize, &'a str, &'a str)> {
    debug_assert_eq!(
        pricing.rates.len(),
        term.rate_count,
        "rate tiers for term {}",
        term.key.as_str()
    );
    pricing
        .rates
        .iter()
        .take(term.rate_count)
        .enumerate()
        .map(|(index, rate)| (index + 1, rate.min.as_str(), rate.max.as_str()))
}

fn child_row<const N: usize>(record_id: &str, fields: [(&str, &str); N]) -> Row {
    let mut row = Row::new();
    row.insert(schema::VEHICLE_ID_COLUMN.to_string(), record_id.to_string());
    for (column, value) in fields {
        row.insert(column.to_string(), value.to_string());
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AccessoryItem, PricingRateRange, PricingTable, TermKey, TireLabel, TireOption,
        VehicleInfo,
    };

    fn record(id: &str, accessories: &[(&str, &str)], tires: &[TireLabel]) -> VehicleRecord {
        VehicleRecord {
            id: id.to_string(),
            vehicle: VehicleInfo {
                brand: "Peugeot".into(),
                model: "208".into(),
                trim: "Style".into(),
                standard_equipment: "Radio DAB\n\n Clima \n".into(),
                ..VehicleInfo::default()
            },
            pricing: PricingTable::empty(),
            accessories: accessories
                .iter()
                .enumerate()
                .map(|(index, (name, price))| AccessoryItem {
                    id: format!("{id}-acc-{index}"),
                    name: name.to_string(),
                    price: price.to_string(),
                })
                .collect(),
            tires: tires
                .iter()
                .enumerate()
                .map(|(index, label)| TireOption {
                    id: format!("{id}-tire-{index}"),
                    label: *label,
                    price: "20".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn flat_row_has_exactly_registry_columns() {
        let accessory_lists: [&[(&str, &str)]; 3] = [
            &[],
            &[("Tow hook", "440.00")],
            &[("a", "1"), ("b", "2"), ("", "3"), ("c", "4")],
        ];
        for accessories in accessory_lists {
            let row = flat_row(&record("r", accessories, &[TireLabel::Winter]));
            let mut expected: Vec<String> = schema::flat_columns().to_vec();
            expected.sort();
            let keys: Vec<String> = row.keys().cloned().collect();
            assert_eq!(keys, expected);
        }
    }

    #[test]
    fn flat_row_normalizes_equipment_and_encodes_children() {
        let row = flat_row(&record(
            "r",
            &[("Tow hook", "440.00"), ("", "10"), ("Camera", "165.00")],
            &[TireLabel::Summer],
        ));
        assert_eq!(row["brand"], "Peugeot");
        assert_eq!(row["standard_equipment"], "Radio DAB|Clima");
        assert_eq!(row["accessories"], "Tow hook:440.00|Camera:165.00");
        assert_eq!(row["tire_options"], "summer:20");
        assert_eq!(row["condition"], "");
    }

    #[test]
    fn flat_row_places_rates_by_position() {
        let mut rec = record("r", &[], &[]);
        rec.pricing.medium.rates[3] = PricingRateRange {
            label: "rate_4".into(),
            min: "340.00".into(),
            max: "165.00".into(),
        };
        rec.pricing.medium.monthly_avg = "410.00".into();
        let row = flat_row(&rec);
        assert_eq!(row["pricing_4y_monthly_avg"], "410.00");
        assert_eq!(row["pricing_4y_rate_4_min"], "340.00");
        assert_eq!(row["pricing_4y_rate_4_max"], "165.00");
        assert_eq!(row["pricing_5y_rate_4_min"], "");
    }

    #[test]
    fn pricing_rows_cover_every_term_even_when_blank() {
        let mut rec = record("r", &[], &[]);
        rec.pricing.short.monthly_avg = "520.00".into();
        for (index, rate) in rec.pricing.short.rates.iter_mut().enumerate() {
            rate.min = format!("{}", 500 + index);
        }

        let rows = pricing_sheet_rows(&[rec]);
        assert_eq!(rows.len(), 3);

        let terms: Vec<&str> = rows.iter().map(|row| row["term"].as_str()).collect();
        assert_eq!(terms, vec!["3y", "4y", "5y"]);
        assert_eq!(rows[0]["monthly_avg"], "520.00");
        assert_eq!(rows[0]["rate_3_min"], "502");
        assert_eq!(rows[1]["monthly_avg"], "");

        for (row, term) in rows.iter().zip(&schema::PRICING_TERMS) {
            let rate_columns = row.keys().filter(|key| key.starts_with("rate_")).count();
            assert_eq!(rate_columns, term.rate_count * 2);
            assert_eq!(row.len(), 7 + term.rate_count * 2);
        }
    }

    #[test]
    fn child_rows_follow_record_then_insertion_order() {
        let records = vec![
            record("a", &[("x", "1"), ("", "2")], &[TireLabel::Winter]),
            record("b", &[], &[TireLabel::Summer, TireLabel::Summer]),
            record("c", &[("y", "3")], &[]),
        ];

        let accessories = accessory_sheet_rows(&records);
        assert_eq!(accessories.len(), 3);
        let keys: Vec<(&str, &str)> = accessories
            .iter()
            .map(|row| (row["vehicle_id"].as_str(), row["name"].as_str()))
            .collect();
        assert_eq!(keys, vec![("a", "x"), ("a", ""), ("c", "y")]);

        let tires = tire_sheet_rows(&records);
        let labels: Vec<(&str, &str)> = tires
            .iter()
            .map(|row| (row["vehicle_id"].as_str(), row["label"].as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![("a", "winter"), ("b", "summer"), ("b", "summer")]
        );

        let vehicles = vehicle_sheet_rows(&records);
        let ids: Vec<&str> = vehicles.iter().map(|row| row["vehicle_id"].as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(vehicles[0]["standard_equipment"], "Radio DAB|Clima");
        assert_eq!(vehicles[0].len(), 25);
    }

    #[test]
    fn empty_workbook_keeps_every_header() {
        let workbook = build_workbook(&[]);
        let names: Vec<&str> = workbook
            .tables
            .iter()
            .map(|table| table.sheet_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["importable_vehicle", "vehicles", "pricing", "accessories", "tires"]
        );
        for table in &workbook.tables {
            assert!(table.rows.is_empty());
            assert!(!table.columns.is_empty());
        }
        assert_eq!(
            workbook.table("pricing").map(|t| t.columns.clone()),
            Some(schema::pricing_columns())
        );
    }

    #[test]
    fn pricing_sheet_pads_short_terms() {
        let workbook = build_workbook(&[record("r", &[], &[])]);
        let pricing = workbook.table("pricing").expect("pricing sheet");
        assert_eq!(pricing.rows.len(), 3);
        for row in &pricing.rows {
            assert_eq!(row.len(), pricing.columns.len());
        }
        assert_eq!(pricing.cell(0, "term"), Some("3y"));
        assert_eq!(pricing.cell(0, "rate_5_min"), Some(""));
        assert_eq!(pricing.cell(2, "term"), Some(TermKey::Long.as_str()));
    }
}
