use std::collections::HashMap;
use std::path::Path;

use chrono::{NaiveDate, Utc};
use tracing::{error, info, instrument, warn};

use crate::draft::IdGenerator;
use crate::error::{Result, ToolError};
use crate::flatten::{SheetTable, WorkbookData, build_workbook};
use crate::io::excel_read;
use crate::io::excel_write::WorkbookSink;
use crate::io::store::RecordStore;
use crate::model::{
    AccessoryItem, ClosedSet, PricingTable, TermKey, TireLabel, TireOption, VehicleInfo,
    VehicleRecord,
};
use crate::schema;
use crate::session::WorkingList;

/// File name used when the caller does not pick one.
pub fn default_export_file_name(date: NaiveDate) -> String {
    format!("whipair-import-{}.xlsx", date.format("%Y-%m-%d"))
}

/// Default file name for an export made today, dated in UTC.
pub fn todays_export_file_name() -> String {
    default_export_file_name(Utc::now().date_naive())
}

/// Exports the working list and clears it once the sink accepted the
/// workbook. On failure the list and its store are left untouched.
#[instrument(level = "info", skip_all, fields(records = list.len()))]
pub fn export_working_list(
    list: &mut WorkingList,
    store: &dyn RecordStore,
    sink: &dyn WorkbookSink,
) -> Result<usize> {
    if list.is_empty() {
        return Err(ToolError::EmptyWorkingList);
    }

    let workbook = build_workbook(list.records());
    info!(sheet_count = workbook.tables.len(), "workbook constructed");

    if let Err(err) = sink.write(&workbook) {
        error!(error = %err, "workbook export failed");
        return Err(err);
    }

    let exported = list.len();
    list.clear();
    if let Err(err) = store.clear() {
        warn!(error = %err, "workbook written but stored records could not be cleared");
    }
    info!(exported, "working list exported and cleared");
    Ok(exported)
}

/// Reads an exported workbook and appends its vehicles to the working list.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn import_workbook(
    input: &Path,
    list: &mut WorkingList,
    store: &dyn RecordStore,
    ids: &mut dyn IdGenerator,
) -> Result<usize> {
    if !input.exists() {
        return Err(ToolError::MissingInput(input.to_path_buf()));
    }

    let workbook = excel_read::read_workbook(input)?;
    let records = records_from_workbook(&workbook, ids)?;
    let imported = records.len();
    for record in records {
        list.push(record);
    }
    store.save(list.records())?;
    info!(imported, "records imported from workbook");
    Ok(imported)
}

/// Rebuilds records from the normalized sheets, joined on `vehicle_id`.
/// Child items receive fresh identifiers.
pub fn records_from_workbook(
    workbook: &WorkbookData,
    ids: &mut dyn IdGenerator,
) -> Result<Vec<VehicleRecord>> {
    let vehicles = required_table(workbook, schema::VEHICLES_SHEET)?;
    let pricing = required_table(workbook, schema::PRICING_SHEET)?;
    let accessories = required_table(workbook, schema::ACCESSORIES_SHEET)?;
    let tires = required_table(workbook, schema::TIRES_SHEET)?;

    let mut records: Vec<VehicleRecord> = Vec::with_capacity(vehicles.rows.len());
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for row in 0..vehicles.rows.len() {
        let id = vehicle_id(vehicles, row)?;
        if index_by_id.contains_key(&id) {
            return Err(ToolError::InvalidWorkbook(format!(
                "duplicate vehicle_id '{id}' in sheet '{}'",
                schema::VEHICLES_SHEET
            )));
        }

        let mut vehicle = VehicleInfo::default();
        for field in schema::VEHICLE_FIELDS {
            vehicle.set(field, vehicles.cell(row, field).unwrap_or(""))?;
        }

        index_by_id.insert(id.clone(), records.len());
        records.push(VehicleRecord {
            id,
            vehicle,
            pricing: PricingTable::empty(),
            accessories: Vec::new(),
            tires: Vec::new(),
        });
    }

    let lookup = |table: &SheetTable, row: usize| -> Result<usize> {
        let id = vehicle_id(table, row)?;
        index_by_id.get(&id).copied().ok_or_else(|| {
            ToolError::InvalidWorkbook(format!(
                "sheet '{}' references unknown vehicle_id '{id}'",
                table.sheet_name
            ))
        })
    };

    for row in 0..pricing.rows.len() {
        let index = lookup(pricing, row)?;
        let key = TermKey::parse(pricing.cell(row, schema::TERM_COLUMN).unwrap_or(""))?;
        let rate_count = schema::term_metadata(key).rate_count;
        let term = records[index].pricing.term_mut(key);

        for field in schema::PRICING_SCALAR_FIELDS {
            term.set_scalar(field, pricing.cell(row, field).unwrap_or(""))?;
        }
        for (position, rate) in term.rates.iter_mut().enumerate().take(rate_count) {
            let position = position + 1;
            rate.min = cell_or_empty(pricing, row, &schema::rate_column(position, "min"));
            rate.max = cell_or_empty(pricing, row, &schema::rate_column(position, "max"));
        }
    }

    for row in 0..accessories.rows.len() {
        let index = lookup(accessories, row)?;
        records[index].accessories.push(AccessoryItem {
            id: ids.next_id(),
            name: cell_or_empty(accessories, row, "name"),
            price: cell_or_empty(accessories, row, "price"),
        });
    }

    for row in 0..tires.rows.len() {
        let index = lookup(tires, row)?;
        records[index].tires.push(TireOption {
            id: ids.next_id(),
            label: TireLabel::parse(tires.cell(row, "label").unwrap_or("").trim())?,
            price: cell_or_empty(tires, row, "price"),
        });
    }

    Ok(records)
}

fn required_table<'a>(workbook: &'a WorkbookData, name: &str) -> Result<&'a SheetTable> {
    let table = workbook
        .table(name)
        .ok_or_else(|| ToolError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    if table.column_index(schema::VEHICLE_ID_COLUMN).is_none() {
        return Err(ToolError::InvalidWorkbook(format!(
            "sheet '{name}' has no {} column",
            schema::VEHICLE_ID_COLUMN
        )));
    }
    Ok(table)
}

fn vehicle_id(table: &SheetTable, row: usize) -> Result<String> {
    let id = table
        .cell(row, schema::VEHICLE_ID_COLUMN)
        .unwrap_or("")
        .trim();
    if id.is_empty() {
        return Err(ToolError::InvalidWorkbook(format!(
            "row {} of sheet '{}' has no vehicle_id",
            row + 2,
            table.sheet_name
        )));
    }
    Ok(id.to_string())
}

fn cell_or_empty(table: &SheetTable, row: usize, column: &str) -> String {
    table.cell(row, column).unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::draft::RecordDraft;
    use crate::model::RecordId;

    struct Sequential(usize);

    impl IdGenerator for Sequential {
        fn next_id(&mut self) -> RecordId {
            self.0 += 1;
            format!("id-{}", self.0)
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        saved: RefCell<Option<Vec<VehicleRecord>>>,
        cleared: RefCell<bool>,
    }

    impl RecordStore for MemoryStore {
        fn load(&self) -> Result<Vec<VehicleRecord>> {
            Ok(self.saved.borrow().clone().unwrap_or_default())
        }

        fn save(&self, records: &[VehicleRecord]) -> Result<()> {
            *self.saved.borrow_mut() = Some(records.to_vec());
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            *self.cleared.borrow_mut() = true;
            Ok(())
        }
    }

    struct StuckStore;

    impl RecordStore for StuckStore {
        fn load(&self) -> Result<Vec<VehicleRecord>> {
            Ok(Vec::new())
        }

        fn save(&self, _records: &[VehicleRecord]) -> Result<()> {
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            Err(ToolError::Io(std::io::Error::other("read-only store")))
        }
    }

    struct CapturingSink(RefCell<Option<WorkbookData>>);

    impl WorkbookSink for CapturingSink {
        fn write(&self, workbook: &WorkbookData) -> Result<()> {
            *self.0.borrow_mut() = Some(workbook.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl WorkbookSink for FailingSink {
        fn write(&self, _workbook: &WorkbookData) -> Result<()> {
            Err(ToolError::Io(std::io::Error::other("disk full")))
        }
    }

    fn sample_list(count: usize) -> WorkingList {
        let mut ids = Sequential(0);
        let mut list = WorkingList::default();
        for _ in 0..count {
            list.push(
                RecordDraft::sample()
                    .into_record(&mut ids)
                    .expect("sample is valid"),
            );
        }
        list
    }

    #[test]
    fn export_rejects_empty_list() {
        let mut list = WorkingList::default();
        let sink = CapturingSink(RefCell::new(None));
        let result = export_working_list(&mut list, &MemoryStore::default(), &sink);
        assert!(matches!(result, Err(ToolError::EmptyWorkingList)));
        assert!(sink.0.borrow().is_none());
    }

    #[test]
    fn successful_export_clears_list_and_store() {
        let mut list = sample_list(2);
        let store = MemoryStore::default();
        let sink = CapturingSink(RefCell::new(None));

        let exported = export_working_list(&mut list, &store, &sink).expect("export");

        assert_eq!(exported, 2);
        assert!(list.is_empty());
        assert!(*store.cleared.borrow());
        let written = sink.0.borrow();
        let workbook = written.as_ref().expect("workbook written");
        assert_eq!(workbook.tables.len(), 5);
        assert_eq!(workbook.tables[0].rows.len(), 2);
    }

    #[test]
    fn failed_export_keeps_working_list() {
        let mut list = sample_list(1);
        let before = list.clone();
        let store = MemoryStore::default();

        let result = export_working_list(&mut list, &store, &FailingSink);

        assert!(matches!(result, Err(ToolError::Io(_))));
        assert_eq!(list, before);
        assert!(!*store.cleared.borrow());
    }

    #[test]
    fn written_export_succeeds_when_store_cannot_be_cleared() {
        let mut list = sample_list(2);
        let sink = CapturingSink(RefCell::new(None));

        let exported = export_working_list(&mut list, &StuckStore, &sink).expect("export");

        assert_eq!(exported, 2);
        assert!(list.is_empty());
        assert!(sink.0.borrow().is_some());
    }

    #[test]
    fn normalized_sheets_rebuild_records() {
        let list = sample_list(2);
        let workbook = build_workbook(list.records());

        let rebuilt =
            records_from_workbook(&workbook, &mut Sequential(100)).expect("records rebuilt");

        assert_eq!(rebuilt.len(), 2);
        for (original, restored) in list.records().iter().zip(&rebuilt) {
            assert_eq!(restored.id, original.id);
            assert_eq!(restored.pricing, original.pricing);
            let names: Vec<(&str, &str)> = restored
                .accessories
                .iter()
                .map(|a| (a.name.as_str(), a.price.as_str()))
                .collect();
            let expected: Vec<(&str, &str)> = original
                .accessories
                .iter()
                .map(|a| (a.name.as_str(), a.price.as_str()))
                .collect();
            assert_eq!(names, expected);
            assert_eq!(restored.tires.len(), original.tires.len());
            assert_eq!(restored.vehicle.brand, original.vehicle.brand);
            assert_eq!(
                restored.vehicle.standard_equipment,
                "Radio DAB|Climatizzatore automatico|Sensori pioggia"
            );
        }
    }

    #[test]
    fn rebuild_rejects_orphan_child_rows() {
        let list = sample_list(1);
        let mut workbook = build_workbook(list.records());
        let tires = workbook
            .tables
            .iter_mut()
            .find(|table| table.sheet_name == schema::TIRES_SHEET)
            .expect("tires sheet");
        tires.rows[0][0] = "ghost".to_string();

        assert!(matches!(
            records_from_workbook(&workbook, &mut Sequential(0)),
            Err(ToolError::InvalidWorkbook(_))
        ));
    }

    #[test]
    fn rebuild_requires_normalized_sheets() {
        let mut workbook = build_workbook(&[]);
        workbook
            .tables
            .retain(|table| table.sheet_name != schema::PRICING_SHEET);
        assert!(matches!(
            records_from_workbook(&workbook, &mut Sequential(0)),
            Err(ToolError::InvalidWorkbook(_))
        ));
    }

    #[test]
    fn default_file_name_is_date_tagged() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).expect("valid date");
        assert_eq!(
            default_export_file_name(date),
            "whipair-import-2026-03-07.xlsx"
        );
    }

    #[test]
    fn todays_file_name_uses_the_utc_date() {
        let expected = default_export_file_name(Utc::now().date_naive());
        assert_eq!(todays_export_file_name(), expected);
    }
}
