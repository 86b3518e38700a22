//! The ordered working list of records awaiting export.

use tracing::debug;

use crate::model::VehicleRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingList {
    records: Vec<VehicleRecord>,
}

impl WorkingList {
    pub fn new(records: Vec<VehicleRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[VehicleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends a record after every existing one.
    pub fn push(&mut self, record: VehicleRecord) {
        debug!(id = %record.id, "record added to working list");
        self.records.push(record);
    }

    /// Removes the record with the given id. Returns whether one was found.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        before != self.records.len()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
