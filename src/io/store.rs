use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::model::VehicleRecord;

/// Persistence for the working list between runs.
pub trait RecordStore {
    fn load(&self) -> Result<Vec<VehicleRecord>>;
    fn save(&self, records: &[VehicleRecord]) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Stores the working list as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for JsonFileStore {
    /// A missing file is an empty list. An unreadable payload is logged and
    /// also treated as empty. Records whose pricing does not match the
    /// registered tier counts are logged and skipped.
    fn load(&self) -> Result<Vec<VehicleRecord>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        match serde_json::from_str::<Vec<VehicleRecord>>(&data) {
            Ok(records) => Ok(records
                .into_iter()
                .filter(|record| match record.pricing.validate() {
                    Ok(()) => true,
                    Err(error) => {
                        warn!(
                            path = %self.path.display(),
                            id = %record.id,
                            %error,
                            "skipping stored record with malformed pricing"
                        );
                        false
                    }
                })
                .collect()),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "failed to parse stored records");
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, records: &[VehicleRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), count = records.len(), "records saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(error) if error.kind() != ErrorKind::NotFound => Err(error.into()),
            _ => Ok(()),
        }
    }
}
