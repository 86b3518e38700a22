use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Table, TableColumn, Workbook};
use tracing::{debug, warn};

use crate::error::Result;
use crate::flatten::WorkbookData;

/// Destination for an assembled workbook.
pub trait WorkbookSink {
    fn write(&self, workbook: &WorkbookData) -> Result<()>;
}

/// Writes workbooks as `.xlsx` files.
#[derive(Debug, Clone)]
pub struct XlsxSink {
    path: PathBuf,
}

impl XlsxSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorkbookSink for XlsxSink {
    fn write(&self, workbook: &WorkbookData) -> Result<()> {
        write_workbook(&self.path, workbook)
    }
}

/// Writes the provided workbook data to the given path. The file is first
/// written next to the target and only renamed into place once complete.
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let partial = path.with_extension("partial");
    let outcome = save_workbook(&partial, workbook).and_then(|()| {
        fs::rename(&partial, path)?;
        Ok(())
    });

    if outcome.is_err() && partial.exists() {
        if let Err(error) = fs::remove_file(&partial) {
            warn!(path = %partial.display(), %error, "failed to remove partial workbook");
        }
    }
    outcome
}

fn save_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut workbook_writer = Workbook::new();
    let header_format = Format::new().set_bold();

    for table in &workbook.tables {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&table.sheet_name)?;

        for (col_idx, header) in table.columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col_idx as u16, header, &header_format)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
            }
        }

        worksheet.set_freeze_panes(1, 0)?;

        if !table.rows.is_empty() && !table.columns.is_empty() {
            let columns: Vec<TableColumn> = table
                .columns
                .iter()
                .map(|header| TableColumn::new().set_header(header))
                .collect();
            let mut excel_table = Table::new();
            excel_table.set_autofilter(true).set_columns(&columns);

            let col_end = (table.columns.len() as u16).saturating_sub(1);
            let row_end = table.rows.len() as u32;
            worksheet.add_table(0, 0, row_end, col_end, &excel_table)?;
        }

        worksheet.autofit();
        debug!(sheet = %table.sheet_name, rows = table.rows.len(), "sheet written");
    }

    workbook_writer.save(path)?;
    Ok(())
}
