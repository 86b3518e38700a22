use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};

use crate::error::{Result, ToolError};
use crate::flatten::{SheetTable, WorkbookData};

/// Reads every sheet of a workbook. The first row of each sheet is taken as
/// its header; data rows are padded or cut to the header width.
pub fn read_workbook(path: &Path) -> Result<WorkbookData> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let mut tables = Vec::new();
    for sheet_name in workbook.sheet_names().to_vec() {
        let range = read_required_sheet(&mut workbook, &sheet_name)?;
        tables.push(range_to_table(&sheet_name, &range));
    }

    Ok(WorkbookData { tables })
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ToolError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(ToolError::from)?;
    Ok(range)
}

fn range_to_table(sheet_name: &str, range: &Range<DataType>) -> SheetTable {
    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => {
            let mut columns: Vec<String> = header
                .iter()
                .map(|cell| cell_to_string(Some(cell)))
                .collect();
            while columns.last().is_some_and(String::is_empty) {
                columns.pop();
            }
            columns
        }
        None => Vec::new(),
    };

    let rows = rows
        .map(|row| {
            (0..columns.len())
                .map(|col_idx| cell_to_string(row.get(col_idx)))
                .collect()
        })
        .collect();

    SheetTable {
        sheet_name: sheet_name.to_string(),
        columns,
        rows,
    }
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
