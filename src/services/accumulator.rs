use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::{domain::search_terms::cell_text, domain::table::ResultTable, error::SpreadsheetError};

const DEFAULT_SHEET: &str = "Sheet1";

/// Appends `table` to the workbook at `file_path`.
///
/// A missing file is created with a header row followed by the table rows.
/// An existing file keeps all of its sheets and gets the table rows, without
/// a header, written below the last used row of every sheet.
pub fn append(table: &ResultTable, file_path: &Path) -> Result<(), SpreadsheetError> {
    if !file_path.exists() {
        return create(table, file_path);
    }

    let sheets = read_sheets(file_path)?;

    let mut workbook = Workbook::new();
    for (name, range) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&name)?;

        let next_row = copy_range(worksheet, &range)?;
        write_rows(worksheet, table, next_row)?;
    }
    workbook.save(file_path)?;

    log::info!(
        "Appended {} rows to {}",
        table.len(),
        file_path.to_string_lossy()
    );
    Ok(())
}

/// Reads every row, header included, of the first sheet as text.
pub fn read_rows(file_path: &Path) -> Result<Vec<Vec<String>>, SpreadsheetError> {
    let sheets = read_sheets(file_path)?;
    let Some((_, range)) = sheets.into_iter().next() else {
        return Ok(vec![]);
    };

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn create(table: &ResultTable, file_path: &Path) -> Result<(), SpreadsheetError> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(DEFAULT_SHEET)?;

    let header = Format::new().set_bold();
    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header)?;
    }
    write_rows(worksheet, table, 1)?;
    workbook.save(file_path)?;

    log::info!(
        "Created {} with {} rows",
        file_path.to_string_lossy(),
        table.len()
    );
    Ok(())
}

fn read_sheets(file_path: &Path) -> Result<Vec<(String, Range<Data>)>, SpreadsheetError> {
    let mut workbook: Xlsx<_> = open_workbook(file_path)?;

    let mut sheets = vec![];
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        sheets.push((name, range));
    }
    Ok(sheets)
}

/// Copies `range` cell by cell at its original position and returns the
/// index of the first row below it.
fn copy_range(worksheet: &mut Worksheet, range: &Range<Data>) -> Result<u32, SpreadsheetError> {
    let Some((start_row, start_col)) = range.start() else {
        return Ok(0);
    };

    for (r, row) in range.rows().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let row_num = start_row + r as u32;
            let col_num = (start_col as usize + c) as u16;
            match cell {
                Data::Empty => {}
                Data::String(s) => {
                    worksheet.write_string(row_num, col_num, s)?;
                }
                Data::Float(f) => {
                    worksheet.write_number(row_num, col_num, *f)?;
                }
                Data::Int(i) => {
                    worksheet.write_number(row_num, col_num, *i as f64)?;
                }
                Data::Bool(b) => {
                    worksheet.write_boolean(row_num, col_num, *b)?;
                }
                other => {
                    worksheet.write_string(row_num, col_num, other.to_string())?;
                }
            }
        }
    }

    Ok(range.end().map(|(row, _)| row + 1).unwrap_or(0))
}

fn write_rows(
    worksheet: &mut Worksheet,
    table: &ResultTable,
    first_row: u32,
) -> Result<(), SpreadsheetError> {
    for (r, row) in table.rows().iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet.write_string(first_row + r as u32, c as u16, value)?;
        }
    }
    Ok(())
}
