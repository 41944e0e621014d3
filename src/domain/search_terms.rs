use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use thiserror::Error;

/// Header of the column holding the search terms in the uploaded workbook.
pub const TERM_COLUMN: &str = "Vegetables";

#[derive(Error, Debug)]
pub enum TermListError {
    #[error("Uploaded file is not a readable xlsx workbook: {0}")]
    Unreadable(#[from] calamine::XlsxError),

    #[error("Uploaded workbook has no worksheet")]
    NoWorksheet,

    #[error("Uploaded workbook has no `{}` column", TERM_COLUMN)]
    MissingColumn,
}

/// Reads the search terms from the first worksheet of an xlsx workbook.
///
/// The first row is the header. Values below the `Vegetables` header are
/// taken as plain strings in sheet order; blank cells are kept as empty terms.
pub fn parse_search_terms(bytes: &[u8]) -> Result<Vec<String>, TermListError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(TermListError::NoWorksheet)??;

    let mut rows = range.rows();
    let header = rows.next().ok_or(TermListError::MissingColumn)?;
    let column = header
        .iter()
        .position(|cell| cell_text(cell) == TERM_COLUMN)
        .ok_or(TermListError::MissingColumn)?;

    Ok(rows
        .map(|row| row.get(column).map(cell_text).unwrap_or_default())
        .collect())
}

pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}
