use super::site::{SEARCH_TERM, SOURCE};

/// Fill value for columns a table does not carry.
pub const EMPTY_CELL: &str = "";

/// One scraped record, as column name to value pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(&'static str, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.cells.iter_mut().find(|(c, _)| *c == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v.as_str())
    }
}

/// Result of one extraction step inside an already rendered page.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Extracted(Row),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Self {
        ResultTable {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: vec![],
        }
    }

    /// Builds a table from already ordered cells. Short rows are padded.
    pub fn from_rows<S: AsRef<str>>(columns: &[S], rows: Vec<Vec<String>>) -> Self {
        let mut table = Self::new(columns);
        for mut row in rows {
            row.resize(table.columns.len(), EMPTY_CELL.to_string());
            table.rows.push(row);
        }
        table
    }

    /// Appends a row, tagging it with its search term and source.
    pub fn push(&mut self, search_term: &str, source: &str, row: &Row) {
        let cells = self
            .columns
            .iter()
            .map(|column| match column.as_str() {
                SEARCH_TERM => search_term.to_string(),
                SOURCE => source.to_string(),
                other => row.get(other).unwrap_or(EMPTY_CELL).to_string(),
            })
            .collect();
        self.rows.push(cells);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[index].as_str()).collect())
    }

    /// Projects the table onto `schema`: columns not carried are filled with
    /// `EMPTY_CELL`, columns outside the schema are dropped.
    pub fn reindex<S: AsRef<str>>(&self, schema: &[S]) -> ResultTable {
        let positions: Vec<Option<usize>> = schema
            .iter()
            .map(|name| self.columns.iter().position(|c| c == name.as_ref()))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                positions
                    .iter()
                    .map(|p| match p {
                        Some(i) => row[*i].clone(),
                        None => EMPTY_CELL.to_string(),
                    })
                    .collect()
            })
            .collect();

        ResultTable {
            columns: schema.iter().map(|c| c.as_ref().to_string()).collect(),
            rows,
        }
    }

    /// Stacks tables in order onto `schema`.
    pub fn concat<S: AsRef<str>>(schema: &[S], tables: &[ResultTable]) -> ResultTable {
        let mut master = ResultTable::new(schema);
        for table in tables {
            master.rows.extend(table.reindex(schema).rows);
        }
        master
    }
}
