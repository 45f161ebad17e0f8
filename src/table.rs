//! Tabular resources (`*.bcsv` tables in their text form).
//!
//! The first non-comment line names the columns; every following line is a
//! record. Cells are separated by tabs when the header contains one, by
//! commas otherwise.

use crate::error::{ActorError, ActorResult};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InfoTable {
    columns: Vec<String>,
    records: Vec<Vec<String>>,
}

impl InfoTable {
    pub fn parse(text: &str) -> ActorResult<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(line_no, line)| (line_no + 1, line.trim_end_matches('\r')))
            .filter(|(_, line)| {
                let trimmed = line.trim();
                !trimmed.is_empty() && !trimmed.starts_with('#')
            });

        let Some((header_line, header)) = lines.next() else {
            return Ok(Self::default());
        };
        let separator = if header.contains('\t') { '\t' } else { ',' };
        let columns: Vec<String> = header
            .split(separator)
            .map(|column| column.trim().to_string())
            .collect();
        if let Some(position) = columns.iter().position(String::is_empty) {
            return Err(ActorError::Table {
                line: header_line,
                message: format!("column {} has no name", position + 1),
            });
        }

        let mut records = Vec::new();
        for (line_no, line) in lines {
            let cells: Vec<String> = line
                .split(separator)
                .map(|cell| cell.trim().to_string())
                .collect();
            if cells.len() > columns.len() {
                return Err(ActorError::Table {
                    line: line_no,
                    message: format!(
                        "record has {} cells but only {} columns are declared",
                        cells.len(),
                        columns.len()
                    ),
                });
            }
            records.push(cells);
        }

        Ok(Self { columns, records })
    }

    /// Decodes table bytes as UTF-8 before parsing.
    pub fn from_bytes(data: &[u8]) -> ActorResult<Self> {
        let text = std::str::from_utf8(data).map_err(|err| ActorError::Table {
            line: 0,
            message: format!("table is not valid UTF-8: {err}"),
        })?;
        Self::parse(text)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn iter(&self) -> InfoIter<'_> {
        InfoIter {
            table: self,
            record: 0,
        }
    }
}

/// Cursor over the records of an [`InfoTable`].
#[derive(Debug, Clone, Copy)]
pub struct InfoIter<'a> {
    table: &'a InfoTable,
    record: usize,
}

impl<'a> InfoIter<'a> {
    pub fn num_records(&self) -> usize {
        self.table.records.len()
    }

    pub fn set_record(&mut self, index: usize) {
        self.record = index;
    }

    pub fn record(&self) -> usize {
        self.record
    }

    /// Returns the raw cell, or `None` when the column is absent from the
    /// table or from the current record.
    pub fn value_string(&self, column: &str) -> Option<&'a str> {
        let index = self.table.columns.iter().position(|name| name == column)?;
        self.table
            .records
            .get(self.record)?
            .get(index)
            .map(String::as_str)
    }

    /// Returns the cell as a number. Empty and non-numeric cells read as
    /// `None`.
    pub fn value_number(&self, column: &str) -> Option<f64> {
        self.value_string(column)
            .filter(|value| !value.is_empty())
            .and_then(|value| value.parse::<f64>().ok())
    }
}
