// Tabular snapshot rendered as CSV

use super::error::{DomainError, Result};

/// In-memory table written by a job's `store` phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Snapshot {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with empty cells; rows wider
    /// than the header are rejected and the snapshot is left unchanged.
    pub fn push_row<I, S>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let width = self.header.len();
        let mut cells: Vec<String> = row.into_iter().map(Into::into).collect();
        if cells.len() > width {
            return Err(DomainError::ValidationError(format!(
                "row has {} cells, header has {}",
                cells.len(),
                width
            )));
        }
        cells.resize(width, String::new());
        self.rows.push(cells);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// RFC 4180 rendering, `\n` line endings
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        write_record(&mut out, &self.header);
        for row in &self.rows {
            write_record(&mut out, row);
        }
        out
    }
}

fn write_record(out: &mut String, cells: &[String]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_field(out, cell);
    }
    out.push('\n');
}

fn write_field(out: &mut String, field: &str) {
    let needs_quotes = field.contains([',', '"', '\n', '\r']);
    if !needs_quotes {
        out.push_str(field);
        return;
    }
    out.push('"');
    out.push_str(&field.replace('"', "\"\""));
    out.push('"');
}
