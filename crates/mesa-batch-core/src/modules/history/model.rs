/// Hydrogen mass fraction at the centre below which the main sequence is over.
pub const TAMS_CENTER_H1: f64 = 1e-3;
pub const CENTER_H1: &str = "center_h1";

/// A MESA `.data` table (history or profile): global header values plus numeric columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MesaTable {
    pub(super) header: Vec<(String, String)>,
    pub(super) columns: Vec<String>,
    pub(super) rows: Vec<Vec<f64>>,
}

impl MesaTable {
    /// Header value with surrounding quotes removed.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.header
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index).copied()
    }

    /// Terminal-age main sequence: the first row whose central hydrogen
    /// fraction has dropped to [`TAMS_CENTER_H1`], otherwise the last row.
    pub fn tams_row(&self) -> Option<usize> {
        if self.rows.is_empty() {
            return None;
        }
        let last = self.rows.len() - 1;
        let Some(index) = self.column_index(CENTER_H1) else {
            return Some(last);
        };
        let exhausted = self
            .rows
            .iter()
            .position(|row| row[index] <= TAMS_CENTER_H1);
        Some(exhausted.unwrap_or(last))
    }
}
