//! Row-major string tables
//!
//! Scenario tables hold template source text in every cell (`'World'`, `3 * 2`, ...); cells
//! are evaluated only when a batch is rendered. Every row always has exactly one cell per
//! column.

use crate::enna::codec::TableData;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("TABLE_CELL: no cell at row {row}, column {column} ({rows} rows, {columns} columns)")]
    CellOutOfRange {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },

    #[error("TABLE_ROW: row {row} does not exist ({rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },

    #[error("TABLE_COLUMN: no column named '{0}'")]
    UnknownColumn(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    column_names: Vec<String>,
    data: Vec<Vec<String>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            column_names: names.into_iter().map(Into::into).collect(),
            data: Vec::new(),
        }
    }

    /// Build from stored data, padding or truncating ragged rows
    pub fn from_data(stored: &TableData) -> Self {
        let width = stored.column_names.len();
        let data = stored
            .data
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.resize(width, String::new());
                row
            })
            .collect();
        Self {
            column_names: stored.column_names.clone(),
            data,
        }
    }

    pub fn to_data(&self) -> TableData {
        TableData {
            column_names: self.column_names.clone(),
            data: self.data.clone(),
        }
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.data
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.data.get(index).map(Vec::as_slice)
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    pub fn has_columns(&self) -> bool {
        !self.column_names.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    /// Insert named columns at the given positions; new cells are empty
    ///
    /// Positions refer to the table as it is before the call and are clamped to its width.
    pub fn insert_columns(&mut self, columns: &[(usize, String)]) {
        let mut columns = columns.to_vec();
        columns.sort_by(|a, b| b.0.cmp(&a.0));
        for (index, name) in columns {
            let index = index.min(self.column_names.len());
            self.column_names.insert(index, name);
            for row in &mut self.data {
                row.insert(index, String::new());
            }
        }
    }

    /// Append columns after the existing ones, in the given order
    pub fn push_columns<S: Into<String>>(&mut self, names: impl IntoIterator<Item = S>) {
        for name in names {
            self.column_names.push(name.into());
            for row in &mut self.data {
                row.push(String::new());
            }
        }
    }

    /// Remove columns by position; out-of-range positions are ignored
    pub fn remove_columns(&mut self, indices: &[usize]) {
        let mut indices = indices.to_vec();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        for index in indices {
            if index < self.column_names.len() {
                self.column_names.remove(index);
                for row in &mut self.data {
                    row.remove(index);
                }
            }
        }
    }

    /// Insert empty rows at the given positions (clamped to the row count)
    pub fn insert_rows(&mut self, indices: &[usize]) {
        let mut indices = indices.to_vec();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        for index in indices {
            let index = index.min(self.data.len());
            self.data.insert(index, vec![String::new(); self.column_names.len()]);
        }
    }

    /// Append `count` rows, every cell set to `fill`
    pub fn append_rows(&mut self, count: usize, fill: &str) {
        let width = self.column_names.len();
        self.data
            .extend(std::iter::repeat_with(|| vec![fill.to_string(); width]).take(count));
    }

    pub fn remove_rows(&mut self, indices: &[usize]) {
        let mut indices = indices.to_vec();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        for index in indices {
            if index < self.data.len() {
                self.data.remove(index);
            }
        }
    }

    /// Copy each listed row directly below itself
    pub fn duplicate_rows(&mut self, indices: &[usize]) -> Result<(), TableError> {
        let mut indices = indices.to_vec();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        if let Some(&row) = indices.iter().find(|&&i| i >= self.data.len()) {
            return Err(TableError::RowOutOfRange {
                row,
                rows: self.data.len(),
            });
        }
        for index in indices {
            let copy = self.data[index].clone();
            self.data.insert(index + 1, copy);
        }
        Ok(())
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.data.get(row)?.get(column).map(String::as_str)
    }

    pub fn set_cell(
        &mut self,
        row: usize,
        column: usize,
        value: impl Into<String>,
    ) -> Result<(), TableError> {
        let (rows, columns) = (self.data.len(), self.column_names.len());
        let cell = self
            .data
            .get_mut(row)
            .and_then(|r| r.get_mut(column))
            .ok_or(TableError::CellOutOfRange {
                row,
                column,
                rows,
                columns,
            })?;
        *cell = value.into();
        Ok(())
    }

    /// Set a cell addressed by column name
    pub fn set_named(
        &mut self,
        row: usize,
        column: &str,
        value: impl Into<String>,
    ) -> Result<(), TableError> {
        let index = self
            .column_index(column)
            .ok_or_else(|| TableError::UnknownColumn(column.to_string()))?;
        self.set_cell(row, index, value)
    }

    /// `(column name, cell)` pairs of one row
    pub fn row_pairs(&self, row: usize) -> Vec<(&str, &str)> {
        match self.data.get(row) {
            Some(cells) => self
                .column_names
                .iter()
                .map(String::as_str)
                .zip(cells.iter().map(String::as_str))
                .collect(),
            None => Vec::new(),
        }
    }
}
