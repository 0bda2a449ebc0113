//! Uniform row-oriented table over any record type.

use serde::Serialize;

/// A flat record that can be laid out as one table row
pub trait Record: Serialize {
    /// Column names, in the order [`Record::cells`] returns values
    const COLUMNS: &'static [&'static str];

    /// The row rendered as text cells
    fn cells(&self) -> Vec<String>;
}

/// An ordered collection of records sharing one column layout
#[derive(Debug, Clone, PartialEq)]
pub struct Table<R> {
    rows: Vec<R>,
}

impl<R: Record> Table<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        R::COLUMNS
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), R::COLUMNS.len())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }
}

impl<R: Record> From<Vec<R>> for Table<R> {
    fn from(rows: Vec<R>) -> Self {
        Self::new(rows)
    }
}

impl<R: Record> FromIterator<R> for Table<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<R> IntoIterator for Table<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a, R> IntoIterator for &'a Table<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileEntry;

    fn entry(path: &str) -> FileEntry {
        FileEntry {
            repository_name: "repo".to_string(),
            file_path: path.to_string(),
            is_directory: false,
            file_size_bytes: 1,
        }
    }

    #[test]
    fn shape_counts_rows_and_columns() {
        let table: Table<FileEntry> = vec![entry("a"), entry("b")].into();
        assert_eq!(table.shape(), (2, 4));
        assert_eq!(table.columns()[1], "file_path");
    }

    #[test]
    fn collects_from_iterator_in_order() {
        let table: Table<FileEntry> = ["x", "y", "z"].into_iter().map(entry).collect();
        let paths: Vec<_> = table.iter().map(|e| e.file_path.as_str()).collect();
        assert_eq!(paths, ["x", "y", "z"]);
    }

    #[test]
    fn empty_table_still_has_columns() {
        let table: Table<FileEntry> = Table::new(Vec::new());
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 4);
    }
}
