//! Records, header sets and datasets.
//!
//! A [`Dataset`] pairs an ordered header sequence with records whose columns
//! line up with it. Alignment is checked once at construction so the matching
//! code can address values by column position.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ReconError, Result};

/// Which of the two reconciled datasets a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a dataset: ordered column name to raw value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Builds a record by zipping headers with row values.
    ///
    /// Missing trailing values become empty strings; extra values are kept
    /// under positional names so that alignment checks can report them.
    pub fn from_row(headers: &[String], row: &[String]) -> Self {
        let width = headers.len().max(row.len());
        let fields = (0..width)
            .map(|idx| {
                let column = headers
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| format!("#{}", idx + 1));
                let value = row.get(idx).cloned().unwrap_or_default();
                (column, value)
            })
            .collect();
        Self { fields }
    }

    /// Looks up a value by column name.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Value at a column position, or the empty string when out of range.
    pub fn value_at(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Ordered column names of one dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSet {
    columns: Vec<String>,
}

impl HeaderSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn validate(&self, side: Side) -> Result<()> {
        if self.columns.is_empty() {
            return Err(ReconError::EmptyHeaders { side });
        }
        let mut seen = BTreeSet::new();
        for column in &self.columns {
            if !seen.insert(column.as_str()) {
                return Err(ReconError::DuplicateHeader {
                    side,
                    column: column.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A validated header set with its records.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    side: Side,
    headers: HeaderSet,
    records: Vec<Record>,
}

impl Dataset {
    /// Validates headers and record alignment.
    ///
    /// # Errors
    ///
    /// Returns [`ReconError::EmptyHeaders`], [`ReconError::DuplicateHeader`] or
    /// [`ReconError::RecordMisaligned`].
    pub fn new(side: Side, headers: HeaderSet, records: Vec<Record>) -> Result<Self> {
        headers.validate(side)?;
        for (index, record) in records.iter().enumerate() {
            check_alignment(side, index, &headers, record)?;
        }
        Ok(Self {
            side,
            headers,
            records,
        })
    }

    /// Builds a dataset from positional rows such as those read from CSV.
    pub fn from_rows(side: Side, headers: Vec<String>, rows: &[Vec<String>]) -> Result<Self> {
        let records = rows
            .iter()
            .map(|row| Record::from_row(&headers, row))
            .collect();
        Self::new(side, HeaderSet::new(headers), records)
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn check_alignment(side: Side, index: usize, headers: &HeaderSet, record: &Record) -> Result<()> {
    let misaligned = |column: &str| ReconError::RecordMisaligned {
        side,
        index,
        column: column.to_string(),
    };
    let mut record_columns = record.columns();
    for header in headers.iter() {
        match record_columns.next() {
            Some(column) if column == header => {}
            Some(column) => return Err(misaligned(column)),
            None => return Err(misaligned(header)),
        }
    }
    if let Some(extra) = record_columns.next() {
        return Err(misaligned(extra));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn from_row_pads_missing_values() {
        let record = Record::from_row(&headers(&["name", "date"]), &["Pikachu".to_string()]);
        assert_eq!(record.get("name"), Some("Pikachu"));
        assert_eq!(record.get("date"), Some(""));
        assert_eq!(record.value_at(5), "");
    }

    #[test]
    fn extra_values_are_misaligned() {
        let rows = vec![vec!["a".to_string(), "b".to_string(), "c".to_string()]];
        let err = Dataset::from_rows(Side::A, headers(&["x", "y"]), &rows).unwrap_err();
        match err {
            ReconError::RecordMisaligned { index, column, .. } => {
                assert_eq!(index, 0);
                assert_eq!(column, "#3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn record_with_wrong_column_is_rejected() {
        let record = Record::new(vec![
            ("name".to_string(), "x".to_string()),
            ("price".to_string(), "1".to_string()),
        ]);
        let err = Dataset::new(
            Side::B,
            HeaderSet::new(headers(&["name", "date"])),
            vec![record],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ReconError::RecordMisaligned { side: Side::B, ref column, .. } if column == "price"
        ));
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let err = Dataset::from_rows(Side::A, headers(&["id", "id"]), &[]).unwrap_err();
        assert!(matches!(err, ReconError::DuplicateHeader { .. }));
    }
}
