use std::collections::{BTreeMap, HashMap};
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufRead, BufReader};

use serde::{Deserialize, Serialize};

use crate::quark::{Quark, StringTable, TextVectorizer};
use crate::Error;

/// Code of a category within its column vocabulary.
pub type ClassId = usize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Categorical { codes: Vec<ClassId>, names: Quark },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: &str, values: Vec<f64>) -> Self {
        Self { name: name.to_string(), data: ColumnData::Numeric(values) }
    }

    pub fn categorical(name: &str, values: &[&str]) -> Self {
        let mut names = Quark::default();
        let codes = values.iter().map(|s| names.find_or_insert(s)).collect();
        Self { name: name.to_string(), data: ColumnData::Categorical { codes, names } }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical { codes, .. } => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self.data, ColumnData::Categorical { .. })
    }
}

/// Designates which column holds the class label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LabelColumn {
    /// The last column (the common layout for classification tables).
    Last,
    /// An explicit 0-based column position.
    Index(usize),
}

impl Default for LabelColumn {
    fn default() -> Self {
        LabelColumn::Last
    }
}

/// An immutable classification table: equally-long named columns, rows are
/// instances. Rows are addressed 0-based on this type; filter results
/// report 1-based positions of the original input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self, Error> {
        if columns.is_empty() {
            return Err(Error::InvalidInput("dataset has no columns".to_string()));
        }
        let n_rows = columns[0].len();
        for c in &columns {
            if c.len() != n_rows {
                return Err(Error::InvalidInput(format!(
                    "column '{}' has {} rows, expected {}",
                    c.name,
                    c.len(),
                    n_rows
                )));
            }
            if let ColumnData::Categorical { codes, names } = &c.data {
                if codes.iter().any(|&code| code >= names.len()) {
                    return Err(Error::InvalidInput(format!(
                        "column '{}' has a code outside its vocabulary",
                        c.name
                    )));
                }
            }
        }
        Ok(Self { columns, n_rows })
    }

    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    /// Resolves a label designator to a concrete column position and checks
    /// it can serve as a class label.
    pub fn resolve_label(&self, which: LabelColumn) -> Result<usize, Error> {
        let idx = match which {
            LabelColumn::Last => self.columns.len() - 1,
            LabelColumn::Index(i) => i,
        };
        let col = self
            .columns
            .get(idx)
            .ok_or_else(|| Error::InvalidInput(format!("label column {} out of range", idx)))?;
        if !col.is_categorical() {
            return Err(Error::InvalidInput(format!(
                "label column '{}' is not categorical",
                col.name
            )));
        }
        Ok(idx)
    }

    /// Class code of `row`. The label column must have been resolved via
    /// [`Dataset::resolve_label`] first.
    pub fn class_of(&self, row: usize, label_col: usize) -> ClassId {
        match &self.columns[label_col].data {
            ColumnData::Categorical { codes, .. } => codes[row],
            ColumnData::Numeric(_) => unreachable!("label column resolved as categorical"),
        }
    }

    pub fn class_names(&self, label_col: usize) -> &Quark {
        match &self.columns[label_col].data {
            ColumnData::Categorical { names, .. } => names,
            ColumnData::Numeric(_) => unreachable!("label column resolved as categorical"),
        }
    }

    /// Numeric cell value, `None` for categorical columns.
    pub fn numeric_value(&self, col: usize, row: usize) -> Option<f64> {
        match &self.columns[col].data {
            ColumnData::Numeric(v) => Some(v[row]),
            ColumnData::Categorical { .. } => None,
        }
    }

    /// Category code of a cell, `None` for numeric columns.
    pub fn category_code(&self, col: usize, row: usize) -> Option<ClassId> {
        match &self.columns[col].data {
            ColumnData::Numeric(_) => None,
            ColumnData::Categorical { codes, .. } => Some(codes[row]),
        }
    }

    /// Count of occurrences per class code over the given rows.
    pub fn class_distribution(&self, label_col: usize, rows: &[usize]) -> HashMap<ClassId, usize> {
        let mut tbl = HashMap::new();
        for &r in rows {
            *tbl.entry(self.class_of(r, label_col)).or_insert(0) += 1;
        }
        tbl
    }

    /// Row projection: a new dataset holding only `rows`, in the given
    /// order, with column names and vocabularies carried over.
    pub fn select(&self, rows: &[usize]) -> Dataset {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                data: match &c.data {
                    ColumnData::Numeric(v) => {
                        ColumnData::Numeric(rows.iter().map(|&r| v[r]).collect())
                    }
                    ColumnData::Categorical { codes, names } => ColumnData::Categorical {
                        codes: rows.iter().map(|&r| codes[r]).collect(),
                        names: names.clone(),
                    },
                },
            })
            .collect();
        Dataset { columns, n_rows: rows.len() }
    }

    /// Copy of the dataset with label codes overwritten at the given
    /// 0-based rows. Codes must belong to the label vocabulary.
    pub fn with_class_overwrites(
        &self,
        label_col: usize,
        repairs: &BTreeMap<usize, ClassId>,
    ) -> Result<Dataset, Error> {
        let mut ds = self.clone();
        match ds.columns.get_mut(label_col).map(|c| &mut c.data) {
            Some(ColumnData::Categorical { codes, names }) => {
                for (&row, &code) in repairs {
                    if row >= codes.len() {
                        return Err(Error::InvalidInput(format!("repair row {} out of range", row)));
                    }
                    if code >= names.len() {
                        return Err(Error::InvalidInput(format!(
                            "repair label code {} outside the class vocabulary",
                            code
                        )));
                    }
                    codes[row] = code;
                }
            }
            _ => {
                return Err(Error::InvalidInput(format!(
                    "label column {} is missing or not categorical",
                    label_col
                )))
            }
        }
        Ok(ds)
    }

    /// Reads a tab-separated table: first line holds column names, every
    /// following line one row. A column whose values all parse as numbers
    /// becomes numeric, anything else categorical.
    pub fn read_tsv<R: BufRead>(reader: R) -> Result<Dataset, Error> {
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(Error::InvalidInput("empty input".to_string())),
        };
        let names: Vec<String> = header.split('\t').map(|s| s.to_string()).collect();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
        for line in lines {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let row: Vec<&str> = line.split('\t').collect();
            if row.len() != names.len() {
                log::warn!("invalid line: {}", line);
                continue;
            }
            for (col, value) in cells.iter_mut().zip(row) {
                col.push(value.to_string());
            }
        }
        let columns = names
            .into_iter()
            .zip(cells)
            .map(|(name, values)| {
                let parsed: Option<Vec<f64>> = values.iter().map(|s| s.parse().ok()).collect();
                match parsed {
                    Some(numbers) => Column::numeric(&name, numbers),
                    None => {
                        let refs: Vec<&str> = values.iter().map(|s| s.as_str()).collect();
                        Column::categorical(&name, &refs)
                    }
                }
            })
            .collect();
        Dataset::new(columns)
    }
}

impl TryFrom<File> for Dataset {
    type Error = Error;

    fn try_from(f: File) -> Result<Self, Error> {
        Dataset::read_tsv(BufReader::new(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_col() -> Dataset {
        Dataset::new(vec![
            Column::numeric("x", vec![1.0, 2.0, 3.0]),
            Column::categorical("class", &["p", "n", "p"]),
        ])
        .expect("valid dataset")
    }

    #[test]
    fn resolve_label_defaults_to_last() {
        let ds = two_col();
        assert_eq!(ds.resolve_label(LabelColumn::Last).unwrap(), 1);
        assert_eq!(ds.class_of(0, 1), 0);
        assert_eq!(ds.class_of(1, 1), 1);
    }

    #[test]
    fn resolve_label_rejects_numeric() {
        let ds = two_col();
        match ds.resolve_label(LabelColumn::Index(0)) {
            Err(Error::InvalidInput(..)) => {}
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn ragged_columns_rejected() {
        let r = Dataset::new(vec![
            Column::numeric("x", vec![1.0]),
            Column::categorical("class", &["p", "n"]),
        ]);
        match r {
            Err(Error::InvalidInput(..)) => {}
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn select_keeps_vocabulary() {
        let ds = two_col();
        let sub = ds.select(&[2, 0]);
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.class_of(0, 1), 0);
        assert_eq!(sub.class_names(1).to_str(1), Some("n"));
    }

    #[test]
    fn overwrite_labels() {
        let ds = two_col();
        let mut repairs = BTreeMap::new();
        repairs.insert(0usize, 1usize);
        let fixed = ds.with_class_overwrites(1, &repairs).unwrap();
        assert_eq!(fixed.class_of(0, 1), 1);
        assert_eq!(ds.class_of(0, 1), 0, "original untouched");
    }

    #[test]
    fn read_tsv_infers_types() {
        let text = "x\tclass\n1.5\tp\n2.5\tn\n";
        let ds = Dataset::read_tsv(text.as_bytes()).expect("parse");
        assert_eq!(ds.len(), 2);
        assert!(ds.column(1).unwrap().is_categorical());
        assert!(!ds.column(0).unwrap().is_categorical());
    }
}
