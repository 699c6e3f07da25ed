//! One capability shared by every place a dataset can come from or go to.
//!
//! The coordinator only talks to `TabularSource`; callers decide which variant
//! to hand it, so there is never a half-configured pair of optional targets.

use crate::db::RelationalSource;
use crate::error::Result;
use crate::file::FileSource;
use crate::models::{Dataset, Header};

/// Open, describe, read, and write a tabular dataset.
pub trait TabularSource {
    /// Short human-readable label for logs and status lines.
    fn describe(&self) -> String;

    /// Confirm the source is reachable without reading it.
    fn check(&self) -> Result<()>;

    /// Column names in order.
    fn describe_columns(&self) -> Result<Header>;

    /// Everything the source holds.
    fn read_all(&self) -> Result<Dataset>;

    /// Push `dataset` into the source. Returns the number of rows written.
    fn write_all(&self, dataset: &Dataset) -> Result<usize>;
}

impl TabularSource for FileSource {
    fn describe(&self) -> String {
        self.path().display().to_string()
    }

    fn check(&self) -> Result<()> {
        self.load().map(|_| ())
    }

    fn describe_columns(&self) -> Result<Header> {
        self.load().map(|(header, _)| header)
    }

    fn read_all(&self) -> Result<Dataset> {
        self.load_dataset()
    }

    /// Replaces the file contents.
    fn write_all(&self, dataset: &Dataset) -> Result<usize> {
        self.save(&dataset.rows, &dataset.header)?;
        Ok(dataset.rows.len())
    }
}

impl TabularSource for RelationalSource {
    fn describe(&self) -> String {
        self.params().qualified_table()
    }

    fn check(&self) -> Result<()> {
        self.get_headers().map(|_| ())
    }

    fn describe_columns(&self) -> Result<Header> {
        self.get_headers()
    }

    fn read_all(&self) -> Result<Dataset> {
        self.load_dataset()
    }

    /// Appends to the table; existing rows are kept.
    fn write_all(&self, dataset: &Dataset) -> Result<usize> {
        self.insert_records(&dataset.rows)
    }
}
