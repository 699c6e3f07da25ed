//! Holds the working dataset and delegates every load and save to whichever
//! source the caller hands in. Row edits never validate shape; the sinks do.

use std::path::Path;

use tracing::{debug, info};

use crate::db::RelationalSource;
use crate::error::Result;
use crate::file::FileSource;
use crate::models::{Dataset, Header, Row, TableSchema};
use crate::source::TabularSource;

#[derive(Debug, Default)]
/// Owner of the authoritative in-memory dataset.
pub struct Coordinator {
    dataset: Dataset,
}

impl Coordinator {
    /// Start with an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current header and rows.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Column names of the current dataset.
    pub fn header(&self) -> &Header {
        &self.dataset.header
    }

    /// Rows of the current dataset, in display order.
    pub fn rows(&self) -> &[Row] {
        &self.dataset.rows
    }

    /// Replace the dataset with everything `source` holds. On failure the
    /// current dataset is kept.
    pub fn load_from(&mut self, source: &dyn TabularSource) -> Result<usize> {
        info!(source = %source.describe(), "loading dataset");
        let dataset = source.read_all()?;
        Ok(self.apply(dataset))
    }

    /// Push the dataset into `sink`.
    pub fn save_to(&self, sink: &dyn TabularSource) -> Result<usize> {
        info!(sink = %sink.describe(), rows = self.dataset.len(), "saving dataset");
        sink.write_all(&self.dataset)
    }

    /// Replace the dataset with the contents of a comma-separated file.
    /// Returns the number of rows loaded.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        self.load_from(&FileSource::new(path.as_ref()))
    }

    /// Write header and rows to `path`, replacing its contents.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        self.save_to(&FileSource::new(path.as_ref()))
    }

    /// Replace the dataset with the header and rows of `db`'s working table.
    pub fn load_from_db(&mut self, db: &RelationalSource) -> Result<usize> {
        self.load_from(db)
    }

    /// Append every row to the table. Calling this twice inserts the rows twice.
    pub fn insert_into_db(&self, db: &RelationalSource) -> Result<usize> {
        self.save_to(db)
    }

    /// Install a dataset produced elsewhere, such as by a background load.
    /// Returns the new row count.
    pub fn apply(&mut self, dataset: Dataset) -> usize {
        self.dataset = dataset;
        debug!(
            columns = self.dataset.header.len(),
            rows = self.dataset.len(),
            "dataset replaced"
        );
        self.dataset.len()
    }

    /// Insert `row` before `index`. An index past the end appends.
    pub fn insert_row(&mut self, index: usize, row: Row) {
        let index = index.min(self.dataset.rows.len());
        debug!(index, "inserting row");
        self.dataset.rows.insert(index, row);
    }

    /// Remove and return the row at `index`, or `None` when out of range.
    pub fn delete_row(&mut self, index: usize) -> Option<Row> {
        if index < self.dataset.rows.len() {
            debug!(index, "deleting row");
            Some(self.dataset.rows.remove(index))
        } else {
            None
        }
    }

    /// Replace the row at `index`, returning the previous contents, or `None`
    /// (leaving the dataset untouched) when out of range.
    pub fn update_row(&mut self, index: usize, row: Row) -> Option<Row> {
        let slot = self.dataset.rows.get_mut(index)?;
        debug!(index, "updating row");
        Some(std::mem::replace(slot, row))
    }

    /// Drop every row. The header stays so new rows can still be entered.
    pub fn clear(&mut self) {
        info!(rows = self.dataset.len(), "clearing data");
        self.dataset.rows.clear();
    }

    /// Whether `db`'s working table can be opened and read. Never errors.
    pub fn is_connected(&self, db: &RelationalSource) -> bool {
        db.test_connection()
    }

    /// Recreate the table from the current header, typed either all-text or
    /// by inspecting the current rows.
    pub fn create_table(&self, db: &RelationalSource, infer_types: bool) -> Result<TableSchema> {
        let schema = if infer_types {
            TableSchema::infer(&self.dataset.header, &self.dataset.rows)
        } else {
            TableSchema::all_text(&self.dataset.header)
        };
        db.create_table(&schema)?;
        Ok(schema)
    }

    /// Empty `db`'s working table. The in-memory dataset is left alone.
    pub fn delete_all_records(&self, db: &RelationalSource) -> Result<usize> {
        db.delete_all_records()
    }
}
