use tracing::{info, warn};

use super::connection::{open_existing, open_or_create};
use super::records::{delete_all_records, fetch_all_records, insert_records};
use super::schema::{create_table, fetch_headers, quote_ident};
use crate::error::{Result, SourceError};
use crate::models::{ConnectionParams, Dataset, Header, Row, TableSchema};

#[derive(Debug, Clone)]
/// A configured table target. Each method opens its own session and closes it
/// before returning; nothing is pooled or reused between calls.
pub struct RelationalSource {
    params: ConnectionParams,
}

impl RelationalSource {
    /// Remember `params` for every later call. Nothing is opened yet.
    pub fn new(params: ConnectionParams) -> Self {
        info!(
            host = %params.host,
            user = %params.user,
            schema = %params.schema,
            table = %params.table,
            "configured relational target"
        );
        Self { params }
    }

    /// The connection parameters used by each operation.
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Change the working table. Blank names are ignored.
    pub fn set_table(&mut self, table: &str) {
        self.params.set_table(table);
    }

    /// Every row of the working table, values rendered as text.
    pub fn get_all_records(&self) -> Result<Vec<Row>> {
        let session = open_existing(&self.params)?;
        fetch_all_records(&session, &self.params.table)
    }

    /// Column names from catalog metadata, ordered by ordinal position.
    pub fn get_headers(&self) -> Result<Header> {
        let session = open_existing(&self.params)?;
        fetch_headers(&session, &self.params.table)
    }

    /// Append `rows` to the table. Returns the number of rows written.
    pub fn insert_records(&self, rows: &[Row]) -> Result<usize> {
        let mut session = open_existing(&self.params)?;
        let inserted = insert_records(&mut session, &self.params.table, rows)?;
        info!(
            rows = inserted,
            table = %self.params.qualified_table(),
            "inserted records"
        );
        Ok(inserted)
    }

    /// Empty the working table, keeping its definition. Returns the number of
    /// rows removed.
    pub fn delete_all_records(&self) -> Result<usize> {
        let session = open_existing(&self.params)?;
        delete_all_records(&session, &self.params.table)
    }

    /// Drop and recreate the table from `schema`. Creates the database file
    /// when it does not exist yet.
    pub fn create_table(&self, schema: &TableSchema) -> Result<()> {
        let session = open_or_create(&self.params)?;
        create_table(&session, &self.params.table, schema)
    }

    /// Open a session and read at most one row. Every failure is logged and
    /// reported as `false`.
    pub fn test_connection(&self) -> bool {
        match self.probe() {
            Ok(()) => {
                info!(table = %self.params.qualified_table(), "connection successful");
                true
            }
            Err(err) => {
                warn!(
                    table = %self.params.qualified_table(),
                    error = %err,
                    "connection check failed"
                );
                false
            }
        }
    }

    /// Header and rows in one dataset.
    pub fn load_dataset(&self) -> Result<Dataset> {
        let rows = self.get_all_records()?;
        let header = self.get_headers()?;
        Ok(Dataset::new(header, rows))
    }

    fn probe(&self) -> Result<()> {
        let session = open_existing(&self.params)?;
        let table = &self.params.table;
        let mut stmt = session
            .prepare(&format!("SELECT * FROM {} LIMIT 1", quote_ident(table)))
            .map_err(SourceError::query(format!("prepare probe on {table}")))?;
        let mut rows = stmt
            .query([])
            .map_err(SourceError::query(format!("probe {table}")))?;
        rows.next()
            .map_err(SourceError::query(format!("read probe row from {table}")))?;
        Ok(())
    }
}
