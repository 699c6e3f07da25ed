use rusqlite::{params, Connection};
use tracing::info;

use crate::error::{Result, SourceError};
use crate::models::{ColumnDef, ColumnType, Header, TableSchema};

/// Quote an identifier for interpolation into SQL. Values are always bound as
/// parameters; only table and column names go through here.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Whether `table` exists in the connected database. Table names compare
/// case-insensitively, the same way SQLite resolves them in statements.
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let mut stmt = conn
        .prepare(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
        )
        .map_err(SourceError::query("prepare table lookup"))?;
    stmt.exists(params![table])
        .map_err(SourceError::query("look up table"))
}

/// Column definitions from catalog metadata, in ordinal order. A missing table
/// is reported as not found rather than as an empty column list.
pub fn fetch_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnDef>> {
    if !table_exists(conn, table)? {
        return Err(SourceError::NotFound(format!("table {table}")));
    }

    let mut stmt = conn
        .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")
        .map_err(SourceError::query("prepare column metadata query"))?;

    let columns = stmt
        .query_map(params![table], |row| {
            let name: String = row.get(0)?;
            let declared: String = row.get(1)?;
            Ok(ColumnDef {
                name,
                kind: ColumnType::from_declared(&declared),
            })
        })
        .map_err(SourceError::query("read column metadata"))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(SourceError::query("collect column metadata"))?;

    Ok(columns)
}

/// Column names only, in ordinal order.
pub fn fetch_headers(conn: &Connection, table: &str) -> Result<Header> {
    Ok(fetch_columns(conn, table)?
        .into_iter()
        .map(|column| column.name)
        .collect())
}

/// Drop `table` if present and recreate it from `schema`. No keys, indexes, or
/// constraints are declared.
pub fn create_table(conn: &Connection, table: &str, schema: &TableSchema) -> Result<()> {
    if schema.is_empty() {
        return Err(SourceError::SchemaMismatch(format!(
            "cannot create table {table} without columns"
        )));
    }

    let columns = schema
        .columns
        .iter()
        .map(|column| format!("{} {}", quote_ident(&column.name), column.kind.sql_name()))
        .collect::<Vec<_>>()
        .join(", ");

    info!(table, "dropping table");
    conn.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)), [])
        .map_err(SourceError::query(format!("drop table {table}")))?;

    info!(table, columns = schema.columns.len(), "creating table");
    conn.execute(
        &format!("CREATE TABLE {} ({columns})", quote_ident(table)),
        [],
    )
    .map_err(SourceError::query(format!("create table {table}")))?;

    Ok(())
}
