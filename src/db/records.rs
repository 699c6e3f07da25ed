use std::time::Instant;

use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection};
use tracing::info;

use super::schema::{fetch_columns, quote_ident, table_exists};
use crate::error::{Result, SourceError};
use crate::models::{ColumnDef, ColumnType, Row};

/// Every row of `table` in storage order, rendered as text.
pub fn fetch_all_records(conn: &Connection, table: &str) -> Result<Vec<Row>> {
    if !table_exists(conn, table)? {
        return Err(SourceError::NotFound(format!("table {table}")));
    }

    let mut stmt = conn
        .prepare(&format!("SELECT * FROM {}", quote_ident(table)))
        .map_err(SourceError::query(format!("prepare select on {table}")))?;
    let width = stmt.column_count();

    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|idx| row.get_ref(idx).map(render_value))
                .collect::<rusqlite::Result<Row>>()
        })
        .map_err(SourceError::query(format!("select rows from {table}")))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(SourceError::query(format!("collect rows from {table}")))?;

    info!(table, rows = rows.len(), "fetched all records");
    Ok(rows)
}

/// Insert `rows` with one parameterized statement inside a single transaction.
///
/// Every row must have exactly one field per table column; the batch is
/// rejected before anything is written otherwise. Nothing prevents the same
/// rows from being inserted twice.
pub fn insert_records(conn: &mut Connection, table: &str, rows: &[Row]) -> Result<usize> {
    let columns = fetch_columns(conn, table)?;

    if let Some((idx, row)) = rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != columns.len())
    {
        return Err(SourceError::SchemaMismatch(format!(
            "row {idx} has {} fields but table {table} has {} columns",
            row.len(),
            columns.len()
        )));
    }

    let sql = insert_statement(table, &columns);
    let started = Instant::now();

    let tx = conn
        .transaction()
        .map_err(SourceError::query("begin insert transaction"))?;
    {
        let mut stmt = tx
            .prepare(&sql)
            .map_err(SourceError::query(format!("prepare insert into {table}")))?;
        for row in rows {
            let values = columns
                .iter()
                .zip(row)
                .map(|(column, raw)| bind_value(column.kind, raw));
            stmt.execute(params_from_iter(values))
                .map_err(SourceError::query(format!("insert into {table}")))?;
        }
    }
    tx.commit()
        .map_err(SourceError::query("commit insert transaction"))?;

    info!(
        table,
        rows = rows.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "finished insert"
    );
    Ok(rows.len())
}

/// Remove every row, keeping the table definition.
pub fn delete_all_records(conn: &Connection, table: &str) -> Result<usize> {
    if !table_exists(conn, table)? {
        return Err(SourceError::NotFound(format!("table {table}")));
    }

    let deleted = conn
        .execute(&format!("DELETE FROM {}", quote_ident(table)), [])
        .map_err(SourceError::query(format!("clear rows from {table}")))?;

    info!(table, rows = deleted, "cleared table");
    Ok(deleted)
}

/// `INSERT INTO "t" ("a", "b") VALUES (?1, ?2)` for the given columns.
fn insert_statement(table: &str, columns: &[ColumnDef]) -> String {
    let names = columns
        .iter()
        .map(|column| quote_ident(&column.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|n| format!("?{n}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({names}) VALUES ({placeholders})",
        quote_ident(table)
    )
}

/// Convert one text field into the value bound for a column. Numeric columns
/// store empty fields as NULL and keep unparsable text as text.
fn bind_value(kind: ColumnType, raw: &str) -> Value {
    match kind {
        ColumnType::Text => Value::Text(raw.to_string()),
        ColumnType::Integer if raw.is_empty() => Value::Null,
        ColumnType::Integer => raw
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::Text(raw.to_string())),
        ColumnType::Real if raw.is_empty() => Value::Null,
        ColumnType::Real => raw
            .parse::<f64>()
            .map(Value::Real)
            .unwrap_or_else(|_| Value::Text(raw.to_string())),
    }
}

/// Render whatever the driver hands back as text.
fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(n) => n.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_table;
    use crate::error::ErrorKind;
    use crate::models::TableSchema;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn typed_table(conn: &Connection) {
        conn.execute(
            "CREATE TABLE prices (GEO TEXT, Coordinate REAL, Year INTEGER)",
            [],
        )
        .unwrap();
    }

    #[test]
    fn insert_statement_binds_every_column() {
        let columns = TableSchema::all_text(&strings(&["a", "b c"])).columns;
        assert_eq!(
            insert_statement("t", &columns),
            "INSERT INTO \"t\" (\"a\", \"b c\") VALUES (?1, ?2)"
        );
    }

    #[test]
    fn typed_values_read_back_as_the_original_text() {
        let mut conn = Connection::open_in_memory().unwrap();
        typed_table(&conn);
        let rows = vec![
            strings(&["Canada", "1.1", "1981"]),
            strings(&["Ontario", "", "n/a"]),
        ];

        insert_records(&mut conn, "prices", &rows).unwrap();
        assert_eq!(fetch_all_records(&conn, "prices").unwrap(), rows);

        let stored: String = conn
            .query_row(
                "SELECT typeof(Coordinate) FROM prices WHERE GEO = 'Canada'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(stored, "real");
    }

    #[test]
    fn repeated_inserts_duplicate_rows() {
        let mut conn = Connection::open_in_memory().unwrap();
        create_table(
            &conn,
            "t",
            &TableSchema::all_text(&strings(&["a", "b"])),
        )
        .unwrap();
        let rows = vec![strings(&["1", "2"])];

        insert_records(&mut conn, "t", &rows).unwrap();
        insert_records(&mut conn, "t", &rows).unwrap();

        assert_eq!(
            fetch_all_records(&conn, "t").unwrap(),
            vec![strings(&["1", "2"]), strings(&["1", "2"])]
        );
    }

    #[test]
    fn short_row_rejects_the_whole_batch() {
        let mut conn = Connection::open_in_memory().unwrap();
        typed_table(&conn);
        let rows = vec![strings(&["Canada", "1.1", "1981"]), strings(&["Quebec"])];

        let err = insert_records(&mut conn, "prices", &rows).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        assert!(fetch_all_records(&conn, "prices").unwrap().is_empty());
    }

    #[test]
    fn delete_all_keeps_the_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        typed_table(&conn);
        insert_records(&mut conn, "prices", &[strings(&["Canada", "1.1", "1981"])]).unwrap();

        assert_eq!(delete_all_records(&conn, "prices").unwrap(), 1);
        assert!(fetch_all_records(&conn, "prices").unwrap().is_empty());
        assert!(table_exists(&conn, "prices").unwrap());
    }

    #[test]
    fn null_and_blob_values_render_as_text() {
        assert_eq!(render_value(ValueRef::Null), "");
        assert_eq!(render_value(ValueRef::Blob(b"raw")), "raw");
        assert_eq!(render_value(ValueRef::Real(60.9)), "60.9");
    }
}
