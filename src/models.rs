//! Domain models shared by both sources and the coordinator. These types stay
//! light-weight data holders: the file and database layers translate their own
//! representations into them, and the coordinator mutates them in place.

use std::fmt;

/// Ordered column names. Uniqueness is not enforced.
pub type Header = Vec<String>;

/// One record. Field order follows the header order.
pub type Row = Vec<String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// The working table: a header plus its ordered rows.
pub struct Dataset {
    /// Column names, in the order both sources use them.
    pub header: Header,
    /// Records in display order. Row length is expected to match the header
    /// but nothing at this level checks it.
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Pair a header with its rows without checking their shape.
    pub fn new(header: Header, rows: Vec<Row>) -> Self {
        Self { header, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Clone, PartialEq, Eq)]
/// Everything needed to reach one table. The fields are plain strings and are
/// reused for every operation against the relational source.
pub struct ConnectionParams {
    /// Directory holding the database files. `localhost` maps to the per-user
    /// data directory.
    pub host: String,
    /// Carried for parity with networked engines; the embedded engine ignores it.
    pub user: String,
    /// Carried for parity with networked engines; never printed.
    pub password: String,
    /// Database name. Resolves to `<schema>.sqlite` beneath `host`.
    pub schema: String,
    /// Working table.
    pub table: String,
}

impl ConnectionParams {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Switch the working table. Blank names are ignored so a cancelled prompt
    /// leaves the previous table in place.
    pub fn set_table(&mut self, table: &str) {
        let table = table.trim();
        if !table.is_empty() {
            self.table = table.to_string();
        }
    }

    /// `schema.table`, used in log lines and status messages.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"***")
            .field("schema", &self.schema)
            .field("table", &self.table)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Storage class used when creating a table.
pub enum ColumnType {
    Text,
    Integer,
    Real,
}

impl ColumnType {
    /// SQL type name used in `CREATE TABLE`.
    pub fn sql_name(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
        }
    }

    /// Map a declared column type back to a storage class using SQLite's
    /// affinity rules, so tables created elsewhere bind values sensibly.
    pub fn from_declared(declared: &str) -> Self {
        let declared = declared.to_ascii_uppercase();
        if declared.contains("INT") {
            ColumnType::Integer
        } else if declared.contains("REAL") || declared.contains("FLOA") || declared.contains("DOUB")
        {
            ColumnType::Real
        } else {
            ColumnType::Text
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One column of a table definition.
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Ordered table definition used by the explicit create-table step.
pub struct TableSchema {
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Every column typed as text.
    pub fn all_text(header: &[String]) -> Self {
        Self {
            columns: header
                .iter()
                .map(|name| ColumnDef {
                    name: name.clone(),
                    kind: ColumnType::Text,
                })
                .collect(),
        }
    }

    /// Pick the narrowest type each column's values survive unchanged.
    ///
    /// A column becomes `INTEGER` or `REAL` only when every non-empty value
    /// parses and prints back to the exact same text, so reading the table
    /// later reproduces the original strings. Columns with no values stay text.
    pub fn infer(header: &[String], rows: &[Row]) -> Self {
        let columns = header
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let mut values = rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .filter(|value| !value.is_empty())
                    .peekable();

                let kind = if values.peek().is_none() {
                    ColumnType::Text
                } else {
                    let values: Vec<&String> = values.collect();
                    if values.iter().all(|v| is_canonical_integer(v)) {
                        ColumnType::Integer
                    } else if values.iter().all(|v| is_canonical_real(v)) {
                        ColumnType::Real
                    } else {
                        ColumnType::Text
                    }
                };

                ColumnDef {
                    name: name.clone(),
                    kind,
                }
            })
            .collect();

        Self { columns }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> Header {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

fn is_canonical_integer(value: &str) -> bool {
    value
        .parse::<i64>()
        .map(|n| n.to_string() == value)
        .unwrap_or(false)
}

/// Negative zero prints as `-0` but is stored as `0`, so it stays text.
fn is_canonical_real(value: &str) -> bool {
    value
        .parse::<f64>()
        .map(|n| {
            n.is_finite() && !(n == 0.0 && n.is_sign_negative()) && n.to_string() == value
        })
        .unwrap_or(false)
}
