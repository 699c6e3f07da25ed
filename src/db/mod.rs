//! Relational source backed by embedded SQLite, split across logical submodules.

mod connection;
mod records;
mod relational;
mod schema;

pub use connection::{database_path, open_existing, open_or_create, Session};
pub use records::{delete_all_records, fetch_all_records, insert_records};
pub use relational::RelationalSource;
pub use schema::{create_table, fetch_columns, fetch_headers, table_exists};
