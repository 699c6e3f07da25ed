use std::fs;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

use directories::BaseDirs;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::{Result, SourceError};
use crate::models::ConnectionParams;

/// Folder name used beneath the user's home directory when the host is
/// `localhost`.
const DATA_DIR_NAME: &str = ".tabsync";
/// Extension appended to the schema name to form the database file name.
const DB_FILE_EXTENSION: &str = "sqlite";
/// Host value that resolves to the per-user data directory.
const LOCAL_HOST: &str = "localhost";

/// An open connection that is closed when dropped. Every relational operation
/// owns exactly one of these for the duration of the call.
#[derive(Debug)]
pub struct Session {
    conn: Connection,
    target: String,
}

impl Deref for Session {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(session = %self.target, "closing database session");
    }
}

/// Open an existing database. A missing database file is a connection failure,
/// the same way an unknown schema is on a networked server.
pub fn open_existing(params: &ConnectionParams) -> Result<Session> {
    let path = database_path(params)?;
    debug!(path = %path.display(), user = %params.user, "opening database session");

    let conn = Connection::open_with_flags(
        &path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|source| SourceError::ConnectionFailed {
        target: path.display().to_string(),
        source,
    })?;

    Ok(Session {
        conn,
        target: params.qualified_table(),
    })
}

/// Open the database, creating the host directory and file when missing. Only
/// the explicit create-table step uses this.
pub fn open_or_create(params: &ConnectionParams) -> Result<Session> {
    let path = database_path(params)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(SourceError::io(parent))?;
    }

    debug!(path = %path.display(), user = %params.user, "opening database session (create)");
    let conn = Connection::open(&path).map_err(|source| SourceError::ConnectionFailed {
        target: path.display().to_string(),
        source,
    })?;

    Ok(Session {
        conn,
        target: params.qualified_table(),
    })
}

/// Resolve `host` + `schema` to the database file.
pub fn database_path(params: &ConnectionParams) -> Result<PathBuf> {
    let schema = params.schema.trim();
    if schema.is_empty() {
        return Err(SourceError::NotFound("schema (empty name)".to_string()));
    }

    let host = params.host.trim();
    let root = if host.is_empty() || host.eq_ignore_ascii_case(LOCAL_HOST) {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| SourceError::NotFound("home directory".to_string()))?;
        base_dirs.home_dir().join(DATA_DIR_NAME)
    } else {
        PathBuf::from(host)
    };

    Ok(root.join(format!("{schema}.{DB_FILE_EXTENSION}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn params(host: &str, schema: &str) -> ConnectionParams {
        ConnectionParams::new(host, "user", "secret", schema, "records")
    }

    #[test]
    fn explicit_host_is_used_as_directory() {
        let path = database_path(&params("/srv/data", "stats")).unwrap();
        assert_eq!(path, PathBuf::from("/srv/data/stats.sqlite"));
    }

    #[test]
    fn blank_schema_is_rejected() {
        let err = database_path(&params("/srv/data", " ")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceNotFound);
    }

    #[test]
    fn open_existing_fails_for_missing_database() {
        let dir = TempDir::new().unwrap();
        let host = dir.path().to_string_lossy().into_owned();
        let err = open_existing(&params(&host, "missing")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ConnectionFailed);
        assert!(!dir.path().join("missing.sqlite").exists());
    }

    #[test]
    fn open_or_create_makes_the_host_directory() {
        let dir = TempDir::new().unwrap();
        let host = dir.path().join("nested").to_string_lossy().into_owned();
        let session = open_or_create(&params(&host, "fresh")).unwrap();
        session.execute_batch("CREATE TABLE t (a TEXT)").unwrap();
        drop(session);
        assert!(dir.path().join("nested").join("fresh.sqlite").exists());
    }
}
