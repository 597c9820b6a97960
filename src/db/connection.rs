use crate::error::{Result, RnaseqlError};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

const BUSY_TIMEOUT_MS: u64 = 5_000;

/// Read-only handle on the RNA-seq result database. The agent never writes;
/// opening without write flags keeps that true at the driver level while the
/// executor's deny-list keeps it observable at the tool boundary.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            RnaseqlError::SchemaUnavailable(format!(
                "cannot open database at {}: {}",
                path.display(),
                e
            ))
        })?;
        conn.busy_timeout(std::time::Duration::from_millis(BUSY_TIMEOUT_MS))
            .map_err(|e| RnaseqlError::SchemaUnavailable(e.to_string()))?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Double-quote an identifier coming from schema reflection so that table
/// and column names with unusual characters survive interpolation.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_is_schema_unavailable() {
        let err = Database::open("/nonexistent/dir/rnaseq.db").unwrap_err();
        assert!(matches!(err, RnaseqlError::SchemaUnavailable(_)));
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("batch"), "\"batch\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
