use std::path::Path;
use parking_lot::Mutex;
use rusqlite::Connection;
use crate::core::error::Result;
use crate::mirror::adapter::MirrorAdapter;

/// SQLite-backed mirror. One connection guarded by a mutex: the core
/// issues a single confirmatory statement per query, so contention is
/// not a concern here.
pub struct SqliteMirror {
    connection: Mutex<Connection>,
}

impl SqliteMirror {
    pub fn open(path: &Path) -> Result<Self> {
        let connection = Connection::open(path)?;
        Ok(SqliteMirror {
            connection: Mutex::new(connection),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        Ok(SqliteMirror {
            connection: Mutex::new(connection),
        })
    }

    /// Direct statement execution for mirror setup in embeddings and
    /// tests.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.connection.lock().execute_batch(sql)?;
        Ok(())
    }
}

impl MirrorAdapter for SqliteMirror {
    fn query_ids(&self, sql: &str) -> Result<Vec<i64>> {
        let connection = self.connection.lock();
        let mut statement = connection.prepare(sql)?;
        let rows = statement.query_map([], |row| row.get::<_, i64>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}
