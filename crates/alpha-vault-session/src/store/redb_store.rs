use std::path::PathBuf;

use redb::{ReadableTable as _, TableDefinition};
use snafu::ResultExt as _;
use tracing::debug;

use super::{SessionStore, StoreKey, StoreOp};
use crate::LOG_TARGET;
use crate::error::{CommitSnafu, DatabaseSnafu, StoreResult, TransactionSnafu};

/// Key: [`StoreKey::as_str`]
const SESSION_TABLE: TableDefinition<&str, &str> = TableDefinition::new("alpha_vault_session");

/// Session store persisted in a redb database file
///
/// All calls do blocking I/O. The values are tiny and the calls rare, so
/// they are made directly rather than through `spawn_blocking`.
#[derive(Debug)]
pub struct RedbSessionStore {
    db: redb::Database,
}

impl RedbSessionStore {
    /// Open (or create) the database at `path`
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        debug!(target: LOG_TARGET, path = %path.display(), "Opening session store");
        let db = redb::Database::create(path).context(DatabaseSnafu)?;
        Self::from_db(db)
    }

    /// Wrap an existing database, creating the session table if needed
    pub fn from_db(db: redb::Database) -> StoreResult<Self> {
        let tx = db.begin_write().map_err(Box::new).context(TransactionSnafu)?;
        // Opening in a write transaction creates the table
        let _ = tx.open_table(SESSION_TABLE)?;
        tx.commit().context(CommitSnafu)?;

        Ok(Self { db })
    }
}

impl SessionStore for RedbSessionStore {
    fn get(&self, key: StoreKey) -> StoreResult<Option<String>> {
        let tx = self
            .db
            .begin_read()
            .map_err(Box::new)
            .context(TransactionSnafu)?;
        let table = tx.open_table(SESSION_TABLE)?;

        Ok(table.get(key.as_str())?.map(|v| v.value().to_owned()))
    }

    fn apply(&self, ops: &[StoreOp]) -> StoreResult<()> {
        let tx = self
            .db
            .begin_write()
            .map_err(Box::new)
            .context(TransactionSnafu)?;
        {
            let mut table = tx.open_table(SESSION_TABLE)?;
            for op in ops {
                match op {
                    StoreOp::Set(key, value) => {
                        table.insert(key.as_str(), value.as_str())?;
                    }
                    StoreOp::Remove(key) => {
                        table.remove(key.as_str())?;
                    }
                }
            }
        }
        tx.commit().context(CommitSnafu)?;
        Ok(())
    }
}
