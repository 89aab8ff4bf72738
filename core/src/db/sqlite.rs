// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! SQLite backend.

use crate::db::{Db, DbError, DbResult, Executor, TxExecutor, schema_statements};
use async_trait::async_trait;
use log::{debug, warn};
use sqlx::Transaction;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Maximum number of connections to open against a file-backed database.
const MAX_FILE_CONNECTIONS: u32 = 8;

/// Classifies a raw `sqlx` error returned by SQLite.
///
/// SQLite does not expose structured error codes through `sqlx` for all of the cases we care
/// about, so some of them are recognized by their message.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::RowNotFound => DbError::NotFound,
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            DbError::Unavailable(e.to_string())
        }
        sqlx::Error::Database(db_err) => {
            let message = db_err.message();
            if message.contains("UNIQUE constraint failed") {
                DbError::AlreadyExists
            } else if message.contains("unable to open database file") {
                DbError::Unavailable(message.to_owned())
            } else {
                DbError::BackendError(format!("SQLite error: {}", message))
            }
        }
        e => DbError::BackendError(e.to_string()),
    }
}

/// Opens the database at `path`, creating it if it does not exist yet.
///
/// `:memory:` gives a private in-memory database that lives only as long as its connection.  The
/// pool keeps exactly one such connection open for its whole life: more than one would see
/// different databases, and recycling it would discard all data.
pub async fn connect(path: &str) -> DbResult<SqliteDb> {
    let options = SqliteConnectOptions::from_str(path)
        .map_err(map_sqlx_error)?
        .create_if_missing(true);

    let pool_options = if path.contains(":memory:") {
        debug!("Opening in-memory SQLite database {}", path);
        SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        debug!("Opening SQLite database {} with up to {} connections", path, MAX_FILE_CONNECTIONS);
        SqlitePoolOptions::new().max_connections(MAX_FILE_CONNECTIONS)
    };

    let pool = pool_options.connect_with(options).await.map_err(map_sqlx_error)?;
    Ok(SqliteDb { pool })
}

/// Handle to issue SQLite queries with.
#[derive(Debug)]
pub enum SqliteExecutor {
    /// A connection taken from the pool.
    Conn(PoolConnection<Sqlite>),

    /// An open transaction.
    Tx(Transaction<'static, Sqlite>),
}

impl SqliteExecutor {
    /// Returns the raw connection to pass to `sqlx` queries.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        match self {
            SqliteExecutor::Conn(conn) => &mut **conn,
            SqliteExecutor::Tx(tx) => &mut **tx,
        }
    }

    /// Commits the wrapped transaction.  Only `TxExecutor` calls this, which guarantees that the
    /// executor is transaction-backed.
    pub(super) async fn commit(self) -> DbResult<()> {
        match self {
            SqliteExecutor::Conn(_) => unreachable!("Direct executors cannot be committed"),
            SqliteExecutor::Tx(tx) => tx.commit().await.map_err(map_sqlx_error),
        }
    }
}

/// Pool of connections to an SQLite database.
pub struct SqliteDb {
    /// The underlying pool.  It can hand out connections to concurrent requests.
    pool: SqlitePool,
}

impl Drop for SqliteDb {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("SQLite pool dropped while still open");
        }
    }
}

#[async_trait]
impl Db for SqliteDb {
    async fn ex(&self) -> DbResult<Executor> {
        let conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        Ok(Executor::Sqlite(SqliteExecutor::Conn(conn)))
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(TxExecutor(Executor::Sqlite(SqliteExecutor::Tx(tx))))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Runs every statement in `schema` against `ex`.
pub async fn run_schema(ex: &mut SqliteExecutor, schema: &str) -> DbResult<()> {
    for stmt in schema_statements(schema)? {
        sqlx::query(&stmt).execute(ex.conn()).await.map_err(map_sqlx_error)?;
    }
    Ok(())
}

/// Test utilities for the SQLite backend.
#[cfg(any(feature = "testutils", test))]
pub mod testutils {
    use super::*;

    /// Opens a fresh in-memory database.
    pub async fn setup() -> SqliteDb {
        let _can_fail = env_logger::builder().is_test(true).try_init();
        connect(":memory:").await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testutils::*;
    use super::*;
    use crate::db::tests::generate_db_rw_tests;
    use std::sync::Arc;

    generate_db_rw_tests!(Arc::new(setup().await));

    #[test]
    fn test_map_sqlx_error_row_not_found() {
        assert_eq!(DbError::NotFound, map_sqlx_error(sqlx::Error::RowNotFound));
    }

    #[test]
    fn test_map_sqlx_error_pool_closed() {
        match map_sqlx_error(sqlx::Error::PoolClosed) {
            DbError::Unavailable(msg) => assert!(msg.contains("closed pool")),
            e => panic!("Unexpected error {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_unique_violation_is_already_exists() {
        let db = setup().await;
        let Executor::Sqlite(mut ex) = db.ex().await.unwrap() else {
            unreachable!("SQLite database returned a foreign executor");
        };

        run_schema(&mut ex, "CREATE TABLE t (s TEXT UNIQUE); -- A comment; with a semicolon\n")
            .await
            .unwrap();
        sqlx::query("INSERT INTO t (s) VALUES ('a')").execute(ex.conn()).await.unwrap();
        let err = sqlx::query("INSERT INTO t (s) VALUES ('a')")
            .execute(ex.conn())
            .await
            .map_err(map_sqlx_error)
            .unwrap_err();
        assert_eq!(DbError::AlreadyExists, err);

        drop(ex);
        db.close().await;
    }

    #[tokio::test]
    async fn test_connect_memory_keeps_its_only_connection() {
        let db = connect(":memory:").await.unwrap();

        let options = db.pool.options();
        assert_eq!(1, options.get_min_connections());
        assert_eq!(1, options.get_max_connections());
        assert_eq!(None, options.get_idle_timeout());
        assert_eq!(None, options.get_max_lifetime());

        let Executor::Sqlite(mut ex) = db.ex().await.unwrap() else {
            unreachable!("SQLite database returned a foreign executor");
        };
        run_schema(&mut ex, "CREATE TABLE t (i INTEGER); INSERT INTO t VALUES (1);").await.unwrap();
        drop(ex);

        let Executor::Sqlite(mut ex) = db.ex().await.unwrap() else {
            unreachable!("SQLite database returned a foreign executor");
        };
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM t").fetch_one(ex.conn()).await.unwrap();
        assert_eq!(1, count);
        drop(ex);
        db.close().await;
    }

    #[tokio::test]
    async fn test_connect_file_and_reopen() {
        let dir = std::env::temp_dir().join(format!("employees-core-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.db");
        let path = path.to_str().unwrap();

        let db = connect(path).await.unwrap();
        let Executor::Sqlite(mut ex) = db.ex().await.unwrap() else {
            unreachable!("SQLite database returned a foreign executor");
        };
        run_schema(&mut ex, "CREATE TABLE t (i INTEGER); INSERT INTO t VALUES (1);").await.unwrap();
        drop(ex);
        db.close().await;

        let db = connect(path).await.unwrap();
        let Executor::Sqlite(mut ex) = db.ex().await.unwrap() else {
            unreachable!("SQLite database returned a foreign executor");
        };
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM t").fetch_one(ex.conn()).await.unwrap();
        assert_eq!(1, count);
        drop(ex);
        db.close().await;

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
