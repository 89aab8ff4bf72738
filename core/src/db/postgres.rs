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

//! PostgreSQL backend.

use crate::db::{Db, DbError, DbResult, Executor, TxExecutor, schema_statements};
use crate::env::{get_optional_var, get_required_var};
use async_trait::async_trait;
use derivative::Derivative;
use log::{debug, warn};
use sqlx::Transaction;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{
    PgConnectOptions, PgConnection, PgDatabaseError, PgPool, PgPoolOptions, Postgres,
};
use std::time::Duration;

/// How long to wait for a free connection when the request does not say otherwise.
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);

/// SQLSTATE raised when an insert or update collides with a unique index.
const UNIQUE_VIOLATION: &str = "23505";

/// Returns true if the SQLSTATE `code` means that the server cannot serve us right now.
fn is_unavailable_code(code: &str) -> bool {
    // Class 08 covers connection exceptions, 53300 is too_many_connections and the 57P0x codes
    // are raised while the server shuts down or starts up.
    code.starts_with("08") || matches!(code, "53300" | "57P01" | "57P02" | "57P03")
}

/// Classifies a raw `sqlx` error returned by PostgreSQL.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::RowNotFound => DbError::NotFound,
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => DbError::Unavailable(e.to_string()),
        sqlx::Error::Database(db_err) => {
            let code = db_err.downcast_ref::<PgDatabaseError>().code();
            if code == UNIQUE_VIOLATION {
                DbError::AlreadyExists
            } else if is_unavailable_code(code) {
                DbError::Unavailable(db_err.message().to_owned())
            } else {
                DbError::BackendError(format!("PostgreSQL error {}: {}", code, db_err.message()))
            }
        }
        e => DbError::BackendError(e.to_string()),
    }
}

/// Connection settings for a PostgreSQL server.
#[derive(Derivative)]
#[derivative(Debug, Default, PartialEq)]
pub struct PostgresOptions {
    /// Name or address of the server.
    pub host: String,

    /// TCP port the server listens on.
    pub port: u16,

    /// Database to open.
    pub database: String,

    /// Role to log in as.
    pub username: String,

    /// Password of the role.
    #[derivative(Debug = "ignore")]
    pub password: String,

    /// Connections to keep open even when idle.
    pub min_connections: Option<u32>,

    /// Upper bound on the number of open connections.
    pub max_connections: Option<u32>,

    /// How long a request may wait for a free connection before failing as unavailable.
    pub acquire_timeout: Option<Duration>,
}

impl PostgresOptions {
    /// Reads the settings from the `<prefix>_*` environment variables.
    ///
    /// `HOST`, `PORT`, `DATABASE`, `USERNAME` and `PASSWORD` are required.  `MIN_CONNECTIONS`,
    /// `MAX_CONNECTIONS` and `ACQUIRE_TIMEOUT_SECS` are optional.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let acquire_timeout = get_optional_var::<u64>(prefix, "ACQUIRE_TIMEOUT_SECS")?;
        Ok(Self {
            host: get_required_var(prefix, "HOST")?,
            port: get_required_var(prefix, "PORT")?,
            database: get_required_var(prefix, "DATABASE")?,
            username: get_required_var(prefix, "USERNAME")?,
            password: get_required_var(prefix, "PASSWORD")?,
            min_connections: get_optional_var(prefix, "MIN_CONNECTIONS")?,
            max_connections: get_optional_var(prefix, "MAX_CONNECTIONS")?,
            acquire_timeout: acquire_timeout.map(Duration::from_secs),
        })
    }

    /// Builds a pool for these settings.  Connections are opened on first use.
    fn into_pool(self) -> PgPool {
        let mut pool_options = PgPoolOptions::new()
            .acquire_timeout(self.acquire_timeout.unwrap_or(DEFAULT_ACQUIRE_TIMEOUT));
        if let Some(min) = self.min_connections {
            pool_options = pool_options.min_connections(min);
        }
        if let Some(max) = self.max_connections {
            pool_options = pool_options.max_connections(max);
        }

        let connect_options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(&self.password);
        pool_options.connect_lazy_with(connect_options)
    }
}

/// Handle to issue PostgreSQL queries with.
#[derive(Debug)]
pub enum PostgresExecutor {
    /// A connection taken from the pool.
    Conn(PoolConnection<Postgres>),

    /// An open transaction.
    Tx(Transaction<'static, Postgres>),
}

impl PostgresExecutor {
    /// Returns the raw connection to pass to `sqlx` queries.
    pub fn conn(&mut self) -> &mut PgConnection {
        match self {
            PostgresExecutor::Conn(conn) => &mut **conn,
            PostgresExecutor::Tx(tx) => &mut **tx,
        }
    }

    /// Commits the wrapped transaction.  Only `TxExecutor` calls this, which guarantees that the
    /// executor is transaction-backed.
    pub(super) async fn commit(self) -> DbResult<()> {
        match self {
            PostgresExecutor::Conn(_) => unreachable!("Direct executors cannot be committed"),
            PostgresExecutor::Tx(tx) => tx.commit().await.map_err(map_sqlx_error),
        }
    }
}

/// Pool of connections to a PostgreSQL server.
pub struct PostgresDb {
    /// The underlying pool.  It can hand out connections to concurrent requests.
    pool: PgPool,
}

impl Drop for PostgresDb {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("PostgreSQL pool dropped while still open");
        }
    }
}

impl PostgresDb {
    /// Prepares a pool against the server described by `opts`.
    ///
    /// No connection is attempted here.  An unreachable server is reported as
    /// `DbError::Unavailable` by the first operation that needs a connection.
    pub fn connect(opts: PostgresOptions) -> Self {
        debug!("Preparing PostgreSQL pool for {:?}", opts);
        Self { pool: opts.into_pool() }
    }

    /// Takes a connection from the pool without wrapping it in a generic `Executor`.
    pub async fn typed_ex(&self) -> DbResult<PostgresExecutor> {
        let conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        Ok(PostgresExecutor::Conn(conn))
    }
}

#[async_trait]
impl Db for PostgresDb {
    async fn ex(&self) -> DbResult<Executor> {
        Ok(Executor::Postgres(self.typed_ex().await?))
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(TxExecutor(Executor::Postgres(PostgresExecutor::Tx(tx))))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Runs every statement in `schema` against `ex`.
pub async fn run_schema(ex: &mut PostgresExecutor, schema: &str) -> DbResult<()> {
    for stmt in schema_statements(schema)? {
        sqlx::query(&stmt).execute(ex.conn()).await.map_err(map_sqlx_error)?;
    }
    Ok(())
}

/// Test utilities for the PostgreSQL backend.
#[cfg(any(feature = "testutils", test))]
pub mod testutils {
    use super::*;

    /// Connects to the server described by the `PGSQL_TEST_*` variables.
    ///
    /// Everything the test creates goes into the `pg_temp` schema, which the server discards when
    /// the session ends.  This only works if the pool keeps exactly one connection alive for the
    /// whole test, so the pool size is pinned.
    pub async fn setup() -> PostgresDb {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let opts = PostgresOptions {
            min_connections: Some(1),
            max_connections: Some(1),
            ..PostgresOptions::from_env("PGSQL_TEST").unwrap()
        };
        let db = PostgresDb::connect(opts);

        let mut ex = db.typed_ex().await.unwrap();
        sqlx::query("SET search_path TO pg_temp").execute(ex.conn()).await.unwrap();
        db
    }
}
