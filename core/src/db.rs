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

//! Generic abstraction to access different database systems.
//!
//! Services talk to PostgreSQL in production and to SQLite in tests or in small single-node
//! deployments.  The types in here hide which of the two is in use until the very last moment:
//! operations receive an `Executor` and only destructure it to pick the SQL dialect to issue.

use async_trait::async_trait;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Database errors.  Any unexpected errors that come from the database are classified as
/// `BackendError`, but errors we know about have more specific types.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// A write was rejected because it would violate a uniqueness constraint.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all error type for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Data read from the database does not satisfy the invariants of the model.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// The requested entry does not exist.
    #[error("Entity not found")]
    NotFound,

    /// The database cannot be reached or refuses to hand out connections.
    #[error("{0}")]
    Unavailable(String),
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// Backend-specific handle to issue queries with.
///
/// There is one variant per enabled backend.  Each one exposes the raw `sqlx` connection so that
/// queries are type-checked against the right database, whether the handle comes straight from the
/// pool or from an open transaction.
pub enum Executor {
    /// Handle to a PostgreSQL database.
    #[cfg(feature = "postgres")]
    Postgres(postgres::PostgresExecutor),

    /// Handle to an SQLite database.
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteExecutor),
}

/// An `Executor` that lives inside an open transaction.
///
/// Dropping this without calling `commit` rolls the transaction back.
pub struct TxExecutor(Executor);

impl TxExecutor {
    /// Gives access to the executor to run queries within the transaction.
    pub fn ex(&mut self) -> &mut Executor {
        &mut self.0
    }

    /// Makes all changes done within the transaction permanent.
    pub async fn commit(self) -> DbResult<()> {
        match self.0 {
            #[cfg(feature = "postgres")]
            Executor::Postgres(e) => e.commit().await,

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(e) => e.commit().await,
        }
    }
}

/// A pool of connections to a database.
#[async_trait]
pub trait Db {
    /// Takes a connection from the pool to run standalone queries.
    async fn ex(&self) -> DbResult<Executor>;

    /// Takes a connection from the pool and opens a transaction on it.
    async fn begin(&self) -> DbResult<TxExecutor>;

    /// Waits for all connections to be returned and closes them.  Later requests for a connection
    /// fail with `DbError::Unavailable`.
    async fn close(&self);
}

/// Splits a `schema` file into its individual statements, dropping `--` comments.
#[cfg(any(feature = "postgres", feature = "sqlite"))]
fn schema_statements(schema: &str) -> DbResult<Vec<String>> {
    let comment = regex::RegexBuilder::new("--.*$")
        .multi_line(true)
        .build()
        .map_err(|e| DbError::BackendError(e.to_string()))?;
    Ok(comment
        .replace_all(schema, "")
        .split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Helpers to write database tests once and run them against every backend.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    pub use paste::paste;

    /// Defines a test called `name` that runs `module::name` against the database returned by
    /// `setup`, optionally tagged with `extra` (typically an `#[ignore]`).
    #[macro_export]
    macro_rules! generate_one_test [
        ( $name:ident, $setup:expr, $module:path $(, #[$extra:meta] )? ) => {
            #[tokio::test]
            $(#[$extra])?
            async fn $name() {
                $crate::db::testutils::paste! {
                    $module :: [< $name >]($setup).await;
                }
            }
        }
    ];

    pub use generate_one_test;

    /// Defines one test for every `name` in `module` using `generate_one_test`.
    ///
    /// `setup` is evaluated once per test and must yield a database that already has whatever
    /// schema the tests need.
    #[macro_export]
    macro_rules! generate_tests [
        ( #[$extra:meta], $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                $crate::db::testutils::generate_one_test!($name, $setup, $module, #[$extra]);
            )+
        };

        ( $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                $crate::db::testutils::generate_one_test!($name, $setup, $module);
            )+
        };
    ];

    pub use generate_tests;
}
