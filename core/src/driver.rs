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

//! Errors of the business logic layer.
//!
//! Services define their own `Driver` holding the database and any other shared state:
//!
//! ```rust
//! use employees_core::db::Db;
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! pub(crate) struct Driver {
//!     db: Arc<dyn Db + Send + Sync>,
//! }
//! ```
//!
//! Driver operations take `self` by value.  Each operation owns the whole unit of work against the
//! database, transaction included, and callers clone the driver for every request.

use crate::db::DbError;

/// Failures surfaced by driver operations, each carrying the message meant for the client.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// Indicates that a request to create or modify an entry failed because it would collide with
    /// an existing one.
    #[error("{0}")]
    AlreadyExists(String),

    /// The database failed in a way the driver has no specific handling for.
    #[error("{0}")]
    BackendError(String),

    /// The entry the caller referred to is not stored.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that the persistence layer could not be reached.
    #[error("{0}")]
    Unavailable(String),
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::AlreadyExists => DriverError::AlreadyExists(e.to_string()),
            DbError::BackendError(_) => DriverError::BackendError(e.to_string()),
            DbError::DataIntegrityError(_) => DriverError::BackendError(e.to_string()),
            DbError::NotFound => DriverError::NotFound(e.to_string()),
            DbError::Unavailable(msg) => DriverError::Unavailable(msg),
        }
    }
}

/// Result type for this module.
pub type DriverResult<T> = Result<T, DriverError>;
