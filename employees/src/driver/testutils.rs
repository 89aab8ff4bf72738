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

//! Test utilities for the business layer.

use crate::db;
use crate::driver::Driver;
use crate::model::Employee;
use crate::model::testutils::data_for;
use employees_core::db::sqlite::{self, SqliteDb};
use employees_core::db::{Db, Executor};
use std::sync::Arc;

/// State of a running test.
pub(crate) struct TestContext {
    /// The database shared with the driver, for direct access from tests.
    db: Arc<SqliteDb>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Creates a driver backed by a fresh in-memory database.
    pub(crate) async fn setup() -> Self {
        let db = Arc::new(sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let driver = Driver::new(db.clone());
        Self { db, driver }
    }

    /// Returns a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Persists an employee whose name and email derive from `seed`.
    pub(crate) async fn create_employee(&self, seed: &str) -> Employee {
        db::create_employee(&mut self.ex().await, data_for(seed)).await.unwrap().unwrap()
    }

    /// Makes the database accept insertions without keeping the new rows.
    pub(crate) async fn discard_inserts(&self) {
        db::testutils::discard_inserts(&mut self.ex().await).await;
    }

    /// Shuts down the database to simulate an unreachable backend.
    pub(crate) async fn break_db(&self) {
        self.db.close().await;
    }

    /// Returns a copy of the driver to issue a single operation.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }
}
