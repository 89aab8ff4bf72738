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

//! Test utilities for the REST API.

use crate::db;
use crate::driver::Driver;
use crate::model::testutils::data_for;
use crate::model::{Employee, EmployeeId};
use crate::rest::app;
use axum::Router;
use employees_core::db::{Db, Executor};
use employees_core::db::sqlite::{self, SqliteDb};
use std::sync::Arc;

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the app, for direct access from tests.
    db: Arc<SqliteDb>,

    /// The app under test.
    app: Router,
}

impl TestContext {
    /// Creates an app backed by a fresh in-memory database.
    pub(crate) async fn setup() -> Self {
        let db = Arc::new(sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let driver = Driver::new(db.clone());
        let app = app(driver);
        Self { db, app }
    }

    /// Returns a copy of the app to issue a single request.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Returns a direct executor against the database.
    async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Shuts down the database to simulate an unreachable backend.
    pub(crate) async fn break_db(&self) {
        self.db.close().await;
    }

    /// Persists an employee whose name and email derive from `seed`.
    pub(crate) async fn create_employee(&self, seed: &str) -> Employee {
        db::create_employee(&mut self.ex().await, data_for(seed)).await.unwrap().unwrap()
    }

    /// Gets the employee identified by `id`, if any.
    pub(crate) async fn get_employee(&self, id: EmployeeId) -> Option<Employee> {
        db::find_employee(&mut self.ex().await, id).await.unwrap()
    }

    /// Gets all stored employees.
    pub(crate) async fn get_employees(&self) -> Vec<Employee> {
        db::get_employees(&mut self.ex().await).await.unwrap()
    }

    /// Makes the database accept insertions without keeping the new rows.
    pub(crate) async fn discard_inserts(&self) {
        db::testutils::discard_inserts(&mut self.ex().await).await;
    }

    /// Stores a row with a blank name, bypassing all validation.
    pub(crate) async fn create_corrupted_employee(&self) {
        let Executor::Sqlite(mut ex) = self.ex().await else {
            unreachable!("REST tests only run against SQLite");
        };
        sqlx::query("INSERT INTO employees (name, department, salary) VALUES ('', 'Ops', 5000)")
            .execute(ex.conn())
            .await
            .unwrap();
    }
}
