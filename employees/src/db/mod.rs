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

//! Database abstraction in terms of the operations needed by the server.

use crate::model::{Employee, EmployeeData, EmployeeId, ModelError};
use employees_core::db::postgres;
use employees_core::db::sqlite;
use employees_core::db::{DbError, DbResult, Executor};
use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;

#[cfg(test)]
pub(crate) mod testutils;

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,
    }
}

impl TryFrom<PgRow> for Employee {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let department: String = row.try_get("department").map_err(postgres::map_sqlx_error)?;
        let salary: f64 = row.try_get("salary").map_err(postgres::map_sqlx_error)?;
        let email: Option<String> = row.try_get("email").map_err(postgres::map_sqlx_error)?;
        let phno: Option<String> = row.try_get("phno").map_err(postgres::map_sqlx_error)?;

        let data = EmployeeData::new(name, department, salary, email, phno)?;
        Ok(Employee::new(EmployeeId::new(id), data))
    }
}

impl TryFrom<SqliteRow> for Employee {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let department: String = row.try_get("department").map_err(sqlite::map_sqlx_error)?;
        let salary: f64 = row.try_get("salary").map_err(sqlite::map_sqlx_error)?;
        let email: Option<String> = row.try_get("email").map_err(sqlite::map_sqlx_error)?;
        let phno: Option<String> = row.try_get("phno").map_err(sqlite::map_sqlx_error)?;

        let data = EmployeeData::new(name, department, salary, email, phno)?;
        Ok(Employee::new(EmployeeId::new(id), data))
    }
}

/// Checks that a write operation touched exactly one row.
fn check_one_row(rows_affected: u64, operation: &str) -> DbResult<()> {
    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        n => Err(DbError::BackendError(format!("{} affected {} rows instead of one", operation, n))),
    }
}

/// Persists a new employee with the given `data` and returns it with its newly-assigned id.
///
/// Returns `None` if the store accepted the insertion but did not keep any row, which happens when
/// a trigger discards it.
pub async fn create_employee(
    ex: &mut Executor,
    data: EmployeeData,
) -> DbResult<Option<Employee>> {
    let id = match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO employees (name, department, salary, email, phno)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(data.name())
                .bind(data.department())
                .bind(data.salary())
                .bind(data.email())
                .bind(data.phno())
                .fetch_optional(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            match row {
                Some(row) => row.try_get::<i64, _>("id").map_err(postgres::map_sqlx_error)?,
                None => return Ok(None),
            }
        }

        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO employees (name, department, salary, email, phno)
                VALUES (?, ?, ?, ?, ?)
            ";
            let done = sqlx::query(query_str)
                .bind(data.name())
                .bind(data.department())
                .bind(data.salary())
                .bind(data.email())
                .bind(data.phno())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            match check_one_row(done.rows_affected(), "Insertion") {
                Ok(()) => done.last_insert_rowid(),
                Err(DbError::NotFound) => return Ok(None),
                Err(e) => return Err(e),
            }
        }
    };

    Ok(Some(Employee::new(EmployeeId::new(id), data)))
}

/// Gets the employee identified by `id`, if it exists.
pub async fn find_employee(ex: &mut Executor, id: EmployeeId) -> DbResult<Option<Employee>> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM employees WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_optional(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.map(Employee::try_from).transpose()
        }

        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM employees WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_optional(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.map(Employee::try_from).transpose()
        }
    }
}

/// Gets all employees, sorted by their identifier.
pub async fn get_employees(ex: &mut Executor) -> DbResult<Vec<Employee>> {
    let query_str = "SELECT * FROM employees ORDER BY id";
    match ex {
        Executor::Postgres(ex) => {
            let rows = sqlx::query(query_str)
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Employee::try_from).collect()
        }

        Executor::Sqlite(ex) => {
            let rows =
                sqlx::query(query_str).fetch_all(ex.conn()).await.map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Employee::try_from).collect()
        }
    }
}

/// Overwrites all mutable fields of the stored employee with the ones in `employee`.
pub async fn update_employee(ex: &mut Executor, employee: &Employee) -> DbResult<()> {
    let data = employee.data();
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE employees
                SET name = $1, department = $2, salary = $3, email = $4, phno = $5
                WHERE id = $6
            ";
            let done = sqlx::query(query_str)
                .bind(data.name())
                .bind(data.department())
                .bind(data.salary())
                .bind(data.email())
                .bind(data.phno())
                .bind(employee.id().as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE employees
                SET name = ?, department = ?, salary = ?, email = ?, phno = ?
                WHERE id = ?
            ";
            let done = sqlx::query(query_str)
                .bind(data.name())
                .bind(data.department())
                .bind(data.salary())
                .bind(data.email())
                .bind(data.phno())
                .bind(employee.id().as_i64())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    check_one_row(rows_affected, "Update")
}

/// Deletes the employee identified by `id`.
pub async fn delete_employee(ex: &mut Executor, id: EmployeeId) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM employees WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM employees WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    check_one_row(rows_affected, "Deletion")
}
