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

//! Operations on one employee.

use crate::db;
use crate::driver::Driver;
use crate::model::{Employee, EmployeeData, EmployeeId};
use employees_core::db::DbError;
use employees_core::driver::{DriverError, DriverResult};
use log::{debug, error, info, warn};

/// Message returned when an email address is already taken by another employee.
const DUPLICATE_EMAIL: &str = "Duplicate Employee data(email already exists)";

/// Converts a database error raised while writing an employee into a driver error.
fn map_write_error(e: DbError, operation: &str) -> DriverError {
    match e {
        DbError::AlreadyExists => {
            error!("{}: email already in use", operation);
            DriverError::AlreadyExists(DUPLICATE_EMAIL.to_owned())
        }
        e => e.into(),
    }
}

impl Driver {
    /// Creates a new employee with the given `data`.
    ///
    /// Returns `None` if the database did not keep the new record.
    pub(crate) async fn add_employee(self, data: EmployeeData) -> DriverResult<Option<Employee>> {
        info!("add: creating employee {}", data.name());

        let name = data.name().clone();
        match db::create_employee(&mut self.db.ex().await?, data)
            .await
            .map_err(|e| map_write_error(e, "add"))?
        {
            Some(employee) => {
                info!("add: created employee with id {}", employee.id());
                Ok(Some(employee))
            }
            None => {
                warn!("add: employee {} was not persisted", name);
                Ok(None)
            }
        }
    }

    /// Gets the employee identified by `id`.
    pub(crate) async fn get_employee(self, id: EmployeeId) -> DriverResult<Employee> {
        debug!("get: looking up employee {}", id);

        match db::find_employee(&mut self.db.ex().await?, id).await? {
            Some(employee) => Ok(employee),
            None => {
                warn!("get: employee {} not found", id);
                Err(DriverError::NotFound(format!("Employee not found with id:{}", id)))
            }
        }
    }

    /// Replaces all fields of the employee identified by `id` with `data`.
    pub(crate) async fn update_employee(
        self,
        id: EmployeeId,
        data: EmployeeData,
    ) -> DriverResult<Employee> {
        info!("update: updating employee {}", id);
        let not_found = || {
            warn!("update: employee {} not found", id);
            DriverError::NotFound(format!("Employee not found with the id {}", id))
        };

        let mut tx = self.db.begin().await?;
        let employee = match db::find_employee(tx.ex(), id).await? {
            Some(employee) => employee.with_data(data),
            None => return Err(not_found()),
        };
        match db::update_employee(tx.ex(), &employee).await {
            Ok(()) => (),
            Err(DbError::NotFound) => return Err(not_found()),
            Err(e) => return Err(map_write_error(e, "update")),
        }
        tx.commit().await?;

        info!("update: updated employee {}", id);
        Ok(employee)
    }

    /// Deletes the employee identified by `id`.
    pub(crate) async fn delete_employee(self, id: EmployeeId) -> DriverResult<()> {
        info!("delete: deleting employee {}", id);
        let not_found = || {
            warn!("delete: employee {} not found", id);
            DriverError::NotFound(format!("Employee not found with id{}", id))
        };

        let mut tx = self.db.begin().await?;
        if db::find_employee(tx.ex(), id).await?.is_none() {
            return Err(not_found());
        }
        match db::delete_employee(tx.ex(), id).await {
            Ok(()) => (),
            Err(DbError::NotFound) => return Err(not_found()),
            Err(e) => return Err(e.into()),
        }
        tx.commit().await?;

        info!("delete: deleted employee {}", id);
        Ok(())
    }
}
