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

//! Operations on the collection of employees.

use crate::db;
use crate::driver::Driver;
use crate::model::Employee;
use employees_core::driver::{DriverError, DriverResult};
use log::{debug, info, warn};

impl Driver {
    /// Gets all employees sorted by their identifier.
    ///
    /// An empty collection is reported as `NotFound`.
    pub(crate) async fn get_employees(self) -> DriverResult<Vec<Employee>> {
        info!("list: fetching all employees");

        let employees = db::get_employees(&mut self.db.ex().await?).await?;
        if employees.is_empty() {
            warn!("list: no employees found");
            return Err(DriverError::NotFound("No employees found".to_owned()));
        }

        debug!("list: found {} employees", employees.len());
        Ok(employees)
    }
}
