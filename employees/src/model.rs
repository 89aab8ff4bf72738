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

//! High-level data types.
//!
//! Every type in here validates its invariants at construction time so that the layers above can
//! assume that any instance they hold is valid.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest salary that can be assigned to an employee.
pub const MIN_SALARY: f64 = 1000.0;

/// Model errors.  These always identify the offending field so that they can be reported back to
/// the user as `<field> <message>`.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{field} {message}")]
pub struct ModelError {
    /// Name of the field that failed validation.
    field: &'static str,

    /// Description of the violated constraint.
    message: &'static str,
}

impl ModelError {
    /// Creates a new error for `field` with a `message` explaining the problem.
    pub(crate) fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Result type for this module.
pub type ModelResult<T> = Result<T, ModelError>;

/// Identifier of an employee, assigned by the database upon creation.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct EmployeeId(i64);

impl EmployeeId {
    /// Creates a new identifier from its raw value.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw value of the identifier.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Checks that `value` has some non-whitespace content.
fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// The mutable fields of an employee.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct EmployeeData {
    /// Full name.  Never blank.
    name: String,

    /// Department the employee belongs to.  Never blank.
    department: String,

    /// Salary, which is at least `MIN_SALARY`.
    salary: f64,

    /// Contact email address.  Unique across all employees when present.
    email: Option<String>,

    /// Phone number, in free form.
    phno: Option<String>,
}

impl EmployeeData {
    /// Creates a new set of employee fields after validating them.
    ///
    /// Fields are checked in declaration order and only the first violation is reported.
    pub fn new(
        name: String,
        department: String,
        salary: f64,
        email: Option<String>,
        phno: Option<String>,
    ) -> ModelResult<Self> {
        if is_blank(&name) {
            return Err(ModelError::new("name", "Name cannot be null or empty"));
        }
        if is_blank(&department) {
            return Err(ModelError::new("department", "must not be blank"));
        }
        if salary.is_nan() || salary < MIN_SALARY {
            return Err(ModelError::new("salary", "Salary must be at least 1000"));
        }
        Ok(Self { name, department, salary, email, phno })
    }
}

/// An employee as persisted in the database.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct Employee {
    /// Identifier assigned by the database.
    id: EmployeeId,

    /// All other fields of the employee.
    #[serde(flatten)]
    data: EmployeeData,
}

impl Employee {
    /// Creates a new employee from its identifier and its fields.
    pub fn new(id: EmployeeId, data: EmployeeData) -> Self {
        Self { id, data }
    }

    /// Replaces all mutable fields with `data` while keeping the identifier.
    pub fn with_data(self, data: EmployeeData) -> Self {
        Self { id: self.id, data }
    }
}


#[cfg(test)]
mod tests {
    use super::testutils::*;
    use super::*;

    #[test]
    fn test_employee_data_ok() {
        let data = EmployeeData::new(
            "Jane".to_owned(),
            "Sales".to_owned(),
            1000.0,
            None,
            Some("1234".to_owned()),
        )
        .unwrap();
        assert_eq!("Jane", data.name());
        assert_eq!("Sales", data.department());
        assert_eq!(1000.0, *data.salary());
        assert_eq!(&None, data.email());
        assert_eq!(Some("1234"), data.phno().as_deref());
    }

    #[test]
    fn test_employee_data_blank_name() {
        for name in ["", "   ", "\t\n"] {
            assert_eq!(
                "name Name cannot be null or empty",
                EmployeeData::new(name.to_owned(), "Sales".to_owned(), 5000.0, None, None)
                    .unwrap_err()
                    .to_string()
            );
        }
    }

    #[test]
    fn test_employee_data_blank_department() {
        assert_eq!(
            "department must not be blank",
            EmployeeData::new("Jane".to_owned(), " ".to_owned(), 5000.0, None, None)
                .unwrap_err()
                .to_string()
        );
    }

    #[test]
    fn test_employee_data_low_salary() {
        for salary in [999.99, 0.0, -5000.0, f64::NAN] {
            assert_eq!(
                "salary Salary must be at least 1000",
                EmployeeData::new("Jane".to_owned(), "Sales".to_owned(), salary, None, None)
                    .unwrap_err()
                    .to_string()
            );
        }
    }

    #[test]
    fn test_employee_data_first_violation_wins() {
        assert_eq!(
            ModelError::new("name", "Name cannot be null or empty"),
            EmployeeData::new("".to_owned(), "".to_owned(), 0.0, None, None).unwrap_err()
        );
        assert_eq!(
            ModelError::new("department", "must not be blank"),
            EmployeeData::new("Jane".to_owned(), "".to_owned(), 0.0, None, None).unwrap_err()
        );
    }

    #[test]
    fn test_employee_with_data_keeps_id() {
        let employee = Employee::new(EmployeeId::new(7), data_for("before"));
        let employee = employee.with_data(data_for("after"));
        assert_eq!(EmployeeId::new(7), *employee.id());
        assert_eq!(&data_for("after"), employee.data());
    }

    #[test]
    fn test_employee_serialization() {
        let employee = Employee::new(
            EmployeeId::new(3),
            EmployeeData::new("Jane".to_owned(), "Sales".to_owned(), 5000.5, None, None).unwrap(),
        );
        assert_eq!(
            r#"{"id":3,"name":"Jane","department":"Sales","salary":5000.5,"email":null,"phno":null}"#,
            serde_json::to_string(&employee).unwrap()
        );
    }
}
