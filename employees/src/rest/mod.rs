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

//! Entry point to the REST server.

use crate::driver::Driver;
use crate::model::{EmployeeData, EmployeeId, MIN_SALARY, ModelError};
use async_trait::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::response::IntoResponse;
use axum::{Json, Router, http};
use employees_core::driver::DriverError;
use employees_core::rest::ErrorResponse;
use log::{debug, error};
use serde::Deserialize;
use time::OffsetDateTime;

mod employee_delete;
mod employee_get;
mod employee_post;
mod employee_put;
mod employees_get;
#[cfg(test)]
mod testutils;

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum RestError {
    /// Indicates that the request would have created a duplicate employee.
    #[error("{0}")]
    AlreadyExists(String),

    /// Catch-all error type for all unexpected errors.
    #[error("{0}")]
    InternalError(String),

    /// Indicates that the employee identifier in the path is not a number.
    #[error("Invalid employee ID type. It must be a number.")]
    InvalidId,

    /// Indicates an error in the contents of the request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Indicates that a requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that the database could not be reached.
    #[error("Database error: {0}")]
    Unavailable(String),
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::AlreadyExists(msg) => RestError::AlreadyExists(msg),
            DriverError::BackendError(msg) => RestError::InternalError(msg),
            DriverError::NotFound(msg) => RestError::NotFound(msg),
            DriverError::Unavailable(msg) => RestError::Unavailable(msg),
        }
    }
}

impl From<ModelError> for RestError {
    fn from(e: ModelError) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> axum::response::Response {
        match self {
            RestError::AlreadyExists(msg) => {
                debug!("Rejecting duplicate employee: {}", msg);
                (http::StatusCode::CONFLICT, "Duplicate Employee data not allowed!").into_response()
            }
            RestError::InternalError(msg) => {
                error!("Unexpected error: {}", msg);
                (http::StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(msg)))
                    .into_response()
            }
            e @ RestError::InvalidId => (http::StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            RestError::InvalidRequest(msg) => (http::StatusCode::BAD_REQUEST, msg).into_response(),
            RestError::NotFound(msg) => {
                error!("{}", msg);
                let status = http::StatusCode::NOT_FOUND;
                let now = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
                let response = ErrorResponse::new(msg).with_details(status, now as i64);
                (status, Json(response)).into_response()
            }
            e @ RestError::Unavailable(_) => {
                error!("{}", e);
                (http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }
}

/// Result type for this module.
pub(crate) type RestResult<T> = Result<T, RestError>;

/// Path extractor for the `:id` segment of the APIs that operate on a single employee.
///
/// Clients address employees with 32-bit ids, so anything wider is rejected as malformed.
pub(crate) struct EmployeeIdPath(pub(crate) EmployeeId);

#[async_trait]
impl<S> FromRequestParts<S> for EmployeeIdPath
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i32>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(EmployeeIdPath(EmployeeId::new(i64::from(id)))),
            Err(e) => {
                debug!("Invalid employee id in {}: {}", parts.uri, e.body_text());
                Err(RestError::InvalidId)
            }
        }
    }
}

/// Message body of the APIs that create or update an employee.
///
/// All fields are optional here so that missing fields are reported by validation instead of by
/// the deserializer.  Any `id` in the request is ignored.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct EmployeeRequest {
    /// Full name.
    #[cfg_attr(test, serde(skip_serializing_if = "Option::is_none"))]
    pub(crate) name: Option<String>,

    /// Department the employee belongs to.
    #[cfg_attr(test, serde(skip_serializing_if = "Option::is_none"))]
    pub(crate) department: Option<String>,

    /// Salary.
    #[cfg_attr(test, serde(skip_serializing_if = "Option::is_none"))]
    pub(crate) salary: Option<f64>,

    /// Contact email address.
    #[cfg_attr(test, serde(skip_serializing_if = "Option::is_none"))]
    pub(crate) email: Option<String>,

    /// Phone number.
    #[cfg_attr(test, serde(skip_serializing_if = "Option::is_none"))]
    pub(crate) phno: Option<String>,
}

impl EmployeeRequest {
    /// Validates the request and converts it into the fields of an employee.
    fn into_data(self) -> RestResult<EmployeeData> {
        let name = self.name.unwrap_or_default();
        let department = self.department.unwrap_or_default();
        let salary = match self.salary {
            Some(salary) => salary,
            None => {
                // Problems in the fields that precede the salary take priority.
                EmployeeData::new(name, department, MIN_SALARY, None, None)?;
                return Err(RestError::InvalidRequest("salary must not be null".to_owned()));
            }
        };
        Ok(EmployeeData::new(name, department, salary, self.email, self.phno)?)
    }
}

/// Body extractor that parses and validates an `EmployeeRequest`.
pub(crate) struct EmployeeBody(pub(crate) EmployeeData);

#[async_trait]
impl<S> FromRequest<S> for EmployeeBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(request) = Json::<EmployeeRequest>::from_request(req, state)
            .await
            .map_err(|e| RestError::InvalidRequest(e.body_text()))?;
        Ok(EmployeeBody(request.into_data()?))
    }
}

/// Creates the router for the application.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::{get, post};
    Router::new()
        .route("/api", get(employees_get::handler))
        .route("/api/add", post(employee_post::handler))
        .route(
            "/api/:id",
            get(employee_get::handler).put(employee_put::handler).delete(employee_delete::handler),
        )
        .with_state(driver)
}
