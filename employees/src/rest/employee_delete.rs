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

//! API to delete an employee.

use crate::driver::Driver;
use crate::rest::{EmployeeIdPath, RestResult};
use axum::extract::State;
use axum::http;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    EmployeeIdPath(id): EmployeeIdPath,
) -> RestResult<http::StatusCode> {
    driver.delete_employee(id).await?;
    Ok(http::StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use employees_core::rest::testutils::*;

    fn route<I: std::fmt::Display>(id: I) -> (http::Method, String) {
        (http::Method::DELETE, format!("/api/{}", id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        let employee = context.create_employee("gone").await;
        let other = context.create_employee("stays").await;

        OneShotBuilder::new(context.app(), route(employee.id()))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NO_CONTENT)
            .expect_empty();

        assert_eq!(vec![other], context.get_employees().await);

        OneShotBuilder::new(context.app(), (http::Method::GET, format!("/api/{}", employee.id())))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("^Employee not found with id:");
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;
        let employee = context.create_employee("stays").await;

        OneShotBuilder::new(context.app(), route(42))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("^Employee not found with id42$");

        assert_eq!(vec![employee], context.get_employees().await);
    }

    #[tokio::test]
    async fn test_invalid_id() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route("x1"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_text("^Invalid employee ID type. It must be a number.$");
    }
}
