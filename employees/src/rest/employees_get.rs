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

//! API to get all employees.

use crate::driver::Driver;
use crate::model::Employee;
use crate::rest::RestResult;
use axum::Json;
use axum::extract::State;

/// API handler.
pub(crate) async fn handler(State(driver): State<Driver>) -> RestResult<Json<Vec<Employee>>> {
    let employees = driver.get_employees().await?;
    Ok(Json(employees))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use axum::http;
    use employees_core::rest::testutils::*;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/api".to_owned())
    }

    #[tokio::test]
    async fn test_empty() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("^No employees found$");
        assert_eq!(Some(404), response.status);
    }

    #[tokio::test]
    async fn test_one() {
        let context = TestContext::setup().await;
        let employee = context.create_employee("only").await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_json::<Vec<Employee>>();
        assert_eq!(vec![employee], response);
    }

    #[tokio::test]
    async fn test_many_sorted_by_id() {
        let context = TestContext::setup().await;
        let employee1 = context.create_employee("z").await;
        let employee2 = context.create_employee("y").await;
        let employee3 = context.create_employee("x").await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_json::<Vec<Employee>>();
        assert_eq!(vec![employee1, employee2, employee3], response);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let context = TestContext::setup().await;
        context.break_db().await;

        OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_status(http::StatusCode::INTERNAL_SERVER_ERROR)
            .expect_text("^Database error: ");
    }
}
