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

//! Shared pieces of the HTTP layer.
//!
//! Services build their `Router` in their own `rest` module and keep each API in a file named
//! `<entity>_<method>.rs`, next to its tests.  Those tests define a `route` helper that returns the
//! method and path of the API, so that every test in the file is guaranteed to hit the same API.
//!
//! Tests drive the router in-process through the `testutils` module: `OneShotBuilder` issues one
//! request and `ResponseChecker` asserts on the buffered response.

use serde::{Deserialize, Serialize};

/// Representation of the details of an error response sent as JSON.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct ErrorResponse {
    /// Textual representation of the error message.
    pub error: String,

    /// HTTP status code of the response, for the errors that carry it in the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Time at which the error was generated, in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ErrorResponse {
    /// Creates an error response that only carries a `message`.
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self { error: message.into(), status: None, timestamp: None }
    }

    /// Attaches the `status` code and the `timestamp` of the error to the response.
    pub fn with_details(mut self, status: http::StatusCode, timestamp: i64) -> Self {
        self.status = Some(status.as_u16());
        self.timestamp = Some(timestamp);
        self
    }
}

/// Common test code for the REST server.
#[cfg(feature = "testutils")]
pub mod testutils {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::{self, HeaderName, HeaderValue};
    use serde::de::DeserializeOwned;
    use tower::util::ServiceExt;

    /// Largest response body the tests are willing to read.
    const MAX_BODY_SIZE: usize = 64 * 1024;

    /// Builder for a single request to the API server.
    #[must_use]
    pub struct OneShotBuilder {
        /// The router for the app being tested.
        app: Router,

        /// Builder for the request that will be sent to the app.
        builder: http::request::Builder,
    }

    impl OneShotBuilder {
        /// Prepares a request for the `method`/`uri` pair against the `app` router.
        pub fn new<U: AsRef<str>>(app: Router, (method, uri): (http::Method, U)) -> Self {
            Self { app, builder: Request::builder().method(method).uri(uri.as_ref()) }
        }

        /// Adds the header `name` with `value` to the request.
        pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
        where
            HeaderName: TryFrom<K>,
            <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
            HeaderValue: TryFrom<V>,
            <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
        {
            self.builder = self.builder.header(name, value);
            self
        }

        /// Sets the content type of the request unless the caller already chose one.
        fn default_content_type(mut self, content_type: &mime::Mime) -> Self {
            let has_content_type = self
                .builder
                .headers_ref()
                .is_some_and(|headers| headers.contains_key(http::header::CONTENT_TYPE));
            if !has_content_type {
                self.builder = self.builder.header(http::header::CONTENT_TYPE, content_type.as_ref());
            }
            self
        }

        /// Sends the request with `body` and buffers the whole response.
        async fn send(self, body: Body) -> ResponseChecker {
            let request = self.builder.body(body).unwrap();
            let response = self.app.oneshot(request).await.unwrap();

            let status = response.status();
            let content_type = response
                .headers()
                .get(http::header::CONTENT_TYPE)
                .map(|value| value.to_str().unwrap().to_owned());
            let body = axum::body::to_bytes(response.into_body(), MAX_BODY_SIZE).await.unwrap();
            let body = String::from_utf8(body.to_vec()).unwrap();

            ResponseChecker { status, content_type, body, exp_status: http::StatusCode::OK }
        }

        /// Sends the request without a payload.
        pub async fn send_empty(self) -> ResponseChecker {
            self.send(Body::empty()).await
        }

        /// Sends the request with a raw `text` payload.  The payload is labeled as plain text
        /// unless `with_header` set a different content type.
        pub async fn send_text<T: Into<String>>(self, text: T) -> ResponseChecker {
            self.default_content_type(&mime::TEXT_PLAIN).send(Body::from(text.into())).await
        }

        /// Sends the request with `value` serialized as its JSON payload.
        pub async fn send_json<T: Serialize>(self, value: T) -> ResponseChecker {
            let payload = serde_json::to_vec(&value).unwrap();
            self.default_content_type(&mime::APPLICATION_JSON).send(Body::from(payload)).await
        }
    }

    /// A buffered response to a request sent by a `OneShotBuilder`, plus the expectations on it.
    #[must_use]
    pub struct ResponseChecker {
        /// Status code of the response.
        status: http::StatusCode,

        /// Value of the `Content-Type` header of the response, if any.
        content_type: Option<String>,

        /// Full body of the response.
        body: String,

        /// Status code the response must carry.
        exp_status: http::StatusCode,
    }

    impl ResponseChecker {
        /// Expects the response to carry `status` instead of 200.
        pub fn expect_status(mut self, status: http::StatusCode) -> Self {
            self.exp_status = status;
            self
        }

        /// Checks the expectations that apply to every response.
        fn verify(&self) {
            assert_eq!(
                self.exp_status, self.status,
                "Unexpected status; body was '{}'",
                self.body
            );
        }

        /// Expects the response to have no body.
        pub fn expect_empty(self) {
            self.verify();
            assert!(self.body.is_empty(), "Body not empty; got {}", self.body);
        }

        /// Expects the response to be an `ErrorResponse` whose message matches `exp_re` and
        /// returns it for further checks.
        pub fn expect_error(self, exp_re: &str) -> ErrorResponse {
            self.verify();
            let response: ErrorResponse = serde_json::from_str(&self.body).unwrap_or_else(|e| {
                panic!("Invalid error response due to {}; content was {}", e, self.body)
            });
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(
                re.is_match(&response.error),
                "Error '{}' does not match re '{}'",
                response.error,
                exp_re
            );
            response
        }

        /// Expects the response to be a JSON document that deserializes into a `T`.
        pub fn expect_json<T: DeserializeOwned>(self) -> T {
            self.verify();
            assert_eq!(Some(mime::APPLICATION_JSON.as_ref()), self.content_type.as_deref());
            serde_json::from_str::<T>(&self.body).unwrap()
        }

        /// Expects the response to be plain text matching `exp_re`.
        pub fn expect_text(self, exp_re: &str) {
            assert!(!exp_re.is_empty(), "Use expect_empty to validate empty responses");

            self.verify();
            assert!(
                self.content_type.as_deref().is_some_and(|ct| ct.starts_with("text/plain")),
                "Expected a text response; got content type {:?}",
                self.content_type
            );
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(
                re.is_match(&self.body),
                "Body content '{}' does not match re '{}'",
                self.body,
                exp_re
            );
        }
    }

    /// Generates a test to verify that an API that expects JSON rejects anything else with a
    /// plain-text explanation.
    #[macro_export]
    macro_rules! test_payload_must_be_json {
        ( $app:expr, $route:expr ) => {
            #[tokio::test]
            async fn test_payload_must_be_json() {
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    .send_text("this is not json")
                    .await
                    .expect_status(axum::http::StatusCode::BAD_REQUEST)
                    .expect_text("Content-Type");

                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    .with_header(axum::http::header::CONTENT_TYPE, "application/json")
                    .send_text("this is not json")
                    .await
                    .expect_status(axum::http::StatusCode::BAD_REQUEST)
                    .expect_text("expected ident");
            }
        };
    }

    pub use test_payload_must_be_json;
}
