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

//! Shared plumbing for the employee records service.
//!
//! The service is split into the following layers, each of which depends only on the ones listed
//! before it:
//!
//! 1.  `model`: High-level data types that represent concepts in the domain of the application.
//!     Types in here validate their invariants at construction time.
//!
//! 1.  `db`: The persistence layer.  Operations are free functions that take an `Executor` and
//!     issue one SQL dialect per supported backend.
//!
//! 1.  `driver`: The business logic layer, which coordinates access to the database.
//!
//! 1.  `rest`: The HTTP layer, offering the REST APIs backed by the driver.
//!
//! Every layer has its own error type (`DbError`, `DriverError`, ...) with `From` conversions into
//! the next one up, so `?` carries failures from SQL all the way to an HTTP status code.
//!
//! This crate provides the pieces of the above that do not know anything about employees.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod db;
pub mod driver;
pub mod env;
pub mod rest;
