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

//! Entry point to the employee records service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use employees::db::init_schema;
use employees::serve;
use employees_core::db::Db;
use employees_core::db::postgres::{PostgresDb, PostgresOptions};
use employees_core::db::sqlite;
use employees_core::env::get_optional_var;
use log::info;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Port to listen on when `EMPLOYEES_PORT` is not set.
const DEFAULT_PORT: u16 = 3000;

/// Opens the database selected by the environment.
///
/// An SQLite database is used if `EMPLOYEES_SQLITE_PATH` is set.  Otherwise, the connection
/// details for PostgreSQL are taken from the `PGSQL_PROD_*` variables.
async fn connect_db() -> Result<Arc<dyn Db + Send + Sync>, String> {
    match get_optional_var::<String>("EMPLOYEES", "SQLITE_PATH")? {
        Some(path) => {
            info!("Using SQLite database at {}", path);
            let db = sqlite::connect(&path).await.map_err(|e| e.to_string())?;
            Ok(Arc::new(db))
        }
        None => {
            let opts = PostgresOptions::from_env("PGSQL_PROD")?;
            info!("Using PostgreSQL database {:?}", opts);
            Ok(Arc::new(PostgresDb::connect(opts)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    env_logger::init();

    let port = get_optional_var::<u16>("EMPLOYEES", "PORT")?.unwrap_or(DEFAULT_PORT);
    let addr = (Ipv4Addr::UNSPECIFIED, port);

    let db = connect_db().await?;
    let mut ex = db.ex().await.map_err(|e| e.to_string())?;
    init_schema(&mut ex).await.map_err(|e| e.to_string())?;
    drop(ex);

    serve(addr, db).await.map_err(|e| e.to_string())
}
