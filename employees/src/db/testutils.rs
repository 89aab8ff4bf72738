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

//! Test utilities for the persistence layer.

use employees_core::db::Executor;

/// Installs a trigger that silently discards every new row inserted into the `employees` table.
pub(crate) async fn discard_inserts(ex: &mut Executor) {
    match ex {
        Executor::Postgres(ex) => {
            sqlx::query(
                "CREATE FUNCTION pg_temp.discard_row() RETURNS trigger AS $$
                BEGIN
                    RETURN NULL;
                END;
                $$ LANGUAGE plpgsql",
            )
            .execute(ex.conn())
            .await
            .unwrap();
            sqlx::query(
                "CREATE TRIGGER discard_inserts BEFORE INSERT ON employees
                FOR EACH ROW EXECUTE FUNCTION pg_temp.discard_row()",
            )
            .execute(ex.conn())
            .await
            .unwrap();
        }

        Executor::Sqlite(ex) => {
            sqlx::query(
                "CREATE TRIGGER discard_inserts BEFORE INSERT ON employees
                BEGIN
                    SELECT RAISE(IGNORE);
                END",
            )
            .execute(ex.conn())
            .await
            .unwrap();
        }
    }
}
