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

//! Typed access to configuration stored in environment variables.
//!
//! Settings are grouped by a common prefix and named `<prefix>_<suffix>`, so that the same code can
//! read, for example, the production and the test database settings.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Result type for environment errors.  Errors are messages ready to show to the user.
type Result<T> = std::result::Result<T, String>;

/// Reads the variable `name` and parses it as a `T`.  Returns `None` if it is not set.
fn lookup<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = match env::var(name) {
        Ok(raw) => raw,
        Err(env::VarError::NotPresent) => return Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            return Err(format!("Invalid value in environment variable {}", name));
        }
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|e| format!("Invalid type in environment variable {}: {}", name, e))
}

/// Gets the variable `<prefix>_<suffix>` as a `T`, failing if it is not set.
pub fn get_required_var<T>(prefix: &str, suffix: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let name = format!("{}_{}", prefix, suffix);
    lookup(&name)?.ok_or_else(|| format!("Required environment variable {} not present", name))
}

/// Gets the variable `<prefix>_<suffix>` as a `T`, or `None` if it is not set.
///
/// A variable that is set to something that cannot be parsed is still an error.
pub fn get_optional_var<T>(prefix: &str, suffix: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    lookup(&format!("{}_{}", prefix, suffix))
}
