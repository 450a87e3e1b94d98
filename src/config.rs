// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use supercard_core::OwnerId;
use supercard_core::types::page::DEFAULT_PAGE_SIZE;

use crate::error::Fallible;
use crate::error::fail;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "supercard.toml";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path to the SQLite database.
    pub database: PathBuf,
    pub host: String,
    pub port: u16,
    /// The learner whose cards the CLI and server operate on.
    pub owner: OwnerId,
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("supercard.db"),
            host: "127.0.0.1".to_string(),
            port: 8000,
            owner: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Loads the configuration. An explicit path must exist; the default file
    /// is optional.
    pub fn load(path: Option<&Path>) -> Fallible<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return fail(format!(
                        "config file does not exist: {}",
                        path.display()
                    ));
                }
                Self::from_file(path)
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    log::debug!("No {DEFAULT_CONFIG_FILE} found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Fallible<Self> {
        log::debug!("Reading configuration from {}", path.display());
        let text = read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(text)?;
        if config.page_size == 0 {
            return fail("page_size must be at least 1");
        }
        Ok(config)
    }
}
