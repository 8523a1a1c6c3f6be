// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implements the configuration file.

use std::fmt::{self, Write};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::Level::Debug;
use log::{debug, log_enabled};
use paste::paste;
use serde::{de, Deserialize};

use datasrc::class::Class;
use datasrc::name::Name;

////////////////////////////////////////////////////////////////////////
// CONFIGURATION LOADING                                              //
////////////////////////////////////////////////////////////////////////

/// Loads the configuration from the file given by `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let dir = match path.as_ref().parent() {
        Some(p) => p,
        None => return Err(anyhow!("the configuration file path has no parent")),
    };
    let raw_config = fs::read(path.as_ref()).context("failed to read the configuration file")?;
    let mut config: Config =
        toml::from_slice(&raw_config).context("failed to parse the configuration file")?;

    // When loading the configuration from a path, all other paths are
    // interpreted relative to the configuration file's directory.
    match config.backend {
        BackendConfig::Database(ref mut database) => resolve(dir, &mut database.path),
        BackendConfig::Memory(ref mut memory) => {
            for zone_config in &mut memory.zones {
                resolve(dir, &mut zone_config.path);
            }
        }
    }

    log_config_summary(&config);
    Ok(config)
}

fn resolve(dir: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = dir.join(&*path);
    }
}

/// Makes the configuration for the database given on the command line.
pub fn load_from_args(database: PathBuf, class: Option<Class>) -> Config {
    let config = Config {
        class: class.map_or_else(default_class, ConfigClass),
        backend: BackendConfig::Database(DatabaseConfig { path: database }),
    };
    log_config_summary(&config);
    config
}

/// Summarizes the configuration in the log, if the debug log level is
/// enabled.
fn log_config_summary(config: &Config) {
    if !log_enabled!(Debug) {
        // Don't compute the message if it will never be printed.
        return;
    }

    let mut message = format!("Configuration loaded:\nClass:   {}\nBackend: ", config.class.0);
    match config.backend {
        BackendConfig::Database(ref database) => {
            write!(message, "database at {}", database.path.display()).unwrap();
        }
        BackendConfig::Memory(ref memory) => {
            write!(message, "memory, {} zone(s) to load", memory.zones.len()).unwrap();
            for zone_config in &memory.zones {
                write!(
                    message,
                    "\n  {} from {}",
                    zone_config.name.0,
                    zone_config.path.display(),
                )
                .unwrap();
            }
        }
    }
    debug!("{}", message);
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION FILE STRUCTURE                                       //
////////////////////////////////////////////////////////////////////////

/// The complete configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_class")]
    pub class: ConfigClass,
    pub backend: BackendConfig,
}

fn default_class() -> ConfigClass {
    ConfigClass(Class::IN)
}

/// The selection of backend and its configuration.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum BackendConfig {
    #[serde(rename = "database")]
    Database(DatabaseConfig),
    #[serde(rename = "memory")]
    Memory(MemoryConfig),
}

/// The configuration of the [`Database`](datasrc::db::Database)
/// backend.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

/// The configuration of the [`MemoryStore`](datasrc::db::MemoryStore)
/// backend, which starts out with the zones listed here.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
}

/// A zone to load into memory from a zone table file.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneConfig {
    pub name: ConfigName,
    pub path: PathBuf,
}

////////////////////////////////////////////////////////////////////////
// WRAPPERS OVER DATASRC TYPES FOR SERDE                              //
////////////////////////////////////////////////////////////////////////

/// Generates a deserializable `ConfigX` structure wrapping an `X` type
/// from [`datasrc`], using its [`FromStr`](std::str::FromStr)
/// implementation.
macro_rules! make_serde_wrapper {
    ($wrapper:ident, $over:ty, $description:literal) => {
        /// A macro-generated deserializable wrapper over a [`datasrc`]
        /// type.
        #[derive(Clone, Debug)]
        pub struct $wrapper(pub $over);

        impl<'de> Deserialize<'de> for $wrapper {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: de::Deserializer<'de>,
            {
                deserializer.deserialize_str(paste! { [<$wrapper Visitor>] })
            }
        }

        paste! {
            /// A macro-generated [`Visitor`](de::Visitor).
            #[derive(Debug)]
            struct [<$wrapper Visitor>];
        }

        impl<'de> de::Visitor<'de> for paste! { [<$wrapper Visitor>] } {
            type Value = $wrapper;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str($description)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .parse()
                    .map($wrapper)
                    .map_err(|e| E::custom(format!("invalid {}: {}", $description, e)))
            }
        }
    };
}

make_serde_wrapper!(ConfigName, Name, "domain name");
make_serde_wrapper!(ConfigClass, Class, "DNS class");
