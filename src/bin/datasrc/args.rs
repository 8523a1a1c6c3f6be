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

//! Implements command-line argument parsing.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

use datasrc::class::Class;
use datasrc::name::Name;
use datasrc::rr::{Record, Type};

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// Inspect and update DNS data sources
#[derive(Debug, Parser)]
#[command(author, version)]
#[command(group(ArgGroup::new("source").required(true).args(["config", "database"])))]
pub struct Args {
    /// Set the configuration file to use
    #[arg(long, conflicts_with = "class", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use the database in a file
    #[arg(long, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Set the class of the database [default: IN]
    #[arg(long, requires = "database", value_name = "CLASS")]
    pub class: Option<Class>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the zones
    Zones,

    /// Find the zone for a name and look the name up in it
    Find {
        name: Name,

        #[arg(default_value = "A")]
        rr_type: Type,

        /// Look beneath zone cuts (to find glue)
        #[arg(long)]
        glue: bool,
    },

    /// Print every record of a zone
    Dump { zone: Name },

    /// Replace the contents of a zone with the records in a table file
    Load { zone: Name, file: PathBuf },

    /// Add and delete records in a zone
    Update {
        zone: Name,

        /// Add a record ("<owner> <ttl> <class> <type> <rdata>")
        #[arg(long, value_name = "RECORD")]
        add: Vec<Record>,

        /// Delete a record ("<owner> <ttl> <class> <type> <rdata>")
        #[arg(long, value_name = "RECORD")]
        delete: Vec<Record>,
    },

    /// Create an empty zone in a database
    Create { zone: Name },
}
