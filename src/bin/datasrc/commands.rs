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

//! Implements the commands.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::process;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use env_logger::Env;
use log::{error, info, warn};

use datasrc::class::Class;
use datasrc::db::{
    table, DataSourceClient, Database, FindOptions, FindResult, MemoryStore, ZoneBackend,
    ZoneIterator,
};
use datasrc::name::Name;

use crate::args::{Args, Command};
use crate::config::{self, BackendConfig, Config, MemoryConfig};

/// Runs the command given by `args`.
pub fn run(args: Args) {
    env_logger::init_from_env(Env::new().default_filter_or("warn"));

    if let Err(e) = try_running(args) {
        let mut message = String::from("Failed:");
        for (i, cause) in e.chain().enumerate() {
            write!(message, "\n[{}] {}", i + 1, cause).unwrap();
        }
        error!("{}", message);
        process::exit(1);
    }
}

fn try_running(args: Args) -> Result<()> {
    // Get the configuration, either from the file system or from the
    // command line arguments, as appropriate.
    let config = if let Some(ref config_path) = args.config {
        info!("Loading the configuration from {}.", config_path.display());
        config::load_from_path(config_path).context("failed to load the configuration")?
    } else if let Some(database) = args.database {
        config::load_from_args(database, args.class)
    } else {
        bail!("no data source was given");
    };
    let Config { class, backend } = config;

    match backend {
        BackendConfig::Database(database_config) => {
            let path = database_config.path;
            let database = Database::open(&path, class.0)
                .with_context(|| format!("failed to open the database at {}", path.display()))?;
            if let Command::Create { ref zone } = args.command {
                return create(&database, zone);
            }
            execute(&Arc::new(database).client(), args.command)
        }
        BackendConfig::Memory(memory_config) => {
            if matches!(args.command, Command::Load { .. } | Command::Update { .. }) {
                warn!("Changes to an in-memory backend are lost when the command exits.");
            }
            let store = load_memory_store(memory_config, class.0)?;
            execute(&store.client(), args.command)
        }
    }
}

/// Creates a [`MemoryStore`] holding the configured zones.
fn load_memory_store(config: MemoryConfig, class: Class) -> Result<Arc<MemoryStore>> {
    let store = Arc::new(MemoryStore::new(class));
    for zone_config in config.zones {
        let origin = zone_config.name.0;
        let path = zone_config.path;
        let file =
            File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
        let zone = table::read(BufReader::new(file), &origin, class)
            .with_context(|| format!("failed to load {}/{} from {}", origin, class, path.display()))?;
        store.load_zone(zone)?;
    }
    Ok(store)
}

fn create(database: &Database, zone: &Name) -> Result<()> {
    if database.create_zone(zone)? {
        println!("Created zone {}.", zone);
        Ok(())
    } else {
        Err(anyhow!("zone {} already exists", zone))
    }
}

////////////////////////////////////////////////////////////////////////
// GENERIC COMMANDS                                                   //
////////////////////////////////////////////////////////////////////////

fn execute<B: ZoneBackend>(client: &DataSourceClient<B>, command: Command) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match command {
        Command::Zones => {
            for origin in client.zones()? {
                writeln!(out, "{}", origin)?;
            }
        }
        Command::Find {
            name,
            rr_type,
            glue,
        } => {
            let found = client.find_zone(&name)?;
            let Some(finder) = found.finder else {
                bail!("no zone contains {}", name);
            };
            writeln!(out, "; zone {} ({:?})", finder.origin(), found.code)?;
            let result = finder.find_with(&name, rr_type, FindOptions { glue_ok: glue });
            writeln!(out, "; {:?}: {}", result.code(), describe(&result))?;
            if let Some(rrset) = result.rrset() {
                writeln!(out, "{}", rrset)?;
            }
        }
        Command::Dump { zone } => {
            table::write_iterator(client.get_iterator(&zone)?, client.class(), &mut out)?;
        }
        Command::Load { zone, file } => {
            let reader = BufReader::new(
                File::open(&file).with_context(|| format!("failed to open {}", file.display()))?,
            );
            let data = table::read(reader, &zone, client.class())
                .with_context(|| format!("failed to read {}", file.display()))?;
            let mut updater = client
                .get_updater(&zone, true)?
                .ok_or_else(|| anyhow!("zone {} does not exist", zone))?;
            for rrset in ZoneIterator::new(&data) {
                updater.add_rrset(rrset)?;
            }
            updater.commit().context("failed to commit")?;
            writeln!(out, "Loaded {} RRset(s) into {}.", updater.changes().len(), zone)?;
        }
        Command::Update { zone, add, delete } => {
            let mut updater = client
                .get_updater(&zone, false)?
                .ok_or_else(|| anyhow!("zone {} does not exist", zone))?;
            for record in delete {
                let text = record.to_string();
                updater
                    .delete_rrset(record.into_rrset())
                    .with_context(|| format!("failed to delete {}", text))?;
            }
            for record in add {
                let text = record.to_string();
                updater
                    .add_rrset(record.into_rrset())
                    .with_context(|| format!("failed to add {}", text))?;
            }
            updater.commit().context("failed to commit")?;
            writeln!(out, "Committed {} change(s) to {}.", updater.changes().len(), zone)?;
        }
        Command::Create { .. } => bail!("only a database can create zones"),
    }

    out.flush()?;
    Ok(())
}

fn describe(result: &FindResult) -> &'static str {
    match result {
        FindResult::Success(_) => "found",
        FindResult::Cname(_) => "found a CNAME",
        FindResult::Delegation(_) => "delegated",
        FindResult::NxRrset => "the name has no records of that type",
        FindResult::NxDomain => "the name does not exist",
        FindResult::OutOfZone => "the name is not in the zone",
    }
}
