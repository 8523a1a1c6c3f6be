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

//! The embedded database storage backend.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use redb::{ReadOnlyTable, ReadableDatabase, ReadableTable, Table, TableDefinition};

use super::{BackendError, Change, DataSourceClient, Error, Transaction, ZoneBackend, ZoneData};
use crate::class::Class;
use crate::name::Name;

mod claims;
mod wire;

use claims::{Claim, Claims};

// Table definitions
const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("meta");
const GENERATION_TABLE: TableDefinition<&[u8], u64> = TableDefinition::new("generations");
const CONTENTS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("contents");

/// The key in the meta table of the class of the database's zones.
const CLASS_KEY: &str = "class";

/// The key in the meta table of the most recently issued generation.
const GENERATION_KEY: &str = "generation";

////////////////////////////////////////////////////////////////////////
// DATABASE                                                           //
////////////////////////////////////////////////////////////////////////

/// A database of zones kept in a [`redb`] file.
///
/// The database keeps the contents of each zone under the zone's
/// origin, along with a *generation* number that is issued afresh on
/// every change to the zone. Every read goes through a `redb` read
/// transaction, so it sees one committed version of the file, and
/// every commit is a single `redb` write transaction.
///
/// Only replacing updates are supported. The database allows one
/// updater per zone at a time; a second one fails with
/// [`Error::AlreadyUpdating`] until the first one ends. `redb` locks
/// the file, so only one process can have the database open. Within
/// that process, any number of threads can share the database through
/// an [`Arc`] and [connect](Database::connect) to it.
pub struct Database {
    db: redb::Database,
    path: PathBuf,
    class: Class,
    claims: Claims,
}

impl Database {
    /// Opens the database in the file at `path`, creating it if it does
    /// not exist. The database holds zones of class `class`; opening
    /// an existing database of another class fails.
    pub fn open(path: impl AsRef<Path>, class: Class) -> Result<Self, Error> {
        let path = path.as_ref();
        let db = redb::Database::create(path).map_err(failed("open the database"))?;

        // Create the tables and record the class if they don't exist.
        let write_txn = db.begin_write().map_err(failed("begin a write transaction"))?;
        {
            let mut meta = write_txn
                .open_table(META_TABLE)
                .map_err(failed("open the meta table"))?;
            let stored = meta
                .get(CLASS_KEY)
                .map_err(failed("read the class"))?
                .map(|value| value.value());
            match stored {
                Some(stored) if stored != u64::from(u16::from(class)) => {
                    let message = format!(
                        "the database at {} holds zones of class {}",
                        path.display(),
                        Class::from(stored as u16),
                    );
                    return Err(BackendError::new(message).into());
                }
                Some(_) => (),
                None => {
                    meta.insert(CLASS_KEY, u64::from(u16::from(class)))
                        .map_err(failed("record the class"))?;
                }
            }
            write_txn
                .open_table(GENERATION_TABLE)
                .map_err(failed("create the generation table"))?;
            write_txn
                .open_table(CONTENTS_TABLE)
                .map_err(failed("create the contents table"))?;
        }
        write_txn.commit().map_err(failed("commit"))?;

        debug!("Opened database {} for class {}.", path.display(), class);
        Ok(Self {
            db,
            path: path.to_owned(),
            class,
            claims: Claims::default(),
        })
    }

    /// Returns the path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the class of the zones in the database.
    pub fn class(&self) -> Class {
        self.class
    }

    /// Creates an empty zone with origin `origin`. Returns `false` (and
    /// does nothing) if the zone already exists. Fails with
    /// [`Error::AlreadyUpdating`] if the zone is being updated.
    pub fn create_zone(&self, origin: &Name) -> Result<bool, Error> {
        let _claim = self.claims.claim(origin)?;
        let key = zone_key(origin);
        let write_txn = self.begin_write()?;
        {
            let mut generations = open_table(&write_txn, GENERATION_TABLE)?;
            if generations
                .get(key.as_slice())
                .map_err(failed("read a generation"))?
                .is_some()
            {
                return Ok(false);
            }
            let generation = next_generation(&write_txn)?;
            generations
                .insert(key.as_slice(), generation)
                .map_err(failed("write a generation"))?;
            let empty = wire::encode(&ZoneData::new(origin.clone(), self.class));
            open_table(&write_txn, CONTENTS_TABLE)?
                .insert(key.as_slice(), empty.as_slice())
                .map_err(failed("write zone contents"))?;
        }
        write_txn.commit().map_err(failed("commit"))?;
        debug!("Created zone {}/{} in {}.", origin, self.class, self.path.display());
        Ok(true)
    }

    /// Deletes the zone with origin `origin`. Returns whether it
    /// existed. Fails with [`Error::AlreadyUpdating`] if the zone is
    /// being updated.
    pub fn remove_zone(&self, origin: &Name) -> Result<bool, Error> {
        let _claim = self.claims.claim(origin)?;
        let key = zone_key(origin);
        let write_txn = self.begin_write()?;
        let existed = {
            let existed = open_table(&write_txn, GENERATION_TABLE)?
                .remove(key.as_slice())
                .map_err(failed("remove a generation"))?
                .is_some();
            open_table(&write_txn, CONTENTS_TABLE)?
                .remove(key.as_slice())
                .map_err(failed("remove zone contents"))?;
            existed
        };
        write_txn.commit().map_err(failed("commit"))?;
        if existed {
            debug!("Removed zone {}/{}.", origin, self.class);
        }
        Ok(existed)
    }

    /// Creates a new connection to the database.
    pub fn connect(self: &Arc<Self>) -> DatabaseBackend {
        DatabaseBackend {
            database: self.clone(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Creates a [`DataSourceClient`] with a new connection to the
    /// database.
    pub fn client(self: &Arc<Self>) -> DataSourceClient<DatabaseBackend> {
        DataSourceClient::new(self.connect())
    }

    fn begin_write(&self) -> Result<redb::WriteTransaction, Error> {
        self.db
            .begin_write()
            .map_err(failed("begin a write transaction"))
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("class", &self.class)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////
// CONNECTIONS                                                        //
////////////////////////////////////////////////////////////////////////

/// A connection to a [`Database`].
///
/// A connection caches the decoded contents of the zones it reads,
/// keyed by generation, so that unchanged zones are not decoded again.
#[derive(Debug)]
pub struct DatabaseBackend {
    database: Arc<Database>,
    cache: RefCell<HashMap<Name, (u64, Arc<ZoneData>)>>,
}

/// The tables of one read transaction.
struct ReadTables {
    generations: ReadOnlyTable<&'static [u8], u64>,
    contents: ReadOnlyTable<&'static [u8], &'static [u8]>,
}

impl DatabaseBackend {
    /// Returns the database this connection is to.
    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }

    fn begin_read(&self) -> Result<ReadTables, Error> {
        let read_txn = self
            .database
            .db
            .begin_read()
            .map_err(failed("begin a read transaction"))?;
        Ok(ReadTables {
            generations: read_txn
                .open_table(GENERATION_TABLE)
                .map_err(failed("open the generation table"))?,
            contents: read_txn
                .open_table(CONTENTS_TABLE)
                .map_err(failed("open the contents table"))?,
        })
    }

    /// Returns the committed state and generation of the zone `origin`
    /// as of the read transaction `tables`, decoding it if the cached
    /// copy is out of date.
    fn snapshot(
        &self,
        tables: &ReadTables,
        origin: &Name,
    ) -> Result<Option<(u64, Arc<ZoneData>)>, Error> {
        let key = zone_key(origin);
        let generation = tables
            .generations
            .get(key.as_slice())
            .map_err(failed("read a generation"))?
            .map(|value| value.value());
        let Some(generation) = generation else {
            self.cache.borrow_mut().remove(origin);
            return Ok(None);
        };
        if let Some((cached, zone)) = self.cache.borrow().get(origin) {
            if *cached == generation {
                return Ok(Some((generation, zone.clone())));
            }
        }

        debug!(
            "Reading generation {} of zone {}/{}.",
            generation, origin, self.database.class,
        );
        let contents = tables
            .contents
            .get(key.as_slice())
            .map_err(failed("read zone contents"))?
            .ok_or_else(|| BackendError::new(format!("zone {} has no contents", origin)))?;
        let zone = wire::decode(contents.value(), origin, self.database.class).map_err(|e| {
            BackendError::with_source(format!("the stored contents of {} are corrupt", origin), e)
        })?;
        let zone = Arc::new(zone);
        self.cache
            .borrow_mut()
            .insert(origin.clone(), (generation, zone.clone()));
        Ok(Some((generation, zone)))
    }
}

impl ZoneBackend for DatabaseBackend {
    fn class(&self) -> Class {
        self.database.class
    }

    fn lookup(&self, name: &Name) -> Result<Option<Arc<ZoneData>>, Error> {
        let tables = self.begin_read()?;
        for skip in 0..name.len() {
            if let Some((_, zone)) = self.snapshot(&tables, &name.suffix(skip))? {
                return Ok(Some(zone));
            }
        }
        Ok(None)
    }

    fn get(&self, origin: &Name) -> Result<Option<Arc<ZoneData>>, Error> {
        let tables = self.begin_read()?;
        Ok(self.snapshot(&tables, origin)?.map(|(_, zone)| zone))
    }

    fn zones(&self) -> Result<Vec<Name>, Error> {
        let tables = self.begin_read()?;
        let mut zones = Vec::new();
        for entry in tables.generations.iter().map_err(failed("list zones"))? {
            let (key, _) = entry.map_err(failed("list zones"))?;
            let origin = Name::from_wire(key.value()).map_err(|e| {
                BackendError::with_source("the database holds an invalid zone origin", e)
            })?;
            zones.push(origin);
        }
        Ok(zones)
    }

    fn traverse(&self, origin: &Name) -> Result<Option<Arc<ZoneData>>, Error> {
        self.get(origin)
    }

    fn begin(
        &self,
        origin: &Name,
        replace: bool,
    ) -> Result<Option<Box<dyn Transaction + '_>>, Error> {
        if self.get(origin)?.is_none() {
            return Ok(None);
        } else if !replace {
            return Err(Error::NotImplemented("partial updates of database zones"));
        }

        let claim = self.database.claims.claim(origin)?;
        // The zone may have been removed before we got the claim.
        let tables = self.begin_read()?;
        Ok(self.snapshot(&tables, origin)?.map(|(_, base)| {
            debug!("Began replacing zone {}/{}.", origin, self.database.class);
            Box::new(DatabaseTransaction {
                backend: self,
                base,
                _claim: claim,
            }) as Box<dyn Transaction + '_>
        }))
    }
}

////////////////////////////////////////////////////////////////////////
// TRANSACTIONS                                                       //
////////////////////////////////////////////////////////////////////////

/// A write transaction on a zone in a [`Database`]. The zone is claimed
/// for as long as the transaction exists; the `redb` write transaction
/// itself only lasts for the commit.
struct DatabaseTransaction<'a> {
    backend: &'a DatabaseBackend,
    base: Arc<ZoneData>,
    _claim: Claim<'a>,
}

impl Transaction for DatabaseTransaction<'_> {
    fn base(&self) -> &Arc<ZoneData> {
        &self.base
    }

    fn commit(&mut self, working: ZoneData, _journal: &[Change]) -> Result<(), Error> {
        let database = &self.backend.database;
        let key = zone_key(self.base.origin());
        let contents = wire::encode(&working);

        let write_txn = database.begin_write()?;
        let generation = next_generation(&write_txn)?;
        open_table(&write_txn, GENERATION_TABLE)?
            .insert(key.as_slice(), generation)
            .map_err(failed("write a generation"))?;
        open_table(&write_txn, CONTENTS_TABLE)?
            .insert(key.as_slice(), contents.as_slice())
            .map_err(failed("write zone contents"))?;
        write_txn.commit().map_err(failed("commit"))?;

        info!(
            "Stored generation {} of zone {}/{} ({} octets).",
            generation,
            working.origin(),
            working.class(),
            contents.len(),
        );
        self.backend
            .cache
            .borrow_mut()
            .insert(working.origin().clone(), (generation, Arc::new(working)));
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// HELPERS                                                            //
////////////////////////////////////////////////////////////////////////

/// Returns the key under which the zone `origin` is stored: the
/// uncompressed wire form of the origin in lowercase.
fn zone_key(origin: &Name) -> Vec<u8> {
    origin.to_ascii_lowercase().to_wire()
}

/// Returns a function that wraps a `redb` error in a [`BackendError`]
/// saying what failed.
fn failed<E: fmt::Display>(action: &'static str) -> impl FnOnce(E) -> Error {
    move |e| BackendError::new(format!("failed to {}: {}", action, e)).into()
}

fn open_table<'txn, K: redb::Key + 'static, V: redb::Value + 'static>(
    write_txn: &'txn redb::WriteTransaction,
    definition: TableDefinition<K, V>,
) -> Result<Table<'txn, K, V>, Error> {
    write_txn
        .open_table(definition)
        .map_err(failed("open a table"))
}

/// Issues a new generation. Generations are unique across the whole
/// database, so a zone that is removed and created again never repeats
/// a generation of its predecessor.
fn next_generation(write_txn: &redb::WriteTransaction) -> Result<u64, Error> {
    let mut meta = open_table(write_txn, META_TABLE)?;
    let generation = meta
        .get(GENERATION_KEY)
        .map_err(failed("read the generation"))?
        .map_or(0, |value| value.value())
        + 1;
    meta.insert(GENERATION_KEY, generation)
        .map_err(failed("write the generation"))?;
    Ok(generation)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
