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

//! End-to-end scenarios run against both storage backends.

use std::borrow::Cow;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use lazy_static::lazy_static;

use datasrc::class::Class;
use datasrc::db::{
    DataSourceClient, Database, DatabaseBackend, Error, FindResult, MemoryBackend, MemoryStore,
    ResultCode, UpdaterState, ZoneBackend,
};
use datasrc::name::Name;
use datasrc::rr::{Record, Rrset, Type};

lazy_static! {
    static ref EXAMPLE: Name = "example.".parse().unwrap();
    static ref SUB_EXAMPLE: Name = "sub.example.".parse().unwrap();
    static ref HOST_SUB_EXAMPLE: Name = "host.sub.example.".parse().unwrap();
    static ref WWW_EXAMPLE: Name = "www.example.".parse().unwrap();
    static ref MAIL_EXAMPLE: Name = "mail.example.".parse().unwrap();
}

fn rrset(text: &str) -> Rrset {
    text.parse::<Record>().unwrap().into_rrset()
}

////////////////////////////////////////////////////////////////////////
// FIXTURES                                                           //
////////////////////////////////////////////////////////////////////////

/// A temporary directory for a database file, removed on drop.
struct TempDir(PathBuf);

impl TempDir {
    fn new() -> Self {
        let name = format!("datasrc-scenario-{:016x}", rand::random::<u64>());
        let path = std::env::temp_dir().join(name);
        fs::create_dir(&path).unwrap();
        Self(path)
    }

    fn database(&self) -> PathBuf {
        self.0.join("zones.redb")
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

const EXAMPLE_RECORDS: &[&str] = &[
    "example. 3600 IN NS ns.example.",
    "ns.example. 3600 IN A 192.0.2.53",
    "www.example. 300 IN A 192.0.2.1",
    "www.example. 300 IN AAAA 2001:db8::1",
    "sub.example. 3600 IN NS ns.sub.example.",
];

const SUB_EXAMPLE_RECORDS: &[&str] = &[
    "sub.example. 3600 IN NS ns.sub.example.",
    "host.sub.example. 300 IN AAAA 2001:db8::2",
];

/// Fills the (existing) zones of `client` using replacing updates.
fn populate<B: ZoneBackend>(client: &DataSourceClient<B>) {
    for (origin, records) in [
        (&*EXAMPLE, EXAMPLE_RECORDS),
        (&*SUB_EXAMPLE, SUB_EXAMPLE_RECORDS),
    ] {
        let mut updater = client.get_updater(origin, true).unwrap().unwrap();
        for record in records {
            updater.add_rrset(rrset(record)).unwrap();
        }
        updater.commit().unwrap();
    }
}

fn memory_client() -> DataSourceClient<MemoryBackend> {
    let store = Arc::new(MemoryStore::new(Class::IN));
    assert!(store.create_zone(&EXAMPLE));
    assert!(store.create_zone(&SUB_EXAMPLE));
    let client = store.client();
    populate(&client);
    client
}

fn database_client(dir: &TempDir) -> DataSourceClient<DatabaseBackend> {
    let database = Arc::new(Database::open(dir.database(), Class::IN).unwrap());
    assert!(database.create_zone(&EXAMPLE).unwrap());
    assert!(database.create_zone(&SUB_EXAMPLE).unwrap());
    let client = database.client();
    populate(&client);
    client
}

/// Declares a test module that runs a scenario on both backends.
macro_rules! on_each_backend {
    ($name:ident) => {
        mod $name {
            use super::*;

            #[test]
            fn memory() {
                super::$name(&memory_client());
            }

            #[test]
            fn database() {
                let dir = TempDir::new();
                super::$name(&database_client(&dir));
            }
        }
    };
}

/// Looks `name` up in the zone the client selects for it, detaching the
/// result from the finder.
fn find<B: ZoneBackend>(
    client: &DataSourceClient<B>,
    name: &Name,
    rr_type: Type,
) -> FindResult<'static> {
    let found = client.find_zone(name).unwrap();
    let finder = found.finder.expect("no zone for the name");
    match finder.find(name, rr_type) {
        FindResult::Success(rrset) => FindResult::Success(Cow::Owned(rrset.into_owned())),
        FindResult::Cname(rrset) => FindResult::Cname(Cow::Owned(rrset.into_owned())),
        FindResult::Delegation(rrset) => panic!("unexpected delegation to {}", rrset.owner()),
        FindResult::NxRrset => FindResult::NxRrset,
        FindResult::NxDomain => FindResult::NxDomain,
        FindResult::OutOfZone => FindResult::OutOfZone,
    }
}

////////////////////////////////////////////////////////////////////////
// SCENARIOS                                                          //
////////////////////////////////////////////////////////////////////////

fn longest_match_wins<B: ZoneBackend>(client: &DataSourceClient<B>) {
    let exact = client.find_zone(&SUB_EXAMPLE).unwrap();
    assert_eq!(exact.code, ResultCode::Success);
    assert_eq!(exact.finder.unwrap().origin(), &*SUB_EXAMPLE);

    let deeper = client.find_zone(&HOST_SUB_EXAMPLE).unwrap();
    assert_eq!(deeper.code, ResultCode::PartialMatch);
    let finder = deeper.finder.unwrap();
    assert_eq!(finder.origin(), &*SUB_EXAMPLE);
    assert_eq!(finder.find(&HOST_SUB_EXAMPLE, Type::AAAA).code(), ResultCode::Success);

    let apex = client.find_zone(&EXAMPLE).unwrap();
    assert_eq!(apex.code, ResultCode::Success);

    let outside = client.find_zone(&"example.org.".parse().unwrap()).unwrap();
    assert_eq!(outside.code, ResultCode::NotFound);
    assert!(outside.finder.is_none());

    assert_eq!(client.zones().unwrap(), [EXAMPLE.clone(), SUB_EXAMPLE.clone()]);
}
on_each_backend!(longest_match_wins);

fn finder_result_codes<B: ZoneBackend>(client: &DataSourceClient<B>) {
    let finder = client.find_zone(&WWW_EXAMPLE).unwrap().finder.unwrap();

    let success = finder.find(&WWW_EXAMPLE, Type::A);
    assert_eq!(success.code(), ResultCode::Success);
    assert_eq!(success.rrset().unwrap().rdatas().len(), 1);

    let nxrrset = finder.find(&WWW_EXAMPLE, Type::MX);
    assert_eq!(nxrrset.code(), ResultCode::NotFound);
    assert!(nxrrset.name_exists());

    let nxdomain = finder.find(&MAIL_EXAMPLE, Type::A);
    assert_eq!(nxdomain.code(), ResultCode::NotFound);
    assert!(!nxdomain.name_exists());

    // sub.example. is delegated from example.
    let delegation = finder.find(&HOST_SUB_EXAMPLE, Type::AAAA);
    assert_eq!(delegation.code(), ResultCode::PartialMatch);
    assert_eq!(delegation.rrset().unwrap().owner(), &*SUB_EXAMPLE);
    assert_eq!(delegation.rrset().unwrap().rr_type(), Type::NS);
}
on_each_backend!(finder_result_codes);

fn replace_leaves_exactly_new_contents<B: ZoneBackend>(client: &DataSourceClient<B>) {
    let mut updater = client.get_updater(&EXAMPLE, true).unwrap().unwrap();
    for old in client.get_iterator(&EXAMPLE).unwrap() {
        updater.delete_rrset(old).unwrap();
    }
    let new = rrset("www.example. 600 IN A 192.0.2.80");
    updater.add_rrset(new.clone()).unwrap();
    updater.commit().unwrap();

    let rrsets: Vec<_> = client.get_iterator(&EXAMPLE).unwrap().collect();
    assert_eq!(rrsets, [new]);
}
on_each_backend!(replace_leaves_exactly_new_contents);

fn add_then_find_round_trip<B: ZoneBackend>(client: &DataSourceClient<B>) {
    let mail = rrset("mail.example. 300 IN A 192.0.2.25");
    let mut updater = client.get_updater(&EXAMPLE, true).unwrap().unwrap();
    updater.add_rrset(mail.clone()).unwrap();

    // The staged change is visible through the updater only.
    match updater.finder().find(&MAIL_EXAMPLE, Type::A) {
        FindResult::Success(found) => assert_eq!(*found, mail),
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(find(client, &MAIL_EXAMPLE, Type::A), FindResult::NxDomain);

    updater.commit().unwrap();
    assert_eq!(updater.state(), UpdaterState::Committed);
    assert_eq!(find(client, &MAIL_EXAMPLE, Type::A), FindResult::Success(Cow::Owned(mail)));
    // The replace removed everything else.
    assert_eq!(find(client, &WWW_EXAMPLE, Type::A), FindResult::NxDomain);
}
on_each_backend!(add_then_find_round_trip);

fn dropped_updater_changes_nothing<B: ZoneBackend>(client: &DataSourceClient<B>) {
    let before: Vec<_> = client.get_iterator(&EXAMPLE).unwrap().collect();

    fn stage_then_fail<B: ZoneBackend>(client: &DataSourceClient<B>) -> Result<(), Error> {
        let mut updater = client
            .get_updater(&EXAMPLE, true)?
            .ok_or_else(|| Error::NotFound(EXAMPLE.clone()))?;
        updater.add_rrset(rrset("mail.example. 300 IN A 192.0.2.25"))?;
        // Out of zone, so this bails out before the commit.
        updater.add_rrset(rrset("www.example.org. 300 IN A 192.0.2.26"))?;
        updater.commit()
    }
    assert!(matches!(stage_then_fail(client), Err(Error::NotInZone)));

    let updater = client.get_updater(&EXAMPLE, true).unwrap().unwrap();
    updater.discard();

    let after: Vec<_> = client.get_iterator(&EXAMPLE).unwrap().collect();
    assert_eq!(before, after);
}
on_each_backend!(dropped_updater_changes_nothing);

fn commit_twice_fails<B: ZoneBackend>(client: &DataSourceClient<B>) {
    let mut updater = client.get_updater(&SUB_EXAMPLE, true).unwrap().unwrap();
    updater.commit().unwrap();
    assert!(matches!(updater.commit(), Err(Error::AlreadyCommitted)));
    assert!(matches!(
        updater.add_rrset(rrset("sub.example. 3600 IN NS ns.sub.example.")),
        Err(Error::AlreadyCommitted),
    ));
    // The empty replace committed.
    assert_eq!(client.get_iterator(&SUB_EXAMPLE).unwrap().count(), 0);
}
on_each_backend!(commit_twice_fails);

fn missing_zones<B: ZoneBackend>(client: &DataSourceClient<B>) {
    let nonexistent: Name = "nonexistent.".parse().unwrap();
    assert!(client.get_updater(&nonexistent, true).unwrap().is_none());
    assert!(matches!(
        client.get_iterator(&nonexistent),
        Err(Error::NotFound(name)) if name == nonexistent,
    ));
    // Iterators need an exact origin.
    assert!(matches!(
        client.get_iterator(&WWW_EXAMPLE),
        Err(Error::NotFound(_)),
    ));
}
on_each_backend!(missing_zones);

////////////////////////////////////////////////////////////////////////
// BACKEND-SPECIFIC SCENARIOS                                         //
////////////////////////////////////////////////////////////////////////

#[test]
fn memory_partial_update() {
    let client = memory_client();
    let mut updater = client.get_updater(&EXAMPLE, false).unwrap().unwrap();
    // Deleting records that do not exist is a no-op.
    updater
        .delete_rrset(rrset("mail.example. 300 IN A 192.0.2.25"))
        .unwrap();
    updater
        .delete_rrset(rrset("www.example. 300 IN AAAA 2001:db8::1"))
        .unwrap();
    updater
        .add_rrset(rrset("www.example. 300 IN A 192.0.2.2"))
        .unwrap();
    updater.commit().unwrap();

    assert_eq!(find(&client, &WWW_EXAMPLE, Type::AAAA), FindResult::NxRrset);
    match find(&client, &WWW_EXAMPLE, Type::A) {
        FindResult::Success(rrset) => assert_eq!(rrset.len(), 2),
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(client.get_iterator(&EXAMPLE).unwrap().count(), 4);
}

#[test]
fn database_is_replace_only() {
    let dir = TempDir::new();
    let client = database_client(&dir);
    assert!(matches!(
        client.get_updater(&EXAMPLE, false),
        Err(Error::NotImplemented(_)),
    ));
}

#[test]
fn database_survives_reopening() {
    let dir = TempDir::new();
    drop(database_client(&dir));
    let reopened = Arc::new(Database::open(dir.database(), Class::IN).unwrap()).client();
    assert_eq!(reopened.zones().unwrap().len(), 2);
    assert_eq!(
        reopened.get_iterator(&EXAMPLE).unwrap().count(),
        EXAMPLE_RECORDS.len(),
    );
}
