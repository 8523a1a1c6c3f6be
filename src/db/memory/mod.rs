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

//! The in-memory storage backend.

use std::sync::{Arc, Mutex, RwLock};

use log::debug;

use super::{Change, DataSourceClient, Error, Transaction, ZoneBackend, ZoneData};
use crate::class::Class;
use crate::name::Name;

mod catalog;

use catalog::Catalog;

////////////////////////////////////////////////////////////////////////
// STORE                                                              //
////////////////////////////////////////////////////////////////////////

/// A store that keeps zones of one class in memory.
///
/// A `MemoryStore` is shared (through an [`Arc`]) by any number of
/// [`DataSourceClient`]s, on any number of threads; each client gets
/// its own [`MemoryBackend`] connection from [`MemoryStore::connect`].
/// Every zone's committed state is an immutable snapshot. Readers clone
/// the current snapshot's [`Arc`], and a commit publishes a new one by
/// swapping the pointer, so readers are never blocked for longer than
/// the swap.
///
/// The store supports both replacing and partial updates, and any
/// number of updaters may be open on a zone at once. Commits on one
/// zone are serialized. A partial update whose starting point is no
/// longer the committed state is rebased: its changes are reapplied, in
/// order, to the newer state. If they no longer apply, the commit
/// fails.
#[derive(Debug)]
pub struct MemoryStore {
    class: Class,
    catalog: RwLock<Catalog<Arc<ZoneCell>>>,
}

/// The committed state of a zone, and the lock that serializes commits.
#[derive(Debug)]
struct ZoneCell {
    committed: RwLock<Arc<ZoneData>>,
    commit_lock: Mutex<()>,
}

impl ZoneCell {
    fn new(zone: ZoneData) -> Self {
        Self {
            committed: RwLock::new(Arc::new(zone)),
            commit_lock: Mutex::new(()),
        }
    }

    fn snapshot(&self) -> Arc<ZoneData> {
        self.committed.read().unwrap().clone()
    }
}

impl MemoryStore {
    /// Creates a new, empty store for zones of class `class`.
    pub fn new(class: Class) -> Self {
        Self {
            class,
            catalog: RwLock::new(Catalog::new()),
        }
    }

    /// Returns the class of the store's zones.
    pub fn class(&self) -> Class {
        self.class
    }

    /// Creates an empty zone with origin `origin`. Returns `false` (and
    /// does nothing) if the zone already exists.
    pub fn create_zone(&self, origin: &Name) -> bool {
        let mut catalog = self.catalog.write().unwrap();
        if catalog.get(origin).is_some() {
            false
        } else {
            let zone = ZoneData::new(origin.clone(), self.class);
            catalog.insert(origin, Arc::new(ZoneCell::new(zone)));
            debug!("Created zone {}/{}.", origin, self.class);
            true
        }
    }

    /// Adds a zone with the given contents, replacing any existing zone
    /// with the same origin. The zone must be of the store's class.
    ///
    /// Updaters that are open on a replaced zone can no longer commit.
    pub fn load_zone(&self, zone: ZoneData) -> Result<(), Error> {
        if zone.class() != self.class {
            return Err(Error::ClassMismatch);
        }
        let origin = zone.origin().clone();
        debug!(
            "Loaded zone {}/{} with {} RRset(s).",
            origin,
            self.class,
            zone.rrset_count(),
        );
        self.catalog
            .write()
            .unwrap()
            .insert(&origin, Arc::new(ZoneCell::new(zone)));
        Ok(())
    }

    /// Removes the zone with origin `origin`. Returns whether it
    /// existed.
    pub fn remove_zone(&self, origin: &Name) -> bool {
        let removed = self.catalog.write().unwrap().remove(origin).is_some();
        if removed {
            debug!("Removed zone {}/{}.", origin, self.class);
        }
        removed
    }

    /// Opens a new connection to the store.
    pub fn connect(self: &Arc<Self>) -> MemoryBackend {
        MemoryBackend {
            store: self.clone(),
        }
    }

    /// Creates a [`DataSourceClient`] over a new connection to the
    /// store.
    pub fn client(self: &Arc<Self>) -> DataSourceClient<MemoryBackend> {
        DataSourceClient::new(self.connect())
    }

    fn cell(&self, origin: &Name) -> Option<Arc<ZoneCell>> {
        self.catalog.read().unwrap().get(origin).cloned()
    }
}

////////////////////////////////////////////////////////////////////////
// BACKEND                                                            //
////////////////////////////////////////////////////////////////////////

/// A connection to a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryBackend {
    store: Arc<MemoryStore>,
}

impl MemoryBackend {
    /// Returns the store this connection is to.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

impl ZoneBackend for MemoryBackend {
    fn class(&self) -> Class {
        self.store.class
    }

    fn lookup(&self, name: &Name) -> Result<Option<Arc<ZoneData>>, Error> {
        let catalog = self.store.catalog.read().unwrap();
        Ok(catalog.lookup(name).map(|cell| cell.snapshot()))
    }

    fn get(&self, origin: &Name) -> Result<Option<Arc<ZoneData>>, Error> {
        Ok(self.store.cell(origin).map(|cell| cell.snapshot()))
    }

    fn zones(&self) -> Result<Vec<Name>, Error> {
        Ok(self.store.catalog.read().unwrap().origins())
    }

    fn traverse(&self, origin: &Name) -> Result<Option<Arc<ZoneData>>, Error> {
        self.get(origin)
    }

    fn begin(
        &self,
        origin: &Name,
        replace: bool,
    ) -> Result<Option<Box<dyn Transaction + '_>>, Error> {
        Ok(self.store.cell(origin).map(|cell| {
            Box::new(MemoryTransaction {
                store: self.store.clone(),
                base: cell.snapshot(),
                cell,
                replace,
            }) as Box<dyn Transaction + '_>
        }))
    }
}

/// A write transaction on a zone in a [`MemoryStore`].
struct MemoryTransaction {
    store: Arc<MemoryStore>,
    cell: Arc<ZoneCell>,
    base: Arc<ZoneData>,
    replace: bool,
}

impl Transaction for MemoryTransaction {
    fn base(&self) -> &Arc<ZoneData> {
        &self.base
    }

    fn commit(&mut self, working: ZoneData, journal: &[Change]) -> Result<(), Error> {
        let _guard = self.cell.commit_lock.lock().unwrap();

        // The zone may have been removed or replaced since we began.
        let origin = self.base.origin();
        match self.store.cell(origin) {
            Some(cell) if Arc::ptr_eq(&cell, &self.cell) => (),
            _ => return Err(Error::NotFound(origin.clone())),
        }

        let current = self.cell.snapshot();
        let new = if self.replace || Arc::ptr_eq(&current, &self.base) {
            working
        } else {
            debug!(
                "Rebasing {} change(s) to zone {}/{}.",
                journal.len(),
                origin,
                self.store.class,
            );
            let mut rebased = ZoneData::clone(&current);
            for change in journal {
                change.apply(&mut rebased)?;
            }
            rebased
        };
        *self.cell.committed.write().unwrap() = Arc::new(new);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use lazy_static::lazy_static;

    use super::*;
    use crate::db::{FindResult, ResultCode};
    use crate::rr::{Record, Rrset, Type};

    lazy_static! {
        static ref QUANDARY_TEST: Name = "quandary.test.".parse().unwrap();
        static ref WWW: Name = "www.quandary.test.".parse().unwrap();
    }

    fn rrset(text: &str) -> Rrset {
        text.parse::<Record>().unwrap().into_rrset()
    }

    fn store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new(Class::IN));
        let mut zone = ZoneData::new(QUANDARY_TEST.clone(), Class::IN);
        zone.add(&rrset("quandary.test. 3600 IN NS ns.quandary.test."))
            .unwrap();
        store.load_zone(zone).unwrap();
        store
    }

    fn find_a(client: &DataSourceClient<MemoryBackend>) -> FindResult<'static> {
        let found = client.find_zone(&WWW).unwrap();
        assert_eq!(found.code, ResultCode::PartialMatch);
        match found.finder.unwrap().find(&WWW, Type::A) {
            FindResult::Success(rrset) => FindResult::Success(Cow::Owned(rrset.into_owned())),
            FindResult::NxDomain => FindResult::NxDomain,
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn zone_management() {
        let store = store();
        assert!(!store.create_zone(&QUANDARY_TEST));
        assert!(store.create_zone(&WWW));
        let mut zones = store.connect().zones().unwrap();
        zones.sort();
        assert_eq!(zones, [QUANDARY_TEST.clone(), WWW.clone()]);
        assert!(store.remove_zone(&WWW));
        assert!(!store.remove_zone(&WWW));
        assert!(matches!(
            store.load_zone(ZoneData::new(WWW.clone(), Class::CH)),
            Err(Error::ClassMismatch),
        ));
    }

    #[test]
    fn commit_is_visible_to_other_clients() {
        let store = store();
        let reader = store.client();
        let writer = store.client();
        let old_finder = reader.find_zone(&WWW).unwrap().finder.unwrap();

        let mut updater = writer.get_updater(&QUANDARY_TEST, false).unwrap().unwrap();
        updater
            .add_rrset(rrset("www.quandary.test. 300 IN A 192.0.2.1"))
            .unwrap();
        assert_eq!(find_a(&reader), FindResult::NxDomain);
        updater.commit().unwrap();

        assert!(matches!(find_a(&reader), FindResult::Success(_)));
        assert_eq!(old_finder.find(&WWW, Type::A), FindResult::NxDomain);
    }

    #[test]
    fn missing_zone_has_no_updater() {
        let client = store().client();
        assert!(client
            .get_updater(&"nonexistent.".parse().unwrap(), false)
            .unwrap()
            .is_none());
    }

    #[test]
    fn stale_partial_updates_are_rebased() {
        let store = store();
        let client = store.client();
        let mut first = client.get_updater(&QUANDARY_TEST, false).unwrap().unwrap();
        let mut second = client.get_updater(&QUANDARY_TEST, false).unwrap().unwrap();
        first
            .add_rrset(rrset("www.quandary.test. 300 IN A 192.0.2.1"))
            .unwrap();
        second
            .add_rrset(rrset("www.quandary.test. 300 IN A 192.0.2.2"))
            .unwrap();
        first.commit().unwrap();
        second.commit().unwrap();

        match find_a(&client) {
            FindResult::Success(rrset) => assert_eq!(rrset.len(), 2),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn conflicting_rebase_fails() {
        let store = store();
        let client = store.client();
        let mut first = client.get_updater(&QUANDARY_TEST, false).unwrap().unwrap();
        let mut second = client.get_updater(&QUANDARY_TEST, false).unwrap().unwrap();
        first
            .add_rrset(rrset("www.quandary.test. 300 IN A 192.0.2.1"))
            .unwrap();
        second
            .add_rrset(rrset("www.quandary.test. 60 IN A 192.0.2.2"))
            .unwrap();
        first.commit().unwrap();
        assert!(matches!(second.commit(), Err(Error::TtlMismatch)));

        match find_a(&client) {
            FindResult::Success(rrset) => assert_eq!(rrset.len(), 1),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn replaced_zone_cannot_be_committed_to() {
        let store = store();
        let client = store.client();
        let mut updater = client.get_updater(&QUANDARY_TEST, true).unwrap().unwrap();
        store
            .load_zone(ZoneData::new(QUANDARY_TEST.clone(), Class::IN))
            .unwrap();
        assert!(matches!(updater.commit(), Err(Error::NotFound(_))));
    }
}
