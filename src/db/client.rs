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

//! The [`DataSourceClient`] entry point.

use std::cell::Cell;
use std::marker::PhantomData;

use super::{Error, ZoneBackend, ZoneFinder, ZoneIterator, ZoneUpdater};
use crate::class::Class;
use crate::name::Name;

/// How well a lookup matched.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResultCode {
    /// An exact match.
    Success,

    /// A match on a superdomain: the closest enclosing zone for
    /// [`DataSourceClient::find_zone`], or a delegation for
    /// [`ZoneFinder::find`].
    PartialMatch,

    /// No match.
    NotFound,
}

/// The result of [`DataSourceClient::find_zone`].
#[derive(Debug)]
pub struct FindZoneResult<'c> {
    pub code: ResultCode,

    /// A finder for the matching zone. This is `Some` exactly when
    /// `code` is not [`ResultCode::NotFound`].
    pub finder: Option<ZoneFinder<'c>>,
}

/// The entry point to a data source.
///
/// A `DataSourceClient` is bound to one backend connection, and thus to
/// one class of data, for its whole life. It locates the zone to use
/// for a name and hands out the objects that read and write zones:
///
/// * [`ZoneFinder`]s, through [`DataSourceClient::find_zone`];
/// * [`ZoneIterator`]s, through [`DataSourceClient::get_iterator`]; and
/// * [`ZoneUpdater`]s, through [`DataSourceClient::get_updater`].
///
/// These borrow the client, so the backend connection outlives them.
/// A client may be moved to another thread but not shared between
/// threads; each thread that needs the data source should create its
/// own client. (Backends such as the in-memory
/// [`MemoryStore`](super::MemoryStore) share their data across clients.)
pub struct DataSourceClient<B> {
    backend: B,
    _not_sync: PhantomData<Cell<()>>,
}

impl<B: ZoneBackend> DataSourceClient<B> {
    /// Creates a client that owns `backend`.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            _not_sync: PhantomData,
        }
    }

    /// Returns the class of the data this client serves.
    pub fn class(&self) -> Class {
        self.backend.class()
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the origins of all zones, in canonical order.
    pub fn zones(&self) -> Result<Vec<Name>, Error> {
        let mut zones = self.backend.zones()?;
        zones.sort_unstable();
        Ok(zones)
    }

    /// Finds the zone that best matches `name`: the zone with the
    /// longest origin that is equal to or a superdomain of `name`.
    ///
    /// The result code is [`ResultCode::Success`] if the origin is
    /// `name` itself, [`ResultCode::PartialMatch`] if it is a proper
    /// superdomain, and [`ResultCode::NotFound`] (with no finder) if no
    /// zone covers `name`. Errors are reserved for backend failures.
    pub fn find_zone(&self, name: &Name) -> Result<FindZoneResult<'_>, Error> {
        Ok(match self.backend.lookup(name)? {
            Some(zone) => FindZoneResult {
                code: if zone.origin().len() == name.len() {
                    ResultCode::Success
                } else {
                    ResultCode::PartialMatch
                },
                finder: Some(ZoneFinder::new(zone)),
            },
            None => FindZoneResult {
                code: ResultCode::NotFound,
                finder: None,
            },
        })
    }

    /// Returns an iterator over all RRsets of the zone whose origin is
    /// exactly `origin`. Fails with [`Error::NotFound`] if there is no
    /// such zone, and with [`Error::NotImplemented`] if the backend
    /// cannot list its zones' contents.
    pub fn get_iterator(&self, origin: &Name) -> Result<ZoneIterator<'_>, Error> {
        let zone = self
            .backend
            .traverse(origin)?
            .ok_or_else(|| Error::NotFound(origin.clone()))?;
        Ok(ZoneIterator::new(&zone))
    }

    /// Opens an updater on the zone whose origin is exactly `origin`,
    /// or returns `None` if there is no such zone. (Updaters never
    /// create zones.)
    ///
    /// When `replace` is set, the updater starts from an empty zone and
    /// its commit replaces the zone's contents; otherwise it starts
    /// from the zone's current contents. Backends that cannot do
    /// partial updates fail with [`Error::NotImplemented`] when
    /// `replace` is not set, and backends that allow one updater per
    /// zone at a time fail with [`Error::AlreadyUpdating`].
    pub fn get_updater(
        &self,
        origin: &Name,
        replace: bool,
    ) -> Result<Option<ZoneUpdater<'_>>, Error> {
        Ok(self
            .backend
            .begin(origin, replace)?
            .map(|transaction| ZoneUpdater::new(transaction, replace)))
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
