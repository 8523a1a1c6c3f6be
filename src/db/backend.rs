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

//! The capability interface between the data source client and storage
//! backends.

use std::sync::Arc;

use super::{Change, Error, ZoneData};
use crate::class::Class;
use crate::name::Name;

/// Trait for storage backends.
///
/// A backend holds the zones of one class and hands out *snapshots* of
/// their committed states as shared [`ZoneData`]. Everything above the
/// backend ([`ZoneFinder`](super::ZoneFinder),
/// [`ZoneIterator`](super::ZoneIterator), and
/// [`ZoneUpdater`](super::ZoneUpdater)) works on those snapshots, so
/// implementations only decide where zones live and how a new state is
/// published.
///
/// A backend value is one connection to the underlying storage. It is
/// owned by a [`DataSourceClient`](super::DataSourceClient) and used
/// from one thread at a time, so it does not need to be [`Sync`].
pub trait ZoneBackend {
    /// Returns the class of the zones this backend serves.
    fn class(&self) -> Class;

    /// Looks up the zone that is the nearest ancestor to `name` (i.e.,
    /// the zone whose origin matches the most consecutive labels in
    /// `name`, starting from the right) and returns a snapshot of its
    /// committed state.
    fn lookup(&self, name: &Name) -> Result<Option<Arc<ZoneData>>, Error>;

    /// Returns a snapshot of the committed state of the zone whose
    /// origin is exactly `origin`.
    ///
    /// A default implementation that uses [`ZoneBackend::lookup`] is
    /// provided. However, backends may wish to provide a custom version
    /// if [`ZoneBackend::lookup`] requires significantly more work than
    /// required to implement `get`.
    fn get(&self, origin: &Name) -> Result<Option<Arc<ZoneData>>, Error> {
        Ok(self
            .lookup(origin)?
            .filter(|zone| zone.origin().len() == origin.len()))
    }

    /// Returns the origins of all zones.
    fn zones(&self) -> Result<Vec<Name>, Error>;

    /// Returns a snapshot of the zone whose origin is exactly `origin`
    /// for a [`ZoneIterator`](super::ZoneIterator) to traverse, or
    /// `None` if there is no such zone.
    ///
    /// The default implementation reports that iteration is not
    /// supported, as for sources that generate their answers on demand
    /// and cannot list them.
    fn traverse(&self, origin: &Name) -> Result<Option<Arc<ZoneData>>, Error> {
        let _ = origin;
        Err(Error::NotImplemented("zone iteration"))
    }

    /// Opens a write transaction on the zone whose origin is exactly
    /// `origin`, or returns `None` if there is no such zone. When
    /// `replace` is set, the transaction will replace the entire
    /// contents of the zone; otherwise it applies changes to the
    /// current contents.
    ///
    /// The default implementation reports that updates are not
    /// supported.
    fn begin(
        &self,
        origin: &Name,
        replace: bool,
    ) -> Result<Option<Box<dyn Transaction + '_>>, Error> {
        let _ = (origin, replace);
        Err(Error::NotImplemented("zone updates"))
    }
}

/// An open write transaction on one zone, obtained from
/// [`ZoneBackend::begin`].
///
/// Dropping a transaction without committing it ends it with no effect
/// on the zone.
pub trait Transaction {
    /// Returns the committed state of the zone when the transaction
    /// began.
    fn base(&self) -> &Arc<ZoneData>;

    /// Atomically publishes a new state of the zone. `working` is the
    /// complete new state, and `journal` lists the changes that turned
    /// [`Transaction::base`] (or, for a replacing transaction, an empty
    /// zone) into it. Backends that allow concurrent transactions may
    /// use the journal to reapply the changes to a newer state.
    ///
    /// A transaction is committed at most once.
    fn commit(&mut self, working: ZoneData, journal: &[Change]) -> Result<(), Error>;
}
