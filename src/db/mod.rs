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

//! Facilities for storing and accessing DNS data.
//!
//! The DNS is essentially a distributed database, and authoritative
//! server implementations are thus database software of a sort. This
//! module is the data source layer of such software: it abstracts
//! record lookups and zone updates from the actual storage methods
//! used. Different backends may keep DNS data in memory, in files on
//! disk, or somewhere else entirely, and the rest of a server does not
//! need to care.
//!
//! ## Zones and clients
//!
//! While [RFC 1035 § 6.1.2] notes that a server may use any internal
//! data structures, a tiered approach is suggested. At the first level,
//! the server maintains a "catalog" of the zones for which it is
//! authoritative. Each zone is in turn stored in its own data
//! structure. [RFC 1034 § 4.3.2] describes query processing the same
//! way: in step 2, the zone to which the query pertains is identified,
//! and in step 3, the zone is searched for the desired records.
//!
//! The interfaces here follow that two-step procedure:
//!
//! * A [`DataSourceClient`] is bound to one backend connection and one
//!   class. [`DataSourceClient::find_zone`] selects the zone whose
//!   origin is the longest match for a name.
//! * A [`ZoneFinder`] answers lookups within one zone, following the
//!   algorithm of [RFC 1034 § 4.3.2] (including delegations, CNAMEs,
//!   and the wildcards of [RFC 4592]).
//! * A [`ZoneIterator`] visits every RRset of a zone.
//! * A [`ZoneUpdater`] stages changes to a zone in a transaction that
//!   is published atomically by [`ZoneUpdater::commit`], or rolled back
//!   when the updater is dropped.
//!
//! ## Snapshots
//!
//! Zone contents are held in [`ZoneData`], a persistent tree whose
//! nodes are shared through [`Arc`](std::sync::Arc)s. Finders and
//! iterators hold the snapshot that was committed when they were
//! created, so they are never affected by updates that are in progress
//! or that commit later. An updater works on its own copy, which shares
//! every node it has not modified with the committed state.
//!
//! ## Backends
//!
//! Storage backends implement the [`ZoneBackend`] trait. Two are
//! provided:
//!
//! * [`MemoryStore`] keeps zones in memory and can be shared among any
//!   number of clients on any number of threads (see
//!   [`MemoryStore::connect`]). It supports both replacing and partial
//!   updates, and allows concurrent updaters on one zone.
//! * [`Database`] keeps zones in a [`redb`] file, one record per zone
//!   in RFC 1035 wire format. Each commit is one `redb` write
//!   transaction. Threads share the database through an `Arc` and
//!   each [connect](Database::connect) to it. It supports only
//!   replacing updates and one updater per zone at a time.
//!
//! The [`table`] module reads and writes zones as text, for loading
//! and dumping them.
//!
//! [RFC 1034 § 4.3.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.3.2
//! [RFC 1035 § 6.1.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-6.1.2
//! [RFC 4592]: https://datatracker.ietf.org/doc/html/rfc4592

mod backend;
mod client;
mod database;
mod error;
mod finder;
mod iterator;
mod memory;
mod node;
mod rrset_list;
pub mod table;
mod updater;
mod zone_data;

pub use backend::{Transaction, ZoneBackend};
pub use client::{DataSourceClient, FindZoneResult, ResultCode};
pub use database::{Database, DatabaseBackend};
pub use error::{BackendError, Error};
pub use finder::{FindOptions, FindResult, ZoneFinder};
pub use iterator::ZoneIterator;
pub use memory::{MemoryBackend, MemoryStore};
pub use updater::{Change, UpdaterState, ZoneUpdater};
pub use zone_data::ZoneData;
