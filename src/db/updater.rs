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

//! The [`ZoneUpdater`] write path.

use std::fmt;
use std::mem;
use std::sync::Arc;

use log::{debug, info};

use super::{Error, Transaction, ZoneData, ZoneFinder};
use crate::class::Class;
use crate::name::Name;
use crate::rr::Rrset;

////////////////////////////////////////////////////////////////////////
// CHANGES                                                            //
////////////////////////////////////////////////////////////////////////

/// A change staged by a [`ZoneUpdater`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Change {
    Add(Rrset),
    Delete(Rrset),
}

impl Change {
    /// Returns the records being added or deleted.
    pub fn rrset(&self) -> &Rrset {
        match self {
            Self::Add(rrset) | Self::Delete(rrset) => rrset,
        }
    }

    /// Applies the change to `zone`. See [`ZoneData::add`] and
    /// [`ZoneData::delete`].
    pub fn apply(&self, zone: &mut ZoneData) -> Result<(), Error> {
        match self {
            Self::Add(rrset) => zone.add(rrset),
            Self::Delete(rrset) => zone.delete(rrset),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// ZONE UPDATER                                                       //
////////////////////////////////////////////////////////////////////////

/// A transactional write handle on one zone.
///
/// An updater stages additions and deletions on a private copy of the
/// zone. Nobody else sees them until [`ZoneUpdater::commit`] publishes
/// them all at once. An updater that is dropped (or explicitly
/// [discarded](ZoneUpdater::discard)) before committing leaves the zone
/// exactly as it was, including when the caller bails out early with
/// `?` or panics.
///
/// The life of an updater is a small state machine (see
/// [`UpdaterState`]): it starts out open, and commits or is discarded
/// exactly once.
pub struct ZoneUpdater<'c> {
    state: State<'c>,
    working: ZoneData,
    journal: Vec<Change>,
    replace: bool,
}

/// The state of a [`ZoneUpdater`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UpdaterState {
    /// Changes may be staged and committed.
    Open,

    /// The changes were published. This is terminal.
    Committed,

    /// The changes were thrown away, either because a commit failed or
    /// because the updater was dropped. This is terminal.
    Discarded,
}

/// The internal state of a [`ZoneUpdater`]. Only an open updater holds
/// a backend transaction, so ending the updater's life releases it.
enum State<'c> {
    Open(Box<dyn Transaction + 'c>),
    Committed,
    Discarded,
}

impl<'c> ZoneUpdater<'c> {
    pub(super) fn new(transaction: Box<dyn Transaction + 'c>, replace: bool) -> Self {
        let base = transaction.base();
        let working = if replace {
            ZoneData::new(base.origin().clone(), base.class())
        } else {
            ZoneData::clone(base)
        };
        debug!(
            "Began {} update of zone {}/{}.",
            if replace { "replacing" } else { "partial" },
            working.origin(),
            working.class(),
        );
        Self {
            state: State::Open(transaction),
            working,
            journal: Vec::new(),
            replace,
        }
    }

    /// Returns the origin of the zone being updated.
    pub fn origin(&self) -> &Name {
        self.working.origin()
    }

    /// Returns the class of the zone being updated.
    pub fn class(&self) -> Class {
        self.working.class()
    }

    /// Returns whether the updater replaces the zone's contents (rather
    /// than starting from them).
    pub fn is_replace(&self) -> bool {
        self.replace
    }

    /// Returns the state of the updater.
    pub fn state(&self) -> UpdaterState {
        match self.state {
            State::Open(_) => UpdaterState::Open,
            State::Committed => UpdaterState::Committed,
            State::Discarded => UpdaterState::Discarded,
        }
    }

    /// Returns the changes staged so far, in order.
    pub fn changes(&self) -> &[Change] {
        &self.journal
    }

    /// Stages the addition of the records of `rrset`. They are merged
    /// into the existing (or already staged) RRset of the same name and
    /// type.
    ///
    /// This fails with [`Error::NotInZone`], [`Error::ClassMismatch`],
    /// or [`Error::TtlMismatch`] if the records do not fit the zone; the
    /// staged state is then unchanged and the updater stays open.
    pub fn add_rrset(&mut self, rrset: Rrset) -> Result<(), Error> {
        self.stage(Change::Add(rrset))
    }

    /// Stages the deletion of the records of `rrset`. The TTL is
    /// ignored. Deleting records that do not exist is not an error; it
    /// does nothing.
    pub fn delete_rrset(&mut self, rrset: Rrset) -> Result<(), Error> {
        self.stage(Change::Delete(rrset))
    }

    fn stage(&mut self, change: Change) -> Result<(), Error> {
        match self.state {
            State::Open(_) => {
                change.apply(&mut self.working)?;
                self.journal.push(change);
                Ok(())
            }
            State::Committed => Err(Error::AlreadyCommitted),
            State::Discarded => Err(Error::Discarded),
        }
    }

    /// Returns a [`ZoneFinder`] over the staged state of the zone, so
    /// that changes can be checked before they are committed.
    pub fn finder(&self) -> ZoneFinder<'_> {
        ZoneFinder::new(Arc::new(self.working.clone()))
    }

    /// Atomically publishes the staged changes. Afterwards, new
    /// [`ZoneFinder`]s and [`ZoneIterator`](super::ZoneIterator)s see
    /// the new state; existing ones keep seeing the state they started
    /// with.
    ///
    /// Committing twice fails with [`Error::AlreadyCommitted`]. If the
    /// backend fails to commit, the zone is unchanged and the updater is
    /// discarded.
    pub fn commit(&mut self) -> Result<(), Error> {
        match mem::replace(&mut self.state, State::Discarded) {
            State::Open(mut transaction) => {
                transaction.commit(self.working.clone(), &self.journal)?;
                self.state = State::Committed;
                info!(
                    "Committed {} change(s) to zone {}/{}.",
                    self.journal.len(),
                    self.origin(),
                    self.class(),
                );
                Ok(())
            }
            State::Committed => {
                self.state = State::Committed;
                Err(Error::AlreadyCommitted)
            }
            State::Discarded => Err(Error::Discarded),
        }
    }

    /// Throws away the staged changes. This is what dropping an open
    /// updater does; `discard` just makes it explicit.
    pub fn discard(mut self) {
        self.abandon();
    }

    fn abandon(&mut self) {
        if let State::Open(_) = self.state {
            debug!(
                "Discarding {} staged change(s) to zone {}/{}.",
                self.journal.len(),
                self.origin(),
                self.class(),
            );
            self.state = State::Discarded;
        }
    }
}

impl Drop for ZoneUpdater<'_> {
    fn drop(&mut self) {
        self.abandon();
    }
}

impl fmt::Debug for ZoneUpdater<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ZoneUpdater")
            .field("origin", self.origin())
            .field("class", &self.class())
            .field("state", &self.state())
            .field("replace", &self.replace)
            .field("changes", &self.journal.len())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
