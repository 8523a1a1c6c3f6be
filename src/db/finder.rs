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

//! The [`ZoneFinder`] read path and its result types.

use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{ResultCode, ZoneData};
use crate::class::Class;
use crate::name::Name;
use crate::rr::{Rrset, Type};

////////////////////////////////////////////////////////////////////////
// ZONE FINDER                                                        //
////////////////////////////////////////////////////////////////////////

/// Looks up records within one zone.
///
/// A `ZoneFinder` holds the snapshot of the zone that was committed
/// when it was created. It never observes later commits or uncommitted
/// updates, so every lookup through one `ZoneFinder` sees the same
/// data. Finders are obtained from
/// [`DataSourceClient::find_zone`](super::DataSourceClient::find_zone)
/// or, to read staged changes, from
/// [`ZoneUpdater::finder`](super::ZoneUpdater::finder).
#[derive(Clone)]
pub struct ZoneFinder<'c> {
    zone: Arc<ZoneData>,
    _source: PhantomData<&'c ()>,
}

/// Options for [`ZoneFinder::find_with`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FindOptions {
    /// Ignore zone cuts, so that glue records below a delegation can be
    /// found.
    pub glue_ok: bool,
}

impl<'c> ZoneFinder<'c> {
    pub(super) fn new(zone: Arc<ZoneData>) -> Self {
        Self {
            zone,
            _source: PhantomData,
        }
    }

    /// Returns the origin of the zone.
    pub fn origin(&self) -> &Name {
        self.zone.origin()
    }

    /// Returns the class of the zone.
    pub fn class(&self) -> Class {
        self.zone.class()
    }

    /// Looks up the records of type `rr_type` at `name`. See
    /// [`FindResult`] for the possible outcomes.
    pub fn find(&self, name: &Name, rr_type: Type) -> FindResult {
        self.find_with(name, rr_type, FindOptions::default())
    }

    /// Like [`ZoneFinder::find`], with options.
    pub fn find_with(&self, name: &Name, rr_type: Type, options: FindOptions) -> FindResult {
        self.zone.lookup(name, rr_type, options)
    }
}

impl std::fmt::Debug for ZoneFinder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ZoneFinder")
            .field("origin", self.origin())
            .field("class", &self.class())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////
// FIND RESULTS                                                       //
////////////////////////////////////////////////////////////////////////

/// The outcome of a [`ZoneFinder`] lookup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FindResult<'a> {
    /// The name has records of the requested type. For a wildcard
    /// match, the owner is the query name.
    Success(Cow<'a, Rrset>),

    /// The name has no records of the requested type, but it has a
    /// CNAME record, which is returned.
    Cname(Cow<'a, Rrset>),

    /// The name is at or below a zone cut. The NS RRset of the
    /// delegation is returned.
    Delegation(&'a Rrset),

    /// The name exists but has no records of the requested type.
    NxRrset,

    /// The name does not exist in the zone.
    NxDomain,

    /// The name is not within the zone at all.
    OutOfZone,
}

impl<'a> FindResult<'a> {
    /// Returns the [`ResultCode`] of the lookup: [`ResultCode::Success`]
    /// for an answer (including a CNAME), [`ResultCode::PartialMatch`]
    /// for a delegation, and [`ResultCode::NotFound`] otherwise.
    pub fn code(&self) -> ResultCode {
        match self {
            Self::Success(_) | Self::Cname(_) => ResultCode::Success,
            Self::Delegation(_) => ResultCode::PartialMatch,
            Self::NxRrset | Self::NxDomain | Self::OutOfZone => ResultCode::NotFound,
        }
    }

    /// Returns the RRset carried by the result, if any.
    pub fn rrset(&self) -> Option<&Rrset> {
        match self {
            Self::Success(rrset) | Self::Cname(rrset) => Some(rrset.as_ref()),
            Self::Delegation(rrset) => Some(*rrset),
            _ => None,
        }
    }

    /// Returns whether the query name exists, which distinguishes the
    /// two kinds of [`ResultCode::NotFound`].
    pub fn name_exists(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Cname(_) | Self::NxRrset)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
