// Copyright 2021 Matthew Ingwersen.
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

//! Implementation of the [`Rrset`] and [`Record`] types.

use std::fmt;
use std::str::FromStr;

use super::{Error, Rdata, Ttl, Type};
use crate::class::Class;
use crate::name::Name;

////////////////////////////////////////////////////////////////////////
// RRSETS                                                             //
////////////////////////////////////////////////////////////////////////

/// A resource record set.
///
/// [RFC 2181 § 5] defined an RRset as a group of records with the same
/// owner, class, and type, and also stipulated that all records in an
/// RRset have the same TTL. An `Rrset` enforces both at construction:
/// it carries a single owner, class, type, and TTL, plus the [`Rdata`]
/// of each record. Duplicate RDATA (see [`Rdata::equals`]) is dropped.
///
/// `Rrset`s are immutable. Zone updates build new `Rrset`s rather than
/// modifying stored ones, so an `Rrset` handed out by a lookup never
/// changes underneath its holder.
///
/// Two `Rrset`s are equal when they agree on owner, class, type, and
/// TTL and hold the same set of RDATA, regardless of order.
///
/// [RFC 2181 § 5]: https://datatracker.ietf.org/doc/html/rfc2181#section-5
#[derive(Clone)]
pub struct Rrset {
    owner: Name,
    class: Class,
    rr_type: Type,
    ttl: Ttl,
    rdatas: Vec<Rdata>,
}

impl Rrset {
    /// Creates a new `Rrset`. Duplicate RDATA is silently dropped.
    pub fn new(
        owner: Name,
        class: Class,
        rr_type: Type,
        ttl: Ttl,
        rdatas: impl IntoIterator<Item = Rdata>,
    ) -> Self {
        let mut rrset = Self {
            owner,
            class,
            rr_type,
            ttl,
            rdatas: Vec::new(),
        };
        for rdata in rdatas {
            rrset.insert(rdata);
        }
        rrset
    }

    /// Groups individual records into an `Rrset`. The records must
    /// share owner, class, and type ([`Error::MixedRecords`]) as well as
    /// TTL ([`Error::TtlMismatch`]), and there must be at least one.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Result<Self, Error> {
        let mut records = records.into_iter();
        let first = records.next().ok_or(Error::NoRecords)?;
        let mut rrset = Self::new(
            first.owner,
            first.class,
            first.rr_type,
            first.ttl,
            [first.rdata],
        );
        for record in records {
            if record.owner != rrset.owner
                || record.class != rrset.class
                || record.rr_type != rrset.rr_type
            {
                return Err(Error::MixedRecords);
            } else if record.ttl != rrset.ttl {
                return Err(Error::TtlMismatch);
            }
            rrset.insert(record.rdata);
        }
        Ok(rrset)
    }

    fn insert(&mut self, rdata: Rdata) {
        if !self.contains(&rdata) {
            self.rdatas.push(rdata);
        }
    }

    pub fn owner(&self) -> &Name {
        &self.owner
    }

    pub fn class(&self) -> Class {
        self.class
    }

    pub fn rr_type(&self) -> Type {
        self.rr_type
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    /// Returns the RDATA of the records, in the order they were added.
    pub fn rdatas(&self) -> &[Rdata] {
        &self.rdatas
    }

    /// Returns the number of records in the `Rrset`.
    pub fn len(&self) -> usize {
        self.rdatas.len()
    }

    /// Returns whether the `Rrset` holds no records. Such an `Rrset`
    /// can be built, but never exists in a zone.
    pub fn is_empty(&self) -> bool {
        self.rdatas.is_empty()
    }

    /// Returns whether the `Rrset` holds a record with RDATA equal to
    /// `rdata`.
    pub fn contains(&self, rdata: &Rdata) -> bool {
        self.rdatas
            .iter()
            .any(|existing| existing.equals(rdata, self.rr_type))
    }

    /// Returns an iterator over the individual records of the `Rrset`.
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.rdatas.iter().map(|rdata| Record {
            owner: self.owner.clone(),
            class: self.class,
            rr_type: self.rr_type,
            ttl: self.ttl,
            rdata: rdata.clone(),
        })
    }

    /// Returns a copy of the `Rrset` with a different owner. This is
    /// how wildcard answers are synthesized.
    pub fn with_owner(&self, owner: Name) -> Self {
        Self {
            owner,
            ..self.clone()
        }
    }

    /// Returns the union of this `Rrset` and `other`, which must have
    /// the same owner, class, and type. The TTLs must agree.
    pub fn merged(&self, other: &Rrset) -> Result<Self, Error> {
        if other.owner != self.owner || other.class != self.class || other.rr_type != self.rr_type
        {
            Err(Error::MixedRecords)
        } else if other.ttl != self.ttl {
            Err(Error::TtlMismatch)
        } else {
            let mut merged = self.clone();
            for rdata in other.rdatas() {
                merged.insert(rdata.clone());
            }
            Ok(merged)
        }
    }

    /// Returns a copy of this `Rrset` without the RDATA found in
    /// `other`. TTLs are not compared. RDATA in `other` that this
    /// `Rrset` lacks is ignored.
    pub fn without(&self, other: &Rrset) -> Self {
        Self {
            rdatas: self
                .rdatas
                .iter()
                .filter(|rdata| !other.contains(rdata))
                .cloned()
                .collect(),
            ..self.clone()
        }
    }
}

impl PartialEq for Rrset {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner
            && self.class == other.class
            && self.rr_type == other.rr_type
            && self.ttl == other.ttl
            && self.len() == other.len()
            && self.rdatas.iter().all(|rdata| other.contains(rdata))
    }
}

impl Eq for Rrset {}

impl fmt::Debug for Rrset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} ",
            self.owner, self.ttl, self.class, self.rr_type
        )?;
        let mut list = f.debug_list();
        for rdata in self.rdatas() {
            list.entry(&format_args!("{}", rdata.display_as(self.rr_type)));
        }
        list.finish()
    }
}

/// An `Rrset` is displayed as one line per record, in the same form
/// that [`Record`]'s [`FromStr`] implementation reads.
impl fmt::Display for Rrset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, record) in self.records().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{record}")?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// INDIVIDUAL RECORDS                                                 //
////////////////////////////////////////////////////////////////////////

/// A single resource record.
///
/// A `Record` is mostly useful as a unit of text input; zones store
/// [`Rrset`]s. See [`Rrset::from_records`] and [`Rrset::records`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    pub owner: Name,
    pub class: Class,
    pub rr_type: Type,
    pub ttl: Ttl,
    pub rdata: Rdata,
}

impl Record {
    /// Wraps this record up as an `Rrset` of one.
    pub fn into_rrset(self) -> Rrset {
        Rrset::new(self.owner, self.class, self.rr_type, self.ttl, [self.rdata])
    }
}

/// Parses a record of the form `<owner> <ttl> <class> <type> <rdata>`,
/// where the owner is fully qualified and the RDATA is in a form that
/// [`Rdata::parse`] accepts.
impl FromStr for Record {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (owner, rest) = next_field(text).ok_or(Error::InvalidRecord("missing owner"))?;
        let (ttl, rest) = next_field(rest).ok_or(Error::InvalidRecord("missing TTL"))?;
        let (class, rest) = next_field(rest).ok_or(Error::InvalidRecord("missing class"))?;
        let (rr_type, rdata) = next_field(rest).ok_or(Error::InvalidRecord("missing type"))?;
        let rr_type: Type = rr_type.parse().map_err(Error::InvalidRecord)?;
        Ok(Self {
            owner: owner.parse()?,
            class: class.parse().map_err(Error::InvalidRecord)?,
            rr_type,
            ttl: ttl.parse().map_err(Error::InvalidRecord)?,
            rdata: Rdata::parse(rr_type, rdata)?,
        })
    }
}

/// Splits the first whitespace-delimited field off of `text`.
fn next_field(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        None
    } else {
        Some(text.split_once(char::is_whitespace).unwrap_or((text, "")))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.owner,
            self.ttl,
            self.class,
            self.rr_type,
            self.rdata.display_as(self.rr_type),
        )
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
