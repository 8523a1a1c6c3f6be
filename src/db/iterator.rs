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

//! The [`ZoneIterator`] traversal.

use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::sync::Arc;

use super::node::Walk;
use super::rrset_list::RrsetList;
use super::zone_data::{Node, ZoneData};
use crate::name::Name;
use crate::rr::Rrset;

/// An iterator over every RRset of a zone.
///
/// The iterator works on the snapshot of the zone that was committed
/// when it was created, and produces each RRset of that snapshot
/// exactly once, in the canonical order of owner names (and by type at
/// each name). Commits made during the traversal do not affect it.
///
/// The traversal is lazy and cannot be restarted; ask the
/// [`DataSourceClient`](super::DataSourceClient) for a new iterator to
/// go through the zone again.
pub struct ZoneIterator<'c> {
    origin: Name,
    walk: Walk<RrsetList>,
    current: Option<(Arc<Node>, usize)>,
    _source: PhantomData<&'c ()>,
}

impl<'c> ZoneIterator<'c> {
    /// Creates an iterator over the current contents of `zone`.
    pub fn new(zone: &ZoneData) -> Self {
        Self {
            origin: zone.origin().clone(),
            walk: zone.walk(),
            current: None,
            _source: PhantomData,
        }
    }

    /// Returns the origin of the zone being iterated.
    pub fn origin(&self) -> &Name {
        &self.origin
    }
}

impl Iterator for ZoneIterator<'_> {
    type Item = Rrset;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((node, index)) = &mut self.current {
                if let Some(rrset) = node.data.get(*index) {
                    *index += 1;
                    return Some(rrset.clone());
                }
            }
            self.current = Some((self.walk.next()?, 0));
        }
    }
}

impl FusedIterator for ZoneIterator<'_> {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::Class;
    use crate::rr::{Record, Type};

    fn rrset(text: &str) -> Rrset {
        text.parse::<Record>().unwrap().into_rrset()
    }

    #[test]
    fn iterates_every_rrset_once_in_order() {
        let mut zone = ZoneData::new("quandary.test.".parse().unwrap(), Class::IN);
        for line in [
            "www.quandary.test. 300 IN AAAA ::1",
            "quandary.test. 3600 IN NS ns.quandary.test.",
            "www.quandary.test. 300 IN A 127.0.0.1",
            "a.b.quandary.test. 300 IN A 127.0.0.2",
            "www.quandary.test. 300 IN A 127.0.0.3",
        ] {
            zone.add(&rrset(line)).unwrap();
        }
        let rrsets: Vec<_> = ZoneIterator::new(&zone)
            .map(|rrset| (rrset.owner().to_string(), rrset.rr_type(), rrset.len()))
            .collect();
        assert_eq!(
            rrsets,
            [
                ("quandary.test.".to_owned(), Type::NS, 1),
                ("a.b.quandary.test.".to_owned(), Type::A, 1),
                ("www.quandary.test.".to_owned(), Type::A, 2),
                ("www.quandary.test.".to_owned(), Type::AAAA, 1),
            ],
        );
    }

    #[test]
    fn iterator_is_a_snapshot() {
        let mut zone = ZoneData::new("quandary.test.".parse().unwrap(), Class::IN);
        zone.add(&rrset("quandary.test. 3600 IN A 127.0.0.1")).unwrap();
        let mut iter = ZoneIterator::new(&zone);
        zone.add(&rrset("www.quandary.test. 300 IN A 127.0.0.2"))
            .unwrap();
        assert_eq!(iter.by_ref().count(), 1);
        assert!(iter.next().is_none());
        assert_eq!(iter.origin().to_string(), "quandary.test.");
    }

    #[test]
    fn empty_zone_yields_nothing() {
        let zone = ZoneData::new(Name::root().clone(), Class::IN);
        assert_eq!(ZoneIterator::new(&zone).count(), 0);
    }
}
