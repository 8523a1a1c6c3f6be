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

//! Internal-use data structure for storing the RRsets at a node.

use super::Error;
use crate::rr::{Rrset, Type};

/// Stores all of the RRsets at a node in the DNS tree, sorted by type.
///
/// Stored [`Rrset`]s are never empty.
#[derive(Clone, Debug, Default)]
pub struct RrsetList {
    rrsets: Vec<Rrset>,
}

impl RrsetList {
    /// Merges the records of `rrset` into the [`Rrset`] of the same
    /// type, creating it if necessary.
    ///
    /// This will fail if the [`Ttl`](crate::rr::Ttl) of the new records
    /// does not match the existing [`Rrset`]; the list is then left
    /// unchanged. The owner and class are the caller's responsibility.
    pub fn merge(&mut self, rrset: &Rrset) -> Result<(), Error> {
        if rrset.is_empty() {
            return Ok(());
        }
        match self.index_of(rrset.rr_type()) {
            Ok(index) => {
                let existing = &mut self.rrsets[index];
                if existing.ttl() != rrset.ttl() {
                    Err(Error::TtlMismatch)
                } else {
                    *existing = existing
                        .merged(rrset)
                        .or(Err(Error::TtlMismatch))?;
                    Ok(())
                }
            }
            Err(index) => {
                self.rrsets.insert(index, rrset.clone());
                Ok(())
            }
        }
    }

    /// Removes the records of `rrset` from the [`Rrset`] of the same
    /// type. Records that are not present are ignored, and an [`Rrset`]
    /// left with no records is dropped. Returns whether anything was
    /// removed.
    pub fn remove(&mut self, rrset: &Rrset) -> bool {
        if let Ok(index) = self.index_of(rrset.rr_type()) {
            let remaining = self.rrsets[index].without(rrset);
            if remaining.len() == self.rrsets[index].len() {
                false
            } else {
                if remaining.is_empty() {
                    self.rrsets.remove(index);
                } else {
                    self.rrsets[index] = remaining;
                }
                true
            }
        } else {
            false
        }
    }

    /// Returns whether removing `rrset` would change the list.
    pub fn overlaps(&self, rrset: &Rrset) -> bool {
        self.lookup(rrset.rr_type()).map_or(false, |existing| {
            rrset.rdatas().iter().any(|rdata| existing.contains(rdata))
        })
    }

    /// Looks up the [`Rrset`] of type `rr_type` in the `RrsetList`.
    pub fn lookup(&self, rr_type: Type) -> Option<&Rrset> {
        self.index_of(rr_type)
            .map(|index| &self.rrsets[index])
            .ok()
    }

    /// Returns the [`Rrset`] at position `index`.
    pub fn get(&self, index: usize) -> Option<&Rrset> {
        self.rrsets.get(index)
    }

    /// Returns an iterator over the [`Rrset`]s of the `RrsetList`.
    pub fn iter(&self) -> std::slice::Iter<Rrset> {
        self.rrsets.iter()
    }

    /// Returns the number of [`Rrset`]s in the list.
    pub fn len(&self) -> usize {
        self.rrsets.len()
    }

    /// Returns whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.rrsets.is_empty()
    }

    fn index_of(&self, rr_type: Type) -> Result<usize, usize> {
        self.rrsets.binary_search_by_key(&rr_type, Rrset::rr_type)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rr::Record;

    fn rrset(text: &str) -> Rrset {
        text.parse::<Record>().unwrap().into_rrset()
    }

    #[test]
    fn rrsetlist_works() {
        let mut rrsets = RrsetList::default();
        rrsets.merge(&rrset("quandary.test. 3600 IN A 127.0.0.1")).unwrap();
        rrsets.merge(&rrset("quandary.test. 3600 IN A 127.0.0.2")).unwrap();
        rrsets.merge(&rrset("quandary.test. 7200 IN CNAME test.")).unwrap();

        assert_eq!(rrsets.lookup(Type::A).unwrap().len(), 2);
        assert_eq!(rrsets.lookup(Type::CNAME).unwrap().len(), 1);
        assert!(rrsets.lookup(Type::AAAA).is_none());
        assert_eq!(
            rrsets.iter().map(Rrset::rr_type).collect::<Vec<_>>(),
            [Type::A, Type::CNAME],
        );
    }

    #[test]
    fn rrsetlist_rejects_ttl_mismatch() {
        let mut rrsets = RrsetList::default();
        rrsets.merge(&rrset("quandary.test. 3600 IN NS test.")).unwrap();
        assert!(matches!(
            rrsets.merge(&rrset("quandary.test. 7200 IN NS invalid.")),
            Err(Error::TtlMismatch),
        ));
        assert_eq!(rrsets.lookup(Type::NS).unwrap().len(), 1);
    }

    #[test]
    fn rrsetlist_remove_works() {
        let mut rrsets = RrsetList::default();
        rrsets.merge(&rrset("quandary.test. 3600 IN A 127.0.0.1")).unwrap();
        rrsets.merge(&rrset("quandary.test. 3600 IN A 127.0.0.2")).unwrap();

        assert!(!rrsets.remove(&rrset("quandary.test. 3600 IN A 127.0.0.3")));
        assert!(!rrsets.overlaps(&rrset("quandary.test. 3600 IN AAAA ::1")));
        assert!(rrsets.overlaps(&rrset("quandary.test. 1 IN A 127.0.0.1")));
        assert!(rrsets.remove(&rrset("quandary.test. 1 IN A 127.0.0.1")));
        assert_eq!(rrsets.lookup(Type::A).unwrap().len(), 1);
        assert!(rrsets.remove(&rrset("quandary.test. 3600 IN A 127.0.0.2")));
        assert!(rrsets.is_empty());
    }
}
