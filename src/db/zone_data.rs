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

//! The [`ZoneData`] structure.

use std::borrow::Cow;
use std::sync::Arc;

use super::node::{self, Walk};
use super::rrset_list::RrsetList;
use super::{Error, FindOptions, FindResult};
use crate::class::Class;
use crate::name::{Label, Name};
use crate::rr::{Rrset, Type};

////////////////////////////////////////////////////////////////////////
// STRUCTURE AND BASIC OPERATIONS                                     //
////////////////////////////////////////////////////////////////////////

/// The contents of one zone: an in-memory tree that mirrors the DNS's
/// tree structure, with the RRsets of each name stored at its node.
///
/// `ZoneData` is persistent. Cloning it is cheap (it clones one
/// [`Arc`]), and [`ZoneData::add`] and [`ZoneData::delete`] copy only
/// the nodes on the path to the change. This is what makes snapshots
/// work: a backend publishes an `Arc<ZoneData>`, readers keep the
/// snapshot they started with, and an update works on a clone that
/// shares everything it has not touched.
///
/// A node with no RRsets and no children never exists, so a name
/// "exists" exactly when it owns records or has descendants that do
/// (i.e., is an empty non-terminal).
#[derive(Clone, Debug)]
pub struct ZoneData {
    class: Class,
    apex: Arc<Node>,
}

pub(super) type Node = node::Node<RrsetList>;

impl ZoneData {
    /// Creates a new, empty `ZoneData` with the given origin and class.
    pub fn new(origin: Name, class: Class) -> Self {
        Self {
            class,
            apex: Arc::new(Node::new(origin)),
        }
    }

    /// Returns the origin of the zone (i.e., the domain name of the
    /// zone's apex node).
    pub fn origin(&self) -> &Name {
        &self.apex.name
    }

    /// Returns the DNS class of the zone.
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns whether the zone holds no records.
    pub fn is_empty(&self) -> bool {
        self.apex.data.is_empty() && self.apex.children.is_empty()
    }

    /// Returns the number of RRsets in the zone.
    pub fn rrset_count(&self) -> usize {
        self.walk().map(|node| node.data.len()).sum()
    }

    /// Returns a walk over the nodes of the zone, in canonical order.
    pub(super) fn walk(&self) -> Walk<RrsetList> {
        Walk::new(self.apex.clone())
    }

    /// Adds the records of `rrset` to the zone, merging them into the
    /// existing RRset of the same name and type, if any.
    ///
    /// This will fail if the owner is not within the zone, if the
    /// class does not match the zone, or if the TTL does not match an
    /// existing RRset. On failure, the zone is unchanged. Adding an
    /// empty RRset does nothing.
    pub fn add(&mut self, rrset: &Rrset) -> Result<(), Error> {
        self.check(rrset)?;
        if rrset.is_empty() {
            return Ok(());
        }
        let owner = rrset.owner();
        let level = self.level_of(owner);
        let existing = self
            .apex
            .get_descendant(owner, level)
            .and_then(|node| node.data.lookup(rrset.rr_type()));
        if existing.map_or(false, |existing| existing.ttl() != rrset.ttl()) {
            return Err(Error::TtlMismatch);
        }
        Arc::make_mut(&mut self.apex)
            .get_or_create_descendant(owner, level)
            .data
            .merge(rrset)
    }

    /// Deletes the records of `rrset` from the zone. The TTL is
    /// ignored, and records that are not present are ignored as well.
    /// Nodes left with no records and no children are removed.
    ///
    /// This will fail if the owner is not within the zone or if the
    /// class does not match the zone.
    pub fn delete(&mut self, rrset: &Rrset) -> Result<(), Error> {
        self.check(rrset)?;
        let level = self.level_of(rrset.owner());
        let present = self
            .apex
            .get_descendant(rrset.owner(), level)
            .map_or(false, |node| node.data.overlaps(rrset));
        // Only copy the path when there is something to delete.
        if present {
            delete_impl(Arc::make_mut(&mut self.apex), rrset, level);
        }
        Ok(())
    }

    fn check(&self, rrset: &Rrset) -> Result<(), Error> {
        if !rrset.owner().eq_or_subdomain_of(self.origin()) {
            Err(Error::NotInZone)
        } else if rrset.class() != self.class {
            Err(Error::ClassMismatch)
        } else {
            Ok(())
        }
    }

    /// Returns how many levels below the apex `name`'s node lies. The
    /// name must be within the zone.
    fn level_of(&self, name: &Name) -> usize {
        name.len() - self.origin().len()
    }
}

/// Implements record deletion. `node` corresponds to the label
/// `rrset.owner()[level]`. Returns whether `node` is now empty and
/// should be removed from its parent.
fn delete_impl(node: &mut Node, rrset: &Rrset, level: usize) -> bool {
    if level == 0 {
        node.data.remove(rrset);
    } else {
        let label = &rrset.owner()[level - 1];
        if let Some(child) = node.children.get_mut(label) {
            if delete_impl(Arc::make_mut(child), rrset, level - 1) {
                node.children.remove(label);
            }
        }
    }
    node.data.is_empty() && node.children.is_empty()
}

////////////////////////////////////////////////////////////////////////
// LOOKUP IMPLEMENTATION                                              //
////////////////////////////////////////////////////////////////////////

enum LookupBaseResult<'a> {
    Found { node: &'a Node, wildcard: bool },
    Delegation(&'a Rrset),
    NxDomain,
}

impl ZoneData {
    /// Looks up the records of type `rr_type` at `name`. This is the
    /// implementation of [`ZoneFinder::find_with`](super::ZoneFinder::find_with).
    pub fn lookup(&self, name: &Name, rr_type: Type, options: FindOptions) -> FindResult {
        if !name.eq_or_subdomain_of(self.origin()) {
            return FindResult::OutOfZone;
        }
        let level = self.level_of(name);
        match lookup_impl(&self.apex, name, level, rr_type, options.glue_ok, true) {
            LookupBaseResult::Found { node, wildcard } => {
                if let Some(rrset) = node.data.lookup(rr_type) {
                    FindResult::Success(synthesize(rrset, name, wildcard))
                } else if let Some(rrset) = node.data.lookup(Type::CNAME) {
                    FindResult::Cname(synthesize(rrset, name, wildcard))
                } else {
                    FindResult::NxRrset
                }
            }
            LookupBaseResult::Delegation(ns_rrset) => FindResult::Delegation(ns_rrset),
            LookupBaseResult::NxDomain => FindResult::NxDomain,
        }
    }
}

/// Implements the DNS lookup algorithm.
///
/// `node` is the deepest node we have matched so far; this node
/// corresponds to the label `name[level]`. If we have not reached the
/// target node, the function attempts to recursively match down the
/// tree. Unless `glue_ok` is set, a non-apex node with an NS RRset is a
/// zone cut and ends the search with a delegation. The one exception is
/// a query for the NS RRset at the cut itself, which is answered. The
/// first call should set `at_apex` to `true`.
fn lookup_impl<'a>(
    node: &'a Node,
    name: &Name,
    level: usize,
    rr_type: Type,
    glue_ok: bool,
    at_apex: bool,
) -> LookupBaseResult<'a> {
    if !at_apex && !glue_ok {
        if let Some(ns_rrset) = node.data.lookup(Type::NS) {
            if level > 0 || rr_type != Type::NS {
                return LookupBaseResult::Delegation(ns_rrset);
            }
        }
    }

    if level == 0 {
        LookupBaseResult::Found {
            node,
            wildcard: false,
        }
    } else {
        // Try to traverse down the tree. If deeper nodes do not exist,
        // then this node is the "closest encloser" (see RFC 4592 §
        // 3.3.1), and we search for a wildcard domain name to be the
        // "source of synthesis" for the response.
        if let Some(subnode) = node.children.get(&name[level - 1]) {
            lookup_impl(subnode, name, level - 1, rr_type, glue_ok, false)
        } else if let Some(source_of_synthesis) = node.children.get(Label::asterisk()) {
            LookupBaseResult::Found {
                node: source_of_synthesis,
                wildcard: true,
            }
        } else {
            LookupBaseResult::NxDomain
        }
    }
}

/// Returns `rrset` as the answer for `name`. An answer synthesized from
/// a wildcard is owned by the query name (RFC 4592 § 3.3.2).
fn synthesize<'a>(rrset: &'a Rrset, name: &Name, wildcard: bool) -> Cow<'a, Rrset> {
    if wildcard {
        Cow::Owned(rrset.with_owner(name.clone()))
    } else {
        Cow::Borrowed(rrset)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use lazy_static::lazy_static;

    use super::*;
    use crate::db::ResultCode;
    use crate::rr::Record;

    lazy_static! {
        static ref NAME: Name = "quandary.test.".parse().unwrap();
    }

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    fn rrset(text: &str) -> Rrset {
        text.parse::<Record>().unwrap().into_rrset()
    }

    fn new_zone() -> ZoneData {
        ZoneData::new(NAME.clone(), Class::IN)
    }

    fn find<'a>(zone: &'a ZoneData, owner: &str, rr_type: Type) -> FindResult<'a> {
        zone.lookup(&name(owner), rr_type, FindOptions::default())
    }

    #[test]
    fn add_rejects_mismatched_class() {
        let mut zone = new_zone();
        assert!(matches!(
            zone.add(&rrset("quandary.test. 3600 CH A 127.0.0.1")),
            Err(Error::ClassMismatch),
        ));
    }

    #[test]
    fn add_rejects_mismatched_ttl() {
        let mut zone = new_zone();
        zone.add(&rrset("quandary.test. 3600 IN A 127.0.0.1")).unwrap();
        assert!(matches!(
            zone.add(&rrset("quandary.test. 7200 IN A 127.0.0.2")),
            Err(Error::TtlMismatch),
        ));
        assert_eq!(
            find(&zone, "quandary.test.", Type::A).rrset().unwrap().len(),
            1,
        );
    }

    #[test]
    fn add_rejects_owner_outside_of_zone() {
        let mut zone = new_zone();
        assert!(matches!(
            zone.add(&rrset("other.test. 3600 IN A 127.0.0.1")),
            Err(Error::NotInZone),
        ));
        assert!(zone.is_empty());
    }

    #[test]
    fn add_works() {
        let mut zone = ZoneData::new(name("d."), Class::IN);
        zone.add(&rrset("a.b.c.d. 3600 IN A 127.0.0.1")).unwrap();

        let c_node = zone.apex.children.get(&name("c.")[0]).unwrap();
        let b_node = c_node.children.get(&name("b.")[0]).unwrap();
        let a_node = b_node.children.get(&name("a.")[0]).unwrap();
        assert_eq!(a_node.children.len(), 0);
        assert_eq!(a_node.data.iter().next().unwrap().rr_type(), Type::A);
        assert_eq!(zone.rrset_count(), 1);
    }

    #[test]
    fn delete_prunes_empty_nodes() {
        let mut zone = ZoneData::new(name("d."), Class::IN);
        zone.add(&rrset("d. 3600 IN A 127.0.0.1")).unwrap();
        zone.add(&rrset("a.b.c.d. 3600 IN A 127.0.0.1")).unwrap();
        zone.add(&rrset("a.b.c.d. 3600 IN A 127.0.0.2")).unwrap();

        zone.delete(&rrset("a.b.c.d. 1 IN A 127.0.0.1")).unwrap();
        assert!(find(&zone, "c.d.", Type::A) == FindResult::NxRrset);

        zone.delete(&rrset("a.b.c.d. 3600 IN A 127.0.0.2")).unwrap();
        assert!(zone.apex.children.is_empty());
        assert!(find(&zone, "c.d.", Type::A) == FindResult::NxDomain);
        assert!(!zone.is_empty());
    }

    #[test]
    fn delete_of_absent_records_is_a_no_op() {
        let mut zone = new_zone();
        zone.add(&rrset("www.quandary.test. 3600 IN A 127.0.0.1"))
            .unwrap();
        let before = zone.clone();
        zone.delete(&rrset("www.quandary.test. 3600 IN A 127.0.0.2"))
            .unwrap();
        zone.delete(&rrset("ftp.quandary.test. 3600 IN A 127.0.0.1"))
            .unwrap();
        assert!(Arc::ptr_eq(&before.apex, &zone.apex));
        assert!(matches!(
            zone.delete(&rrset("www.other.test. 3600 IN A 127.0.0.1")),
            Err(Error::NotInZone),
        ));
    }

    #[test]
    fn changes_to_a_copy_are_isolated() {
        let mut original = new_zone();
        original
            .add(&rrset("www.quandary.test. 3600 IN A 127.0.0.1"))
            .unwrap();
        let mut copy = original.clone();
        copy.add(&rrset("ftp.quandary.test. 3600 IN A 127.0.0.1"))
            .unwrap();
        copy.delete(&rrset("www.quandary.test. 3600 IN A 127.0.0.1"))
            .unwrap();

        assert!(find(&original, "www.quandary.test.", Type::A).code() == ResultCode::Success);
        assert!(find(&original, "ftp.quandary.test.", Type::A) == FindResult::NxDomain);
        assert!(find(&copy, "www.quandary.test.", Type::A) == FindResult::NxDomain);
        assert_eq!(copy.rrset_count(), 1);
    }

    ////////////////////////////////////////////////////////////////////
    // LOOKUP TESTS                                                   //
    ////////////////////////////////////////////////////////////////////

    #[test]
    fn lookup_works() {
        let mut zone = new_zone();
        let www = rrset("www.quandary.test. 3600 IN A 127.0.0.1");
        zone.add(&www).unwrap();
        assert!(matches!(
            find(&zone, "www.quandary.test.", Type::A),
            FindResult::Success(Cow::Borrowed(found)) if *found == www,
        ));
    }

    #[test]
    fn lookup_handles_exists_but_no_records() {
        let mut zone = new_zone();
        zone.add(&rrset("a.www.quandary.test. 3600 IN A 127.0.0.1"))
            .unwrap();
        let result = find(&zone, "a.www.quandary.test.", Type::AAAA);
        assert!(result == FindResult::NxRrset);
        assert!(result.name_exists());

        // Empty non-terminals exist, too.
        assert!(find(&zone, "www.quandary.test.", Type::A) == FindResult::NxRrset);
    }

    #[test]
    fn lookup_handles_nxdomain_and_wrong_zone() {
        let zone = new_zone();
        let result = find(&zone, "www.quandary.test.", Type::A);
        assert!(result == FindResult::NxDomain);
        assert!(!result.name_exists());
        assert!(find(&zone, "other.test.", Type::A) == FindResult::OutOfZone);
    }

    #[test]
    fn lookup_returns_cname() {
        let mut zone = new_zone();
        let alias = rrset("alias.quandary.test. 3600 IN CNAME www.quandary.test.");
        zone.add(&alias).unwrap();
        assert!(matches!(
            find(&zone, "alias.quandary.test.", Type::A),
            FindResult::Cname(found) if *found == alias,
        ));
        assert!(matches!(
            find(&zone, "alias.quandary.test.", Type::CNAME),
            FindResult::Success(found) if *found == alias,
        ));
    }

    #[test]
    fn referral_processing_works() {
        let mut zone = new_zone();
        let ns = rrset("subdel.quandary.test. 3600 IN NS ns.subdel.quandary.test.");
        let glue = rrset("ns.subdel.quandary.test. 3600 IN A 127.0.0.1");
        zone.add(&ns).unwrap();
        zone.add(&glue).unwrap();

        // Without glue_ok, names at or below the cut are delegated.
        for (owner, rr_type) in [
            ("ns.subdel.quandary.test.", Type::A),
            ("subdel.quandary.test.", Type::A),
            ("x.y.subdel.quandary.test.", Type::NS),
        ] {
            let result = find(&zone, owner, rr_type);
            assert!(matches!(result, FindResult::Delegation(found) if *found == ns));
            assert_eq!(result.code(), ResultCode::PartialMatch);
        }

        // The NS RRset at the cut itself is an exact match.
        assert!(matches!(
            find(&zone, "subdel.quandary.test.", Type::NS),
            FindResult::Success(found) if *found == ns,
        ));

        // With glue_ok, lookups enter non-authoritative data.
        let options = FindOptions { glue_ok: true };
        assert!(matches!(
            zone.lookup(&name("ns.subdel.quandary.test."), Type::A, options),
            FindResult::Success(found) if *found == glue,
        ));
    }

    #[test]
    fn apex_ns_is_not_a_cut() {
        let mut zone = new_zone();
        zone.add(&rrset("quandary.test. 3600 IN NS ns.quandary.test."))
            .unwrap();
        zone.add(&rrset("ns.quandary.test. 3600 IN A 127.0.0.1"))
            .unwrap();
        assert!(matches!(
            find(&zone, "ns.quandary.test.", Type::A),
            FindResult::Success(_),
        ));
    }

    // RFC 4592 § 2.2.1 provides examples of wildcard synthesis. We
    // replicate the examples here, since (a) it verifies the
    // correctness of our wildcard processing, and (b) it's in general a
    // nice workout for the lookup code. Lengthy RDATA that does not
    // matter for the tests is abbreviated.
    static RFC_4592_ZONE: &[&str] = &[
        "example. 3600 IN SOA \\# 4 00000000",
        "example. 3600 IN NS ns.example.com.",
        "example. 3600 IN NS ns.example.net.",
        "*.example. 3600 IN TXT \\# 19 12746869732069732061207769 6c6463617264",
        "*.example. 3600 IN MX \\# 17 000a05686f737431076578616d706c6500",
        "sub.*.example. 3600 IN TXT \\# 3 026e6f",
        "host1.example. 3600 IN A 192.0.2.1",
        "_ssh._tcp.host1.example. 3600 IN SRV \\# 2 0000",
        "_ssh._tcp.host2.example. 3600 IN SRV \\# 2 0000",
        "subdel.example. 3600 IN NS ns.example.com.",
        "subdel.example. 3600 IN NS ns.example.net.",
    ];

    #[test]
    fn rfc_4592_examples() {
        let mut zone = ZoneData::new(name("example."), Class::IN);
        for line in RFC_4592_ZONE {
            zone.add(&rrset(line)).unwrap();
        }

        // The following are synthesized from a wildcard.
        match find(&zone, "host3.example.", Type::MX) {
            FindResult::Success(found) => {
                assert_eq!(found.owner(), &name("host3.example."));
                assert_eq!(found.rdatas()[0].len(), 17);
            }
            _ => panic!("host3.example. MX did not return the expected record"),
        }
        assert!(find(&zone, "host3.example.", Type::A) == FindResult::NxRrset);
        match find(&zone, "foo.bar.example.", Type::TXT) {
            FindResult::Success(found) => {
                assert_eq!(found.owner(), &name("foo.bar.example."));
                assert_eq!(found.rdatas()[0].len(), 19);
            }
            _ => panic!("foo.bar.example. TXT did not return the expected record"),
        }

        // The following do not trigger wildcard synthesis. (See RFC
        // 4592 § 2.2.1 for the reasons why!)
        assert!(find(&zone, "host1.example.", Type::MX) == FindResult::NxRrset);
        assert!(find(&zone, "sub.*.example.", Type::MX) == FindResult::NxRrset);
        assert!(find(&zone, "_telnet._tcp.host1.example.", Type::SRV) == FindResult::NxDomain);
        match find(&zone, "host.subdel.example.", Type::A) {
            FindResult::Delegation(ns) => {
                assert_eq!(ns.owner(), &name("subdel.example."));
                assert_eq!(ns.len(), 2);
            }
            _ => panic!("host.subdel.example. A did not return the expected referral"),
        }
        assert!(find(&zone, "ghost.*.example.", Type::MX) == FindResult::NxDomain);
    }
}
