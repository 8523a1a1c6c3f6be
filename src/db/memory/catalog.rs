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

//! The [`Catalog`] structure.

use std::sync::Arc;

use crate::db::node;
use crate::name::Name;

/// An in-memory catalog of zones that mirrors the DNS's tree structure,
/// mapping zone origins to values of type `V`.
///
/// Since the tree replicates the DNS namespace, finding the zone for a
/// name is a walk down from the root that remembers the deepest origin
/// seen along the way.
#[derive(Debug)]
pub struct Catalog<V> {
    root: Node<V>,
}

type Node<V> = node::Node<Option<V>>;

impl<V: Clone> Catalog<V> {
    /// Creates a new, initially empty `Catalog`.
    pub fn new() -> Self {
        Self {
            root: Node::new(Name::root().clone()),
        }
    }

    /// Adds an entry, replacing and returning the current entry for
    /// that origin (if any).
    pub fn insert(&mut self, origin: &Name, value: V) -> Option<V> {
        let node = self
            .root
            .get_or_create_descendant(origin, origin.len() - 1);
        node.data.replace(value)
    }

    /// Removes and returns the entry for `origin` (if any).
    pub fn remove(&mut self, origin: &Name) -> Option<V> {
        remove_impl(&mut self.root, origin, origin.len() - 1).0
    }
}

impl<V> Catalog<V> {
    /// Returns the entry whose origin is the longest match for `name`.
    pub fn lookup(&self, name: &Name) -> Option<&V> {
        lookup_impl(&self.root, name, name.len() - 1)
    }

    /// Returns the entry whose origin is exactly `origin`.
    pub fn get(&self, origin: &Name) -> Option<&V> {
        self.root
            .get_descendant(origin, origin.len() - 1)?
            .data
            .as_ref()
    }

    /// Returns the origins of all entries.
    pub fn origins(&self) -> Vec<Name> {
        let mut origins = Vec::new();
        collect_origins(&self.root, &mut origins);
        origins
    }
}

impl<V: Clone> Default for Catalog<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Implements lookup. The parameter `node` is the deepest node we have
/// matched so far; this node corresponds to `name[level]`.
fn lookup_impl<'a, V>(node: &'a Node<V>, name: &Name, level: usize) -> Option<&'a V> {
    if level == 0 {
        // We've matched the entire name.
        node.data.as_ref()
    } else {
        // Try to traverse down the tree. If we can match more labels,
        // then we see if there's a longer match.
        let longer_match = if let Some(subnode) = node.children.get(&name[level - 1]) {
            lookup_impl(subnode, name, level - 1)
        } else {
            None
        };
        longer_match.or(node.data.as_ref())
    }
}

/// Implements removal. Returns the removed entry and whether `node` is
/// now empty and can be pruned.
fn remove_impl<V: Clone>(node: &mut Node<V>, name: &Name, level: usize) -> (Option<V>, bool) {
    if level == 0 {
        (node.data.take(), node.children.is_empty())
    } else if let Some(subnode) = node.children.get_mut(&name[level - 1]) {
        let (entry, remove) = remove_impl(Arc::make_mut(subnode), name, level - 1);
        if remove {
            node.children.remove(&name[level - 1]);
            (entry, node.data.is_none() && node.children.is_empty())
        } else {
            (entry, false)
        }
    } else {
        (None, false)
    }
}

fn collect_origins<V>(node: &Node<V>, origins: &mut Vec<Name>) {
    if node.data.is_some() {
        origins.push(node.name.clone());
    }
    for child in node.children.values() {
        collect_origins(child, origins);
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    #[test]
    fn lookup_works() {
        let mut catalog = Catalog::new();
        catalog.insert(&name("test."), 1);
        catalog.insert(&name("x.quandary.test."), 2);

        assert_eq!(catalog.lookup(Name::root()), None);
        assert_eq!(catalog.lookup(&name("test.")), Some(&1));
        assert_eq!(catalog.lookup(&name("quandary.test.")), Some(&1));
        assert_eq!(catalog.lookup(&name("x.quandary.test.")), Some(&2));
        assert_eq!(catalog.lookup(&name("y.x.QUANDARY.test.")), Some(&2));
        assert_eq!(catalog.lookup(&name("example.")), None);

        assert_eq!(catalog.get(&name("quandary.test.")), None);
        assert_eq!(catalog.get(&name("x.quandary.test.")), Some(&2));
    }

    #[test]
    fn insert_replaces() {
        let mut catalog = Catalog::new();
        assert_eq!(catalog.insert(&name("test."), 1), None);
        assert_eq!(catalog.insert(&name("test."), 2), Some(1));
        assert_eq!(catalog.get(&name("test.")), Some(&2));
    }

    #[test]
    fn remove_works() {
        let test = name("test.");
        let quandary_test = name("quandary.test.");
        let mut catalog = Catalog::new();
        catalog.insert(&test, 1);
        catalog.insert(&quandary_test, 2);

        // Removing the entry at test. must not remove the node, since
        // quandary.test. lies beneath it.
        assert_eq!(catalog.remove(&test), Some(1));
        assert_eq!(catalog.lookup(&quandary_test), Some(&2));
        assert_eq!(catalog.lookup(&test), None);

        assert_eq!(catalog.remove(&quandary_test), Some(2));
        assert!(catalog.root.children.is_empty());
        assert_eq!(catalog.remove(&quandary_test), None);
    }

    #[test]
    fn origins_lists_entries() {
        let mut catalog = Catalog::new();
        catalog.insert(Name::root(), 0);
        catalog.insert(&name("b.test."), 1);
        catalog.insert(&name("a.test."), 2);
        let mut origins = catalog.origins();
        origins.sort();
        assert_eq!(origins, [name("."), name("a.test."), name("b.test.")]);
    }
}
