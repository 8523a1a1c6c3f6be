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

//! The [`Node`] structure, representing a node in the DNS tree, used in
//! both the zone data structure ([`ZoneData`](super::ZoneData)) and the
//! in-memory store's catalog of zones.
//!
//! Children are shared through [`Arc`]s, which makes the tree
//! persistent: cloning a tree is cheap, and modifying a clone through
//! [`Node::get_or_create_descendant`] copies only the nodes on the path
//! to the change ([`Arc::make_mut`]). Everything else stays shared with
//! the original, which is never affected.

use std::collections::HashMap;
use std::iter::FusedIterator;
use std::sync::Arc;

use crate::name::{Label, Name};

/// A node in the DNS tree. This structure is generic over the type of
/// data to store at each node.
#[derive(Clone, Debug)]
pub struct Node<T> {
    pub name: Name,
    pub children: HashMap<Label, Arc<Node<T>>>,
    pub data: T,
}

impl<T: Default> Node<T> {
    /// Creates a new `Node` with the provided name. Its data is set to
    /// `T`'s default, and it initially has no children.
    pub fn new(name: Name) -> Self {
        Self {
            name,
            children: HashMap::new(),
            data: T::default(),
        }
    }
}

impl<T: Clone + Default> Node<T> {
    /// Gets or creates a descendant node corresponding to `name`. Any
    /// nodes between the target descendant node and `self` will also be
    /// created, and shared nodes on the path are copied. `level` should
    /// be set so that `self` corresponds to the label `name[level]`.
    pub fn get_or_create_descendant(&mut self, name: &Name, level: usize) -> &mut Self {
        if level == 0 {
            self
        } else {
            let child = self
                .children
                .entry(name[level - 1].clone())
                .or_insert_with(|| Arc::new(Self::new(name.suffix(level - 1))));
            Arc::make_mut(child).get_or_create_descendant(name, level - 1)
        }
    }
}

impl<T> Node<T> {
    /// Finds the descendant node corresponding to `name`, where `self`
    /// corresponds to the label `name[level]`.
    pub fn get_descendant(&self, name: &Name, level: usize) -> Option<&Self> {
        if level == 0 {
            Some(self)
        } else {
            self.children
                .get(&name[level - 1])?
                .get_descendant(name, level - 1)
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TREE WALK                                                          //
////////////////////////////////////////////////////////////////////////

/// An iterator over a shared [`Node`] and all of its descendants.
///
/// Nodes are produced in the canonical order of their names ([RFC 4034
/// § 6.1]): each node comes before its children, and siblings are
/// sorted by label. Because the walk holds [`Arc`]s rather than
/// references, it keeps the tree it started on alive and is unaffected
/// by later modifications of copies of that tree.
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
pub struct Walk<T> {
    stack: Vec<Arc<Node<T>>>,
}

impl<T> Walk<T> {
    /// Creates a new `Walk` starting at (and including) `top`.
    pub fn new(top: Arc<Node<T>>) -> Self {
        Self { stack: vec![top] }
    }
}

impl<T> Iterator for Walk<T> {
    type Item = Arc<Node<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let mut children: Vec<_> = node.children.iter().collect();
        // The stack is LIFO, so push the greatest label first.
        children.sort_unstable_by(|(a, _), (b, _)| b.cmp(a));
        self.stack
            .extend(children.into_iter().map(|(_, child)| child.clone()));
        Some(node)
    }
}

impl<T> FusedIterator for Walk<T> {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
