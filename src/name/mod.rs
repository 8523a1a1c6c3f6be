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

//! Implementation of data structures related to domain names.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;
use std::slice;
use std::str::FromStr;

use lazy_static::lazy_static;

mod builder;
mod error;
mod label;
mod wire;
pub use builder::NameBuilder;
pub use error::Error;
pub use label::Label;

/// The maximum number of labels in a domain name.
const MAX_N_LABELS: usize = 128;

/// The maximum length of the uncompressed on-the-wire representation of
/// a domain name.
const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a label in a domain name (not including the
/// octet that provides the length).
const MAX_LABEL_LEN: usize = 63;

////////////////////////////////////////////////////////////////////////
// NAME STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// A fully qualified domain name.
///
/// A `Name` is an immutable sequence of [`Label`]s, ordered from the
/// leftmost (most specific) label to the rightmost. The last label is
/// always the null label of the root, so `example.` has two labels and
/// the root `.` has one. The tree structures in [`db`](crate::db) rely
/// on this: label `name[name.len() - 1]` is the root, and the node for
/// `name` lies `name.len() - origin.len()` levels below the node for a
/// zone origin.
///
/// `Name`s are constructed
///
/// * through the [`FromStr`] implementation (presentation format with
///   [RFC 4343 § 2.1] escapes);
/// * through a [`NameBuilder`]; or
/// * from the uncompressed on-the-wire format through
///   [`Name::from_wire`].
///
/// Comparisons, hashing and ordering are ASCII-case-insensitive, while
/// case is preserved for display. [`Ord`] implements the canonical
/// ordering of [RFC 4034 § 6.1].
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
/// [RFC 4343 § 2.1]: https://datatracker.ietf.org/doc/html/rfc4343#section-2.1
#[derive(Clone)]
pub struct Name {
    labels: Box<[Label]>,
}

lazy_static! {
    static ref ROOT: Name = Name::from_labels(vec![Label::null().clone()]);
}

#[allow(clippy::len_without_is_empty)] // A domain name is never empty!
impl Name {
    /// Wraps up a list of labels. The caller (this module) guarantees
    /// that the list is non-empty, ends with the null label, and
    /// satisfies the length limits.
    fn from_labels(labels: Vec<Label>) -> Self {
        debug_assert!(labels.last().map_or(false, Label::is_null));
        Self {
            labels: labels.into_boxed_slice(),
        }
    }

    /// Returns a reference to a `Name` representing the DNS root, `.`.
    pub fn root() -> &'static Name {
        &ROOT
    }

    /// Returns whether this `Name` is equal to or a subdomain of
    /// `other`.
    pub fn eq_or_subdomain_of(&self, other: &Name) -> bool {
        self.len() >= other.len()
            && self
                .labels()
                .rev()
                .zip(other.labels().rev())
                .all(|(a, b)| a == b)
    }

    /// Returns whether this `Name` is a subdomain of `other` but not
    /// equal to it.
    pub fn strict_subdomain_of(&self, other: &Name) -> bool {
        self.len() > other.len() && self.eq_or_subdomain_of(other)
    }

    /// Returns whether the `Name` is the DNS root `.`.
    pub fn is_root(&self) -> bool {
        self.labels.len() == 1
    }

    /// Returns whether the `Name` is a wildcard domain name (i.e.,
    /// whether its first label is `*`).
    pub fn is_wildcard(&self) -> bool {
        self[0].is_asterisk()
    }

    /// Returns an iterator over labels in this `Name`, from left to
    /// right.
    pub fn labels(&self) -> slice::Iter<Label> {
        self.labels.iter()
    }

    /// Returns the number of labels in this `Name`, including the null
    /// label.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns the superdomain obtained by skipping the first `skip`
    /// labels of the `Name`, or `None` if there aren't enough labels.
    pub fn superdomain(&self, skip: usize) -> Option<Name> {
        (skip < self.len()).then(|| self.suffix(skip))
    }

    /// Like [`Name::superdomain`], but for callers that know `skip` is
    /// in range. Panics if `skip >= self.len()`.
    pub(crate) fn suffix(&self, skip: usize) -> Name {
        Self {
            labels: self.labels[skip..].into(),
        }
    }

    /// Returns a copy of this `Name` with all ASCII letters made
    /// lowercase.
    pub fn to_ascii_lowercase(&self) -> Name {
        Self {
            labels: self.labels().map(Label::to_ascii_lowercase).collect(),
        }
    }

    /// Returns the length of the `Name`'s uncompressed on-the-wire
    /// representation.
    pub fn wire_len(&self) -> usize {
        self.labels().map(|label| label.len() + 1).sum()
    }

    /// Returns the uncompressed on-the-wire representation of the
    /// `Name`.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.wire_len());
        wire::write_uncompressed(self, &mut buf);
        buf
    }

    /// Parses an uncompressed on-the-wire name that occupies all of
    /// `octets`.
    pub fn from_wire(octets: &[u8]) -> Result<Name, Error> {
        wire::parse_uncompressed(octets, true).map(|(name, _)| name)
    }

    /// Parses an uncompressed on-the-wire name at the start of
    /// `octets`, returning it with the number of octets it occupied.
    pub fn from_wire_prefix(octets: &[u8]) -> Result<(Name, usize), Error> {
        wire::parse_uncompressed(octets, false)
    }
}

impl Index<usize> for Name {
    type Output = Label;

    fn index(&self, index: usize) -> &Self::Output {
        &self.labels[index]
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for label in &self.labels[..self.len() - 1] {
            write!(f, "{label}.")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels
    }
}

impl Eq for Name {}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per [RFC 4034 § 6.1], `Name`s are ordered as strings of labels read
/// from right to left.
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.labels()
            .rev()
            .zip(other.labels().rev())
            .map(|(a, b)| a.cmp(b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| self.len().cmp(&other.len()))
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for label in self.labels() {
            label.hash(state);
        }
    }
}

////////////////////////////////////////////////////////////////////////
// PARSING OF NAMES FROM RUST STRINGS                                 //
////////////////////////////////////////////////////////////////////////

/// Allows for conversion of a Rust [`str`] into a [`Name`]. The passed
/// string must be strictly ASCII and fully qualified (i.e. end with a
/// period). Escape sequences as defined by [RFC 4343 § 2.1] are
/// supported.
///
/// [RFC 4343 § 2.1]: https://datatracker.ietf.org/doc/html/rfc4343#section-2.1
impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::StrEmpty);
        } else if s == "." {
            return Ok(Name::root().clone());
        }

        let mut remaining: &[u8] = s.as_ref();
        let mut builder = NameBuilder::new();

        // NOTE: checking each octet is enough to reject non-ASCII
        // input, since every multi-byte character starts with a
        // non-ASCII octet.
        while let Some(&octet) = remaining.first() {
            if octet == b'\\' {
                let (value, consumed) = parse_escape(&remaining[1..])?;
                builder.try_push(value)?;
                remaining = &remaining[consumed + 1..];
            } else if octet == b'.' {
                builder.next_label()?;
                remaining = &remaining[1..];
            } else if !octet.is_ascii() {
                return Err(Error::StrNotAscii);
            } else {
                builder.try_push(octet)?;
                remaining = &remaining[1..];
            }
        }
        builder.finish()
    }
}

/// Parses an escape sequence. `remaining` starts with the octet
/// immediately *after* the introducing backslash. Returns the escaped
/// value and the number of octets consumed.
fn parse_escape(remaining: &[u8]) -> Result<(u8, usize), Error> {
    match remaining {
        [] => Err(Error::InvalidEscape),
        [d1, d2, d3, ..] if d1.is_ascii_digit() && d2.is_ascii_digit() && d3.is_ascii_digit() => {
            let value = [d1, d2, d3]
                .iter()
                .fold(0u32, |acc, d| 10 * acc + (**d - b'0') as u32);
            u8::try_from(value)
                .map(|value| (value, 3))
                .or(Err(Error::InvalidEscape))
        }
        [d, ..] if d.is_ascii_digit() => Err(Error::InvalidEscape),
        [other, ..] => Ok((*other, 1)),
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
    fn root_has_expected_characteristics() {
        let root = Name::root();
        assert!(root.is_root());
        assert_eq!(root.len(), 1);
        assert_eq!(root.to_wire(), [0]);
        assert_eq!(root.to_string(), ".");
    }

    #[test]
    fn is_wildcard_works() {
        assert!(name("*.quandary.test.").is_wildcard());
        assert!(!name("quandary.test.").is_wildcard());
        assert!(name("*.*.quandary.test.").is_wildcard());
        assert!(!name("x.*.quandary.test.").is_wildcard());
    }

    #[test]
    fn superdomain_works() {
        let subdomain = name("subdomain.example.test.");
        assert_eq!(subdomain.superdomain(0), Some(subdomain.clone()));
        assert_eq!(subdomain.superdomain(1), Some(name("example.test.")));
        assert_eq!(subdomain.superdomain(2), Some(name("test.")));
        assert_eq!(subdomain.superdomain(3).as_ref(), Some(Name::root()));
        assert_eq!(subdomain.superdomain(4), None);
    }

    #[test]
    fn eq_or_subdomain_of_works() {
        let subdomain = name("subdomain.example.test.");
        let domain = name("EXAMPLE.test.");
        let root = Name::root();
        assert!(subdomain.eq_or_subdomain_of(&subdomain));
        assert!(subdomain.eq_or_subdomain_of(&domain));
        assert!(subdomain.eq_or_subdomain_of(root));
        assert!(!domain.eq_or_subdomain_of(&subdomain));
        assert!(root.eq_or_subdomain_of(root));
        assert!(!domain.eq_or_subdomain_of(&name("other.test.")));
        assert!(!domain.eq_or_subdomain_of(&name("example.com.")));

        assert!(subdomain.strict_subdomain_of(&domain));
        assert!(!domain.strict_subdomain_of(&domain));
    }

    #[test]
    fn equality_and_hashing_ignore_case() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(name("Example.TEST."));
        assert!(set.contains(&name("example.test.")));
        assert_eq!(name("Example.TEST.").to_string(), "Example.TEST.");
    }

    #[test]
    fn ord_works() {
        // This ordered list is from RFC 4034 § 6.1, which defines the
        // canonical ordering of domain names.
        let names: Vec<Name> = [
            "example.",
            "a.example.",
            "yljkjljk.a.example.",
            "Z.a.example.",
            "zABC.a.EXAMPLE.",
            "z.example.",
            "\\001.z.example.",
            "*.z.example.",
            "\\200.z.example.",
        ]
        .into_iter()
        .map(name)
        .collect();

        for (i, ni) in names.iter().enumerate() {
            for (j, nj) in names.iter().enumerate() {
                assert_eq!(i.cmp(&j), ni.cmp(nj));
            }
        }
    }

    #[test]
    fn fromstr_works() {
        assert_eq!(name("example.test.").to_wire(), b"\x07example\x04test\x00");
        assert_eq!(&name("."), Name::root());
    }

    #[test]
    fn fromstr_rejects_bad_input() {
        assert_eq!("".parse::<Name>(), Err(Error::StrEmpty));
        assert_eq!("✈.aero.".parse::<Name>(), Err(Error::StrNotAscii));
        assert_eq!("non.fqdn".parse::<Name>(), Err(Error::NonNullTerminal));
        assert_eq!("a.b..c.".parse::<Name>(), Err(Error::NullNonTerminal));
        assert_eq!(
            format!("{}.", "x".repeat(64)).parse::<Name>(),
            Err(Error::LabelTooLong),
        );
        assert_eq!("x.".repeat(128).parse::<Name>(), Err(Error::NameTooLong));
    }

    #[test]
    fn fromstr_escaping_works() {
        assert_eq!(name("\\000.\\\\\\..").to_wire(), b"\x01\x00\x02\\.\x00");
        assert_eq!("\\00".parse::<Name>(), Err(Error::InvalidEscape));
        assert_eq!("\\00x.".parse::<Name>(), Err(Error::InvalidEscape));
        assert_eq!("\\256.".parse::<Name>(), Err(Error::InvalidEscape));
    }

    #[test]
    fn display_round_trips() {
        let original = name("a\\.b.\\032x.example.");
        assert_eq!(original.to_string(), "a\\.b.\\032x.example.");
        assert_eq!(name(&original.to_string()), original);
    }
}
