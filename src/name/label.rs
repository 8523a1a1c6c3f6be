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

//! Implementation of the [`Label`] type.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use lazy_static::lazy_static;

use super::{Error, MAX_LABEL_LEN};

/// The label given to a node in the Domain Name System's tree
/// structure.
///
/// Note that in accordance with [RFC 1034 § 3.1]:
///
/// * comparisons between `Label`s are case-insensitive assuming ASCII,
///   but
/// * case is preserved in the internal representation.
///
/// Because equality and hashing ignore case, `Label`s can key the
/// child maps of the DNS tree structures in [`db`](crate::db) directly.
///
/// [RFC 1034 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1034#section-3.1
#[derive(Clone)]
pub struct Label {
    octets: Box<[u8]>,
}

lazy_static! {
    static ref ASTERISK: Label = Label::from_unchecked(b"*");
    static ref NULL: Label = Label::from_unchecked(b"");
}

#[allow(clippy::len_without_is_empty)] // Following DNS terminology, we have is_null().
impl Label {
    /// Returns the asterisk label `*`, which has a special meaning in
    /// the DNS lookup process.
    pub fn asterisk() -> &'static Self {
        &ASTERISK
    }

    /// Returns the null (zero-length) `Label`.
    pub fn null() -> &'static Self {
        &NULL
    }

    /// Wraps up octets as a `Label` without checking their length. For
    /// use within the parent module after a manual check.
    pub(super) fn from_unchecked(octets: &[u8]) -> Self {
        Self {
            octets: octets.into(),
        }
    }

    /// Returns whether this `Label` is the asterisk label.
    pub fn is_asterisk(&self) -> bool {
        *self.octets == *b"*"
    }

    /// Returns whether this `Label` is the null (zero-length) label.
    pub fn is_null(&self) -> bool {
        self.octets.is_empty()
    }

    /// Returns the number of octets in this `Label`.
    pub fn len(&self) -> usize {
        self.octets.len()
    }

    /// Returns the octets of this `Label`.
    pub fn octets(&self) -> &[u8] {
        &self.octets
    }

    /// Returns a copy of this `Label` with all ASCII letters made
    /// lowercase.
    pub fn to_ascii_lowercase(&self) -> Self {
        Self {
            octets: self.octets.to_ascii_lowercase().into(),
        }
    }
}

impl TryFrom<&[u8]> for Label {
    type Error = Error;

    fn try_from(octets: &[u8]) -> Result<Self, Self::Error> {
        if octets.len() > MAX_LABEL_LEN {
            Err(Error::LabelTooLong)
        } else {
            Ok(Self::from_unchecked(octets))
        }
    }
}

/// When a `Label` is displayed, octets that are not ASCII graphic
/// characters are escaped in accordance with RFC 1035 § 5.1 and
/// RFC 4343 § 2.1. So are the characters that master files give a
/// special meaning (`.`, `\`, `;`, `$`, `(`, `)`, `"`, and `@`), so that
/// the output always reads back as the same label.
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &octet in self.octets() {
            match octet {
                b'.' | b'\\' | b';' | b'$' | b'(' | b')' | b'"' | b'@' => {
                    write!(f, "\\{}", octet as char)?
                }
                _ if octet.is_ascii_graphic() => write!(f, "{}", octet as char)?,
                _ => write!(f, "\\{octet:03}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.octets.eq_ignore_ascii_case(&other.octets)
    }
}

impl Eq for Label {}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Labels are ordered as in [RFC 4034 § 6.1]: as unsigned octet strings
/// after ASCII letters are made lowercase, with a proper prefix sorting
/// first.
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.octets.iter().map(u8::to_ascii_lowercase);
        let b = other.octets.iter().map(u8::to_ascii_lowercase);
        a.cmp(b)
    }
}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.octets.len());
        for octet in self.octets.iter() {
            state.write_u8(octet.to_ascii_lowercase());
        }
    }
}
