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

//! Implementation of the [`Class`] type for DNS classes.

use std::fmt;
use std::str::FromStr;

use crate::util::{parse_generic_mnemonic, Caseless};

/// Represents a class in the DNS.
///
/// Every [`DataSourceClient`](crate::db::DataSourceClient) is bound to
/// exactly one class, and every zone and RRset it serves carries it.
/// On the wire a class is an unsigned 16-bit integer, so this is a thin
/// wrapper around [`u16`] with constants for the defined classes and
/// textual conversions that follow [RFC 3597 § 5] for unknown ones.
///
/// [RFC 3597 § 5]: https://datatracker.ietf.org/doc/html/rfc3597#section-5
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Class(u16);

impl Class {
    // RFC 1035. CS is left out, since the IANA no longer lists it.
    pub const IN: Self = Self(1);
    pub const CH: Self = Self(3);
    pub const HS: Self = Self(4);
}

impl From<u16> for Class {
    fn from(value: u16) -> Self {
        Class(value)
    }
}

impl From<Class> for u16 {
    fn from(class: Class) -> Self {
        class.0
    }
}

impl FromStr for Class {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        for (mnemonic, class) in [("IN", Self::IN), ("CH", Self::CH), ("HS", Self::HS)] {
            if Caseless(mnemonic) == Caseless(text) {
                return Ok(class);
            }
        }
        parse_generic_mnemonic(text, "CLASS", "class value is not a valid unsigned 16-bit integer")
            .map(Self)
            .map_err(|e| if e == "unknown mnemonic" { "unknown class" } else { e })
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::IN => f.write_str("IN"),
            Self::CH => f.write_str("CH"),
            Self::HS => f.write_str("HS"),
            Self(value) => write!(f, "CLASS{value}"),
        }
    }
}
