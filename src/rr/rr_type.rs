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

//! Provides the [`Type`] structure for DNS RR types.

use std::fmt;
use std::str::FromStr;

use crate::util::{parse_generic_mnemonic, Caseless};

////////////////////////////////////////////////////////////////////////
// RR TYPES                                                           //
////////////////////////////////////////////////////////////////////////

/// Represents the RR type of a DNS record.
///
/// An RR type is represented on the wire as an unsigned 16-bit integer.
/// Hence this is basically a wrapper around `u16` with nice
/// [`Debug`](fmt::Debug), [`Display`](fmt::Display), and [`FromStr`]
/// implementations for working with the common textual representations
/// of RR types. In addition, constants for common RR types (e.g.
/// [`Type::A`]) are provided.
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Type(u16);

impl Type {
    pub const A: Type = Type(1);
    pub const NS: Type = Type(2);
    pub const MD: Type = Type(3);
    pub const MF: Type = Type(4);
    pub const CNAME: Type = Type(5);
    pub const SOA: Type = Type(6);
    pub const MB: Type = Type(7);
    pub const MG: Type = Type(8);
    pub const MR: Type = Type(9);
    pub const NULL: Type = Type(10);
    pub const WKS: Type = Type(11);
    pub const PTR: Type = Type(12);
    pub const HINFO: Type = Type(13);
    pub const MINFO: Type = Type(14);
    pub const MX: Type = Type(15);
    pub const TXT: Type = Type(16);
    pub const AAAA: Type = Type(28);
    pub const SRV: Type = Type(33);

    /// Returns whether RDATA of this type is a single embedded domain
    /// name. For these RFC 1035 types, the embedded name is compared
    /// case-insensitively (see [RFC 3597 § 6]).
    ///
    /// [RFC 3597 § 6]: https://datatracker.ietf.org/doc/html/rfc3597#section-6
    pub fn has_name_rdata(self) -> bool {
        matches!(
            self,
            Self::NS
                | Self::MD
                | Self::MF
                | Self::CNAME
                | Self::MB
                | Self::MG
                | Self::MR
                | Self::PTR
        )
    }
}

impl From<u16> for Type {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Type> for u16 {
    fn from(rr_type: Type) -> Self {
        rr_type.0
    }
}

/// The types with mnemonics, matched without regard to case.
const MNEMONICS: [(&str, Type); 18] = [
    ("A", Type::A),
    ("NS", Type::NS),
    ("MD", Type::MD),
    ("MF", Type::MF),
    ("CNAME", Type::CNAME),
    ("SOA", Type::SOA),
    ("MB", Type::MB),
    ("MG", Type::MG),
    ("MR", Type::MR),
    ("NULL", Type::NULL),
    ("WKS", Type::WKS),
    ("PTR", Type::PTR),
    ("HINFO", Type::HINFO),
    ("MINFO", Type::MINFO),
    ("MX", Type::MX),
    ("TXT", Type::TXT),
    ("AAAA", Type::AAAA),
    ("SRV", Type::SRV),
];

impl FromStr for Type {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if let Some(&(_, rr_type)) = MNEMONICS
            .iter()
            .find(|(mnemonic, _)| Caseless(mnemonic) == Caseless(text))
        {
            return Ok(rr_type);
        }
        parse_generic_mnemonic(text, "TYPE", "type value is not a valid unsigned 16-bit integer")
            .map(Self)
            .map_err(|e| if e == "unknown mnemonic" { "unknown type" } else { e })
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match MNEMONICS.iter().find(|(_, rr_type)| rr_type == self) {
            Some((mnemonic, _)) => f.write_str(mnemonic),
            None => write!(f, "TYPE{}", self.0), // RFC 3597 § 5
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
