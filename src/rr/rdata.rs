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

//! Implementation of the [`Rdata`] type.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::{Error, Type};
use crate::name::Name;
use crate::util::{decode_hex, encode_hex};

////////////////////////////////////////////////////////////////////////
// RDATA TYPE                                                         //
////////////////////////////////////////////////////////////////////////

/// A type for record RDATA.
///
/// The RDATA of a record is limited to 65,535 octets. The `Rdata` type
/// owns its octets and can only be constructed if they have a valid
/// length. It does not know its own RR type; the [`Rrset`](super::Rrset)
/// that holds it does.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Rdata {
    octets: Box<[u8]>,
}

impl Rdata {
    /// Returns RDATA holding the uncompressed wire form of `name`, as
    /// used by NS, CNAME, and PTR records.
    pub fn from_name(name: &Name) -> Self {
        // Names are at most 255 octets, so this never exceeds the limit.
        Self {
            octets: name.to_wire().into_boxed_slice(),
        }
    }

    /// Returns whether the [`Rdata`] is empty.
    pub fn is_empty(&self) -> bool {
        self.octets.is_empty()
    }

    /// Returns the length of the [`Rdata`].
    pub fn len(&self) -> usize {
        self.octets.len()
    }

    /// Returns the underlying octet slice.
    pub fn octets(&self) -> &[u8] {
        &self.octets
    }

    /// Determines whether this [`Rdata`] is equal to another, assuming
    /// that they are both of type `rr_type`.
    ///
    /// [RFC 3597 § 6] specifies that RRs of unknown type are equal when
    /// their RDATA is bitwise equal. Only types that predate the RFC and
    /// embed domain names compare those names case-insensitively. If
    /// either side does not hold a valid name, this falls back to a
    /// bitwise comparison.
    ///
    /// [RFC 3597 § 6]: https://datatracker.ietf.org/doc/html/rfc3597#section-6
    pub fn equals(&self, other: &Self, rr_type: Type) -> bool {
        if rr_type.has_name_rdata() {
            if let (Ok(a), Ok(b)) = (Name::from_wire(&self.octets), Name::from_wire(&other.octets))
            {
                return a == b;
            }
        }
        self.octets == other.octets
    }

    /// Parses the presentation form of RDATA of type `rr_type`.
    ///
    /// The [RFC 3597 § 5] generic form `\# <length> <hex>` is accepted
    /// for every type. In addition, A and AAAA RDATA may be given as
    /// addresses, and RDATA consisting of a single domain name (see
    /// [`Type::has_name_rdata`]) may be given as a fully qualified name.
    ///
    /// [RFC 3597 § 5]: https://datatracker.ietf.org/doc/html/rfc3597#section-5
    pub fn parse(rr_type: Type, text: &str) -> Result<Self, Error> {
        let text = text.trim();
        if let Some(generic) = text.strip_prefix("\\#") {
            return Self::parse_generic(generic);
        }
        match rr_type {
            Type::A => text
                .parse::<Ipv4Addr>()
                .map(Self::from)
                .or(Err(Error::InvalidRdata("not an IPv4 address"))),
            Type::AAAA => text
                .parse::<Ipv6Addr>()
                .map(Self::from)
                .or(Err(Error::InvalidRdata("not an IPv6 address"))),
            _ if rr_type.has_name_rdata() => {
                let name: Name = text.parse()?;
                Ok(Self::from_name(&name))
            }
            _ => Err(Error::InvalidRdata("this type must use the \\# generic form")),
        }
    }

    fn parse_generic(text: &str) -> Result<Self, Error> {
        let text = text.trim_start();
        let (len, hex) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
        let len: usize = len
            .parse()
            .or(Err(Error::InvalidRdata("generic RDATA length is not a number")))?;
        let octets =
            decode_hex(hex).ok_or(Error::InvalidRdata("generic RDATA is not valid hex"))?;
        if octets.len() != len {
            Err(Error::InvalidRdata("generic RDATA length does not match"))
        } else {
            octets.try_into()
        }
    }

    /// Returns a value that displays this RDATA in the presentation
    /// form appropriate to `rr_type`, falling back to the generic form.
    /// The output is accepted by [`Rdata::parse`].
    pub fn display_as(&self, rr_type: Type) -> DisplayAs {
        DisplayAs {
            rdata: self,
            rr_type,
        }
    }
}

impl TryFrom<Vec<u8>> for Rdata {
    type Error = Error;

    fn try_from(octets: Vec<u8>) -> Result<Self, Self::Error> {
        if octets.len() > u16::MAX as usize {
            Err(Error::RdataTooLong)
        } else {
            Ok(Self {
                octets: octets.into_boxed_slice(),
            })
        }
    }
}

impl TryFrom<&[u8]> for Rdata {
    type Error = Error;

    fn try_from(octets: &[u8]) -> Result<Self, Self::Error> {
        octets.to_vec().try_into()
    }
}

impl From<Ipv4Addr> for Rdata {
    fn from(addr: Ipv4Addr) -> Self {
        Self {
            octets: addr.octets().into(),
        }
    }
}

impl From<Ipv6Addr> for Rdata {
    fn from(addr: Ipv6Addr) -> Self {
        Self {
            octets: addr.octets().into(),
        }
    }
}

/// We output using the RFC 3597 format for RDATA of unknown type.
impl fmt::Display for Rdata {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\\# {}", self.len())?;
        if !self.is_empty() {
            write!(f, " {}", encode_hex(&self.octets))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Rdata {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

////////////////////////////////////////////////////////////////////////
// TYPE-AWARE DISPLAY                                                 //
////////////////////////////////////////////////////////////////////////

/// Displays an [`Rdata`] according to its type. See
/// [`Rdata::display_as`].
pub struct DisplayAs<'a> {
    rdata: &'a Rdata,
    rr_type: Type,
}

impl fmt::Display for DisplayAs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let octets = self.rdata.octets();
        match self.rr_type {
            Type::A => {
                if let Ok(octets) = <[u8; 4]>::try_from(octets) {
                    return fmt::Display::fmt(&Ipv4Addr::from(octets), f);
                }
            }
            Type::AAAA => {
                if let Ok(octets) = <[u8; 16]>::try_from(octets) {
                    return fmt::Display::fmt(&Ipv6Addr::from(octets), f);
                }
            }
            rr_type if rr_type.has_name_rdata() => {
                if let Ok(name) = Name::from_wire(octets) {
                    return fmt::Display::fmt(&name, f);
                }
            }
            _ => (),
        }
        fmt::Display::fmt(self.rdata, f)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_addresses() {
        let a = Rdata::parse(Type::A, "192.0.2.1").unwrap();
        assert_eq!(a.octets(), [192, 0, 2, 1]);
        let aaaa = Rdata::parse(Type::AAAA, "2001:db8::1").unwrap();
        assert_eq!(aaaa.len(), 16);
        assert!(Rdata::parse(Type::A, "2001:db8::1").is_err());
    }

    #[test]
    fn parses_names() {
        let ns = Rdata::parse(Type::NS, "ns1.example.").unwrap();
        assert_eq!(ns.octets(), b"\x03ns1\x07example\x00");
        assert!(matches!(
            Rdata::parse(Type::CNAME, "relative"),
            Err(Error::InvalidName(_)),
        ));
    }

    #[test]
    fn parses_generic_form() {
        let rdata = Rdata::parse(Type::MX, "\\# 4 000a 0000").unwrap();
        assert_eq!(rdata.octets(), [0, 10, 0, 0]);
        assert!(Rdata::parse(Type::NULL, "\\# 0").unwrap().is_empty());
        assert_eq!(
            Rdata::parse(Type::MX, "\\# 3 0000"),
            Err(Error::InvalidRdata("generic RDATA length does not match")),
        );
        assert!(Rdata::parse(Type::MX, "10 mail.example.").is_err());
    }

    #[test]
    fn display_round_trips() {
        for (rr_type, text) in [
            (Type::A, "192.0.2.1"),
            (Type::AAAA, "2001:db8::1"),
            (Type::PTR, "host.example."),
            (Type::TXT, "\\# 3 026869"),
        ] {
            let rdata = Rdata::parse(rr_type, text).unwrap();
            assert_eq!(rdata.display_as(rr_type).to_string(), text);
        }
        let odd = Rdata::try_from(&[1, 2, 3][..]).unwrap();
        assert_eq!(odd.display_as(Type::A).to_string(), "\\# 3 010203");
    }

    #[test]
    fn equals_ignores_case_of_embedded_names() {
        let lower = Rdata::parse(Type::CNAME, "target.example.").unwrap();
        let upper = Rdata::parse(Type::CNAME, "TARGET.example.").unwrap();
        assert!(lower.equals(&upper, Type::CNAME));
        assert!(!lower.equals(&upper, Type::TXT));
        assert_ne!(lower, upper);
    }

    #[test]
    fn rejects_long_rdata() {
        assert_eq!(
            Rdata::try_from(vec![0; 65536]).err(),
            Some(Error::RdataTooLong),
        );
    }
}
