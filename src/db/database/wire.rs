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

//! The stored form of zone contents.
//!
//! A zone's contents are stored as a sequence of records in the
//! uncompressed wire format of [RFC 1035 § 4.1.3], one record per
//! RDATA, in the order a [`ZoneIterator`] visits the RRsets:
//!
//! ```text
//! OWNER (uncompressed) | TYPE (16) | CLASS (16) | TTL (32) | RDLENGTH (16) | RDATA
//! ```
//!
//! [RFC 1035 § 4.1.3]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.3

use crate::class::Class;
use crate::db::{BackendError, ZoneData, ZoneIterator};
use crate::name::Name;
use crate::rr::{Rdata, Rrset, Ttl, Type};

/// The length of the fields between the owner and the RDATA.
const FIXED_LEN: usize = 10;

/// Encodes the contents of `zone`.
pub fn encode(zone: &ZoneData) -> Vec<u8> {
    let mut buf = Vec::new();
    for rrset in ZoneIterator::new(zone) {
        let owner = rrset.owner().to_wire();
        for rdata in rrset.rdatas() {
            buf.extend_from_slice(&owner);
            buf.extend_from_slice(&u16::from(rrset.rr_type()).to_be_bytes());
            buf.extend_from_slice(&u16::from(rrset.class()).to_be_bytes());
            buf.extend_from_slice(&u32::from(rrset.ttl()).to_be_bytes());
            // Rdata never exceeds 65,535 octets.
            buf.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
            buf.extend_from_slice(rdata.octets());
        }
    }
    buf
}

/// Decodes the stored contents of the zone `origin` of class `class`.
/// Every record must fit the zone.
pub fn decode(mut octets: &[u8], origin: &Name, class: Class) -> Result<ZoneData, BackendError> {
    let mut zone = ZoneData::new(origin.clone(), class);
    while !octets.is_empty() {
        let (owner, owner_len) = Name::from_wire_prefix(octets)
            .map_err(|e| BackendError::with_source("a stored record has an invalid owner", e))?;
        let fixed = octets
            .get(owner_len..owner_len + FIXED_LEN)
            .ok_or_else(truncated)?;
        let rr_type = Type::from(read_u16(&fixed[0..2]));
        let record_class = Class::from(read_u16(&fixed[2..4]));
        let ttl = Ttl::from(read_u32(&fixed[4..8]));
        let rdata_start = owner_len + FIXED_LEN;
        let rdata_end = rdata_start + read_u16(&fixed[8..10]) as usize;
        let rdata = Rdata::try_from(octets.get(rdata_start..rdata_end).ok_or_else(truncated)?)?;

        zone.add(&Rrset::new(owner, record_class, rr_type, ttl, [rdata]))
            .map_err(|e| BackendError::with_source("a stored record does not fit its zone", e))?;
        octets = &octets[rdata_end..];
    }
    Ok(zone)
}

fn truncated() -> BackendError {
    BackendError::new("the stored zone contents are truncated")
}

/// Reads a network-byte-order `u16` from a two-octet slice.
fn read_u16(octets: &[u8]) -> u16 {
    u16::from_be_bytes([octets[0], octets[1]])
}

/// Reads a network-byte-order `u32` from a four-octet slice.
fn read_u32(octets: &[u8]) -> u32 {
    u32::from_be_bytes([octets[0], octets[1], octets[2], octets[3]])
}
