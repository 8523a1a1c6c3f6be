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

//! Conversion of [`Name`]s to and from the uncompressed on-the-wire
//! representation of [RFC 1035 § 3.1].
//!
//! Names embedded in RDATA (e.g. the target of an NS record) are stored
//! this way. Message compression is not handled here.
//!
//! [RFC 1035 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.1

use super::{Error, Name, NameBuilder};

/// Parses an uncompressed name at the start of `octets`. Returns the
/// name and the number of octets it occupied. When `all` is set, extra
/// data after the name is an error.
pub fn parse_uncompressed(octets: &[u8], all: bool) -> Result<(Name, usize), Error> {
    let mut builder = NameBuilder::new();
    let mut cursor = 0;
    loop {
        let len = *octets.get(cursor).ok_or(Error::UnexpectedEnd)? as usize;
        if len & 0xc0 != 0 {
            return Err(Error::UnsupportedLabelType);
        }
        cursor += 1;
        if len == 0 {
            break;
        }
        let label = octets
            .get(cursor..cursor + len)
            .ok_or(Error::UnexpectedEnd)?;
        builder.try_push_label(label)?;
        cursor += len;
    }
    if all && cursor != octets.len() {
        return Err(Error::ExtraData);
    }
    Ok((builder.finish()?, cursor))
}

/// Appends the uncompressed on-the-wire representation of `name` to
/// `buf`.
pub fn write_uncompressed(name: &Name, buf: &mut Vec<u8>) {
    for label in name.labels() {
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.octets());
    }
}
