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

//! Implementation of the [`Error`] type for record-related errors.

use std::fmt;

use crate::name;

/// An error type used to report problems constructing RDATA, records,
/// and RRsets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// RDATA was longer than 65,535 octets.
    RdataTooLong,

    /// RDATA text could not be parsed for the given type.
    InvalidRdata(&'static str),

    /// A textual record was malformed.
    InvalidRecord(&'static str),

    /// A domain name in a textual record was malformed.
    InvalidName(name::Error),

    /// Records that were to form one RRset disagree on owner, class,
    /// or type.
    MixedRecords,

    /// Records that were to form one RRset have different TTLs.
    TtlMismatch,

    /// There were no records to form an RRset from.
    NoRecords,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::RdataTooLong => f.write_str("RDATA is longer than 65,535 octets"),
            Self::InvalidRdata(reason) => write!(f, "invalid RDATA: {reason}"),
            Self::InvalidRecord(reason) => write!(f, "invalid record: {reason}"),
            Self::InvalidName(e) => write!(f, "invalid domain name: {e}"),
            Self::MixedRecords => {
                f.write_str("records do not share the same owner, class, and type")
            }
            Self::TtlMismatch => f.write_str("records in an RRset must have the same TTL"),
            Self::NoRecords => f.write_str("an RRset needs at least one record"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidName(e) => Some(e),
            _ => None,
        }
    }
}

impl From<name::Error> for Error {
    fn from(e: name::Error) -> Self {
        Self::InvalidName(e)
    }
}
