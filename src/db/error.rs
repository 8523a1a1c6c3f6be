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

//! Implementation of the [`Error`] type for data source errors.

use std::fmt;

use crate::name::Name;
use crate::rr;

/// The errors reported by data source operations.
///
/// Note that failing to find something is usually *not* an error: the
/// lookup methods report absence through their result types (see
/// [`ResultCode`](super::ResultCode)). An `Error` means an operation
/// could not be carried out.
#[derive(Debug)]
pub enum Error {
    /// The named zone does not exist, where an exact zone was required.
    NotFound(Name),

    /// The backend does not support the requested operation.
    NotImplemented(&'static str),

    /// The updater has already been committed.
    AlreadyCommitted,

    /// Another updater holds the zone, and the backend does not allow
    /// concurrent updates.
    AlreadyUpdating(Name),

    /// The updater was discarded after a failed commit.
    Discarded,

    /// A record's owner is not within the zone.
    NotInZone,

    /// A record's class does not match the zone's.
    ClassMismatch,

    /// A record's TTL does not match the rest of its RRset.
    TtlMismatch,

    /// The backend failed.
    Backend(BackendError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "zone {name} not found"),
            Self::NotImplemented(what) => write!(f, "not implemented: {what}"),
            Self::AlreadyCommitted => f.write_str("the update has already been committed"),
            Self::AlreadyUpdating(name) => write!(f, "zone {name} is already being updated"),
            Self::Discarded => f.write_str("the update was discarded"),
            Self::NotInZone => f.write_str("the owner is not within the zone"),
            Self::ClassMismatch => f.write_str("the class does not match the zone"),
            Self::TtlMismatch => f.write_str("the TTL does not match the rest of the RRset"),
            Self::Backend(e) => write!(f, "backend failure: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(e) => std::error::Error::source(e),
            _ => None,
        }
    }
}

impl From<BackendError> for Error {
    fn from(e: BackendError) -> Self {
        Self::Backend(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Backend(BackendError::with_source("I/O error", e))
    }
}

////////////////////////////////////////////////////////////////////////
// BACKEND ERRORS                                                     //
////////////////////////////////////////////////////////////////////////

/// A failure inside a storage backend, such as an I/O error or corrupt
/// stored data.
#[derive(Debug)]
pub struct BackendError {
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl BackendError {
    /// Creates a `BackendError` with no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a `BackendError` caused by another error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the message describing the failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<rr::Error> for BackendError {
    fn from(e: rr::Error) -> Self {
        Self::with_source("invalid record data", e)
    }
}
