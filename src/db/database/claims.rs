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

//! Claims that keep a zone to one updater at a time.

use std::collections::HashSet;
use std::sync::Mutex;

use log::debug;

use crate::db::Error;
use crate::name::Name;

/// The set of zones of a [`Database`](super::Database) that are being
/// updated or otherwise modified.
#[derive(Debug, Default)]
pub struct Claims(Mutex<HashSet<Name>>);

impl Claims {
    /// Claims the zone `origin`. Fails with [`Error::AlreadyUpdating`]
    /// if someone else holds a claim on it.
    pub fn claim(&self, origin: &Name) -> Result<Claim<'_>, Error> {
        if self.0.lock().unwrap().insert(origin.clone()) {
            debug!("Claimed zone {} for writing.", origin);
            Ok(Claim {
                claims: self,
                origin: origin.clone(),
            })
        } else {
            Err(Error::AlreadyUpdating(origin.clone()))
        }
    }
}

/// An exclusive claim on a zone, held for as long as the value lives.
#[derive(Debug)]
pub struct Claim<'a> {
    claims: &'a Claims,
    origin: Name,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.claims.0.lock().unwrap().remove(&self.origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_are_exclusive_and_caseless() {
        let claims = Claims::default();
        let example: Name = "example.".parse().unwrap();
        let claim = claims.claim(&example).unwrap();
        assert!(matches!(
            claims.claim(&"EXAMPLE.".parse().unwrap()),
            Err(Error::AlreadyUpdating(name)) if name == example,
        ));
        assert!(claims.claim(&"other.".parse().unwrap()).is_ok());
        drop(claim);
        assert!(claims.claim(&example).is_ok());
    }
}
