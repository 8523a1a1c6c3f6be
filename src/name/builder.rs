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

//! Implementation of the [`NameBuilder`] type.

use arrayvec::ArrayVec;

use super::{Error, Label, Name, MAX_LABEL_LEN, MAX_N_LABELS, MAX_WIRE_LEN};

/// Builds a [`Name`] octet by octet or label by label, enforcing the
/// length limits of [RFC 1035 § 2.3.4] as it goes.
///
/// [RFC 1035 § 2.3.4]: https://datatracker.ietf.org/doc/html/rfc1035#section-2.3.4
#[derive(Debug, Default)]
pub struct NameBuilder {
    labels: ArrayVec<Label, MAX_N_LABELS>,
    current: ArrayVec<u8, MAX_LABEL_LEN>,
    wire_len: usize,
}

impl NameBuilder {
    /// Creates a new builder with no labels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an octet to the label currently being built.
    pub fn try_push(&mut self, octet: u8) -> Result<(), Error> {
        self.current.try_push(octet).or(Err(Error::LabelTooLong))
    }

    /// Finishes the label currently being built and starts a new one.
    /// Fails if the finished label would be null, since a null label
    /// may only terminate a name.
    pub fn next_label(&mut self) -> Result<(), Error> {
        if self.current.is_empty() {
            return Err(Error::NullNonTerminal);
        }
        let label = Label::from_unchecked(&self.current);
        self.current.clear();
        self.push_label(label)
    }

    /// Appends a complete non-null label.
    pub fn try_push_label(&mut self, octets: &[u8]) -> Result<(), Error> {
        debug_assert!(self.current.is_empty(), "a label is in progress");
        if octets.is_empty() {
            Err(Error::NullNonTerminal)
        } else {
            self.push_label(Label::try_from(octets)?)
        }
    }

    fn push_label(&mut self, label: Label) -> Result<(), Error> {
        // One octet of the wire limit is reserved for the null label.
        let wire_len = self.wire_len + 1 + label.len();
        if wire_len + 1 > MAX_WIRE_LEN {
            return Err(Error::NameTooLong);
        }
        self.labels.try_push(label).or(Err(Error::NameTooLong))?;
        self.wire_len = wire_len;
        Ok(())
    }

    /// Terminates the name with the null label and returns it. Fails
    /// with [`Error::NonNullTerminal`] if a label is still in progress
    /// (i.e. the name was not fully qualified).
    pub fn finish(mut self) -> Result<Name, Error> {
        if !self.current.is_empty() {
            return Err(Error::NonNullTerminal);
        }
        self.labels
            .try_push(Label::null().clone())
            .or(Err(Error::NameTooLong))?;
        Ok(Name::from_labels(self.labels.into_iter().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_labels() {
        let mut builder = NameBuilder::new();
        builder.try_push_label(b"www").unwrap();
        for &octet in b"example" {
            builder.try_push(octet).unwrap();
        }
        builder.next_label().unwrap();
        let name = builder.finish().unwrap();
        assert_eq!(name.to_string(), "www.example.");
    }

    #[test]
    fn rejects_unterminated_name() {
        let mut builder = NameBuilder::new();
        builder.try_push(b'x').unwrap();
        assert_eq!(builder.finish().err(), Some(Error::NonNullTerminal));
    }
}
