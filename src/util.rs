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

//! Crate-private utilities.

/// A wrapper around [`str`] references whose [`PartialEq`] and [`Eq`]
/// implementations are ASCII-case-insensitive.
pub struct Caseless<'a>(pub &'a str);

impl PartialEq for Caseless<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(other.0)
    }
}

impl Eq for Caseless<'_> {}

/// Parses the [RFC 3597 § 5] generic mnemonic for an unknown class or
/// type (e.g. `CLASS32` or `TYPE731`). `prefix` is `CLASS` or `TYPE`.
///
/// [RFC 3597 § 5]: https://datatracker.ietf.org/doc/html/rfc3597#section-5
pub fn parse_generic_mnemonic(
    text: &str,
    prefix: &str,
    what: &'static str,
) -> Result<u16, &'static str> {
    match text.get(0..prefix.len()) {
        Some(p) if p.eq_ignore_ascii_case(prefix) => text[prefix.len()..]
            .parse::<u16>()
            .map_err(|_| what),
        _ => Err("unknown mnemonic"),
    }
}

/// Converts a nibble into an ASCII hex character. Lower-case hex digits
/// are used. The passed value must be less than 16.
pub fn nibble_to_ascii_hex_digit(nibble: u8) -> u8 {
    assert!(nibble < 16);
    if nibble < 10 {
        b'0' + nibble
    } else {
        b'a' + nibble - 10
    }
}

/// Converts an ASCII hexadecimal digit to its numeric value. This
/// returns [`None`] if `digit` is not one of the ASCII characters
/// `0` through `9`, `A` through `F`, or `a` through `f`.
pub fn ascii_hex_digit_to_nibble(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        _ => None,
    }
}

/// Decodes a string of hex digits into octets. ASCII whitespace between
/// digits is ignored, since generic RDATA is often written in groups.
pub fn decode_hex(text: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .map(ascii_hex_digit_to_nibble)
        .collect::<Option<_>>()?;
    if digits.len() % 2 != 0 {
        return None;
    }
    Some(digits.chunks(2).map(|pair| pair[0] << 4 | pair[1]).collect())
}

/// Encodes octets as lower-case hex digits.
pub fn encode_hex(octets: &[u8]) -> String {
    let mut text = String::with_capacity(2 * octets.len());
    for octet in octets {
        text.push(nibble_to_ascii_hex_digit(octet >> 4) as char);
        text.push(nibble_to_ascii_hex_digit(octet & 0xf) as char);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_works() {
        assert_eq!(encode_hex(&[0x00, 0x7f, 0xab]), "007fab");
        assert_eq!(decode_hex("00 7F ab"), Some(vec![0x00, 0x7f, 0xab]));
        assert_eq!(decode_hex("abc"), None);
        assert_eq!(decode_hex("zz"), None);
    }

    #[test]
    fn generic_mnemonics_parse() {
        assert_eq!(parse_generic_mnemonic("type65280", "TYPE", "bad"), Ok(65280));
        assert_eq!(parse_generic_mnemonic("TYPEx", "TYPE", "bad"), Err("bad"));
        assert!(parse_generic_mnemonic("FOO", "TYPE", "bad").is_err());
    }
}
