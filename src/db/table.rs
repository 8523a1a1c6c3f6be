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

//! The zone table text format.
//!
//! A zone table holds the contents of one zone as text, one record per
//! line, preceded by a header of directives:
//!
//! ```text
//! ; comment
//! $ORIGIN example.
//! $CLASS IN
//! example.        3600 IN SOA \# 4 00000000
//! www.example.     300 IN A 192.0.2.1
//! ```
//!
//! Records are written as `<owner> <ttl> <class> <type> <rdata>`, with
//! fully qualified owners and RDATA in a form that
//! [`Rdata::parse`](crate::rr::Rdata::parse) accepts. Owners that start
//! with `;` or `$` must escape it (`\;`), as [`Name`]'s `Display` does.
//! Lines that start with `;` are comments, and blank lines are ignored.
//! The directives are optional, but must come before the first record:
//!
//! * `$ORIGIN` names the zone's origin; and
//! * `$CLASS` gives the zone's class.
//!
//! The `datasrc` tool uses the format to load in-memory zones, to load
//! new contents into a zone, and to dump zones.

use std::fmt;
use std::io::{self, BufRead, Write};

use super::{ZoneData, ZoneIterator};
use crate::class::Class;
use crate::name::{self, Name};
use crate::rr::{self, Record};

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// Represents errors that may occur while reading a zone table.
#[derive(Debug)]
pub enum Error {
    /// I/O errors encountered while reading the table.
    Io(io::Error),

    /// Syntax errors and records that do not fit the zone.
    Syntax(ErrorDetails),
}

impl Error {
    fn new(line: usize, kind: ErrorKind) -> Self {
        Self::Syntax(ErrorDetails { line, kind })
    }
}

impl From<io::Error> for Error {
    fn from(io_error: io::Error) -> Self {
        Self::Io(io_error)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(io_error) => write!(f, "I/O error: {}", io_error),
            Self::Syntax(details) => details.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(io_error) => Some(io_error),
            Self::Syntax(_) => None,
        }
    }
}

/// A result type for zone table reading.
pub type Result<T> = std::result::Result<T, Error>;

/// Provides the line and kind of a zone table syntax error.
#[derive(Debug)]
pub struct ErrorDetails {
    line: usize,
    kind: ErrorKind,
}

impl ErrorDetails {
    /// Returns the line in the table at which the error occurred.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Returns the kind of syntax error that occurred.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at line {}", self.kind, self.line)
    }
}

/// Kinds of zone table syntax errors.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    DirectiveAfterRecord,
    ExpectedArgument,
    ExpectedEol,
    InvalidClass(&'static str),
    InvalidOrigin(name::Error),
    InvalidRecord(rr::Error),
    RecordRejected(super::Error),
    UnknownDirective,
    WrongClass(Class),
    WrongOrigin(Name),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DirectiveAfterRecord => f.write_str("directives must precede all records"),
            Self::ExpectedArgument => f.write_str("the directive needs an argument"),
            Self::ExpectedEol => f.write_str("expected end of line"),
            Self::InvalidClass(e) => write!(f, "invalid class: {e}"),
            Self::InvalidOrigin(e) => write!(f, "invalid origin: {e}"),
            Self::InvalidRecord(e) => write!(f, "invalid record: {e}"),
            Self::RecordRejected(e) => write!(f, "record rejected: {e}"),
            Self::UnknownDirective => f.write_str("unknown directive"),
            Self::WrongClass(class) => write!(f, "the table is for class {class}"),
            Self::WrongOrigin(origin) => write!(f, "the table is for zone {origin}"),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// READING                                                            //
////////////////////////////////////////////////////////////////////////

/// The meaningful lines of a table.
enum Line {
    Origin(Name),
    Class(Class),
    Record(Record),
}

/// Reads the lines of a table, skipping comments and blank lines.
struct Lines<R> {
    reader: R,
    buf: String,
    line_number: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line_number: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<(usize, Line)>> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let text = self.buf.trim();
            if text.is_empty() || text.starts_with(';') {
                continue;
            }
            return parse_line(text)
                .map(|line| Some((self.line_number, line)))
                .map_err(|kind| Error::new(self.line_number, kind));
        }
    }
}

fn parse_line(text: &str) -> std::result::Result<Line, ErrorKind> {
    let Some(directive) = text.strip_prefix('$') else {
        return text.parse().map(Line::Record).map_err(ErrorKind::InvalidRecord);
    };
    let mut fields = directive.split_whitespace();
    let name = fields.next().unwrap_or_default();
    let argument = fields.next().ok_or(ErrorKind::ExpectedArgument)?;
    if fields.next().is_some() {
        return Err(ErrorKind::ExpectedEol);
    }
    if name.eq_ignore_ascii_case("ORIGIN") {
        argument
            .parse()
            .map(Line::Origin)
            .map_err(ErrorKind::InvalidOrigin)
    } else if name.eq_ignore_ascii_case("CLASS") {
        argument
            .parse()
            .map(Line::Class)
            .map_err(ErrorKind::InvalidClass)
    } else {
        Err(ErrorKind::UnknownDirective)
    }
}

/// Reads a table into a new [`ZoneData`] for the zone `origin` of class
/// `class`.
///
/// If the table has `$ORIGIN` or `$CLASS` directives, they must agree
/// with `origin` and `class`. Every record must belong to the zone.
pub fn read(reader: impl BufRead, origin: &Name, class: Class) -> Result<ZoneData> {
    let mut lines = Lines::new(reader);
    let mut zone = ZoneData::new(origin.clone(), class);
    let mut seen_record = false;
    while let Some((line_number, line)) = lines.next_line()? {
        let kind = match line {
            Line::Record(record) => {
                seen_record = true;
                match zone.add(&record.into_rrset()) {
                    Ok(()) => continue,
                    Err(e) => ErrorKind::RecordRejected(e),
                }
            }
            _ if seen_record => ErrorKind::DirectiveAfterRecord,
            Line::Origin(found) if found != *origin => ErrorKind::WrongOrigin(found),
            Line::Class(found) if found != class => ErrorKind::WrongClass(found),
            Line::Origin(_) | Line::Class(_) => continue,
        };
        return Err(Error::new(line_number, kind));
    }
    Ok(zone)
}

////////////////////////////////////////////////////////////////////////
// WRITING                                                            //
////////////////////////////////////////////////////////////////////////

/// Writes `zone` as a table, with `$ORIGIN` and `$CLASS` directives.
pub fn write(zone: &ZoneData, writer: impl Write) -> io::Result<()> {
    write_iterator(ZoneIterator::new(zone), zone.class(), writer)
}

/// Like [`write`], but writes the RRsets produced by `iterator`, which
/// come from a zone of class `class`.
pub fn write_iterator(
    iterator: ZoneIterator,
    class: Class,
    mut writer: impl Write,
) -> io::Result<()> {
    writeln!(writer, "$ORIGIN {}", iterator.origin())?;
    writeln!(writer, "$CLASS {}", class)?;
    for rrset in iterator {
        writeln!(writer, "{}", rrset)?;
    }
    writer.flush()
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
