// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fast entity scanner using SIMD-accelerated byte searching
//!
//! Scans IFC files to discover entities without full parsing.

use memchr::memchr;
use rustc_hash::FxHashMap;

/// Entity index mapping ID to byte offsets
pub type EntityIndex = FxHashMap<u32, (usize, usize)>;

/// Fast entity scanner for IFC files
///
/// Uses memchr for SIMD-accelerated scanning to quickly find entity
/// boundaries without full parsing.
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> EntityScanner<'a> {
    /// Create a new scanner for the given content
    pub fn new(content: &'a str) -> Self {
        // Skip header section (find DATA; line)
        let pos = content.find("DATA;").map(|p| p + 5).unwrap_or(0);

        Self { content, pos }
    }

    /// Scan to find the next entity
    ///
    /// Returns (id, type_name, start_byte, end_byte). Lines whose header
    /// cannot be read are stepped over, never returned.
    pub fn next_entity(&mut self) -> Option<(u32, &'a str, usize, usize)> {
        let bytes = self.content.as_bytes();

        while self.pos < bytes.len() {
            let hash_pos = memchr(b'#', &bytes[self.pos..])?;
            self.pos += hash_pos;

            // Entity definitions start a line (or follow the previous `;`);
            // anything else is a reference inside attributes
            let is_entity_start = self.pos == 0
                || matches!(bytes[self.pos - 1], b'\n' | b'\r' | b';' | b' ' | b'\t');

            if !is_entity_start {
                self.pos += 1;
                continue;
            }

            let start = self.pos;

            self.pos += 1; // Skip #
            let id_start = self.pos;

            while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }

            if self.pos == id_start {
                continue;
            }

            let id: u32 = match self.content[id_start..self.pos].parse() {
                Ok(id) => id,
                Err(_) => continue,
            };

            self.skip_blanks();

            if self.pos >= bytes.len() || bytes[self.pos] != b'=' {
                continue;
            }
            self.pos += 1; // Skip =

            self.skip_blanks();

            let type_start = self.pos;
            while self.pos < bytes.len()
                && (bytes[self.pos].is_ascii_alphanumeric() || bytes[self.pos] == b'_')
            {
                self.pos += 1;
            }

            if self.pos == type_start {
                continue;
            }

            let type_name = &self.content[type_start..self.pos];

            let end = self.find_entity_end()?;

            return Some((id, type_name, start, end));
        }

        None
    }

    fn skip_blanks(&mut self) {
        let bytes = self.content.as_bytes();
        while self.pos < bytes.len() && (bytes[self.pos] == b' ' || bytes[self.pos] == b'\t') {
            self.pos += 1;
        }
    }

    /// Find the end of an entity (semicolon), handling quoted strings
    ///
    /// Strings never span lines, so a line break inside one ends the entity
    /// there. A line break followed by a new `#id=` also ends it, which keeps
    /// a missing `;` from swallowing the next definition. The returned span
    /// then fails to decode and only that entity is lost.
    fn find_entity_end(&mut self) -> Option<usize> {
        let bytes = self.content.as_bytes();
        let mut in_string = false;

        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\'' => {
                    // Escaped quote ''
                    if in_string && self.pos + 1 < bytes.len() && bytes[self.pos + 1] == b'\'' {
                        self.pos += 2;
                        continue;
                    }
                    in_string = !in_string;
                }
                b';' if !in_string => {
                    self.pos += 1;
                    return Some(self.pos);
                }
                b'\n' | b'\r' => {
                    if in_string || starts_definition(&bytes[self.pos..]) {
                        log::debug!("Unterminated entity at byte {}, resynchronising", self.pos);
                        return Some(self.pos);
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }

        None
    }

    /// Build an index of all entities (ID -> byte offsets)
    pub fn build_index(content: &'a str) -> EntityIndex {
        let mut scanner = Self::new(content);
        let mut index = FxHashMap::default();

        while let Some((id, _, start, end)) = scanner.next_entity() {
            index.entry(id).or_insert((start, end));
        }

        index
    }
}

/// Whether `bytes`, after leading line breaks and blanks, opens `#<digits>=`
fn starts_definition(bytes: &[u8]) -> bool {
    let mut rest = bytes;
    while let [b'\n' | b'\r' | b' ' | b'\t', tail @ ..] = rest {
        rest = tail;
    }
    let Some(tail) = rest.strip_prefix(b"#") else {
        return false;
    };
    let digits = tail.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return false;
    }
    tail[digits..]
        .iter()
        .find(|b| !matches!(b, b' ' | b'\t'))
        .is_some_and(|b| *b == b'=')
}

/// Header information extracted from an IFC file
#[derive(Clone, Debug, Default)]
pub struct HeaderInfo {
    pub schema_version: String,
    pub file_name: Option<String>,
    pub timestamp: Option<String>,
    pub originating_system: Option<String>,
}

/// Parse the header section to extract metadata
pub fn parse_header(content: &str) -> HeaderInfo {
    let mut info = HeaderInfo::default();

    let header_start = content.find("HEADER;").unwrap_or(0);
    let header_end = content[header_start..]
        .find("ENDSEC;")
        .map(|p| header_start + p)
        .unwrap_or(content.len());
    let header = &content[header_start..header_end];

    if let Some(args) = header_arguments(header, "FILE_SCHEMA") {
        // FILE_SCHEMA(('IFC4'))
        if let Some(schema) = args.first().and_then(|a| first_quoted(a)) {
            info.schema_version = schema;
        }
    }

    if let Some(args) = header_arguments(header, "FILE_NAME") {
        // FILE_NAME(name, timestamp, (author), (organization), preprocessor, originating_system, authorization)
        info.file_name = args.first().and_then(|a| first_quoted(a));
        info.timestamp = args.get(1).and_then(|a| first_quoted(a));
        info.originating_system = args.get(5).and_then(|a| first_quoted(a));
    }

    info
}

/// Split the top-level arguments of a header record like `FILE_NAME(...)`
fn header_arguments<'h>(header: &'h str, record: &str) -> Option<Vec<&'h str>> {
    let record_start = header.find(record)?;
    let open = record_start + header[record_start..].find('(')?;
    let bytes = header.as_bytes();

    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut arg_start = open + 1;
    let mut pos = open;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\'' => in_string = !in_string,
            b'(' if !in_string => depth += 1,
            b')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    args.push(header[arg_start..pos].trim());
                    return Some(args);
                }
            }
            b',' if !in_string && depth == 1 => {
                args.push(header[arg_start..pos].trim());
                arg_start = pos + 1;
            }
            _ => {}
        }
        pos += 1;
    }

    None
}

/// First quoted string inside a header argument, `''` unescaped
fn first_quoted(arg: &str) -> Option<String> {
    let start = arg.find('\'')? + 1;
    let bytes = arg.as_bytes();
    let mut end = start;
    while end < bytes.len() {
        if bytes[end] == b'\'' {
            if end + 1 < bytes.len() && bytes[end + 1] == b'\'' {
                end += 2;
                continue;
            }
            let value = arg[start..end].replace("''", "'");
            return (!value.is_empty()).then_some(value);
        }
        end += 1;
    }
    None
}
