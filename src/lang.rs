// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parser for the Mozilla `.lang` localization format.
//!
//! A `.lang` file is line oriented: `;Source string` opens an entity and
//! the following line carries its translation. Lines starting with a
//! single `#` are developer comments for the entity below them, `##`
//! lines are tag and meta lines, and a translation may end in ` {ok}` to
//! mark it as deliberately identical to its source.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use encoding_rs::Encoding;
use thiserror::Error;

use crate::{SourceStore, TransUnit};

/// Marker on the first line of a file that is ready for publication.
const ACTIVE_MARKER: &str = "## active ##";

/// Suffix marking a translation as deliberately identical to its source.
const OK_MARKER: &str = "{ok}";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read lang file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown encoding label: {0}")]
    UnknownEncoding(String),
    #[error("{filename}: input is not valid {encoding}")]
    Decode { filename: String, encoding: String },
    #[error("{filename}:{line}: translation without a preceding source string")]
    OrphanTranslation { filename: String, line: usize },
}

/// An ordered sequence of translation units read from one `.lang` file.
#[derive(Debug)]
pub struct LangStore {
    filename: String,
    units: Vec<TransUnit>,
    is_active: bool,
}

impl LangStore {
    /// Parse a whole `.lang` file from `bytes`.
    ///
    /// `filename` is recorded for error messages and provenance notes.
    /// `encoding` is a WHATWG encoding label such as `"utf-8"` or
    /// `"latin1"`; malformed content for the chosen encoding is an error,
    /// not replaced.
    pub fn parse(bytes: &[u8], filename: &str, encoding: &str) -> Result<Self, ParseError> {
        let codec = Encoding::for_label(encoding.as_bytes())
            .ok_or_else(|| ParseError::UnknownEncoding(encoding.to_owned()))?;
        let (text, _, had_errors) = codec.decode(bytes);
        if had_errors {
            return Err(ParseError::Decode {
                filename: filename.to_owned(),
                encoding: encoding.to_owned(),
            });
        }

        let mut store = LangStore {
            filename: filename.to_owned(),
            units: Vec::new(),
            is_active: false,
        };
        // Entity whose translation line has not been seen yet.
        let mut pending: Option<TransUnit> = None;
        let mut comment = String::new();

        for (idx, line) in text.lines().enumerate() {
            if idx == 0 && line.trim_end() == ACTIVE_MARKER {
                store.is_active = true;
                continue;
            }
            if line.starts_with("##") {
                // Tag and meta lines carry no translatable content.
                continue;
            }
            if let Some(rest) = line.strip_prefix('#') {
                if !comment.is_empty() {
                    comment.push('\n');
                }
                comment.push_str(rest.trim());
                continue;
            }
            if line.trim().is_empty() {
                // Comments must be adjacent to their entity.
                comment.clear();
                continue;
            }
            if let Some(source) = line.strip_prefix(';') {
                if let Some(unit) = pending.take() {
                    // Previous entity had no translation line.
                    store.units.push(unit);
                }
                pending = Some(TransUnit {
                    source: source.to_owned(),
                    target: String::new(),
                    locations: Vec::new(),
                    notes: std::mem::take(&mut comment),
                });
                continue;
            }
            match pending.take() {
                Some(mut unit) => {
                    let target = match line.strip_suffix(OK_MARKER) {
                        Some(stripped) => stripped.trim_end(),
                        None => line,
                    };
                    unit.target = target.to_owned();
                    store.units.push(unit);
                }
                None => {
                    return Err(ParseError::OrphanTranslation {
                        filename: filename.to_owned(),
                        line: idx + 1,
                    });
                }
            }
        }
        if let Some(unit) = pending {
            store.units.push(unit);
        }
        Ok(store)
    }

    /// Read `input` to the end and parse it.
    pub fn from_reader(
        mut input: impl Read,
        filename: &str,
        encoding: &str,
    ) -> Result<Self, ParseError> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        Self::parse(&bytes, filename, encoding)
    }

    pub fn from_path(path: &Path, encoding: &str) -> Result<Self, ParseError> {
        let file = File::open(path)?;
        Self::from_reader(file, &path.display().to_string(), encoding)
    }

    /// Whether the file carried the `## active ##` marker.
    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

impl SourceStore for LangStore {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn units(&self) -> &[TransUnit] {
        &self.units
    }
}
