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

//! The conversion core: map one parsed source store onto one PO catalog.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::Context;
use polib::message::Message;

use crate::catalog::{DuplicateStyle, PoFile};
use crate::lang::LangStore;
use crate::{SourceStore, TransUnit};

/// Input format to output format mapping for the conversion framework.
pub static FORMATS: &[(&str, &str)] = &[("lang", "po")];

/// Outcome of one driver run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvertStatus {
    /// The source file had no units; the output was not touched.
    NothingWritten,
    /// The catalog was serialized to the output.
    Written,
}

impl ConvertStatus {
    /// Numeric convention used by batch conversion frameworks: 0 when
    /// nothing was written, 1 otherwise.
    pub fn code(self) -> i32 {
        match self {
            ConvertStatus::NothingWritten => 0,
            ConvertStatus::Written => 1,
        }
    }
}

/// Convert one source store into a single PO catalog.
pub struct Converter<S> {
    source: S,
    target: PoFile,
    duplicate_style: DuplicateStyle,
}

impl Converter<LangStore> {
    /// Eagerly parse `.lang` content from `input`. On failure no
    /// converter exists.
    pub fn from_reader(
        input: impl Read,
        filename: &str,
        duplicate_style: DuplicateStyle,
        encoding: &str,
    ) -> anyhow::Result<Self> {
        let source = LangStore::from_reader(input, filename, encoding)?;
        Ok(Converter::new(source, duplicate_style))
    }

    pub fn from_path(
        path: &Path,
        duplicate_style: DuplicateStyle,
        encoding: &str,
    ) -> anyhow::Result<Self> {
        let source = LangStore::from_path(path, encoding)?;
        Ok(Converter::new(source, duplicate_style))
    }
}

impl<S: SourceStore> Converter<S> {
    /// Wrap an already-parsed store.
    pub fn new(source: S, duplicate_style: DuplicateStyle) -> Self {
        Converter {
            source,
            target: PoFile::new(),
            duplicate_style,
        }
    }

    /// Convert the whole source store to a PO catalog.
    ///
    /// Units keep their file order. The header receives one provenance
    /// note, and duplicate keys are resolved with the configured style.
    /// Consumes the converter: a conversion run is single-use.
    pub fn convert_store(mut self) -> PoFile {
        self.target
            .add_header_note(&format!("extracted from {}", self.source.filename()));
        for unit in self.source.units() {
            self.target.add_unit(convert_unit(unit));
        }
        self.target.remove_duplicates(self.duplicate_style);
        self.target
    }
}

/// Convert a source format unit to a target format unit.
///
/// Text is copied verbatim; notes become developer comments even when
/// empty.
pub fn convert_unit(unit: &TransUnit) -> Message {
    Message::build_singular()
        .with_msgid(unit.source.clone())
        .with_msgstr(unit.target.clone())
        .with_source(unit.locations.join("\n"))
        .with_comments(unit.notes.clone())
        .done()
}

/// Wrapper around the converter for filesystem-level drivers.
///
/// `templates` and `pot` are accepted for signature compatibility with
/// batch conversion and ignored: the lang format has no template
/// variant. An empty catalog writes nothing and reports it through the
/// returned status; any parse or write failure propagates unchanged.
pub fn run_converter(
    input: impl Read,
    input_name: &str,
    mut output: impl Write,
    _templates: Option<&Path>,
    _pot: bool,
    duplicate_style: DuplicateStyle,
    encoding: &str,
) -> anyhow::Result<ConvertStatus> {
    let converter = Converter::from_reader(input, input_name, duplicate_style, encoding)?;
    let catalog = converter.convert_store();
    if catalog.is_empty() {
        return Ok(ConvertStatus::NothingWritten);
    }
    catalog
        .serialize(&mut output)
        .with_context(|| format!("failed to write PO output for {input_name}"))?;
    Ok(ConvertStatus::Written)
}
